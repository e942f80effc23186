//! Archetype rules, evaluated in spec order (spec §4.5).

use std::collections::BTreeSet;

use crate::profile::{ColumnProfile, Role};
use crate::reflect::RawTable;

/// `bridge` if exactly two FKs and PK equals the union of those FK columns.
pub fn is_bridge(table: &RawTable) -> bool {
    if table.foreign_keys.len() != 2 {
        return false;
    }
    let fk_columns: BTreeSet<&str> = table
        .foreign_keys
        .iter()
        .map(|fk| fk.local_column.as_str())
        .collect();
    let pk_columns: BTreeSet<&str> = table.primary_key.iter().map(String::as_str).collect();
    !pk_columns.is_empty() && pk_columns == fk_columns
}

/// `fact` if >= 2 FKs and >= 1 metric column.
pub fn is_fact(table: &RawTable, profiles: &[ColumnProfile]) -> bool {
    table.foreign_keys.len() >= 2 && profiles.iter().any(|p| p.role == Role::Metric)
}

/// `reference` if row-count estimate <= 10,000 and no outgoing FKs.
pub fn is_reference(table: &RawTable) -> bool {
    table.foreign_keys.is_empty() && table.row_count_estimate.map(|n| n <= 10_000).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{RawForeignKey, RawTable};

    fn bridge_table() -> RawTable {
        RawTable {
            schema: "public".to_string(),
            name: "order_items".to_string(),
            columns: vec![],
            primary_key: vec!["order_id".to_string(), "product_id".to_string()],
            foreign_keys: vec![
                RawForeignKey {
                    local_column: "order_id".to_string(),
                    remote_table_key: "public.orders".to_string(),
                    remote_column: "id".to_string(),
                },
                RawForeignKey {
                    local_column: "product_id".to_string(),
                    remote_table_key: "public.products".to_string(),
                    remote_column: "id".to_string(),
                },
            ],
            row_count_estimate: Some(5000),
        }
    }

    #[test]
    fn composite_pk_matching_both_fks_is_bridge() {
        assert!(is_bridge(&bridge_table()));
    }

    #[test]
    fn extra_pk_column_disqualifies_bridge() {
        let mut table = bridge_table();
        table.primary_key.push("line_number".to_string());
        assert!(!is_bridge(&table));
    }

    #[test]
    fn reference_requires_no_outgoing_fks_and_small_row_count() {
        let mut table = bridge_table();
        table.foreign_keys.clear();
        table.row_count_estimate = Some(42);
        assert!(is_reference(&table));
    }
}
