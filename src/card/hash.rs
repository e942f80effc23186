//! Content-only hashing: the connection fingerprint and the reflection
//! hash (spec §3). Neither depends on sampled values, timestamps, or the
//! order tables/columns were reflected in.

use std::hash::{Hash, Hasher};

use crate::reflect::{RawColumn, RawForeignKey, RawSchema, RawTable};

#[derive(Debug, Clone, Copy)]
pub struct ProfilingParams {
    pub value_constraint_threshold: usize,
    pub sample_rows: usize,
}

/// A stable hash of the connection string, used as a card identity key
/// without persisting credentials in the card itself.
pub fn compute_connection_fingerprint(database_url: &str) -> String {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    database_url.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Content hash over the reflected structure plus profiling parameters.
/// Independent of sampled values and wall-clock time: only structural
/// facts (schemas, tables, columns, keys, FKs) and the parameters that
/// shaped profiling feed the hash, in a canonical (sorted) order.
pub fn compute_reflection_hash(raw: &RawSchema, params: &ProfilingParams) -> String {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();

    let mut schemas = raw.schemas.clone();
    schemas.sort();
    schemas.hash(&mut hasher);

    let mut tables: Vec<&RawTable> = raw.tables.iter().collect();
    tables.sort_by_key(|t| t.table_key());
    for table in tables {
        table.schema.hash(&mut hasher);
        table.name.hash(&mut hasher);

        let mut columns: Vec<&RawColumn> = table.columns.iter().collect();
        columns.sort_by(|a, b| a.name.cmp(&b.name));
        for column in columns {
            column.name.hash(&mut hasher);
            column.vendor_type.hash(&mut hasher);
            column.nullable.hash(&mut hasher);
            column.is_primary_key.hash(&mut hasher);
        }

        let mut pk = table.primary_key.clone();
        pk.sort();
        pk.hash(&mut hasher);

        let mut fks: Vec<&RawForeignKey> = table.foreign_keys.iter().collect();
        fks.sort_by(|a, b| (a.local_column.as_str(), a.remote_table_key.as_str()).cmp(&(b.local_column.as_str(), b.remote_table_key.as_str())));
        for fk in fks {
            fk.local_column.hash(&mut hasher);
            fk.remote_table_key.hash(&mut hasher);
            fk.remote_column.hash(&mut hasher);
        }
    }

    params.value_constraint_threshold.hash(&mut hasher);
    params.sample_rows.hash(&mut hasher);

    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::RawSchema;

    fn schema(table_order: &[&str]) -> RawSchema {
        RawSchema {
            schemas: vec!["public".to_string()],
            tables: table_order
                .iter()
                .map(|name| RawTable {
                    schema: "public".to_string(),
                    name: name.to_string(),
                    columns: vec![RawColumn {
                        name: "id".to_string(),
                        vendor_type: "integer".to_string(),
                        nullable: false,
                        is_primary_key: true,
                    }],
                    primary_key: vec!["id".to_string()],
                    foreign_keys: vec![],
                    row_count_estimate: None,
                })
                .collect(),
            warnings: vec![],
        }
    }

    #[test]
    fn reflection_hash_is_order_independent() {
        let params = ProfilingParams { value_constraint_threshold: 25, sample_rows: 500 };
        let a = compute_reflection_hash(&schema(&["orders", "customers"]), &params);
        let b = compute_reflection_hash(&schema(&["customers", "orders"]), &params);
        assert_eq!(a, b);
    }

    #[test]
    fn reflection_hash_changes_with_structure() {
        let params = ProfilingParams { value_constraint_threshold: 25, sample_rows: 500 };
        let a = compute_reflection_hash(&schema(&["orders"]), &params);
        let b = compute_reflection_hash(&schema(&["orders", "customers"]), &params);
        assert_ne!(a, b);
    }

    #[test]
    fn connection_fingerprint_is_deterministic() {
        let a = compute_connection_fingerprint("postgres://u:p@host/db");
        let b = compute_connection_fingerprint("postgres://u:p@host/db");
        assert_eq!(a, b);
    }
}
