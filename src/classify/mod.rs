//! Classifier (C5): assigns an archetype, archive/audit flags, and a
//! one-sentence summary to every table.

pub mod rules;
pub mod types;

use std::collections::{HashMap, HashSet};

use crate::graph::is_archive_name;
use crate::profile::{ColumnProfile, Role};
use crate::reflect::{RawTable, TableKey};

pub use types::{Archetype, TableClassification};

/// Classify every table. `area_names` maps table-key to its subject-area
/// name (from the Graph Builder), used only to build the summary sentence.
pub fn classify_tables(
    tables: &[RawTable],
    profiles_by_table: &HashMap<TableKey, Vec<ColumnProfile>>,
    area_names: &HashMap<TableKey, String>,
) -> HashMap<TableKey, TableClassification> {
    let mut archetypes: HashMap<TableKey, Archetype> = HashMap::new();

    // Pass 1: bridge and fact, evaluated independently of other tables.
    for table in tables {
        let key = table.table_key();
        let profiles = profiles_by_table.get(&key).map(Vec::as_slice).unwrap_or(&[]);
        if rules::is_bridge(table) {
            archetypes.insert(key, Archetype::Bridge);
        } else if rules::is_fact(table, profiles) {
            archetypes.insert(key, Archetype::Fact);
        }
    }

    let fact_tables: HashSet<TableKey> = archetypes
        .iter()
        .filter(|(_, a)| **a == Archetype::Fact)
        .map(|(k, _)| k.clone())
        .collect();

    // Referenced-by-fact lookup: table key -> referenced by >= 1 fact table.
    let mut referenced_by_fact: HashSet<TableKey> = HashSet::new();
    for table in tables {
        if !fact_tables.contains(&table.table_key()) {
            continue;
        }
        for fk in &table.foreign_keys {
            referenced_by_fact.insert(fk.remote_table_key.clone());
        }
    }

    // Pass 2: dimension, reference, operational for whatever remains.
    for table in tables {
        let key = table.table_key();
        if archetypes.contains_key(&key) {
            continue;
        }
        let has_pk = !table.primary_key.is_empty();
        let archetype = if has_pk && referenced_by_fact.contains(&key) {
            Archetype::Dimension
        } else if rules::is_reference(table) {
            Archetype::Reference
        } else {
            Archetype::Operational
        };
        archetypes.insert(key, archetype);
    }

    tables
        .iter()
        .map(|table| {
            let key = table.table_key();
            let archetype = archetypes[&key];
            let profiles = profiles_by_table.get(&key).map(Vec::as_slice).unwrap_or(&[]);
            let is_archive = is_archive_name(&table.name);
            let is_audit_like = is_audit_like(&table.name, profiles);
            let area_name = area_names.get(&key).map(String::as_str).unwrap_or("Unassigned");
            let summary = build_summary(archetype, profiles, area_name);
            (
                key,
                TableClassification { archetype, is_archive, is_audit_like, summary },
            )
        })
        .collect()
}

/// A table is audit-like when its name carries an audit/log token, or its
/// columns are dominated by identifiers and timestamps with nothing that
/// looks like business content (no metric, category, or text columns).
fn is_audit_like(table_name: &str, profiles: &[ColumnProfile]) -> bool {
    let name = table_name.to_ascii_lowercase();
    if name.contains("audit") || name.contains("log") {
        return true;
    }
    if profiles.is_empty() {
        return false;
    }
    let content_bearing = profiles
        .iter()
        .any(|p| matches!(p.role, Role::Metric | Role::Category | Role::Text));
    !content_bearing
}

fn dominant_roles(profiles: &[ColumnProfile]) -> Vec<Role> {
    let mut counts: HashMap<Role, usize> = HashMap::new();
    for p in profiles {
        *counts.entry(p.role).or_insert(0) += 1;
    }
    let mut roles: Vec<(Role, usize)> = counts.into_iter().collect();
    roles.sort_by(|a, b| b.1.cmp(&a.1));
    roles.into_iter().take(2).map(|(r, _)| r).collect()
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::Key => "key",
        Role::Id => "identifier",
        Role::Date => "date",
        Role::Metric => "metric",
        Role::Category => "category",
        Role::Text => "text",
    }
}

fn archetype_label(archetype: Archetype) -> &'static str {
    match archetype {
        Archetype::Bridge => "bridge",
        Archetype::Fact => "fact",
        Archetype::Dimension => "dimension",
        Archetype::Reference => "reference",
        Archetype::Operational => "operational",
    }
}

fn build_summary(archetype: Archetype, profiles: &[ColumnProfile], area_name: &str) -> String {
    let roles: Vec<&str> = dominant_roles(profiles).into_iter().map(role_label).collect();
    if roles.is_empty() {
        format!("A {} table in the {} subject area.", archetype_label(archetype), area_name)
    } else {
        format!(
            "A {} table dominated by {} columns, in the {} subject area.",
            archetype_label(archetype),
            roles.join("/"),
            area_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{RawForeignKey, RawTable};

    fn fact_table() -> RawTable {
        RawTable {
            schema: "public".to_string(),
            name: "orders".to_string(),
            columns: vec![],
            primary_key: vec!["id".to_string()],
            foreign_keys: vec![
                RawForeignKey {
                    local_column: "customer_id".to_string(),
                    remote_table_key: "public.customers".to_string(),
                    remote_column: "id".to_string(),
                },
                RawForeignKey {
                    local_column: "product_id".to_string(),
                    remote_table_key: "public.products".to_string(),
                    remote_column: "id".to_string(),
                },
            ],
            row_count_estimate: Some(100_000),
        }
    }

    fn dimension_table(name: &str) -> RawTable {
        RawTable {
            schema: "public".to_string(),
            name: name.to_string(),
            columns: vec![],
            primary_key: vec!["id".to_string()],
            foreign_keys: vec![],
            row_count_estimate: Some(500),
        }
    }

    #[test]
    fn referenced_table_becomes_dimension() {
        let orders = fact_table();
        let customers = dimension_table("customers");
        let products = dimension_table("products");
        let tables = vec![orders, customers, products];

        let mut profiles: HashMap<TableKey, Vec<ColumnProfile>> = HashMap::new();
        profiles.insert(
            "public.orders".to_string(),
            vec![ColumnProfile {
                table_key: "public.orders".to_string(),
                name: "total_amount".to_string(),
                vendor_type: "numeric".to_string(),
                nullable: false,
                is_primary_key: false,
                is_foreign_key: false,
                fk_target: None,
                null_rate: 0.0,
                distinct_ratio: 0.9,
                patterns: vec![],
                semantic_tags: vec![],
                role: Role::Metric,
                enumerated_values: None,
                range: None,
                sampled_partial: false,
            }],
        );

        let area_names = HashMap::new();
        let result = classify_tables(&tables, &profiles, &area_names);
        assert_eq!(result["public.orders"].archetype, Archetype::Fact);
        assert_eq!(result["public.customers"].archetype, Archetype::Dimension);
        assert_eq!(result["public.products"].archetype, Archetype::Dimension);
    }
}
