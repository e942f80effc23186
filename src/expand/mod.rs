//! Graph Expander (C9): expands retrieval seed tables along FK edges
//! using a utility score, preserving all seeds in the output.

pub mod expander;
pub mod types;

pub use expander::expand;
pub use types::{ExpandOptions, ExpandStrategy, ExpandedTable, ExpansionOrigin, SeedTable};

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;

    use super::*;
    use crate::card::{BuildMeta, SchemaCard, TableProfile};
    use crate::classify::Archetype;
    use crate::graph::FkEdge;

    fn table(key: &str, archetype: Archetype, centrality: f64, is_archive: bool) -> TableProfile {
        TableProfile {
            table_key: key.to_string(),
            columns: Vec::new(),
            primary_key: vec!["id".to_string()],
            foreign_keys: Vec::new(),
            archetype,
            summary: String::new(),
            subject_area_id: "area_1".to_string(),
            centrality,
            metric_column_count: 0,
            date_column_count: 0,
            is_archive,
            is_audit_like: false,
        }
    }

    fn sample_card() -> SchemaCard {
        let mut tables = HashMap::new();
        tables.insert("public.orders".to_string(), table("public.orders", Archetype::Fact, 0.9, false));
        tables.insert("public.customers".to_string(), table("public.customers", Archetype::Dimension, 0.6, false));
        tables.insert("public.order_items".to_string(), table("public.order_items", Archetype::Bridge, 0.4, false));
        tables.insert("public.products".to_string(), table("public.products", Archetype::Dimension, 0.5, false));
        tables.insert("public.orders_archive".to_string(), table("public.orders_archive", Archetype::Fact, 0.1, true));

        let fk_edges = vec![
            FkEdge { from_table: "public.orders".to_string(), to_table: "public.customers".to_string(), weight: 1 },
            FkEdge { from_table: "public.orders".to_string(), to_table: "public.order_items".to_string(), weight: 1 },
            FkEdge { from_table: "public.order_items".to_string(), to_table: "public.products".to_string(), weight: 1 },
            FkEdge { from_table: "public.orders".to_string(), to_table: "public.orders_archive".to_string(), weight: 1 },
        ];

        SchemaCard {
            dialect: "postgres".to_string(),
            connection_fingerprint: "fp".to_string(),
            schemas: vec!["public".to_string()],
            subject_areas: HashMap::new(),
            tables,
            fk_edges,
            built_at: Utc::now(),
            reflection_hash: "hash".to_string(),
            build_meta: BuildMeta { version: "0.1.0".to_string(), feature_flags: Vec::new() },
        }
    }

    #[test]
    fn fk_following_reaches_depth_two_and_excludes_archive_by_default() {
        let card = sample_card();
        let seeds = vec![SeedTable { table_key: "public.orders".to_string(), retrieval_score: 1.0 }];
        let opts = ExpandOptions { max_tables: 10, ..ExpandOptions::default() };
        let result = expand(&card, &seeds, &opts);

        let keys: Vec<&str> = result.iter().map(|t| t.table_key.as_str()).collect();
        assert!(keys.contains(&"public.products"));
        assert!(!keys.contains(&"public.orders_archive"));
    }

    #[test]
    fn archive_included_when_strict_exclude_disabled() {
        let card = sample_card();
        let seeds = vec![SeedTable { table_key: "public.orders".to_string(), retrieval_score: 1.0 }];
        let opts = ExpandOptions { max_tables: 10, strict_archive_exclude: false, ..ExpandOptions::default() };
        let result = expand(&card, &seeds, &opts);

        assert!(result.iter().any(|t| t.table_key == "public.orders_archive"));
    }

    #[test]
    fn simple_strategy_only_includes_direct_neighbors() {
        let card = sample_card();
        let seeds = vec![SeedTable { table_key: "public.orders".to_string(), retrieval_score: 1.0 }];
        let opts = ExpandOptions { max_tables: 10, strategy: ExpandStrategy::Simple, ..ExpandOptions::default() };
        let result = expand(&card, &seeds, &opts);

        let keys: Vec<&str> = result.iter().map(|t| t.table_key.as_str()).collect();
        assert!(keys.contains(&"public.customers"));
        assert!(!keys.contains(&"public.products"));
    }

    #[test]
    fn all_seeds_are_preserved_under_a_tight_budget() {
        let card = sample_card();
        let seeds = vec![
            SeedTable { table_key: "public.orders".to_string(), retrieval_score: 1.0 },
            SeedTable { table_key: "public.products".to_string(), retrieval_score: 0.8 },
        ];
        let opts = ExpandOptions { max_tables: 1, ..ExpandOptions::default() };
        let result = expand(&card, &seeds, &opts);

        assert!(result.iter().any(|t| t.table_key == "public.orders"));
        assert!(result.iter().any(|t| t.table_key == "public.products"));
    }
}
