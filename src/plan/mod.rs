//! Query Planner (C10): combines Retrieval + Graph Expander output into a
//! typed plan with joins, candidate columns, clarifications, and an
//! optional draft SQL statement.

pub mod planner;
pub mod types;

pub use planner::plan_query;
pub use types::{
    Clarification, DetailLevel, FilterCandidate, JoinStep, PlanBudget, PlanRequest, PlanResult, PredicateShape, TableScore,
};

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;

    use super::*;
    use crate::card::{BuildMeta, SchemaCard, TableProfile};
    use crate::classify::Archetype;
    use crate::embed::{NoopEmbeddingService, SemanticIndex};
    use crate::graph::FkEdge;
    use crate::profile::{ColumnProfile, Role};
    use crate::reflect::RawForeignKey;

    fn column(table_key: &str, name: &str, role: Role) -> ColumnProfile {
        ColumnProfile {
            table_key: table_key.to_string(),
            name: name.to_string(),
            vendor_type: "text".to_string(),
            nullable: false,
            is_primary_key: name == "id",
            is_foreign_key: false,
            fk_target: None,
            null_rate: 0.0,
            distinct_ratio: 1.0,
            patterns: Vec::new(),
            semantic_tags: Vec::new(),
            role,
            enumerated_values: None,
            range: None,
            sampled_partial: false,
        }
    }

    fn sample_card() -> SchemaCard {
        let mut tables = HashMap::new();

        let orders_columns = vec![
            column("public.orders", "id", Role::Key),
            column("public.orders", "customer_id", Role::Id),
            column("public.orders", "order_date", Role::Date),
            column("public.orders", "total_amount", Role::Metric),
        ];
        tables.insert(
            "public.orders".to_string(),
            TableProfile {
                table_key: "public.orders".to_string(),
                columns: orders_columns,
                primary_key: vec!["id".to_string()],
                foreign_keys: vec![RawForeignKey {
                    local_column: "customer_id".to_string(),
                    remote_table_key: "public.customers".to_string(),
                    remote_column: "id".to_string(),
                }],
                archetype: Archetype::Fact,
                summary: "orders fact table".to_string(),
                subject_area_id: "area_1".to_string(),
                centrality: 0.9,
                metric_column_count: 1,
                date_column_count: 1,
                is_archive: false,
                is_audit_like: false,
            },
        );

        let customers_columns = vec![
            column("public.customers", "id", Role::Key),
            column("public.customers", "region", Role::Category),
        ];
        tables.insert(
            "public.customers".to_string(),
            TableProfile {
                table_key: "public.customers".to_string(),
                columns: customers_columns,
                primary_key: vec!["id".to_string()],
                foreign_keys: Vec::new(),
                archetype: Archetype::Dimension,
                summary: "customers dimension table".to_string(),
                subject_area_id: "area_1".to_string(),
                centrality: 0.6,
                metric_column_count: 0,
                date_column_count: 0,
                is_archive: false,
                is_audit_like: false,
            },
        );

        SchemaCard {
            dialect: "postgres".to_string(),
            connection_fingerprint: "fp".to_string(),
            schemas: vec!["public".to_string()],
            subject_areas: HashMap::new(),
            tables,
            fk_edges: vec![FkEdge { from_table: "public.orders".to_string(), to_table: "public.customers".to_string(), weight: 1 }],
            built_at: Utc::now(),
            reflection_hash: "hash".to_string(),
            build_meta: BuildMeta { version: "0.1.0".to_string(), feature_flags: Vec::new() },
        }
    }

    #[tokio::test]
    async fn plans_a_joinable_request_with_a_fact_main_table() {
        let card = sample_card();
        let embedder = NoopEmbeddingService::new(384);
        let semantic_index = SemanticIndex::disabled();
        let request = PlanRequest {
            request: "total revenue by customer region".to_string(),
            constraints: HashMap::new(),
            detail_level: DetailLevel::Standard,
            budget: Some(PlanBudget { tables: 10, columns_per_table: 8, sample_values: 5 }),
        };

        let result = plan_query(&card, &embedder, &semantic_index, &request).await;

        assert_eq!(result.main_table.as_deref(), Some("public.orders"));
        assert!(!result.join_plan.is_empty());
        assert!(result.clarifications.iter().all(|c| c.reason_code != "UNJOINABLE_SUBSET"));
    }

    #[tokio::test]
    async fn missing_metric_column_flags_clarification() {
        let mut card = sample_card();
        if let Some(orders) = card.tables.get_mut("public.orders") {
            for col in orders.columns.iter_mut() {
                if col.role == Role::Metric {
                    col.role = Role::Text;
                }
            }
        }
        let embedder = NoopEmbeddingService::new(384);
        let semantic_index = SemanticIndex::disabled();
        let request = PlanRequest {
            request: "total revenue by customer".to_string(),
            constraints: HashMap::new(),
            detail_level: DetailLevel::Standard,
            budget: None,
        };

        let result = plan_query(&card, &embedder, &semantic_index, &request).await;
        assert!(result.clarifications.iter().any(|c| c.reason_code == "NO_METRIC"));
    }

    #[tokio::test]
    async fn empty_database_flags_no_tables() {
        let card = SchemaCard {
            dialect: "postgres".to_string(),
            connection_fingerprint: "fp".to_string(),
            schemas: Vec::new(),
            subject_areas: HashMap::new(),
            tables: HashMap::new(),
            fk_edges: Vec::new(),
            built_at: Utc::now(),
            reflection_hash: "hash".to_string(),
            build_meta: BuildMeta { version: "0.1.0".to_string(), feature_flags: Vec::new() },
        };
        let embedder = NoopEmbeddingService::new(384);
        let semantic_index = SemanticIndex::disabled();
        let request = PlanRequest {
            request: "anything".to_string(),
            constraints: HashMap::new(),
            detail_level: DetailLevel::Standard,
            budget: None,
        };

        let result = plan_query(&card, &embedder, &semantic_index, &request).await;
        assert!(result.clarifications.iter().any(|c| c.reason_code == "NO_TABLES" && c.blocking));
        assert!(result.draft_sql.is_none());
    }

    #[tokio::test]
    async fn draft_sql_falls_back_to_known_columns_when_budget_selects_none() {
        let mut tables = HashMap::new();
        let events_columns = vec![column("public.events", "happened_at", Role::Date), column("public.events", "amount", Role::Metric)];
        tables.insert(
            "public.events".to_string(),
            TableProfile {
                table_key: "public.events".to_string(),
                columns: events_columns,
                primary_key: Vec::new(),
                foreign_keys: Vec::new(),
                archetype: Archetype::Fact,
                summary: "events fact table".to_string(),
                subject_area_id: "area_1".to_string(),
                centrality: 0.9,
                metric_column_count: 1,
                date_column_count: 1,
                is_archive: false,
                is_audit_like: false,
            },
        );
        let card = SchemaCard {
            dialect: "postgres".to_string(),
            connection_fingerprint: "fp".to_string(),
            schemas: vec!["public".to_string()],
            subject_areas: HashMap::new(),
            tables,
            fk_edges: Vec::new(),
            built_at: Utc::now(),
            reflection_hash: "hash".to_string(),
            build_meta: BuildMeta { version: "0.1.0".to_string(), feature_flags: Vec::new() },
        };
        let embedder = NoopEmbeddingService::new(384);
        let semantic_index = SemanticIndex::disabled();
        let request = PlanRequest {
            request: "list events".to_string(),
            constraints: HashMap::new(),
            detail_level: DetailLevel::Standard,
            budget: Some(PlanBudget { tables: 10, columns_per_table: 0, sample_values: 5 }),
        };

        let result = plan_query(&card, &embedder, &semantic_index, &request).await;

        assert!(result.selected_columns.get("public.events").map(|c| c.is_empty()).unwrap_or(true));
        let sql = result.draft_sql.expect("draft_sql should fall back to the table's known columns");
        assert!(!sql.to_ascii_uppercase().contains("SELECT *"));
        assert!(sql.contains("happened_at") && sql.contains("amount"));
    }
}
