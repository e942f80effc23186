//! Execution Guardrail end-to-end scenario (spec §8, scenario 5): a typo'd
//! column name comes back with a fuzzy-matched hint rather than a bare
//! driver error.

mod common;

use schema_cortex::guardrail::{execute_query, GuardrailOptions};
use schema_cortex::sqlast::{KnownIdentifiers, SqlAstService};

#[tokio::test]
async fn unresolved_identifier_suggests_the_closest_known_column() {
    let db = common::sales_memory_db().await;
    let sqlast = SqlAstService::new();
    let known = KnownIdentifiers {
        tables: vec!["sales_orders".to_string(), "sales_customers".to_string()],
        columns: vec!["id".to_string(), "customer_id".to_string(), "order_date".to_string(), "amount".to_string(), "region".to_string()],
    };

    let result = execute_query(&db, &sqlast, &known, "SELECT custmr_id FROM sales_orders", &GuardrailOptions::default()).await;

    let error = result.error.expect("expected a structured error for an unresolved column");
    assert_eq!(error.code, "UNRESOLVED_IDENTIFIER");
    assert!(
        error.hints.iter().any(|h| h.contains("customer_id")),
        "expected a hint suggesting customer_id, got {:?}",
        error.hints
    );
}
