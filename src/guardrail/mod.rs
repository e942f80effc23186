//! Execution Guardrail (C12): the only path by which a planned or
//! hand-written statement reaches the database.

pub mod guardrail;
pub mod types;

pub use guardrail::{execute_query, GuardrailOptions};
pub use types::{ColumnDescriptor, ExecuteError, ExecuteResult, ExecuteStatus, NextAction};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CortexDb;
    use crate::sqlast::{KnownIdentifiers, SqlAstService};

    async fn memory_db() -> CortexDb {
        // Shared cache so every connection in the pool sees the same
        // in-memory database rather than each getting its own.
        let db = CortexDb::connect("sqlite::memory:?cache=shared").await.unwrap();
        db.fetch_all("CREATE TABLE sales_orders (id INTEGER PRIMARY KEY, customer_id INTEGER, total_amount REAL)")
            .await
            .unwrap();
        db.fetch_all("INSERT INTO sales_orders (id, customer_id, total_amount) VALUES (1, 1, 10.0), (2, 1, 20.0)")
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn rejects_non_select_statements_without_touching_the_driver() {
        let db = memory_db().await;
        let sqlast = SqlAstService::new();
        let known = KnownIdentifiers::default();
        let result = execute_query(&db, &sqlast, &known, "DELETE FROM sales_orders", &GuardrailOptions::default()).await;

        assert_eq!(result.status, ExecuteStatus::Error);
        assert_eq!(result.error.unwrap().code, "NON_SELECT_STATEMENT");
    }

    #[tokio::test]
    async fn executes_a_simple_select() {
        let db = memory_db().await;
        let sqlast = SqlAstService::new();
        let known = KnownIdentifiers::default();
        let result = execute_query(&db, &sqlast, &known, "SELECT 1 AS one", &GuardrailOptions::default()).await;

        assert_eq!(result.status, ExecuteStatus::Ok);
        assert!(!result.truncated);
        assert_eq!(result.rows.len(), 1);
    }

    #[tokio::test]
    async fn detects_truncation_with_a_tight_row_limit() {
        let db = memory_db().await;
        let sqlast = SqlAstService::new();
        let known = KnownIdentifiers::default();
        let opts = GuardrailOptions { row_limit: 1, max_cell_chars: 2000 };
        let result = execute_query(&db, &sqlast, &known, "SELECT id FROM sales_orders", &opts).await;

        assert_eq!(result.status, ExecuteStatus::Ok);
        assert!(result.truncated);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.next_action, NextAction::Paginate);
    }
}
