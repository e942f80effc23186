//! Smoke tests for the MCP tool surface: construct a `Coordinator` against
//! an in-memory SQLite database, wait for readiness, then invoke each tool
//! handler directly (no stdio transport needed for this).

mod common;

use std::sync::Arc;
use std::time::Duration;

use rmcp::handler::server::wrapper::Parameters;

use schema_cortex::config::CortexConfig;
use schema_cortex::coordinator::Coordinator;
use schema_cortex::embed::NoopEmbeddingService;
use schema_cortex::mcp::{CortexServer, ExecuteQueryInput, GetDatabaseOverviewInput, GetInitStatusInput, GetTableInfoInput};

fn test_config() -> CortexConfig {
    CortexConfig {
        database_url: "sqlite::memory:?cache=shared".to_string(),
        row_limit: 200,
        max_cell_chars: 2000,
        sample_rows: 50,
        sample_timeout: Duration::from_secs(5),
        embedding_model: "BAAI/bge-small-en-v1.5".to_string(),
        debug_tools: true,
        cache_dir: None,
        fast_start_max_tables: 300,
    }
}

async fn ready_server() -> CortexServer {
    let db = common::sales_memory_db().await;
    let embedder = Arc::new(NoopEmbeddingService::new(384));
    let coordinator = Coordinator::new(db, test_config(), embedder);
    coordinator.start();
    coordinator.wait_until_ready(Duration::from_secs(10)).await.expect("coordinator became ready");
    CortexServer::new(coordinator)
}

#[tokio::test]
async fn init_status_reports_ready_after_startup() {
    let server = ready_server().await;
    let status = server.get_init_status(Parameters(GetInitStatusInput::default())).await.expect("get_init_status succeeds").0;
    assert_eq!(format!("{:?}", status.phase).to_lowercase(), "ready");
}

#[tokio::test]
async fn database_overview_lists_both_tables() {
    let server = ready_server().await;
    let overview = server
        .get_database_overview(Parameters(GetDatabaseOverviewInput::default()))
        .await
        .expect("get_database_overview succeeds")
        .0;
    assert_eq!(overview.table_count, 2);
}

#[tokio::test]
async fn table_info_reports_the_orders_foreign_key() {
    let server = ready_server().await;
    let input = GetTableInfoInput {
        table_key: "main.sales_orders".to_string(),
        include_samples: false,
        column_role_filter: None,
        max_sample_values: 5,
        relationship_limit: 10,
    };
    let info = server.get_table_info(Parameters(input)).await.expect("get_table_info succeeds").0;
    assert!(info.relationships.iter().any(|r| r.other_table.contains("sales_customers")));
}

#[tokio::test]
async fn execute_query_runs_a_select_end_to_end() {
    let server = ready_server().await;
    let input = ExecuteQueryInput { sql: "SELECT amount FROM sales_orders WHERE id = 1".to_string() };
    let result = server.execute_query(Parameters(input)).await.expect("execute_query succeeds").0;
    assert_eq!(format!("{:?}", result.status).to_lowercase(), "ok");
    assert_eq!(result.rows.len(), 1);
}
