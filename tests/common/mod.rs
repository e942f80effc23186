//! Shared fixtures for integration tests: an in-memory SQLite database
//! standing in for the `sales` schema used throughout spec §8's scenarios,
//! and a hand-built `SchemaCard` for planner tests that don't need a live
//! connection.

use std::collections::HashMap;

use chrono::Utc;

use schema_cortex::card::{BuildMeta, SchemaCard, TableProfile};
use schema_cortex::classify::Archetype;
use schema_cortex::db::CortexDb;
use schema_cortex::graph::FkEdge;
use schema_cortex::profile::{ColumnProfile, Role};
use schema_cortex::reflect::RawForeignKey;

/// Builds the orders/customers `SchemaCard` used by spec §8 scenarios 1-2:
/// `sales.orders(id PK, customer_id FK->sales.customers.id, order_date, amount)`
/// and `sales.customers(id PK, region)`.
pub fn sales_schema_card() -> SchemaCard {
    let mut tables = HashMap::new();

    let orders_columns = vec![
        column("sales.orders", "id", Role::Key, true),
        column("sales.orders", "customer_id", Role::Id, false),
        column("sales.orders", "order_date", Role::Date, false),
        column("sales.orders", "amount", Role::Metric, false),
    ];
    tables.insert(
        "sales.orders".to_string(),
        TableProfile {
            table_key: "sales.orders".to_string(),
            columns: orders_columns,
            primary_key: vec!["id".to_string()],
            foreign_keys: vec![RawForeignKey {
                local_column: "customer_id".to_string(),
                remote_table_key: "sales.customers".to_string(),
                remote_column: "id".to_string(),
            }],
            archetype: Archetype::Fact,
            summary: "orders fact table".to_string(),
            subject_area_id: "sales".to_string(),
            centrality: 0.9,
            metric_column_count: 1,
            date_column_count: 1,
            is_archive: false,
            is_audit_like: false,
        },
    );

    let customers_columns = vec![
        column("sales.customers", "id", Role::Key, true),
        column("sales.customers", "region", Role::Category, false),
    ];
    tables.insert(
        "sales.customers".to_string(),
        TableProfile {
            table_key: "sales.customers".to_string(),
            columns: customers_columns,
            primary_key: vec!["id".to_string()],
            foreign_keys: Vec::new(),
            archetype: Archetype::Dimension,
            summary: "customers dimension table".to_string(),
            subject_area_id: "sales".to_string(),
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
        schemas: vec!["sales".to_string()],
        subject_areas: HashMap::new(),
        tables,
        fk_edges: vec![FkEdge { from_table: "sales.orders".to_string(), to_table: "sales.customers".to_string(), weight: 1 }],
        built_at: Utc::now(),
        reflection_hash: "hash".to_string(),
        build_meta: BuildMeta { version: "0.1.0".to_string(), feature_flags: Vec::new() },
    }
}

fn column(table_key: &str, name: &str, role: Role, is_primary_key: bool) -> ColumnProfile {
    ColumnProfile {
        table_key: table_key.to_string(),
        name: name.to_string(),
        vendor_type: "text".to_string(),
        nullable: false,
        is_primary_key,
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

/// In-memory SQLite database with a `sales_orders`/`sales_customers` pair
/// (flattened table names, since SQLite has no schema namespacing) used by
/// guardrail/MCP integration tests.
pub async fn sales_memory_db() -> CortexDb {
    let db = CortexDb::connect("sqlite::memory:?cache=shared").await.expect("connect to in-memory sqlite");
    db.fetch_all(
        "CREATE TABLE sales_customers (id INTEGER PRIMARY KEY, region TEXT)",
    )
    .await
    .expect("create sales_customers");
    db.fetch_all(
        "CREATE TABLE sales_orders (id INTEGER PRIMARY KEY, customer_id INTEGER, order_date TEXT, amount REAL)",
    )
    .await
    .expect("create sales_orders");
    db.fetch_all("INSERT INTO sales_customers (id, region) VALUES (1, 'west'), (2, 'east')")
        .await
        .expect("seed sales_customers");
    db.fetch_all(
        "INSERT INTO sales_orders (id, customer_id, order_date, amount) VALUES \
         (1, 1, '2024-03-01', 10.0), (2, 1, '2024-06-15', 20.0), (3, 2, '2023-01-01', 5.0)",
    )
    .await
    .expect("seed sales_orders");
    db
}
