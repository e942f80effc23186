//! Sampler (C2, spec §4.2): draws a bounded, representative row sample per
//! table within a time budget. Derived statistics are all that survive past
//! the profiling step — raw sampled values are never retained.

use std::time::Duration;

use futures::StreamExt;
use sqlx::{Column, Row};

use crate::db::{CortexDb, Dialect};
use crate::error::CortexError;
use crate::reflect::RawTable;

/// A single sampled row, values stringified for dialect-agnostic profiling.
/// `None` marks SQL NULL.
pub type SampledRow = Vec<Option<String>>;

/// Result of sampling one table.
#[derive(Debug, Clone)]
pub struct TableSample {
    pub column_names: Vec<String>,
    pub rows: Vec<SampledRow>,
    /// Set when the sampling deadline elapsed before `per_table_rows` rows
    /// were collected (spec §4.2: "sets a per-table `sampled=partial` flag").
    pub partial: bool,
}

/// Draw a sample for one table, bounded by row count and wall-clock deadline.
///
/// Rows stream in incrementally so that a deadline firing mid-scan preserves
/// whatever already arrived, rather than discarding the whole sample.
pub async fn sample_table(
    db: &CortexDb,
    table: &RawTable,
    per_table_rows: usize,
    timeout: Duration,
) -> TableSample {
    let sql = sample_query(db.dialect(), table, per_table_rows);
    let deadline = tokio::time::Instant::now() + timeout;

    let mut stream = sqlx::query(&sql).fetch(db.pool());
    let mut rows = Vec::new();
    let mut column_names: Option<Vec<String>> = None;
    let mut partial = false;

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            partial = true;
            tracing::debug!(table = %table.table_key(), rows = rows.len(), "sampling timed out, returning partial sample");
            break;
        }
        match tokio::time::timeout(remaining, stream.next()).await {
            Ok(Some(Ok(row))) => {
                if column_names.is_none() {
                    column_names = Some(row.columns().iter().map(|c| c.name().to_string()).collect());
                }
                rows.push(stringify_row(&row));
            }
            Ok(Some(Err(e))) => {
                tracing::warn!(table = %table.table_key(), error = %e, rows = rows.len(), "sampling query failed mid-stream");
                partial = true;
                break;
            }
            Ok(None) => break,
            Err(_) => {
                partial = true;
                tracing::debug!(table = %table.table_key(), rows = rows.len(), "sampling timed out, returning partial sample");
                break;
            }
        }
    }

    TableSample {
        column_names: column_names.unwrap_or_else(|| table.columns.iter().map(|c| c.name.clone()).collect()),
        rows,
        partial,
    }
}

fn sample_query(dialect: Dialect, table: &RawTable, limit: usize) -> String {
    let qualified = format!("{}.{}", table.schema, table.name);
    match dialect {
        // Native sample operator: cheap block sampling, bounded by LIMIT so
        // a near-empty sample never blows past `limit`.
        Dialect::Postgres => format!("SELECT * FROM {qualified} TABLESAMPLE BERNOULLI (10) LIMIT {limit}"),
        // MySQL/SQLite have no native sample operator comparable in cost;
        // fall back to a deterministic limited scan (spec §4.2).
        _ => format!("SELECT * FROM {qualified} LIMIT {limit}"),
    }
}

fn stringify_row(row: &sqlx::any::AnyRow) -> SampledRow {
    (0..row.columns().len())
        .map(|i| {
            row.try_get::<Option<String>, _>(i)
                .ok()
                .flatten()
                .or_else(|| row.try_get::<Option<i64>, _>(i).ok().flatten().map(|v| v.to_string()))
                .or_else(|| row.try_get::<Option<f64>, _>(i).ok().flatten().map(|v| v.to_string()))
                .or_else(|| row.try_get::<Option<bool>, _>(i).ok().flatten().map(|v| v.to_string()))
        })
        .collect()
}

/// Whether a sqlx/Any type name denotes a temporal column (used by both the
/// sampler's downstream profiler and ad-hoc diagnostics).
pub fn is_temporal_type_name(type_name: &str) -> bool {
    let t = type_name.to_ascii_lowercase();
    t.contains("date") || t.contains("time") || t.contains("timestamp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::RawColumn;

    fn orders_table() -> RawTable {
        RawTable {
            schema: "main".to_string(),
            name: "orders".to_string(),
            columns: vec![RawColumn { name: "id".to_string(), vendor_type: "integer".to_string(), nullable: false, is_primary_key: true }],
            primary_key: vec!["id".to_string()],
            foreign_keys: Vec::new(),
            row_count_estimate: None,
        }
    }

    #[tokio::test]
    async fn samples_all_rows_within_the_deadline() {
        let db = CortexDb::connect("sqlite::memory:?cache=shared").await.expect("connect");
        db.fetch_all("CREATE TABLE orders (id INTEGER PRIMARY KEY)").await.expect("create table");
        db.fetch_all("INSERT INTO orders (id) VALUES (1), (2), (3)").await.expect("seed rows");

        let sample = sample_table(&db, &orders_table(), 50, Duration::from_secs(5)).await;

        assert_eq!(sample.rows.len(), 3);
        assert!(!sample.partial);
        assert_eq!(sample.column_names, vec!["id".to_string()]);
    }

    #[tokio::test]
    async fn an_already_elapsed_deadline_returns_a_partial_sample_without_panicking() {
        let db = CortexDb::connect("sqlite::memory:?cache=shared").await.expect("connect");
        db.fetch_all("CREATE TABLE orders (id INTEGER PRIMARY KEY)").await.expect("create table");
        db.fetch_all("INSERT INTO orders (id) VALUES (1), (2), (3)").await.expect("seed rows");

        let sample = sample_table(&db, &orders_table(), 50, Duration::from_secs(0)).await;

        assert!(sample.partial);
        assert!(sample.rows.len() <= 3);
    }
}
