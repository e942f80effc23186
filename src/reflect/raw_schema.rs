//! Types produced by the Reflection Adapter (spec §4.1), before profiling.

use serde::{Deserialize, Serialize};

/// `"<schema>.<name>"` — the stable identifier used throughout the card,
/// plan, and execution layers (spec §3).
pub type TableKey = String;

pub fn table_key(schema: &str, name: &str) -> TableKey {
    format!("{schema}.{name}")
}

/// A single reflected column, vendor type preserved verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawColumn {
    pub name: String,
    /// Vendor-typed name as reported by the driver (e.g. `"varchar(255)"`).
    pub vendor_type: String,
    pub nullable: bool,
    pub is_primary_key: bool,
}

/// An outgoing foreign key edge from one table to another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawForeignKey {
    pub local_column: String,
    pub remote_table_key: TableKey,
    pub remote_column: String,
}

/// A single reflected table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTable {
    pub schema: String,
    pub name: String,
    pub columns: Vec<RawColumn>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<RawForeignKey>,
    /// Approximate row count from catalog statistics, when available.
    pub row_count_estimate: Option<i64>,
}

impl RawTable {
    pub fn table_key(&self) -> TableKey {
        table_key(&self.schema, &self.name)
    }
}

/// Output of `reflect()` — the raw structural snapshot before sampling,
/// profiling, graph building, and classification are layered on top.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSchema {
    pub schemas: Vec<String>,
    pub tables: Vec<RawTable>,
    /// Non-fatal per-table reflection failures (spec §4.1: "records a
    /// partial-reflection warning rather than failing").
    pub warnings: Vec<String>,
}
