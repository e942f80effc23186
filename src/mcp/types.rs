//! Tool request/response types for the MCP tool surface (spec §6).
//!
//! Requests that already match a domain shape (`plan_query_for_intent`,
//! `execute_query`) reuse the domain type directly. Everything else gets a
//! dedicated response struct, built from engine types rather than exposing
//! them verbatim, so the wire shape stays stable if an engine type grows an
//! internal field.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::coordinator::{Phase, ReadinessState};
use crate::reflect::TableKey;

/// Input for `get_init_status`. Carries no fields; present so the tool has
/// a concrete schema rather than an untyped empty object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetInitStatusInput {}

/// Response for `get_init_status` (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InitStatusResponse {
    pub phase: Phase,
    pub attempts: u32,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub fast_start_complete: bool,
    pub enriched: bool,
    pub error_message: Option<String>,
}

impl From<ReadinessState> for InitStatusResponse {
    fn from(state: ReadinessState) -> Self {
        Self {
            phase: state.phase,
            attempts: state.attempts,
            started_at: state.started_at,
            completed_at: state.completed_at,
            fast_start_complete: state.fast_start_complete,
            enriched: state.enriched,
            error_message: state.error_message,
        }
    }
}

/// Input for `get_database_overview`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetDatabaseOverviewInput {
    #[serde(default = "default_true")]
    pub include_subject_areas: bool,
    #[serde(default = "default_area_limit")]
    pub area_limit: usize,
}

impl Default for GetDatabaseOverviewInput {
    fn default() -> Self {
        Self { include_subject_areas: true, area_limit: default_area_limit() }
    }
}

fn default_true() -> bool {
    true
}

fn default_area_limit() -> usize {
    20
}

/// One subject area entry in `get_database_overview`'s response.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SubjectAreaSummary {
    pub id: String,
    pub name: String,
    pub table_count: usize,
    pub summary: String,
}

/// Response for `get_database_overview` (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DatabaseOverviewResponse {
    pub dialect: String,
    pub schemas: Vec<String>,
    pub table_count: usize,
    pub subject_areas: Vec<SubjectAreaSummary>,
}

/// Input for `get_table_info`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetTableInfoInput {
    pub table_key: String,
    #[serde(default)]
    pub include_samples: bool,
    #[serde(default)]
    pub column_role_filter: Option<String>,
    #[serde(default = "default_max_sample_values")]
    pub max_sample_values: usize,
    #[serde(default = "default_relationship_limit")]
    pub relationship_limit: usize,
}

fn default_max_sample_values() -> usize {
    5
}

fn default_relationship_limit() -> usize {
    25
}

/// A single column in `get_table_info`'s response.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ColumnInfo {
    pub name: String,
    pub vendor_type: String,
    pub role: String,
    pub nullable: bool,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
    pub sample_values: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipDirection {
    Outgoing,
    Incoming,
}

/// An FK relationship, in either direction, shown alongside a table's info.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RelationshipInfo {
    pub local_column: String,
    pub other_table: TableKey,
    pub other_column: String,
    pub direction: RelationshipDirection,
}

/// A heuristic "likely useful as a WHERE clause" column, surfaced so a
/// caller building a query by hand knows where to look first.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CommonFilterHint {
    pub column: String,
    pub reason: String,
}

/// Response for `get_table_info` (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TableInfoResponse {
    pub table_key: TableKey,
    pub archetype: String,
    pub summary: String,
    pub subject_area_id: String,
    pub centrality: f64,
    pub is_archive: bool,
    pub is_audit_like: bool,
    pub primary_key: Vec<String>,
    pub columns: Vec<ColumnInfo>,
    pub relationships: Vec<RelationshipInfo>,
    pub common_filters: Vec<CommonFilterHint>,
}

/// Input for the debug `find_tables` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FindTablesInput {
    pub query: String,
    #[serde(default = "default_find_limit")]
    pub limit: usize,
    /// One of "lexical", "embedding_table", "embedding_column", "combined".
    /// Defaults to "combined".
    #[serde(default)]
    pub approach: Option<String>,
    /// Fusion weight for the "combined" approach, in [0, 1]. Defaults to 0.5.
    #[serde(default)]
    pub alpha: Option<f64>,
}

fn default_find_limit() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TableScoreComponents {
    pub lexical: f64,
    pub embedding: f64,
    pub combined: f64,
    pub archive_penalized: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RankedTable {
    pub table_key: TableKey,
    pub score: f64,
    pub components: TableScoreComponents,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FindTablesResponse {
    pub results: Vec<RankedTable>,
}

/// Input for the debug `find_columns` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FindColumnsInput {
    pub keyword: String,
    #[serde(default = "default_find_limit")]
    pub limit: usize,
    #[serde(default)]
    pub by_table: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RankedColumn {
    pub table_key: TableKey,
    pub column: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FindColumnsResponse {
    pub results: Vec<RankedColumn>,
}

/// Input for `execute_query`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExecuteQueryInput {
    pub sql: String,
}
