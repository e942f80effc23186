//! Query Planner (C10) data model (spec §3 "Plan Result", §4.10).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::expand::ExpansionOrigin;
use crate::reflect::TableKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DetailLevel {
    Brief,
    Standard,
    Full,
}

impl Default for DetailLevel {
    fn default() -> Self {
        DetailLevel::Standard
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlanBudget {
    pub tables: usize,
    pub columns_per_table: usize,
    pub sample_values: usize,
}

impl Default for PlanBudget {
    fn default() -> Self {
        Self { tables: 12, columns_per_table: 8, sample_values: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlanRequest {
    pub request: String,
    #[serde(default)]
    pub constraints: HashMap<String, String>,
    #[serde(default)]
    pub detail_level: DetailLevel,
    #[serde(default)]
    pub budget: Option<PlanBudget>,
}

/// Per-table component scores (spec §3 "Plan Result").
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TableScore {
    pub table_key: TableKey,
    pub lexical: f64,
    pub embedding: f64,
    pub centrality: f64,
    pub archetype_bonus: f64,
    pub expansion_origin: ExpansionOrigin,
    pub combined: f64,
}

/// One FK hop in the chosen join plan, fully qualifying both columns.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JoinStep {
    pub left_column: String,
    pub right_column: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PredicateShape {
    Eq,
    In,
    Between,
    GteLt,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FilterCandidate {
    pub column: String,
    pub predicate_shape: PredicateShape,
    pub enumerated_values: Option<Vec<String>>,
    /// Explicit literal bounds for `Between`/`GteLt` shapes, e.g. a year
    /// mentioned in the request resolved to `("2024-01-01", "2025-01-01")`.
    /// `None` when the shape was inferred from sampled range metadata alone.
    pub bounds: Option<(String, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Clarification {
    pub question: String,
    pub reason_code: String,
    pub blocking: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlanResult {
    pub request: String,
    pub tables: Vec<TableScore>,
    pub main_table: Option<TableKey>,
    pub join_plan: Vec<JoinStep>,
    pub key_columns: HashMap<TableKey, Vec<String>>,
    pub group_by_candidates: Vec<String>,
    pub filter_candidates: Vec<FilterCandidate>,
    pub selected_columns: HashMap<TableKey, Vec<String>>,
    pub clarifications: Vec<Clarification>,
    pub assumptions: Vec<String>,
    pub confidence: f64,
    pub draft_sql: Option<String>,
}
