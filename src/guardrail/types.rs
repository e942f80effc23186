//! Execution Guardrail (C12) data model (spec §3 "Execute Result").

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{CortexError, ErrorCategory};
use crate::sqlast::ValidationNote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExecuteStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    None,
    RefinePlan,
    Paginate,
    InspectTable,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ColumnDescriptor {
    pub name: String,
    pub vendor_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExecuteError {
    pub category: ErrorCategory,
    pub code: String,
    pub message: String,
    pub hints: Vec<String>,
    pub recoverable: bool,
}

impl ExecuteError {
    pub fn from_cortex_error(error: &CortexError, hints: Vec<String>) -> Self {
        Self {
            category: error.category(),
            code: error.code().to_string(),
            message: error.to_string(),
            hints,
            recoverable: error.recoverable(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExecuteResult {
    pub normalized_sql: String,
    pub validation_notes: Vec<ValidationNote>,
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<Vec<Option<String>>>,
    pub truncated: bool,
    pub status: ExecuteStatus,
    pub error: Option<ExecuteError>,
    pub next_action: NextAction,
}
