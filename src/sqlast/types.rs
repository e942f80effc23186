//! SQL-AST Service (C11) data model (spec §4.11).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ValidationNote {
    pub message: String,
    pub severity: NoteSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NoteSeverity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ValidationResult {
    pub valid: bool,
    pub notes: Vec<ValidationNote>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SqlMetadata {
    pub tables: Vec<String>,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AssistSuggestion {
    pub original: String,
    pub suggestion: String,
    pub distance: usize,
}

/// Known identifiers against which `assist_error` fuzzy-matches unresolved
/// names (spec §4.11).
#[derive(Debug, Clone, Default)]
pub struct KnownIdentifiers {
    pub tables: Vec<String>,
    pub columns: Vec<String>,
}
