//! Maps `CortexError` onto the MCP tool-call error surface (spec §7): every
//! condition preventing a meaningful result surfaces as a structured value
//! with a stable code, category, and a recovery suggestion, never a bare
//! string or an unstructured crash.

use std::borrow::Cow;

use rmcp::model::{Content, ErrorCode, ErrorData, IntoContents};
use serde::Serialize;

use crate::coordinator::ReadinessState;
use crate::error::{CortexError, ErrorCategory};

/// Structured error response for MCP tool calls.
#[derive(Debug, Serialize)]
pub struct ToolError {
    pub error_code: String,
    pub category: ErrorCategory,
    pub message: String,
    pub recoverable: bool,
    pub suggestion: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<String>,
}

impl ToolError {
    /// Built when a tool is called before the schema build has reached
    /// `Phase::Ready` (spec §7: `SERVICE_NOT_READY` surfaces on every tool).
    pub fn not_ready(readiness: &ReadinessState) -> Self {
        let detail = readiness.error_message.clone().unwrap_or_else(|| format!("{:?}", readiness.phase));
        CortexError::NotReady(detail).into()
    }

    pub fn with_hints(mut self, hints: Vec<String>) -> Self {
        self.hints = hints;
        self
    }
}

impl IntoContents for ToolError {
    fn into_contents(self) -> Vec<Content> {
        let json = serde_json::to_string(&self).unwrap_or_else(|_| self.message.clone());
        vec![Content::text(json)]
    }
}

impl From<CortexError> for ToolError {
    fn from(err: CortexError) -> Self {
        let suggestion = suggestion_for(&err).to_string();
        Self {
            error_code: err.code().to_string(),
            category: err.category(),
            recoverable: err.recoverable(),
            message: err.to_string(),
            suggestion,
            hints: Vec::new(),
        }
    }
}

fn suggestion_for(err: &CortexError) -> &'static str {
    match err.category() {
        ErrorCategory::Readiness => "Call get_init_status and retry once phase is \"ready\".",
        ErrorCategory::Input => "Check the identifier against get_database_overview or get_table_info.",
        ErrorCategory::Safety => "Only a single read-only SELECT statement is accepted.",
        ErrorCategory::Parse => "Check the statement's syntax against the active dialect; see the hints for close matches.",
        ErrorCategory::Runtime => "Refine the plan and retry; the condition may be transient.",
        ErrorCategory::Coverage => "Provide the detail requested by the returned clarification.",
    }
}

impl From<CortexError> for ErrorData {
    fn from(err: CortexError) -> Self {
        let code = match err.category() {
            ErrorCategory::Readiness | ErrorCategory::Runtime => ErrorCode::INTERNAL_ERROR,
            ErrorCategory::Input | ErrorCategory::Safety | ErrorCategory::Parse | ErrorCategory::Coverage => {
                ErrorCode::INVALID_PARAMS
            }
        };
        let category = err.category();
        let code_str = err.code();
        let recoverable = err.recoverable();
        ErrorData {
            code,
            message: Cow::Owned(err.to_string()),
            data: Some(serde_json::json!({
                "error_code": code_str,
                "category": category,
                "recoverable": recoverable,
            })),
        }
    }
}
