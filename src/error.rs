use thiserror::Error;

/// Error taxonomy category (spec §7). Shapes structured responses so that
/// every condition preventing a meaningful result surfaces as a value, never
/// an unstructured crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Readiness,
    Input,
    Safety,
    Parse,
    Runtime,
    Coverage,
}

/// Crate-wide error type for Schema Cortex operations.
#[derive(Debug, Error)]
pub enum CortexError {
    #[error("service not ready: {0}")]
    NotReady(String),

    #[error("invalid table key: {0}")]
    InvalidTableKey(String),

    #[error("unknown dialect: {0}")]
    UnknownDialect(String),

    #[error("statement is not a SELECT: {0}")]
    NonSelectStatement(String),

    #[error("multiple statements are not allowed")]
    MultiStatement,

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("unresolved identifier: {0}")]
    UnresolvedIdentifier(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("driver error: {0}")]
    DriverError(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("ambiguous intent: {0}")]
    AmbiguousIntent(String),

    #[error("reflection failed: {0}")]
    ReflectionFailed(String),

    #[error("not found: {entity_type} '{id}'")]
    NotFound { entity_type: String, id: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl CortexError {
    /// Structured taxonomy entry for this error (spec §3 `Execute Result`, §7).
    pub fn category(&self) -> ErrorCategory {
        match self {
            CortexError::NotReady(_) => ErrorCategory::Readiness,
            CortexError::InvalidTableKey(_) | CortexError::UnknownDialect(_) => {
                ErrorCategory::Input
            }
            CortexError::NonSelectStatement(_) | CortexError::MultiStatement => {
                ErrorCategory::Safety
            }
            CortexError::ParseError(_) | CortexError::UnresolvedIdentifier(_) => {
                ErrorCategory::Parse
            }
            CortexError::TypeMismatch(_)
            | CortexError::DriverError(_)
            | CortexError::Timeout(_) => ErrorCategory::Runtime,
            CortexError::AmbiguousIntent(_) => ErrorCategory::Coverage,
            CortexError::ReflectionFailed(_)
            | CortexError::NotFound { .. }
            | CortexError::Validation(_)
            | CortexError::Io(_) => ErrorCategory::Input,
            CortexError::Unsupported(_) => ErrorCategory::Runtime,
        }
    }

    /// Stable machine-readable code, e.g. `NON_SELECT_STATEMENT`.
    pub fn code(&self) -> &'static str {
        match self {
            CortexError::NotReady(_) => "SERVICE_NOT_READY",
            CortexError::InvalidTableKey(_) => "INVALID_TABLE_KEY",
            CortexError::UnknownDialect(_) => "UNKNOWN_DIALECT",
            CortexError::NonSelectStatement(_) => "NON_SELECT_STATEMENT",
            CortexError::MultiStatement => "MULTI_STATEMENT",
            CortexError::ParseError(_) => "PARSE_ERROR",
            CortexError::UnresolvedIdentifier(_) => "UNRESOLVED_IDENTIFIER",
            CortexError::TypeMismatch(_) => "TYPE_MISMATCH",
            CortexError::DriverError(_) => "DRIVER_ERROR",
            CortexError::Timeout(_) => "TIMEOUT",
            CortexError::AmbiguousIntent(_) => "AMBIGUOUS_INTENT",
            CortexError::ReflectionFailed(_) => "REFLECTION_ERROR",
            CortexError::NotFound { .. } => "NOT_FOUND",
            CortexError::Validation(_) => "VALIDATION_ERROR",
            CortexError::Io(_) => "IO_ERROR",
            CortexError::Unsupported(_) => "UNSUPPORTED",
        }
    }

    /// Whether a caller can reasonably retry or refine and succeed.
    pub fn recoverable(&self) -> bool {
        !matches!(
            self,
            CortexError::NonSelectStatement(_) | CortexError::MultiStatement
        )
    }
}

impl From<std::io::Error> for CortexError {
    fn from(err: std::io::Error) -> Self {
        CortexError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CortexError {
    fn from(err: serde_json::Error) -> Self {
        CortexError::Io(format!("JSON error: {err}"))
    }
}

impl From<sqlx::Error> for CortexError {
    fn from(err: sqlx::Error) -> Self {
        CortexError::DriverError(err.to_string())
    }
}

impl From<sqlparser::parser::ParserError> for CortexError {
    fn from(err: sqlparser::parser::ParserError) -> Self {
        CortexError::ParseError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CortexError>;
