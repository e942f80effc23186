//! SQL-AST Service (C11): dialect-aware parsing, validation, transpilation,
//! metadata extraction, and fuzzy identifier assistance, all built on a
//! shared parse-tree cache.

pub mod cache;
pub mod service;
pub mod types;

pub use cache::ParseCache;
pub use service::SqlAstService;
pub use types::{AssistSuggestion, KnownIdentifiers, NoteSeverity, SqlMetadata, ValidationNote, ValidationResult};
