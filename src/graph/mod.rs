//! Graph Builder (C4): FK graph construction, centrality, community
//! detection, and subject-area assignment.

pub mod builder;
pub mod centrality;
pub mod community;
pub mod types;

pub use builder::build_graph;
pub use types::{FkEdge, GraphBuildOptions, GraphBuildResult, SubjectArea};

pub const ARCHIVE_NAME_TOKENS: &[&str] = &["archive", "history", "hist", "audit", "log", "backup"];

/// Whether a table name carries one of the archive-ish name tokens (spec
/// §4.5). Shared between the Graph Builder's `merge_archive_areas` option
/// and the Classifier's `is_archive` flag so both apply the same rule.
pub fn is_archive_name(table_name: &str) -> bool {
    let lower = table_name.to_ascii_lowercase();
    ARCHIVE_NAME_TOKENS.iter().any(|token| lower.contains(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_archive_tokens() {
        assert!(is_archive_name("orders_archive"));
        assert!(is_archive_name("audit_log"));
        assert!(!is_archive_name("orders"));
    }
}
