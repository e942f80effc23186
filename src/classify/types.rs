//! Classifier (C5) data model.

use serde::{Deserialize, Serialize};

/// Table archetype (spec §4.5, GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Bridge,
    Fact,
    Dimension,
    Reference,
    Operational,
}

/// Result of classifying one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableClassification {
    pub archetype: Archetype,
    pub is_archive: bool,
    pub is_audit_like: bool,
    pub summary: String,
}
