//! Column Profile data model (spec §3).

use serde::{Deserialize, Serialize};

use crate::reflect::TableKey;

/// Semantic classification of a column (spec GLOSSARY: Role).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Key,
    Id,
    Date,
    Metric,
    Category,
    Text,
}

/// Small set of detected surface patterns over sampled string values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfacePattern {
    EmailLike,
    UrlLike,
    PhoneLike,
    PercentLike,
}

/// Deterministic, gazetteer-driven NER-like semantic tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticTag {
    Person,
    Organization,
    Location,
}

/// A numeric or date range, stored as strings so both types share one shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: String,
    pub max: String,
}

/// A foreign-key target, if this column is the local half of an FK edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkTarget {
    pub table_key: TableKey,
    pub column: String,
}

/// Per-column derived profile (spec §3 "Column Profile").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub table_key: TableKey,
    pub name: String,
    pub vendor_type: String,
    pub nullable: bool,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
    pub fk_target: Option<FkTarget>,
    pub null_rate: f64,
    pub distinct_ratio: f64,
    pub patterns: Vec<SurfacePattern>,
    pub semantic_tags: Vec<SemanticTag>,
    pub role: Role,
    /// Present only when `distinct_count <= value_constraint_threshold`.
    pub enumerated_values: Option<Vec<String>>,
    pub range: Option<ValueRange>,
    /// Whether the sample that produced this profile was cut short by the
    /// per-table sampling deadline (propagated from `TableSample::partial`).
    pub sampled_partial: bool,
}
