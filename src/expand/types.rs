//! Graph Expander (C9) data model (spec §4.9).

use serde::{Deserialize, Serialize};

use crate::reflect::TableKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpandStrategy {
    FkFollowing,
    Simple,
}

impl Default for ExpandStrategy {
    fn default() -> Self {
        ExpandStrategy::FkFollowing
    }
}

#[derive(Debug, Clone)]
pub struct SeedTable {
    pub table_key: TableKey,
    pub retrieval_score: f64,
}

#[derive(Debug, Clone)]
pub struct ExpandOptions {
    pub max_tables: usize,
    pub strategy: ExpandStrategy,
    /// When true (the default), archive tables are excluded from expansion
    /// candidates. Seeds are never excluded regardless of this flag.
    pub strict_archive_exclude: bool,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            max_tables: 12,
            strategy: ExpandStrategy::default(),
            strict_archive_exclude: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionOrigin {
    Seed,
    Expanded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpandedTable {
    pub table_key: TableKey,
    pub utility: f64,
    pub archetype_bonus: f64,
    pub combined_score: f64,
    pub origin: ExpansionOrigin,
}
