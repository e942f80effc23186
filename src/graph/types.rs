//! Data model produced by the Graph Builder (spec §4.4).

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::reflect::TableKey;

/// An undirected FK edge between two tables, weighted by how many FK
/// columns connect them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkEdge {
    pub from_table: TableKey,
    pub to_table: TableKey,
    pub weight: usize,
}

/// A subject area: a community of tables that belong together, with a
/// stable id and a human-readable name (spec §3 "Schema Card").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectArea {
    pub id: String,
    pub name: String,
    pub table_keys: BTreeSet<TableKey>,
    pub summary: String,
}

/// Full output of the Graph Builder for one reflected schema.
#[derive(Debug, Clone)]
pub struct GraphBuildResult {
    pub edges: Vec<FkEdge>,
    pub centrality: HashMap<TableKey, f64>,
    /// Set when eigenvector centrality failed to converge and degree
    /// centrality was used instead (spec §4.4).
    pub used_degree_fallback: bool,
    pub subject_areas: Vec<SubjectArea>,
    pub table_to_area: HashMap<TableKey, String>,
}

/// Options controlling graph partitioning (spec §4.4, §9).
#[derive(Debug, Clone)]
pub struct GraphBuildOptions {
    pub min_area_size: usize,
    pub merge_archive_areas: bool,
}

impl Default for GraphBuildOptions {
    fn default() -> Self {
        Self {
            min_area_size: 2,
            merge_archive_areas: false,
        }
    }
}
