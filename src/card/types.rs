//! Schema Card data model (spec §3).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::Archetype;
use crate::graph::{FkEdge, SubjectArea};
use crate::profile::ColumnProfile;
use crate::reflect::{RawForeignKey, TableKey};

/// Per-table derived profile (spec §3 "Table Profile").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableProfile {
    pub table_key: TableKey,
    pub columns: Vec<ColumnProfile>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<RawForeignKey>,
    pub archetype: Archetype,
    pub summary: String,
    pub subject_area_id: String,
    pub centrality: f64,
    pub metric_column_count: usize,
    pub date_column_count: usize,
    pub is_archive: bool,
    pub is_audit_like: bool,
}

/// Build provenance carried alongside the card (spec §3 "build-meta").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildMeta {
    pub version: String,
    pub feature_flags: Vec<String>,
}

/// Root entity produced by the Schema Intelligence Engine (spec §3
/// "Schema Card"). Invariants: every FK target resolves within the card;
/// every table belongs to exactly one subject area; `reflection_hash` is a
/// function of content alone, independent of sampled values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaCard {
    pub dialect: String,
    pub connection_fingerprint: String,
    pub schemas: Vec<String>,
    pub subject_areas: HashMap<String, SubjectArea>,
    pub tables: HashMap<TableKey, TableProfile>,
    pub fk_edges: Vec<FkEdge>,
    pub built_at: DateTime<Utc>,
    pub reflection_hash: String,
    pub build_meta: BuildMeta,
}

impl SchemaCard {
    /// Every FK target resolves within the card (spec §3 invariant).
    pub fn fk_targets_resolve(&self) -> bool {
        self.tables.values().all(|table| {
            table
                .foreign_keys
                .iter()
                .all(|fk| self.tables.contains_key(&fk.remote_table_key))
        })
    }

    /// Every table belongs to exactly one subject area (spec §3 invariant).
    pub fn every_table_has_one_area(&self) -> bool {
        self.tables.keys().all(|key| {
            self.subject_areas
                .values()
                .filter(|area| area.table_keys.contains(key))
                .count()
                == 1
        })
    }
}
