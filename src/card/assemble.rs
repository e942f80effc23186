//! Assembles a `SchemaCard` from the outputs of C1-C5.

use std::collections::HashMap;

use crate::card::hash::{compute_connection_fingerprint, compute_reflection_hash, ProfilingParams};
use crate::card::types::{BuildMeta, SchemaCard, TableProfile};
use crate::classify::TableClassification;
use crate::db::Dialect;
use crate::graph::GraphBuildResult;
use crate::profile::{ColumnProfile, Role};
use crate::reflect::{RawSchema, TableKey};

pub struct AssembleInput<'a> {
    pub dialect: Dialect,
    pub database_url: &'a str,
    pub raw: &'a RawSchema,
    pub profiles: &'a HashMap<TableKey, Vec<ColumnProfile>>,
    pub graph: &'a GraphBuildResult,
    pub classifications: &'a HashMap<TableKey, TableClassification>,
    pub profiling_params: ProfilingParams,
}

pub fn assemble_card(input: AssembleInput<'_>) -> SchemaCard {
    let tables: HashMap<TableKey, TableProfile> = input
        .raw
        .tables
        .iter()
        .map(|t| {
            let key = t.table_key();
            let classification = &input.classifications[&key];
            let columns = input.profiles.get(&key).cloned().unwrap_or_default();
            let metric_column_count = columns.iter().filter(|c| c.role == Role::Metric).count();
            let date_column_count = columns.iter().filter(|c| c.role == Role::Date).count();

            let profile = TableProfile {
                table_key: key.clone(),
                columns,
                primary_key: t.primary_key.clone(),
                foreign_keys: t.foreign_keys.clone(),
                archetype: classification.archetype,
                summary: classification.summary.clone(),
                subject_area_id: input.graph.table_to_area.get(&key).cloned().unwrap_or_default(),
                centrality: input.graph.centrality.get(&key).copied().unwrap_or(0.0),
                metric_column_count,
                date_column_count,
                is_archive: classification.is_archive,
                is_audit_like: classification.is_audit_like,
            };
            (key, profile)
        })
        .collect();

    let subject_areas = input
        .graph
        .subject_areas
        .iter()
        .map(|a| (a.id.clone(), a.clone()))
        .collect();

    SchemaCard {
        dialect: input.dialect.to_string(),
        connection_fingerprint: compute_connection_fingerprint(input.database_url),
        schemas: input.raw.schemas.clone(),
        subject_areas,
        tables,
        fk_edges: input.graph.edges.clone(),
        built_at: chrono::Utc::now(),
        reflection_hash: compute_reflection_hash(input.raw, &input.profiling_params),
        build_meta: BuildMeta {
            version: env!("CARGO_PKG_VERSION").to_string(),
            feature_flags: vec![],
        },
    }
}
