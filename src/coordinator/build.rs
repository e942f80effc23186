//! The build pipeline (spec §4.13): chains C1-C6 into a single `SchemaCard`.
//! Shared by both the fast-start and enrich passes, with `max_tables` as the
//! only knob that distinguishes a conservative first pass from a full one.

use std::collections::HashMap;

use crate::card::{assemble_card, AssembleInput, ProfilingParams, SchemaCard};
use crate::classify::classify_tables;
use crate::config::CortexConfig;
use crate::db::CortexDb;
use crate::error::CortexError;
use crate::graph::{build_graph, GraphBuildOptions};
use crate::profile::{profile_table, ColumnProfile, DEFAULT_VALUE_CONSTRAINT_THRESHOLD};
use crate::reflect::{reflect, ReflectOptions, TableKey};
use crate::sample::sample_table;

/// Reflect, sample, profile, build the graph, classify, and assemble a
/// `SchemaCard` in one pass. `max_tables` bounds reflection scope; the
/// fast-start pass passes `Some(config.fast_start_max_tables)`, the enrich
/// pass passes `None`.
pub async fn build_schema_card(
    db: &CortexDb,
    config: &CortexConfig,
    max_tables: Option<usize>,
) -> Result<SchemaCard, CortexError> {
    let raw = reflect(db, &ReflectOptions { max_tables, ..Default::default() }).await?;

    let mut profiles_by_table: HashMap<TableKey, Vec<ColumnProfile>> = HashMap::new();
    for table in &raw.tables {
        let sample = sample_table(db, table, config.sample_rows, config.sample_timeout).await;
        let profiles = profile_table(table, &sample, DEFAULT_VALUE_CONSTRAINT_THRESHOLD);
        profiles_by_table.insert(table.table_key(), profiles);
    }

    let graph_result = build_graph(&raw.tables, &GraphBuildOptions::default());

    let area_names: HashMap<TableKey, String> = graph_result
        .table_to_area
        .iter()
        .filter_map(|(table_key, area_id)| {
            graph_result
                .subject_areas
                .iter()
                .find(|a| &a.id == area_id)
                .map(|a| (table_key.clone(), a.name.clone()))
        })
        .collect();

    let classifications = classify_tables(&raw.tables, &profiles_by_table, &area_names);

    let card = assemble_card(AssembleInput {
        dialect: db.dialect(),
        database_url: &config.database_url,
        raw: &raw,
        profiles: &profiles_by_table,
        graph: &graph_result,
        classifications: &classifications,
        profiling_params: ProfilingParams {
            value_constraint_threshold: DEFAULT_VALUE_CONSTRAINT_THRESHOLD,
            sample_rows: config.sample_rows,
        },
    });

    Ok(card)
}
