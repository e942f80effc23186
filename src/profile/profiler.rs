//! Profiler (C3, spec §4.3): turns a table's raw structure plus its sample
//! into per-column profiles — null rate, distinct ratio, inferred role,
//! surface patterns, semantic tags, and (when cardinality is low enough)
//! enumerated values or a min/max range.

use std::collections::BTreeSet;

use crate::profile::ner::{tag_from_column_name, tag_from_values};
use crate::profile::patterns::detect_patterns;
use crate::profile::rules::{infer_role, RoleInput};
use crate::profile::types::{ColumnProfile, FkTarget, SemanticTag, ValueRange};
use crate::reflect::RawTable;
use crate::sample::TableSample;

/// Default cutoff for "low enough cardinality to enumerate" when the caller
/// does not override it (spec §4.3 `value_constraint_threshold`).
pub const DEFAULT_VALUE_CONSTRAINT_THRESHOLD: usize = 25;

/// Build profiles for every column of `table` from its `sample`.
pub fn profile_table(
    table: &RawTable,
    sample: &TableSample,
    value_constraint_threshold: usize,
) -> Vec<ColumnProfile> {
    let table_key = table.table_key();
    table
        .columns
        .iter()
        .map(|col| {
            let col_index = sample.column_names.iter().position(|n| n == &col.name);
            let non_null_values: Vec<&str> = col_index
                .map(|idx| {
                    sample
                        .rows
                        .iter()
                        .filter_map(|row| row.get(idx).and_then(|v| v.as_deref()))
                        .collect()
                })
                .unwrap_or_default();

            let sample_size = sample.rows.len();
            let null_count = col_index
                .map(|idx| {
                    sample
                        .rows
                        .iter()
                        .filter(|row| row.get(idx).map(|v| v.is_none()).unwrap_or(true))
                        .count()
                })
                .unwrap_or(0);
            let null_rate = if sample_size == 0 {
                0.0
            } else {
                null_count as f64 / sample_size as f64
            };

            let distinct_values: BTreeSet<&str> = non_null_values.iter().copied().collect();
            let distinct_count = distinct_values.len();
            let distinct_ratio = if non_null_values.is_empty() {
                0.0
            } else {
                distinct_count as f64 / non_null_values.len() as f64
            };

            let fk = table
                .foreign_keys
                .iter()
                .find(|fk| fk.local_column == col.name);
            let is_foreign_key = fk.is_some();
            let fk_target = fk.map(|fk| FkTarget {
                table_key: fk.remote_table_key.clone(),
                column: fk.remote_column.clone(),
            });

            let avg_text_len = if non_null_values.is_empty() {
                None
            } else {
                Some(
                    non_null_values.iter().map(|v| v.len()).sum::<usize>() as f64
                        / non_null_values.len() as f64,
                )
            };

            let role = infer_role(&RoleInput {
                column_name: &col.name,
                vendor_type: &col.vendor_type,
                is_primary_key: col.is_primary_key,
                is_foreign_key,
                distinct_ratio,
                distinct_count,
                value_constraint_threshold,
                avg_text_len,
            });

            let enumerated_values = if distinct_count > 0 && distinct_count <= value_constraint_threshold {
                Some(distinct_values.iter().map(|v| v.to_string()).collect())
            } else {
                None
            };

            let range = value_range(&distinct_values);

            let patterns = detect_patterns(&non_null_values);
            let mut semantic_tags = tag_from_column_name(&col.name);
            for tag in tag_from_values(&non_null_values) {
                if !semantic_tags.contains(&tag) {
                    semantic_tags.push(tag);
                }
            }
            dedup_tags(&mut semantic_tags);

            ColumnProfile {
                table_key: table_key.clone(),
                name: col.name.clone(),
                vendor_type: col.vendor_type.clone(),
                nullable: col.nullable,
                is_primary_key: col.is_primary_key,
                is_foreign_key,
                fk_target,
                null_rate,
                distinct_ratio,
                patterns,
                semantic_tags,
                role,
                enumerated_values,
                range,
                sampled_partial: sample.partial,
            }
        })
        .collect()
}

fn dedup_tags(tags: &mut Vec<SemanticTag>) {
    let mut seen = Vec::new();
    tags.retain(|t| {
        if seen.contains(t) {
            false
        } else {
            seen.push(*t);
            true
        }
    });
}

/// A min/max range, only meaningful when values compare lexicographically
/// close to their natural order (numeric strings, ISO dates). Best-effort:
/// the profiler does not parse vendor types to decide numeric vs. text.
fn value_range(values: &BTreeSet<&str>) -> Option<ValueRange> {
    if values.len() < 2 {
        return None;
    }
    let min = values.iter().next()?;
    let max = values.iter().next_back()?;
    Some(ValueRange {
        min: min.to_string(),
        max: max.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{RawColumn, RawForeignKey};

    fn table() -> RawTable {
        RawTable {
            schema: "public".to_string(),
            name: "orders".to_string(),
            columns: vec![
                RawColumn {
                    name: "id".to_string(),
                    vendor_type: "integer".to_string(),
                    nullable: false,
                    is_primary_key: true,
                },
                RawColumn {
                    name: "customer_id".to_string(),
                    vendor_type: "integer".to_string(),
                    nullable: false,
                    is_primary_key: false,
                },
                RawColumn {
                    name: "status".to_string(),
                    vendor_type: "varchar".to_string(),
                    nullable: false,
                    is_primary_key: false,
                },
            ],
            primary_key: vec!["id".to_string()],
            foreign_keys: vec![RawForeignKey {
                local_column: "customer_id".to_string(),
                remote_table_key: "public.customers".to_string(),
                remote_column: "id".to_string(),
            }],
            row_count_estimate: Some(1000),
        }
    }

    fn sample() -> TableSample {
        TableSample {
            column_names: vec!["id".to_string(), "customer_id".to_string(), "status".to_string()],
            rows: vec![
                vec![Some("1".to_string()), Some("10".to_string()), Some("open".to_string())],
                vec![Some("2".to_string()), Some("11".to_string()), Some("closed".to_string())],
                vec![Some("3".to_string()), Some("10".to_string()), Some("open".to_string())],
            ],
            partial: false,
        }
    }

    #[test]
    fn primary_key_column_gets_key_role() {
        let profiles = profile_table(&table(), &sample(), DEFAULT_VALUE_CONSTRAINT_THRESHOLD);
        let id = profiles.iter().find(|c| c.name == "id").unwrap();
        assert_eq!(id.role, crate::profile::types::Role::Key);
        assert!(id.is_primary_key);
    }

    #[test]
    fn foreign_key_column_gets_fk_target() {
        let profiles = profile_table(&table(), &sample(), DEFAULT_VALUE_CONSTRAINT_THRESHOLD);
        let fk = profiles.iter().find(|c| c.name == "customer_id").unwrap();
        assert!(fk.is_foreign_key);
        assert_eq!(fk.fk_target.as_ref().unwrap().table_key, "public.customers");
        assert_eq!(fk.role, crate::profile::types::Role::Id);
    }

    #[test]
    fn low_cardinality_column_gets_enumerated_values() {
        let profiles = profile_table(&table(), &sample(), DEFAULT_VALUE_CONSTRAINT_THRESHOLD);
        let status = profiles.iter().find(|c| c.name == "status").unwrap();
        let values = status.enumerated_values.as_ref().unwrap();
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn empty_sample_yields_zero_null_rate_and_no_range() {
        let empty = TableSample {
            column_names: vec!["id".to_string(), "customer_id".to_string(), "status".to_string()],
            rows: vec![],
            partial: true,
        };
        let profiles = profile_table(&table(), &empty, DEFAULT_VALUE_CONSTRAINT_THRESHOLD);
        for p in &profiles {
            assert_eq!(p.null_rate, 0.0);
            assert!(p.sampled_partial);
        }
    }
}
