//! Retrieval Engine (C8, spec §4.8): ranks tables against a free-text
//! query using lexical, embedding, or fused strategies.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::card::SchemaCard;
use crate::embed::{EmbeddingService, SemanticIndex};
use crate::graph::ARCHIVE_NAME_TOKENS;
use crate::reflect::TableKey;
use crate::retrieval::lexical::lexical_score;
use crate::retrieval::tokenize::tokenize;

const ARCHIVE_PENALTY: f64 = 0.5;
const COLUMN_MAX_POOL_TOP_N: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Lexical,
    EmbeddingTable,
    EmbeddingColumn,
    Combined,
}

#[derive(Debug, Clone)]
pub struct RetrievalOptions {
    pub k: usize,
    pub strategy: Strategy,
    /// Combined-fusion weight, clamped to [0, 1].
    pub alpha: f64,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self { k: 10, strategy: Strategy::Combined, alpha: 0.5 }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredTable {
    pub table_key: TableKey,
    pub lexical_score: f64,
    pub embedding_score: f64,
    pub combined_score: f64,
    pub archive_penalized: bool,
}

pub async fn retrieve(
    card: &SchemaCard,
    embedder: &dyn EmbeddingService,
    semantic_index: &SemanticIndex,
    query: &str,
    opts: &RetrievalOptions,
) -> Vec<ScoredTable> {
    let query_tokens = tokenize(query);
    let query_has_archive_cue = query_tokens.iter().any(|t| ARCHIVE_NAME_TOKENS.contains(&t.as_str()));
    let alpha = opts.alpha.clamp(0.0, 1.0);

    let mut lexical: HashMap<TableKey, f64> = HashMap::new();
    for (key, profile) in &card.tables {
        let column_bag: Vec<&str> = profile.columns.iter().map(|c| c.name.as_str()).collect();
        let searchable = format!("{} {} {}", table_short_name(key), profile.summary, column_bag.join(" "));
        lexical.insert(key.clone(), lexical_score(&query_tokens, &searchable));
    }

    let wants_embedding = matches!(opts.strategy, Strategy::EmbeddingTable | Strategy::EmbeddingColumn | Strategy::Combined);
    let embedding = if wants_embedding && semantic_index.is_enabled() && embedder.is_available() {
        match embedder.embed_text(query).await {
            Ok(query_vector) => match opts.strategy {
                Strategy::EmbeddingColumn => embedding_column_scores(card, semantic_index, &query_vector),
                _ => embedding_table_scores(semantic_index, &query_vector, card),
            },
            Err(_) => HashMap::new(),
        }
    } else {
        HashMap::new()
    };

    let lexical_norm = min_max_normalize(&lexical);
    let embedding_norm = min_max_normalize(&embedding);

    let mut scored: Vec<ScoredTable> = card
        .tables
        .keys()
        .map(|key| {
            let lex = lexical_norm.get(key).copied().unwrap_or(0.0);
            let emb = embedding_norm.get(key).copied().unwrap_or(0.0);
            let raw_combined = match opts.strategy {
                Strategy::Lexical => lex,
                Strategy::EmbeddingTable | Strategy::EmbeddingColumn => {
                    if embedding.is_empty() {
                        lex
                    } else {
                        emb
                    }
                }
                Strategy::Combined => {
                    if embedding.is_empty() {
                        lex
                    } else {
                        alpha * lex + (1.0 - alpha) * emb
                    }
                }
            };

            let is_archive = card.tables.get(key).map(|t| t.is_archive).unwrap_or(false);
            let archive_penalized = is_archive && !query_has_archive_cue;
            let combined_score = if archive_penalized { raw_combined * ARCHIVE_PENALTY } else { raw_combined };

            ScoredTable {
                table_key: key.clone(),
                lexical_score: lexical.get(key).copied().unwrap_or(0.0),
                embedding_score: embedding.get(key).copied().unwrap_or(0.0),
                combined_score,
                archive_penalized,
            }
        })
        .collect();

    scored.sort_by(|a, b| b.combined_score.partial_cmp(&a.combined_score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(opts.k);
    scored
}

fn embedding_table_scores(semantic_index: &SemanticIndex, query_vector: &[f32], card: &SchemaCard) -> HashMap<TableKey, f64> {
    semantic_index
        .search_tables(query_vector, card.tables.len().max(1))
        .into_iter()
        .map(|(key, score)| (key, score as f64))
        .collect()
}

/// Aggregates the top-N column matches per table via max-pool (spec §4.8).
fn embedding_column_scores(card: &SchemaCard, semantic_index: &SemanticIndex, query_vector: &[f32]) -> HashMap<TableKey, f64> {
    let column_hits = semantic_index.search_columns(query_vector, card.tables.len().max(1) * COLUMN_MAX_POOL_TOP_N);
    let mut best: HashMap<TableKey, f64> = HashMap::new();
    for (table_key, _column, score) in column_hits {
        let entry = best.entry(table_key).or_insert(f32::MIN as f64);
        if (score as f64) > *entry {
            *entry = score as f64;
        }
    }
    best
}

fn min_max_normalize(scores: &HashMap<TableKey, f64>) -> HashMap<TableKey, f64> {
    if scores.is_empty() {
        return HashMap::new();
    }
    let min = scores.values().cloned().fold(f64::INFINITY, f64::min);
    let max = scores.values().cloned().fold(f64::NEG_INFINITY, f64::max);
    if (max - min).abs() < f64::EPSILON {
        return scores.keys().map(|k| (k.clone(), 1.0)).collect();
    }
    scores.iter().map(|(k, v)| (k.clone(), (v - min) / (max - min))).collect()
}

fn table_short_name(table_key: &str) -> &str {
    table_key.rsplit('.').next().unwrap_or(table_key)
}
