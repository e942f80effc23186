//! Builds per-table and per-column vectors from a Schema Card and stores
//! them in the approximate-NN index (spec §4.7).

use crate::card::SchemaCard;
use crate::embed::index::{FlatVectorIndex, NoopVectorIndex, VectorIndex};
use crate::embed::service::EmbeddingService;
use crate::reflect::TableKey;

pub struct SemanticIndex {
    table_index: Box<dyn VectorIndex>,
    column_index: Box<dyn VectorIndex>,
    enabled: bool,
}

impl SemanticIndex {
    pub fn disabled() -> Self {
        Self {
            table_index: Box::new(NoopVectorIndex),
            column_index: Box::new(NoopVectorIndex),
            enabled: false,
        }
    }

    /// Build the index from a card. Falls back to `disabled()` whenever the
    /// embedder reports unavailable or a batch embed call fails — retrieval
    /// then silently uses lexical scoring only (spec §4.7, §4.8).
    pub async fn build(card: &SchemaCard, embedder: &dyn EmbeddingService) -> Self {
        if !embedder.is_available() {
            return Self::disabled();
        }

        let mut table_keys = Vec::new();
        let mut table_texts = Vec::new();
        for (key, profile) in &card.tables {
            let column_bag: Vec<&str> = profile.columns.iter().map(|c| c.name.as_str()).collect();
            let text = format!("{} {} {}", table_short_name(key), profile.summary, column_bag.join(" "));
            table_keys.push(key.clone());
            table_texts.push(text);
        }

        let table_vectors = match embedder.embed_batch(&table_texts).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "table embedding batch failed, disabling semantic index");
                return Self::disabled();
            }
        };
        let table_index = FlatVectorIndex::new();
        table_index.upsert(table_keys.into_iter().zip(table_vectors).collect());

        let mut column_keys = Vec::new();
        let mut column_texts = Vec::new();
        for (key, profile) in &card.tables {
            for column in &profile.columns {
                column_keys.push(format!("{key}::{}", column.name));
                column_texts.push(format!("{} {} {:?}", table_short_name(key), column.name, column.role));
            }
        }
        let column_index = FlatVectorIndex::new();
        if let Ok(vectors) = embedder.embed_batch(&column_texts).await {
            column_index.upsert(column_keys.into_iter().zip(vectors).collect());
        }

        Self {
            table_index: Box::new(table_index),
            column_index: Box::new(column_index),
            enabled: true,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn search_tables(&self, query_vector: &[f32], k: usize) -> Vec<(TableKey, f32)> {
        self.table_index.search(query_vector, k)
    }

    /// Returns `(table_key, column_name, score)` triples.
    pub fn search_columns(&self, query_vector: &[f32], k: usize) -> Vec<(TableKey, String, f32)> {
        self.column_index
            .search(query_vector, k)
            .into_iter()
            .filter_map(|(compound_key, score)| {
                let (table, column) = compound_key.split_once("::")?;
                Some((table.to_string(), column.to_string(), score))
            })
            .collect()
    }
}

fn table_short_name(table_key: &str) -> &str {
    table_key.rsplit('.').next().unwrap_or(table_key)
}
