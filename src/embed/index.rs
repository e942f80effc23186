//! Approximate-NN index capability (spec §4.7). A flat, brute-force
//! cosine-similarity scan is "approximate-NN" in the degenerate sense of
//! being exact at the scale this service operates at (hundreds to low
//! thousands of tables/columns per schema, not a bulk vector database);
//! it degrades to a noop when the embedder itself is unavailable.

use std::collections::HashMap;
use std::sync::RwLock;

pub trait VectorIndex: Send + Sync {
    fn upsert(&self, items: Vec<(String, Vec<f32>)>);
    fn search(&self, query: &[f32], k: usize) -> Vec<(String, f32)>;
    fn is_available(&self) -> bool;
}

#[derive(Default)]
pub struct FlatVectorIndex {
    vectors: RwLock<HashMap<String, Vec<f32>>>,
}

impl FlatVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VectorIndex for FlatVectorIndex {
    fn upsert(&self, items: Vec<(String, Vec<f32>)>) {
        let mut vectors = self.vectors.write().expect("vector index lock poisoned");
        for (key, vector) in items {
            vectors.insert(key, vector);
        }
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<(String, f32)> {
        let vectors = self.vectors.read().expect("vector index lock poisoned");
        let mut scored: Vec<(String, f32)> = vectors
            .iter()
            .map(|(key, vector)| (key.clone(), cosine_similarity(query, vector)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }

    fn is_available(&self) -> bool {
        true
    }
}

pub struct NoopVectorIndex;

impl VectorIndex for NoopVectorIndex {
    fn upsert(&self, _items: Vec<(String, Vec<f32>)>) {}
    fn search(&self, _query: &[f32], _k: usize) -> Vec<(String, f32)> {
        vec![]
    }
    fn is_available(&self) -> bool {
        false
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_closest_vector() {
        let index = FlatVectorIndex::new();
        index.upsert(vec![
            ("a".to_string(), vec![1.0, 0.0]),
            ("b".to_string(), vec![0.0, 1.0]),
        ]);
        let results = index.search(&[1.0, 0.0], 1);
        assert_eq!(results[0].0, "a");
    }

    #[test]
    fn noop_index_always_empty() {
        let index = NoopVectorIndex;
        index.upsert(vec![("a".to_string(), vec![1.0])]);
        assert!(index.search(&[1.0], 5).is_empty());
        assert!(!index.is_available());
    }
}
