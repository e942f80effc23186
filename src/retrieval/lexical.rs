//! Lexical scoring: cosine similarity over token-frequency vectors
//! (spec §4.8).

use std::collections::HashMap;

use crate::retrieval::tokenize::tokenize;

pub fn token_frequency(tokens: &[String]) -> HashMap<&str, f64> {
    let mut freq: HashMap<&str, f64> = HashMap::new();
    for t in tokens {
        *freq.entry(t.as_str()).or_insert(0.0) += 1.0;
    }
    freq
}

pub fn cosine_similarity(a: &HashMap<&str, f64>, b: &HashMap<&str, f64>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let dot: f64 = a.iter().map(|(k, v)| v * b.get(k).copied().unwrap_or(0.0)).sum();
    let norm_a = a.values().map(|v| v * v).sum::<f64>().sqrt();
    let norm_b = b.values().map(|v| v * v).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Score `query` against `searchable_text` by cosine similarity over
/// token-frequency vectors.
pub fn lexical_score(query_tokens: &[String], searchable_text: &str) -> f64 {
    let text_tokens = tokenize(searchable_text);
    let query_freq = token_frequency(query_tokens);
    let text_freq = token_frequency(&text_tokens);
    cosine_similarity(&query_freq, &text_freq)
}
