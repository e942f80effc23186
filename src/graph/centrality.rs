//! Eigenvector centrality by power iteration, with a degree-centrality
//! fallback on non-convergence (spec §4.4, §9).

use std::collections::HashMap;

use crate::reflect::TableKey;

const MAX_ITERATIONS: usize = 200;
const CONVERGENCE_TOLERANCE: f64 = 1e-8;

/// Adjacency list: table key -> (neighbor, edge weight).
pub type Adjacency = HashMap<TableKey, Vec<(TableKey, f64)>>;

/// Returns (scores, used_degree_fallback).
pub fn compute_centrality(keys: &[TableKey], adjacency: &Adjacency) -> (HashMap<TableKey, f64>, bool) {
    match keys.len() {
        0 => (HashMap::new(), false),
        1 => {
            let mut scores = HashMap::new();
            scores.insert(keys[0].clone(), 0.0);
            (scores, false)
        }
        _ => match eigenvector_centrality(keys, adjacency) {
            Some(scores) => (scores, false),
            None => (degree_centrality(keys, adjacency), true),
        },
    }
}

fn eigenvector_centrality(keys: &[TableKey], adjacency: &Adjacency) -> Option<HashMap<TableKey, f64>> {
    let n = keys.len();
    let index: HashMap<&TableKey, usize> = keys.iter().enumerate().map(|(i, k)| (k, i)).collect();
    let mut x = vec![1.0 / (n as f64).sqrt(); n];

    for _ in 0..MAX_ITERATIONS {
        let mut next = vec![0.0_f64; n];
        for (key, neighbors) in adjacency {
            let Some(&i) = index.get(key) else { continue };
            for (neighbor, weight) in neighbors {
                if let Some(&j) = index.get(neighbor) {
                    next[i] += weight * x[j];
                }
            }
        }

        let norm = next.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm == 0.0 || !norm.is_finite() {
            return None;
        }
        for v in next.iter_mut() {
            *v /= norm;
        }

        let delta: f64 = x.iter().zip(next.iter()).map(|(a, b)| (a - b).abs()).sum();
        x = next;
        if delta < CONVERGENCE_TOLERANCE {
            return Some(keys.iter().enumerate().map(|(i, k)| (k.clone(), x[i].abs())).collect());
        }
    }
    None
}

fn degree_centrality(keys: &[TableKey], adjacency: &Adjacency) -> HashMap<TableKey, f64> {
    let max_possible = (keys.len().saturating_sub(1)) as f64;
    keys.iter()
        .map(|k| {
            let degree: f64 = adjacency.get(k).map(|n| n.iter().map(|(_, w)| w).sum()).unwrap_or(0.0);
            let score = if max_possible > 0.0 { degree / max_possible } else { 0.0 };
            (k.clone(), score)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_adjacency() -> (Vec<TableKey>, Adjacency) {
        // a - b - c, unweighted
        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let mut adjacency: Adjacency = HashMap::new();
        adjacency.insert("a".to_string(), vec![("b".to_string(), 1.0)]);
        adjacency.insert("b".to_string(), vec![("a".to_string(), 1.0), ("c".to_string(), 1.0)]);
        adjacency.insert("c".to_string(), vec![("b".to_string(), 1.0)]);
        (keys, adjacency)
    }

    #[test]
    fn middle_node_has_highest_eigenvector_centrality() {
        let (keys, adjacency) = chain_adjacency();
        let (scores, fallback) = compute_centrality(&keys, &adjacency);
        assert!(!fallback);
        assert!(scores["b"] > scores["a"]);
        assert!(scores["b"] > scores["c"]);
    }

    #[test]
    fn disconnected_graph_falls_back_to_degree() {
        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let adjacency: Adjacency = keys.iter().map(|k| (k.clone(), vec![])).collect();
        let (scores, fallback) = compute_centrality(&keys, &adjacency);
        assert!(fallback);
        assert_eq!(scores["a"], 0.0);
    }

    #[test]
    fn single_table_has_zero_centrality() {
        let keys = vec!["only".to_string()];
        let adjacency: Adjacency = HashMap::new();
        let (scores, fallback) = compute_centrality(&keys, &adjacency);
        assert!(!fallback);
        assert_eq!(scores["only"], 0.0);
    }
}
