//! Greedy modularity community detection and the small-community merge /
//! archive coalescing passes that turn communities into subject areas
//! (spec §4.4).

use std::collections::{BTreeSet, HashMap};

use crate::graph::types::FkEdge;
use crate::reflect::TableKey;

/// Greedy agglomerative modularity optimization (Clauset-Newman-Moore
/// style): repeatedly merge the pair of adjacent communities with the
/// greatest positive modularity gain until no merge improves modularity.
pub fn detect_communities(keys: &[TableKey], edges: &[FkEdge]) -> Vec<BTreeSet<TableKey>> {
    if keys.is_empty() {
        return vec![];
    }
    let total_weight: f64 = edges.iter().map(|e| e.weight as f64).sum();
    if total_weight == 0.0 {
        return keys
            .iter()
            .map(|k| BTreeSet::from([k.clone()]))
            .collect();
    }
    let m2 = 2.0 * total_weight;

    let mut community_of: HashMap<TableKey, usize> =
        keys.iter().enumerate().map(|(i, k)| (k.clone(), i)).collect();
    let mut communities: HashMap<usize, BTreeSet<TableKey>> = keys
        .iter()
        .enumerate()
        .map(|(i, k)| (i, BTreeSet::from([k.clone()])))
        .collect();
    let mut community_degree: HashMap<usize, f64> = HashMap::new();
    for k in keys {
        community_degree.insert(community_of[k], 0.0);
    }
    for e in edges {
        *community_degree.get_mut(&community_of[&e.from_table]).unwrap() += e.weight as f64;
        *community_degree.get_mut(&community_of[&e.to_table]).unwrap() += e.weight as f64;
    }

    let mut between: HashMap<(usize, usize), f64> = HashMap::new();
    for e in edges {
        let ci = community_of[&e.from_table];
        let cj = community_of[&e.to_table];
        if ci == cj {
            continue;
        }
        let key = if ci < cj { (ci, cj) } else { (cj, ci) };
        *between.entry(key).or_insert(0.0) += e.weight as f64;
    }

    loop {
        let mut best: Option<((usize, usize), f64)> = None;
        for (&(ci, cj), &e_ij) in &between {
            let a_i = community_degree[&ci] / m2;
            let a_j = community_degree[&cj] / m2;
            let delta_q = 2.0 * (e_ij / m2 - a_i * a_j);
            if delta_q > 1e-12 && best.map(|(_, b)| delta_q > b).unwrap_or(true) {
                best = Some(((ci, cj), delta_q));
            }
        }
        let Some(((a, b), _)) = best else { break };
        let (keep, remove) = if a < b { (a, b) } else { (b, a) };

        let removed_nodes = communities.remove(&remove).unwrap();
        for node in &removed_nodes {
            community_of.insert(node.clone(), keep);
        }
        communities.get_mut(&keep).unwrap().extend(removed_nodes);
        let removed_degree = community_degree.remove(&remove).unwrap();
        *community_degree.get_mut(&keep).unwrap() += removed_degree;

        let mut merged_targets: HashMap<usize, f64> = HashMap::new();
        let mut next_between = HashMap::new();
        for (&(x, y), &w) in &between {
            if x == remove || y == remove || x == keep || y == keep {
                let other = if x == keep || x == remove { y } else { x };
                if other != keep && other != remove {
                    *merged_targets.entry(other).or_insert(0.0) += w;
                }
            } else {
                next_between.insert((x, y), w);
            }
        }
        for (other, w) in merged_targets {
            let key = if keep < other { (keep, other) } else { (other, keep) };
            *next_between.entry(key).or_insert(0.0) += w;
        }
        between = next_between;
    }

    communities.into_values().collect()
}

/// Merge communities smaller than `min_area_size` into the neighboring
/// community with the most shared edge weight; with no FK-connected
/// neighbor, fold into the largest remaining community rather than leave
/// an undersized area stranded.
pub fn merge_small_communities(
    mut communities: Vec<BTreeSet<TableKey>>,
    edges: &[FkEdge],
    min_area_size: usize,
) -> Vec<BTreeSet<TableKey>> {
    loop {
        if communities.len() <= 1 {
            break;
        }
        let Some(idx) = communities.iter().position(|c| c.len() < min_area_size) else {
            break;
        };
        let small = communities[idx].clone();

        let mut best: Option<(usize, f64)> = None;
        for (other_idx, other) in communities.iter().enumerate() {
            if other_idx == idx {
                continue;
            }
            let weight: f64 = edges
                .iter()
                .filter(|e| {
                    (small.contains(&e.from_table) && other.contains(&e.to_table))
                        || (small.contains(&e.to_table) && other.contains(&e.from_table))
                })
                .map(|e| e.weight as f64)
                .sum();
            if weight > 0.0 && best.map(|(_, b)| weight > b).unwrap_or(true) {
                best = Some((other_idx, weight));
            }
        }

        let target_idx = best.map(|(i, _)| i).unwrap_or_else(|| {
            communities
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != idx)
                .max_by_key(|(_, c)| c.len())
                .map(|(i, _)| i)
                .expect("communities.len() > 1 guaranteed by loop guard")
        });

        let merged = communities[idx].clone();
        communities[target_idx].extend(merged);
        communities.remove(idx);
    }
    communities
}

/// Coalesce every community whose tables are majority-archive into a
/// single community, when `merge_archive_areas` is enabled (spec §4.4).
pub fn coalesce_archive_communities(
    communities: Vec<BTreeSet<TableKey>>,
    is_archive: impl Fn(&TableKey) -> bool,
) -> Vec<BTreeSet<TableKey>> {
    let is_majority_archive = |c: &BTreeSet<TableKey>| -> bool {
        if c.is_empty() {
            return false;
        }
        let archive_count = c.iter().filter(|k| is_archive(k)).count();
        archive_count * 2 > c.len()
    };

    let (archive_communities, mut rest): (Vec<_>, Vec<_>) =
        communities.into_iter().partition(|c| is_majority_archive(c));

    if archive_communities.len() > 1 {
        let mut merged = BTreeSet::new();
        for c in archive_communities {
            merged.extend(c);
        }
        rest.push(merged);
    } else {
        rest.extend(archive_communities);
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(a: &str, b: &str, w: usize) -> FkEdge {
        FkEdge {
            from_table: a.to_string(),
            to_table: b.to_string(),
            weight: w,
        }
    }

    #[test]
    fn two_disconnected_triangles_form_two_communities() {
        let keys: Vec<TableKey> = vec!["a1", "a2", "a3", "b1", "b2", "b3"]
            .into_iter()
            .map(String::from)
            .collect();
        let edges = vec![
            edge("a1", "a2", 1),
            edge("a2", "a3", 1),
            edge("a1", "a3", 1),
            edge("b1", "b2", 1),
            edge("b2", "b3", 1),
            edge("b1", "b3", 1),
        ];
        let communities = detect_communities(&keys, &edges);
        assert_eq!(communities.len(), 2);
        for c in &communities {
            assert_eq!(c.len(), 3);
        }
    }

    #[test]
    fn no_edges_yields_all_singletons() {
        let keys: Vec<TableKey> = vec!["a".to_string(), "b".to_string()];
        let communities = detect_communities(&keys, &[]);
        assert_eq!(communities.len(), 2);
    }

    #[test]
    fn small_community_merges_into_connected_neighbor() {
        let communities = vec![
            BTreeSet::from(["a".to_string()]),
            BTreeSet::from(["b".to_string(), "c".to_string(), "d".to_string()]),
        ];
        let edges = vec![edge("a", "b", 2)];
        let merged = merge_small_communities(communities, &edges, 2);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].len(), 4);
    }

    #[test]
    fn archive_communities_coalesce_when_majority_two_or_more() {
        let communities = vec![
            BTreeSet::from(["orders_archive".to_string()]),
            BTreeSet::from(["events_history".to_string()]),
            BTreeSet::from(["customers".to_string()]),
        ];
        let merged = coalesce_archive_communities(communities, |k| k.contains("archive") || k.contains("history"));
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().any(|c| c.len() == 2));
    }
}
