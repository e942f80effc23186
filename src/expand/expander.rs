//! FK-graph expansion from seed tables (spec §4.9).

use std::collections::{HashMap, HashSet, VecDeque};

use crate::card::SchemaCard;
use crate::classify::Archetype;
use crate::expand::types::{ExpandOptions, ExpandStrategy, ExpandedTable, ExpansionOrigin, SeedTable};
use crate::reflect::TableKey;

const SEED_PROXIMITY_WEIGHT: f64 = 0.5;
const ARCHETYPE_BONUS_WEIGHT: f64 = 0.3;
const CENTRALITY_WEIGHT: f64 = 0.2;
const MAX_DEPTH: usize = 2;

type Adjacency = HashMap<TableKey, Vec<TableKey>>;

fn build_adjacency(card: &SchemaCard) -> Adjacency {
    let mut adjacency: Adjacency = HashMap::new();
    for edge in &card.fk_edges {
        adjacency.entry(edge.from_table.clone()).or_default().push(edge.to_table.clone());
        adjacency.entry(edge.to_table.clone()).or_default().push(edge.from_table.clone());
    }
    adjacency
}

struct Reachable {
    depth: usize,
    via_seed: TableKey,
}

/// BFS from all seeds simultaneously, up to `max_depth`, tracking the
/// shortest depth and the originating seed for each reached table.
fn bfs_from_seeds(adjacency: &Adjacency, seeds: &[SeedTable], max_depth: usize) -> HashMap<TableKey, Reachable> {
    let mut reached: HashMap<TableKey, Reachable> = HashMap::new();
    let mut queue: VecDeque<(TableKey, usize, TableKey)> = VecDeque::new();

    for seed in seeds {
        reached.insert(seed.table_key.clone(), Reachable { depth: 0, via_seed: seed.table_key.clone() });
        queue.push_back((seed.table_key.clone(), 0, seed.table_key.clone()));
    }

    while let Some((current, depth, via_seed)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        if let Some(neighbors) = adjacency.get(&current) {
            for neighbor in neighbors {
                let next_depth = depth + 1;
                let should_visit = match reached.get(neighbor) {
                    Some(existing) => next_depth < existing.depth,
                    None => true,
                };
                if should_visit {
                    reached.insert(neighbor.clone(), Reachable { depth: next_depth, via_seed: via_seed.clone() });
                    queue.push_back((neighbor.clone(), next_depth, via_seed.clone()));
                }
            }
        }
    }

    reached
}

fn archetype_bonus(seed_archetype: Archetype, candidate_archetype: Archetype) -> f64 {
    match (seed_archetype, candidate_archetype) {
        (Archetype::Fact, Archetype::Dimension) | (Archetype::Dimension, Archetype::Fact) => 1.0,
        _ => 0.0,
    }
}

fn utility_score(card: &SchemaCard, via_seed: &TableKey, candidate: &TableKey, depth: usize) -> (f64, f64) {
    let seed_proximity = if depth == 0 { 1.0 } else { 1.0 / depth as f64 };
    let bonus = match (card.tables.get(via_seed), card.tables.get(candidate)) {
        (Some(seed_profile), Some(candidate_profile)) => archetype_bonus(seed_profile.archetype, candidate_profile.archetype),
        _ => 0.0,
    };
    let centrality = card.tables.get(candidate).map(|t| t.centrality.clamp(0.0, 1.0)).unwrap_or(0.0);
    let utility = SEED_PROXIMITY_WEIGHT * seed_proximity + ARCHETYPE_BONUS_WEIGHT * bonus + CENTRALITY_WEIGHT * centrality;
    (utility, bonus)
}

/// Expands `seeds` along the FK graph, returning a combined-score-ranked
/// list that always preserves every seed table.
pub fn expand(card: &SchemaCard, seeds: &[SeedTable], opts: &ExpandOptions) -> Vec<ExpandedTable> {
    let adjacency = build_adjacency(card);
    let seed_keys: HashSet<TableKey> = seeds.iter().map(|s| s.table_key.clone()).collect();
    let seed_scores: HashMap<TableKey, f64> = seeds.iter().map(|s| (s.table_key.clone(), s.retrieval_score)).collect();

    let max_depth = match opts.strategy {
        ExpandStrategy::FkFollowing => MAX_DEPTH,
        ExpandStrategy::Simple => 1,
    };
    let reached = bfs_from_seeds(&adjacency, seeds, max_depth);

    let mut candidates: Vec<ExpandedTable> = Vec::new();
    for (table_key, info) in &reached {
        let is_seed = seed_keys.contains(table_key);
        if !is_seed {
            let is_archive = card.tables.get(table_key).map(|t| t.is_archive).unwrap_or(false);
            if is_archive && opts.strict_archive_exclude {
                continue;
            }
        }

        let (utility, bonus) = if is_seed { (1.0, 0.0) } else { utility_score(card, &info.via_seed, table_key, info.depth) };
        let retrieval_score = seed_scores.get(table_key).copied().unwrap_or(0.0);
        let combined_score = retrieval_score + utility;
        let origin = if is_seed { ExpansionOrigin::Seed } else { ExpansionOrigin::Expanded };

        candidates.push(ExpandedTable { table_key: table_key.clone(), utility, archetype_bonus: bonus, combined_score, origin });
    }

    // Ensure every seed is present even if it had no FK edges at all.
    for seed in seeds {
        if !candidates.iter().any(|c| c.table_key == seed.table_key) {
            candidates.push(ExpandedTable {
                table_key: seed.table_key.clone(),
                utility: 1.0,
                archetype_bonus: 0.0,
                combined_score: seed.retrieval_score + 1.0,
                origin: ExpansionOrigin::Seed,
            });
        }
    }

    candidates.sort_by(|a, b| b.combined_score.partial_cmp(&a.combined_score).unwrap_or(std::cmp::Ordering::Equal));

    let seed_count = seeds.len();
    if candidates.len() > opts.max_tables.max(seed_count) {
        let mut kept: Vec<ExpandedTable> = Vec::new();
        let mut non_seeds: Vec<ExpandedTable> = Vec::new();
        for c in candidates {
            if seed_keys.contains(&c.table_key) {
                kept.push(c);
            } else {
                non_seeds.push(c);
            }
        }
        let remaining_budget = opts.max_tables.saturating_sub(kept.len());
        kept.extend(non_seeds.into_iter().take(remaining_budget));
        kept.sort_by(|a, b| b.combined_score.partial_cmp(&a.combined_score).unwrap_or(std::cmp::Ordering::Equal));
        kept
    } else {
        candidates
    }
}
