//! Query Planner (C10): turns a free-text request into a typed, partially
//! or fully SQL-shaped plan (spec §4.10).

use std::collections::{HashMap, HashSet, VecDeque};

use crate::card::SchemaCard;
use crate::classify::Archetype;
use crate::embed::{EmbeddingService, SemanticIndex};
use crate::expand::{self, ExpandOptions, ExpandedTable, SeedTable};
use crate::plan::types::{
    Clarification, FilterCandidate, JoinStep, PlanBudget, PlanRequest, PlanResult, PredicateShape, TableScore,
};
use crate::profile::Role;
use crate::reflect::TableKey;
use crate::retrieval::{self, RetrievalOptions, Strategy};

const CONFIDENCE_THRESHOLD: f64 = 0.6;
const TEMPORAL_HINTS: &[&str] = &["over time", "trend", "by month", "by year", "by day", "date", "when", "history", "monthly", "yearly", "daily"];
const AGGREGATION_HINTS: &[&str] = &["total", "sum", "average", "avg", "count", "how many", "mean", "aggregate"];
const RELATIVE_TIME_HINTS: &[&str] = &["last month", "last week", "last quarter", "last year", "this month", "this week", "this quarter", "this year", "yesterday", "recent", "recently"];

pub async fn plan_query(
    card: &SchemaCard,
    embedder: &dyn EmbeddingService,
    semantic_index: &SemanticIndex,
    request: &PlanRequest,
) -> PlanResult {
    let budget = request.budget.clone().unwrap_or_default();

    // Step 1: retrieval + expansion.
    let retrieval_opts = RetrievalOptions { k: budget.tables, strategy: Strategy::Combined, alpha: 0.5 };
    let retrieved = retrieval::retrieve(card, embedder, semantic_index, &request.request, &retrieval_opts).await;

    let seeds: Vec<SeedTable> = retrieved
        .iter()
        .map(|r| SeedTable { table_key: r.table_key.clone(), retrieval_score: r.combined_score })
        .collect();
    let expand_opts = ExpandOptions { max_tables: budget.tables, ..ExpandOptions::default() };
    let expanded = expand::expand(card, &seeds, &expand_opts);

    let lexical_by_key: HashMap<&TableKey, f64> = retrieved.iter().map(|r| (&r.table_key, r.lexical_score)).collect();
    let embedding_by_key: HashMap<&TableKey, f64> = retrieved.iter().map(|r| (&r.table_key, r.embedding_score)).collect();

    let tables: Vec<TableScore> = expanded
        .iter()
        .map(|e| table_score(card, e, &lexical_by_key, &embedding_by_key))
        .collect();

    let chosen: HashSet<TableKey> = tables.iter().map(|t| t.table_key.clone()).collect();

    // Step 2: choose main_table.
    let main_table = choose_main_table(card, &tables);

    // Step 3: join_plan + UNJOINABLE_SUBSET clarification.
    let mut clarifications = Vec::new();
    let (join_plan, orphans) = match &main_table {
        Some(main) => build_join_plan(card, main, &chosen),
        None => (Vec::new(), chosen.iter().cloned().collect()),
    };
    if !orphans.is_empty() {
        clarifications.push(Clarification {
            question: format!("These tables could not be joined to the main table via foreign keys: {}. How should they relate?", orphans.join(", ")),
            reason_code: "UNJOINABLE_SUBSET".to_string(),
            blocking: true,
        });
    }

    // Step 4: key_columns.
    let key_columns = build_key_columns(card, &chosen, &join_plan);

    // Step 5: group_by_candidates.
    let group_by_candidates = main_table
        .as_ref()
        .map(|main| group_by_candidates(card, main, &chosen))
        .unwrap_or_default();

    // Step 6: filter_candidates.
    let explicit_year = extract_explicit_year(&request.request);
    let filter_candidates = filter_candidates(card, &chosen, explicit_year);

    // Step 7: selected_columns.
    let selected_columns = selected_columns(card, &chosen, &key_columns, budget.columns_per_table);

    // Step 8: remaining clarifications.
    if card.tables.is_empty() {
        clarifications.push(Clarification {
            question: "The database has no tables to plan against.".to_string(),
            reason_code: "NO_TABLES".to_string(),
            blocking: true,
        });
    } else if main_table.is_none() {
        clarifications.push(Clarification {
            question: "No table stood out as the clear subject of this request. Which table should anchor it?".to_string(),
            reason_code: "AMBIGUOUS_INTENT".to_string(),
            blocking: true,
        });
    }
    let has_date_column = chosen.iter().any(|k| has_role(card, k, Role::Date));
    if implies_temporal(&request.request) && !has_date_column {
        clarifications.push(Clarification {
            question: "This looks like it needs a time dimension, but no date column was found among the candidate tables.".to_string(),
            reason_code: "NO_DATE_DIMENSION".to_string(),
            blocking: false,
        });
    }
    let has_metric_column = chosen.iter().any(|k| has_role(card, k, Role::Metric));
    if implies_aggregation(&request.request) && !has_metric_column {
        clarifications.push(Clarification {
            question: "This looks like it needs a numeric measure to aggregate, but no metric column was found.".to_string(),
            reason_code: "NO_METRIC".to_string(),
            blocking: false,
        });
    }
    let date_candidate_count = chosen.iter().filter(|k| has_role(card, k, Role::Date)).count();
    if date_candidate_count > 1 {
        clarifications.push(Clarification {
            question: "Multiple date columns are available across the candidate tables. Which one should define the time scope?".to_string(),
            reason_code: "AMBIGUOUS_DATE_COLUMN".to_string(),
            blocking: false,
        });
    }
    if implies_relative_time(&request.request) && explicit_year.is_none() && has_date_column {
        clarifications.push(Clarification {
            question: "This request names a relative time period without an anchor date. What date range should it resolve to?".to_string(),
            reason_code: "AMBIGUOUS_TIME_RANGE".to_string(),
            blocking: true,
        });
    }

    // Step 9: confidence.
    let confidence = compute_confidence(&tables, &chosen, orphans.len(), has_date_column, has_metric_column);

    // Step 10: draft_sql.
    let draft_sql = if clarifications.is_empty() && confidence >= CONFIDENCE_THRESHOLD {
        main_table.as_ref().and_then(|main| build_draft_sql(card, main, &join_plan, &selected_columns, &filter_candidates))
    } else {
        None
    };
    if draft_sql.is_none() && main_table.is_some() && confidence >= CONFIDENCE_THRESHOLD && clarifications.is_empty() {
        clarifications.push(Clarification {
            question: "No columns could be selected for the main table, so a draft query can't be assembled without risking SELECT *.".to_string(),
            reason_code: "NO_SELECTABLE_COLUMNS".to_string(),
            blocking: true,
        });
    }

    PlanResult {
        request: request.request.clone(),
        tables,
        main_table,
        join_plan,
        key_columns,
        group_by_candidates,
        filter_candidates,
        selected_columns,
        clarifications,
        assumptions: Vec::new(),
        confidence,
        draft_sql,
    }
}

fn table_score(
    card: &SchemaCard,
    expanded: &ExpandedTable,
    lexical_by_key: &HashMap<&TableKey, f64>,
    embedding_by_key: &HashMap<&TableKey, f64>,
) -> TableScore {
    let centrality = card.tables.get(&expanded.table_key).map(|t| t.centrality).unwrap_or(0.0);
    TableScore {
        table_key: expanded.table_key.clone(),
        lexical: lexical_by_key.get(&expanded.table_key).copied().unwrap_or(0.0),
        embedding: embedding_by_key.get(&expanded.table_key).copied().unwrap_or(0.0),
        centrality,
        archetype_bonus: expanded.archetype_bonus,
        expansion_origin: expanded.origin,
        combined: expanded.combined_score,
    }
}

fn choose_main_table(card: &SchemaCard, tables: &[TableScore]) -> Option<TableKey> {
    if let Some(fact) = tables
        .iter()
        .filter(|t| card.tables.get(&t.table_key).map(|p| p.archetype == Archetype::Fact).unwrap_or(false))
        .max_by(|a, b| a.combined.partial_cmp(&b.combined).unwrap_or(std::cmp::Ordering::Equal))
    {
        return Some(fact.table_key.clone());
    }
    tables
        .iter()
        .max_by(|a, b| a.combined.partial_cmp(&b.combined).unwrap_or(std::cmp::Ordering::Equal))
        .map(|t| t.table_key.clone())
}

/// Adjacency keyed by table, each entry carrying the neighbor and the
/// (local_column, remote_column) pair oriented local→remote.
type JoinAdjacency = HashMap<TableKey, Vec<(TableKey, String, String)>>;

fn build_join_adjacency(card: &SchemaCard) -> JoinAdjacency {
    let mut adjacency: JoinAdjacency = HashMap::new();
    for (table_key, profile) in &card.tables {
        for fk in &profile.foreign_keys {
            adjacency
                .entry(table_key.clone())
                .or_default()
                .push((fk.remote_table_key.clone(), fk.local_column.clone(), fk.remote_column.clone()));
            adjacency
                .entry(fk.remote_table_key.clone())
                .or_default()
                .push((table_key.clone(), fk.remote_column.clone(), fk.local_column.clone()));
        }
    }
    adjacency
}

/// BFS spanning tree of FK edges connecting `chosen` tables to `main`,
/// spec §4.10 step 3. Returns the join steps plus any chosen tables left
/// unreachable.
fn build_join_plan(card: &SchemaCard, main: &TableKey, chosen: &HashSet<TableKey>) -> (Vec<JoinStep>, Vec<TableKey>) {
    let adjacency = build_join_adjacency(card);
    let mut visited: HashSet<TableKey> = HashSet::new();
    visited.insert(main.clone());
    let mut queue: VecDeque<TableKey> = VecDeque::new();
    queue.push_back(main.clone());
    let mut steps = Vec::new();

    while let Some(current) = queue.pop_front() {
        if let Some(neighbors) = adjacency.get(&current) {
            for (neighbor, local_col, remote_col) in neighbors {
                if !chosen.contains(neighbor) || visited.contains(neighbor) {
                    continue;
                }
                visited.insert(neighbor.clone());
                steps.push(JoinStep {
                    left_column: format!("{current}.{local_col}"),
                    right_column: format!("{neighbor}.{remote_col}"),
                });
                queue.push_back(neighbor.clone());
            }
        }
    }

    let mut orphans: Vec<TableKey> = chosen.iter().filter(|t| !visited.contains(*t)).cloned().collect();
    orphans.sort();
    (steps, orphans)
}

fn build_key_columns(card: &SchemaCard, chosen: &HashSet<TableKey>, join_plan: &[JoinStep]) -> HashMap<TableKey, Vec<String>> {
    let mut key_columns: HashMap<TableKey, Vec<String>> = HashMap::new();
    for table_key in chosen {
        if let Some(profile) = card.tables.get(table_key) {
            let mut cols: Vec<String> = profile.primary_key.clone();
            for step in join_plan {
                for side in [&step.left_column, &step.right_column] {
                    if let Some((t, c)) = side.rsplit_once('.') {
                        if t == table_key && !cols.contains(&c.to_string()) {
                            cols.push(c.to_string());
                        }
                    }
                }
            }
            key_columns.insert(table_key.clone(), cols);
        }
    }
    key_columns
}

fn group_by_candidates(card: &SchemaCard, main: &TableKey, chosen: &HashSet<TableKey>) -> Vec<String> {
    let mut candidates = Vec::new();
    if let Some(profile) = card.tables.get(main) {
        for col in &profile.columns {
            if matches!(col.role, Role::Category | Role::Date) {
                candidates.push(format!("{main}.{}", col.name));
            }
        }
    }
    for table_key in chosen {
        if table_key == main {
            continue;
        }
        let Some(profile) = card.tables.get(table_key) else { continue };
        if profile.archetype != Archetype::Dimension {
            continue;
        }
        for col in &profile.columns {
            if matches!(col.role, Role::Category | Role::Date) {
                candidates.push(format!("{table_key}.{}", col.name));
            }
        }
    }
    candidates
}

fn filter_candidates(card: &SchemaCard, chosen: &HashSet<TableKey>, explicit_year: Option<i32>) -> Vec<FilterCandidate> {
    let mut candidates = Vec::new();
    for table_key in chosen {
        let Some(profile) = card.tables.get(table_key) else { continue };
        for col in &profile.columns {
            if col.role == Role::Date {
                if let Some(year) = explicit_year {
                    candidates.push(FilterCandidate {
                        column: format!("{table_key}.{}", col.name),
                        predicate_shape: PredicateShape::Between,
                        enumerated_values: None,
                        bounds: Some((format!("{year}-01-01"), format!("{}-01-01", year + 1))),
                    });
                    continue;
                }
            }
            if let Some(values) = &col.enumerated_values {
                let shape = if values.len() <= 1 { PredicateShape::Eq } else { PredicateShape::In };
                candidates.push(FilterCandidate {
                    column: format!("{table_key}.{}", col.name),
                    predicate_shape: shape,
                    enumerated_values: Some(values.clone()),
                    bounds: None,
                });
            } else if col.range.is_some() {
                let shape = if col.role == Role::Date { PredicateShape::Between } else { PredicateShape::GteLt };
                candidates.push(FilterCandidate {
                    column: format!("{table_key}.{}", col.name),
                    predicate_shape: shape,
                    enumerated_values: None,
                    bounds: None,
                });
            }
        }
    }
    candidates
}

/// Pulls a plausible calendar year (1900-2100) out of free text, e.g. "total
/// revenue by region for 2024" -> `Some(2024)`.
fn extract_explicit_year(request: &str) -> Option<i32> {
    request
        .split(|c: char| !c.is_ascii_digit())
        .filter(|tok| tok.len() == 4)
        .find_map(|tok| tok.parse::<i32>().ok())
        .filter(|year| (1900..=2100).contains(year))
}

fn implies_relative_time(request: &str) -> bool {
    let lower = request.to_ascii_lowercase();
    RELATIVE_TIME_HINTS.iter().any(|hint| lower.contains(hint))
}

fn role_priority(role: Role) -> usize {
    match role {
        Role::Date => 0,
        Role::Metric => 1,
        Role::Category => 2,
        Role::Key => 3,
        Role::Text => 4,
        Role::Id => 5,
    }
}

fn selected_columns(
    card: &SchemaCard,
    chosen: &HashSet<TableKey>,
    key_columns: &HashMap<TableKey, Vec<String>>,
    columns_per_table: usize,
) -> HashMap<TableKey, Vec<String>> {
    let mut selected = HashMap::new();
    for table_key in chosen {
        let Some(profile) = card.tables.get(table_key) else { continue };
        let keys = key_columns.get(table_key).cloned().unwrap_or_default();
        let mut ranked: Vec<&crate::profile::ColumnProfile> =
            profile.columns.iter().filter(|c| !keys.contains(&c.name)).collect();
        ranked.sort_by_key(|c| role_priority(c.role));
        let mut cols = keys;
        for col in ranked.into_iter().take(columns_per_table.saturating_sub(cols.len())) {
            cols.push(col.name.clone());
        }
        selected.insert(table_key.clone(), cols);
    }
    selected
}

fn has_role(card: &SchemaCard, table_key: &TableKey, role: Role) -> bool {
    card.tables
        .get(table_key)
        .map(|p| p.columns.iter().any(|c| c.role == role))
        .unwrap_or(false)
}

fn implies_temporal(request: &str) -> bool {
    let lower = request.to_ascii_lowercase();
    TEMPORAL_HINTS.iter().any(|hint| lower.contains(hint))
}

fn implies_aggregation(request: &str) -> bool {
    let lower = request.to_ascii_lowercase();
    AGGREGATION_HINTS.iter().any(|hint| lower.contains(hint))
}

fn compute_confidence(
    tables: &[TableScore],
    chosen: &HashSet<TableKey>,
    orphan_count: usize,
    has_date_column: bool,
    has_metric_column: bool,
) -> f64 {
    let mut sorted_scores: Vec<f64> = tables.iter().map(|t| t.combined).collect();
    sorted_scores.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    let top1 = sorted_scores.first().copied().unwrap_or(0.0);
    let top_k = sorted_scores.last().copied().unwrap_or(0.0);
    let score_dispersion = if top1 > 0.0 { (top1 - top_k) / top1 } else { 0.0 };

    let role_coverage = match (has_date_column, has_metric_column) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.5,
        (false, false) => 0.0,
    };

    let graph_connectivity = if chosen.is_empty() {
        1.0
    } else {
        (chosen.len() - orphan_count) as f64 / chosen.len() as f64
    };

    (0.4 * score_dispersion + 0.3 * role_coverage + 0.3 * graph_connectivity).clamp(0.0, 1.0)
}

/// Assembles a draft SELECT from the chosen columns. Never falls back to a
/// `table.*` wildcard (spec §4.10's no-`SELECT *` invariant): if nothing was
/// selected for the main table, enumerates its known columns from the
/// `SchemaCard` instead, and returns `None` if even that comes up empty.
fn build_draft_sql(
    card: &SchemaCard,
    main: &TableKey,
    join_plan: &[JoinStep],
    selected_columns: &HashMap<TableKey, Vec<String>>,
    filter_candidates: &[FilterCandidate],
) -> Option<String> {
    let mut select_list: Vec<String> = Vec::new();
    let mut table_keys: Vec<&TableKey> = selected_columns.keys().collect();
    table_keys.sort();
    for table_key in &table_keys {
        if let Some(cols) = selected_columns.get(*table_key) {
            for col in cols {
                select_list.push(format!("{table_key}.{col}"));
            }
        }
    }
    if select_list.is_empty() {
        let known_columns = card.tables.get(main)?.columns.iter().map(|c| format!("{main}.{}", c.name));
        select_list.extend(known_columns);
    }
    if select_list.is_empty() {
        return None;
    }

    let mut sql = format!("SELECT {} FROM {main}", select_list.join(", "));
    for step in join_plan {
        let Some((right_table, _)) = step.right_column.rsplit_once('.') else { continue };
        sql.push_str(&format!(" JOIN {right_table} ON {} = {}", step.left_column, step.right_column));
    }

    let mut clauses: Vec<String> = Vec::new();
    for filter in filter_candidates {
        match (&filter.predicate_shape, &filter.enumerated_values, &filter.bounds) {
            (PredicateShape::Eq, Some(values), _) if values.len() == 1 => {
                clauses.push(format!("{} = '{}'", filter.column, values[0].replace('\'', "''")));
            }
            (PredicateShape::Between, _, Some((lower, upper))) => {
                clauses.push(format!("{} BETWEEN '{lower}' AND '{upper}'", filter.column));
            }
            _ => {}
        }
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    Some(sql)
}
