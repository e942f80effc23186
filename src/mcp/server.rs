//! MCP tool surface (spec §6): seven tools over the live `SchemaCard`,
//! Retrieval Engine, Query Planner, and Execution Guardrail. Two tools are
//! gated behind `config.debug_tools` since they expose internal scoring
//! rather than an end-user-facing shape.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rmcp::{
    handler::server::tool::ToolRouter,
    handler::server::wrapper::{Json, Parameters},
    model::*,
    tool, tool_handler, tool_router, ServerHandler, ServiceExt,
};
use tracing::instrument;

use crate::coordinator::{Coordinator, Phase};
use crate::error::CortexError;
use crate::mcp::error::ToolError;
use crate::mcp::types::*;
use crate::plan::PlanRequest;
use crate::profile::{ColumnProfile, Role};
use crate::reflect::{RawColumn, RawTable};
use crate::retrieval::{RetrievalOptions, Strategy};
use crate::sample::sample_table;
use crate::sqlast::{KnownIdentifiers, SqlAstService};

/// MCP server for the schema intelligence and query planning surface.
#[derive(Clone)]
pub struct CortexServer {
    coordinator: Arc<Coordinator>,
    sqlast: Arc<SqlAstService>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl CortexServer {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator, sqlast: Arc::new(SqlAstService::new()), tool_router: Self::tool_router() }
    }

    fn require_ready(&self) -> Result<(), ToolError> {
        let readiness = self.coordinator.readiness();
        match readiness.phase {
            Phase::Ready | Phase::Running => Ok(()),
            _ => Err(ToolError::not_ready(&readiness)),
        }
    }

    fn require_debug_tools(&self) -> Result<(), ToolError> {
        if self.coordinator.config().debug_tools {
            Ok(())
        } else {
            Err(CortexError::Unsupported("debug tools are disabled; set SCHEMA_CORTEX_DEBUG_TOOLS=true to enable".to_string()).into())
        }
    }

    #[tool(description = "Report the schema build's lifecycle phase (idle/starting/running/ready/failed/stopped) and timing. Call this before any other tool if unsure whether the service is ready.")]
    #[instrument(name = "mcp.get_init_status", skip_all)]
    pub async fn get_init_status(&self, _request: Parameters<GetInitStatusInput>) -> Result<Json<InitStatusResponse>, ToolError> {
        Ok(Json(self.coordinator.readiness().into()))
    }

    #[tool(description = "Summarize the connected database: dialect, schemas, table count, and subject areas (communities of related tables detected from foreign keys).")]
    #[instrument(name = "mcp.get_database_overview", skip_all)]
    pub async fn get_database_overview(
        &self,
        request: Parameters<GetDatabaseOverviewInput>,
    ) -> Result<Json<DatabaseOverviewResponse>, ToolError> {
        self.require_ready()?;
        let input = request.0;
        let card = self.coordinator.card().ok_or_else(|| ToolError::not_ready(&self.coordinator.readiness()))?;

        let subject_areas = if input.include_subject_areas {
            let mut areas: Vec<SubjectAreaSummary> = card
                .subject_areas
                .values()
                .map(|a| SubjectAreaSummary {
                    id: a.id.clone(),
                    name: a.name.clone(),
                    table_count: a.table_keys.len(),
                    summary: a.summary.clone(),
                })
                .collect();
            areas.sort_by(|a, b| b.table_count.cmp(&a.table_count).then_with(|| a.id.cmp(&b.id)));
            areas.truncate(input.area_limit);
            areas
        } else {
            Vec::new()
        };

        Ok(Json(DatabaseOverviewResponse {
            dialect: card.dialect.clone(),
            schemas: card.schemas.clone(),
            table_count: card.tables.len(),
            subject_areas,
        }))
    }

    #[tool(description = "Plan a query for a natural-language request: ranks candidate tables, infers a join plan, proposes group-by and filter candidates, and returns clarifications when the request is ambiguous or under-specified. Returns a draft SELECT when confidence is high enough.")]
    #[instrument(name = "mcp.plan_query_for_intent", skip_all)]
    pub async fn plan_query_for_intent(&self, request: Parameters<PlanQueryForIntentInput>) -> Result<Json<crate::plan::PlanResult>, ToolError> {
        self.require_ready()?;
        let input = request.0;
        let card = self.coordinator.card().ok_or_else(|| ToolError::not_ready(&self.coordinator.readiness()))?;
        let embedder = self.coordinator.embedder();
        let semantic_index = self.coordinator.semantic_index();

        let plan_request = PlanRequest {
            request: input.request,
            constraints: input.constraints,
            detail_level: input.detail_level,
            budget: input.budget.map(Into::into),
        };

        let result = crate::plan::plan_query(&card, embedder.as_ref(), semantic_index.as_ref(), &plan_request).await;
        Ok(Json(result))
    }

    #[tool(description = "Get the full profile of one table: columns with roles and sample values, primary key, foreign-key relationships (incoming and outgoing), and heuristic common-filter hints.")]
    #[instrument(name = "mcp.get_table_info", skip_all)]
    pub async fn get_table_info(&self, request: Parameters<GetTableInfoInput>) -> Result<Json<TableInfoResponse>, ToolError> {
        self.require_ready()?;
        let input = request.0;
        let card = self.coordinator.card().ok_or_else(|| ToolError::not_ready(&self.coordinator.readiness()))?;

        let profile = card
            .tables
            .get(&input.table_key)
            .ok_or_else(|| CortexError::InvalidTableKey(input.table_key.clone()))?;

        let role_filter = input.column_role_filter.as_deref().and_then(parse_role);

        let sample_values = if input.include_samples {
            sample_live_values(self.coordinator.db(), profile, input.max_sample_values, self.coordinator.config().sample_timeout).await
        } else {
            HashMap::new()
        };

        let columns: Vec<ColumnInfo> = profile
            .columns
            .iter()
            .filter(|c| role_filter.map(|r| r == c.role).unwrap_or(true))
            .map(|c| ColumnInfo {
                name: c.name.clone(),
                vendor_type: c.vendor_type.clone(),
                role: format!("{:?}", c.role).to_lowercase(),
                nullable: c.nullable,
                is_primary_key: c.is_primary_key,
                is_foreign_key: c.is_foreign_key,
                sample_values: sample_values
                    .get(&c.name)
                    .cloned()
                    .or_else(|| c.enumerated_values.clone())
                    .unwrap_or_default(),
            })
            .collect();

        let mut relationships: Vec<RelationshipInfo> = profile
            .foreign_keys
            .iter()
            .map(|fk| RelationshipInfo {
                local_column: fk.local_column.clone(),
                other_table: fk.remote_table_key.clone(),
                other_column: fk.remote_column.clone(),
                direction: RelationshipDirection::Outgoing,
            })
            .collect();

        for (other_key, other_profile) in card.tables.iter() {
            if other_key == &input.table_key {
                continue;
            }
            for fk in &other_profile.foreign_keys {
                if fk.remote_table_key == input.table_key {
                    relationships.push(RelationshipInfo {
                        local_column: fk.remote_column.clone(),
                        other_table: other_key.clone(),
                        other_column: fk.local_column.clone(),
                        direction: RelationshipDirection::Incoming,
                    });
                }
            }
            if relationships.len() >= input.relationship_limit {
                break;
            }
        }
        relationships.truncate(input.relationship_limit);

        let common_filters = common_filter_hints(&profile.columns);

        Ok(Json(TableInfoResponse {
            table_key: profile.table_key.clone(),
            archetype: format!("{:?}", profile.archetype).to_lowercase(),
            summary: profile.summary.clone(),
            subject_area_id: profile.subject_area_id.clone(),
            centrality: profile.centrality,
            is_archive: profile.is_archive,
            is_audit_like: profile.is_audit_like,
            primary_key: profile.primary_key.clone(),
            columns,
            relationships,
            common_filters,
        }))
    }

    #[tool(description = "Debug tool: rank tables against a free-text query by lexical, embedding, or fused similarity, with per-component scores. Only registered when debug tools are enabled.")]
    #[instrument(name = "mcp.find_tables", skip_all)]
    pub async fn find_tables(&self, request: Parameters<FindTablesInput>) -> Result<Json<FindTablesResponse>, ToolError> {
        self.require_ready()?;
        self.require_debug_tools()?;
        let input = request.0;
        let card = self.coordinator.card().ok_or_else(|| ToolError::not_ready(&self.coordinator.readiness()))?;
        let embedder = self.coordinator.embedder();
        let semantic_index = self.coordinator.semantic_index();

        let strategy = input.approach.as_deref().map(parse_strategy).unwrap_or(Strategy::Combined);
        let opts = RetrievalOptions { k: input.limit, strategy, alpha: input.alpha.unwrap_or(0.5) };

        let scored = crate::retrieval::retrieve(&card, embedder.as_ref(), semantic_index.as_ref(), &input.query, &opts).await;

        let results = scored
            .into_iter()
            .map(|s| RankedTable {
                table_key: s.table_key,
                score: s.combined_score,
                components: TableScoreComponents {
                    lexical: s.lexical_score,
                    embedding: s.embedding_score,
                    combined: s.combined_score,
                    archive_penalized: s.archive_penalized,
                },
            })
            .collect();

        Ok(Json(FindTablesResponse { results }))
    }

    #[tool(description = "Debug tool: fuzzy-search column names across the schema for a keyword, optionally scoped to one table. Only registered when debug tools are enabled.")]
    #[instrument(name = "mcp.find_columns", skip_all)]
    pub async fn find_columns(&self, request: Parameters<FindColumnsInput>) -> Result<Json<FindColumnsResponse>, ToolError> {
        self.require_ready()?;
        self.require_debug_tools()?;
        let input = request.0;
        let card = self.coordinator.card().ok_or_else(|| ToolError::not_ready(&self.coordinator.readiness()))?;

        let mut results: Vec<RankedColumn> = card
            .tables
            .iter()
            .filter(|(key, _)| input.by_table.as_deref().map(|t| key.contains(t)).unwrap_or(true))
            .flat_map(|(key, profile)| {
                profile.columns.iter().map(move |c| RankedColumn {
                    table_key: key.clone(),
                    column: c.name.clone(),
                    score: column_match_score(&input.keyword, &c.name),
                })
            })
            .filter(|r| r.score > 0.0)
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(input.limit);

        Ok(Json(FindColumnsResponse { results }))
    }

    #[tool(description = "Execute a single read-only SELECT statement against the connected database. Rejects non-SELECT and multi-statement input outright; truncates oversized result sets and cells; on failure, returns an assist hint suggesting the closest known table/column name.")]
    #[instrument(name = "mcp.execute_query", skip_all)]
    pub async fn execute_query(&self, request: Parameters<ExecuteQueryInput>) -> Result<Json<crate::guardrail::ExecuteResult>, ToolError> {
        self.require_ready()?;
        let input = request.0;
        let card = self.coordinator.card().ok_or_else(|| ToolError::not_ready(&self.coordinator.readiness()))?;

        let mut known = KnownIdentifiers::default();
        for (table_key, profile) in &card.tables {
            known.tables.push(table_key.clone());
            for column in &profile.columns {
                known.columns.push(column.name.clone());
            }
        }

        let config = self.coordinator.config();
        let opts = crate::guardrail::GuardrailOptions { row_limit: config.row_limit, max_cell_chars: config.max_cell_chars };
        let result = crate::guardrail::execute_query(self.coordinator.db(), &self.sqlast, &known, &input.sql, &opts).await;
        Ok(Json(result))
    }
}

#[tool_handler]
impl ServerHandler for CortexServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "schema-cortex".to_string(),
                title: Some("Schema Cortex".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                r#"# Schema Cortex

Schema intelligence and guarded query planning for a connected relational database.

## Workflow
1. get_init_status — confirm phase is "ready" before calling anything else.
2. get_database_overview — orient on dialect, schemas, and subject areas.
3. plan_query_for_intent — turn a natural-language request into a ranked table set, join plan, and (when confident) a draft SELECT.
4. get_table_info — inspect one table's columns, relationships, and common filters before hand-writing SQL.
5. execute_query — run a single read-only SELECT; results are truncated to a bounded row/cell size and every statement runs inside a rolled-back transaction.

## Debug tools
find_tables and find_columns expose raw retrieval scores and are only available when debug tools are enabled.
"#
                .to_string(),
            ),
        }
    }
}

fn parse_role(name: &str) -> Option<Role> {
    Some(match name.to_ascii_lowercase().as_str() {
        "key" => Role::Key,
        "id" => Role::Id,
        "date" => Role::Date,
        "metric" => Role::Metric,
        "category" => Role::Category,
        "text" => Role::Text,
        _ => return None,
    })
}

fn parse_strategy(name: &str) -> Strategy {
    match name.to_ascii_lowercase().as_str() {
        "lexical" => Strategy::Lexical,
        "embedding_table" => Strategy::EmbeddingTable,
        "embedding_column" => Strategy::EmbeddingColumn,
        _ => Strategy::Combined,
    }
}

fn common_filter_hints(columns: &[ColumnProfile]) -> Vec<CommonFilterHint> {
    columns
        .iter()
        .filter_map(|c| match c.role {
            Role::Date => Some(CommonFilterHint { column: c.name.clone(), reason: "date/time column; useful for range filters".to_string() }),
            Role::Category => Some(CommonFilterHint {
                column: c.name.clone(),
                reason: "low-cardinality category; useful for equality/IN filters".to_string(),
            }),
            Role::Metric => Some(CommonFilterHint { column: c.name.clone(), reason: "numeric metric; useful for threshold filters".to_string() }),
            _ => None,
        })
        .collect()
}

/// Fuzzy column-name match score in `(0, 1]`; 0 means no usable match.
/// Exact substring matches score highest; otherwise falls back to
/// normalized edit distance, the same primitive `SqlAstService::assist_error`
/// uses for identifier suggestions.
fn column_match_score(keyword: &str, column: &str) -> f64 {
    let keyword_lower = keyword.to_ascii_lowercase();
    let column_lower = column.to_ascii_lowercase();
    if column_lower == keyword_lower {
        return 1.0;
    }
    if column_lower.contains(&keyword_lower) {
        return 0.9;
    }
    let distance = rapidfuzz::distance::levenshtein::distance(keyword_lower.chars(), column_lower.chars());
    let longest = keyword_lower.len().max(column_lower.len()).max(1);
    if distance >= longest {
        return 0.0;
    }
    1.0 - (distance as f64 / longest as f64)
}

/// Live-samples representative values for a table's columns, used by
/// `get_table_info` when `include_samples` is requested instead of relying
/// solely on the profiled `enumerated_values`/`range`.
async fn sample_live_values(
    db: &crate::db::CortexDb,
    profile: &crate::card::TableProfile,
    max_values: usize,
    timeout: std::time::Duration,
) -> HashMap<String, Vec<String>> {
    let (schema, name) = match profile.table_key.split_once('.') {
        Some((schema, name)) => (schema.to_string(), name.to_string()),
        None => return HashMap::new(),
    };

    let raw_table = RawTable {
        schema,
        name,
        columns: profile
            .columns
            .iter()
            .map(|c| RawColumn { name: c.name.clone(), vendor_type: c.vendor_type.clone(), nullable: c.nullable, is_primary_key: c.is_primary_key })
            .collect(),
        primary_key: profile.primary_key.clone(),
        foreign_keys: profile.foreign_keys.clone(),
        row_count_estimate: None,
    };

    let sample = sample_table(db, &raw_table, max_values.max(1) * 5, timeout).await;

    let mut out: HashMap<String, Vec<String>> = HashMap::new();
    for (col_idx, col_name) in sample.column_names.iter().enumerate() {
        let mut seen = HashSet::new();
        let mut values = Vec::new();
        for row in &sample.rows {
            if let Some(Some(v)) = row.get(col_idx) {
                if seen.insert(v.clone()) {
                    values.push(v.clone());
                }
            }
            if values.len() >= max_values {
                break;
            }
        }
        out.insert(col_name.clone(), values);
    }
    out
}

/// Builds the server from a started coordinator, serves stdio, and shuts
/// the coordinator down gracefully on `SIGINT`/`SIGTERM`-equivalent signals.
pub async fn run_mcp_server(coordinator: Arc<Coordinator>) -> anyhow::Result<()> {
    let server = CortexServer::new(Arc::clone(&coordinator));
    tracing::info!("starting schema-cortex MCP server v{}", env!("CARGO_PKG_VERSION"));

    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let service = server.serve(transport).await?;
    tracing::info!("MCP server listening on stdio");

    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("shutdown signal received");
        coordinator.shutdown(std::time::Duration::from_secs(5)).await;
    });

    service.waiting().await?;
    tracing::info!("MCP server shutting down");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_match_score_prefers_exact_then_substring_then_fuzzy() {
        assert_eq!(column_match_score("total", "total"), 1.0);
        assert!(column_match_score("total", "total_amount") > 0.8);
        assert!(column_match_score("custmer", "customer_id") > 0.0);
        assert_eq!(column_match_score("zzzzzzzzzz", "a"), 0.0);
    }

    #[test]
    fn parse_role_is_case_insensitive() {
        assert_eq!(parse_role("Date"), Some(Role::Date));
        assert_eq!(parse_role("nonsense"), None);
    }

    #[test]
    fn parse_strategy_defaults_to_combined() {
        assert_eq!(parse_strategy("lexical"), Strategy::Lexical);
        assert_eq!(parse_strategy("unknown"), Strategy::Combined);
    }
}
