//! Execution Guardrail (C12): SELECT-only enforcement, transpile+validate,
//! bounded-row execution, and structured diagnostics on failure (spec
//! §4.12).

use sqlx::{Column, Row};

use crate::db::{CortexDb, Dialect};
use crate::error::CortexError;
use crate::guardrail::types::{ColumnDescriptor, ExecuteError, ExecuteResult, ExecuteStatus, NextAction};
use crate::sqlast::{KnownIdentifiers, SqlAstService};

pub struct GuardrailOptions {
    pub row_limit: usize,
    pub max_cell_chars: usize,
}

impl Default for GuardrailOptions {
    fn default() -> Self {
        Self { row_limit: 200, max_cell_chars: 2000 }
    }
}

/// Runs the Execution Guardrail pipeline against `sql`, rejecting on the
/// first failing step rather than ever reaching the driver with an unsafe
/// statement.
pub async fn execute_query(
    db: &CortexDb,
    sqlast: &SqlAstService,
    known: &KnownIdentifiers,
    sql: &str,
    opts: &GuardrailOptions,
) -> ExecuteResult {
    let trimmed = sql.trim().trim_end_matches(';').trim();

    // Step 1: SELECT-only enforcement.
    if trimmed.to_ascii_lowercase().contains(';') {
        return error_result(trimmed.to_string(), CortexError::MultiStatement, Vec::new());
    }
    let statements = match sqlast.parse(trimmed, db.dialect()) {
        Ok(s) => s,
        Err(e) => return error_result(trimmed.to_string(), e, Vec::new()),
    };
    if statements.len() != 1 {
        return error_result(trimmed.to_string(), CortexError::MultiStatement, Vec::new());
    }
    if !matches!(statements[0], sqlparser::ast::Statement::Query(_)) {
        return error_result(
            trimmed.to_string(),
            CortexError::NonSelectStatement(trimmed.to_string()),
            Vec::new(),
        );
    }

    // Step 2: transpile to the active dialect.
    let transpiled = match sqlast.auto_transpile(trimmed, db.dialect()) {
        Ok(sql) => sql,
        Err(e) => return error_result(trimmed.to_string(), e, hints_for(sqlast, trimmed, &e, db.dialect(), known)),
    };

    // Step 3: validate; collect notes.
    let validation = sqlast.validate(&transpiled, db.dialect());
    if !validation.valid {
        return error_result(transpiled, CortexError::ParseError("transpiled statement failed validation".to_string()), Vec::new());
    }

    // Step 4: execute with a probe row beyond row_limit, always rolled
    // back so a SELECT statement can never leave residual effects.
    let probe_sql = format!("SELECT * FROM ({transpiled}) AS guardrail_probe LIMIT {}", opts.row_limit + 1);
    let mut tx = match db.pool().begin().await {
        Ok(tx) => tx,
        Err(e) => {
            let cortex_err = CortexError::from(e);
            return error_result(transpiled, cortex_err, Vec::new());
        }
    };
    // Defense in depth beyond the AST-level SELECT-only check (spec §5): a
    // side-effecting call inside a syntactically valid SELECT (`pg_sleep`,
    // `setval`, ...) should still be rejected at the driver. Sqlite has no
    // equivalent session-level read-only mode, so this is a no-op there.
    if let Some(set_read_only) = read_only_statement(db.dialect()) {
        if let Err(e) = sqlx::query(set_read_only).execute(&mut *tx).await {
            let cortex_err = CortexError::from(e);
            let _ = tx.rollback().await;
            return error_result(transpiled, cortex_err, Vec::new());
        }
    }
    let rows = match sqlx::query(&probe_sql).fetch_all(&mut *tx).await {
        Ok(rows) => rows,
        Err(e) => {
            let cortex_err = CortexError::from(e);
            let hints = hints_for(sqlast, &transpiled, &cortex_err, db.dialect(), known);
            let _ = tx.rollback().await;
            // A driver failure that a fuzzy match against the live schema
            // can explain is an unresolved identifier, not an opaque
            // driver error (spec §8 scenario 5).
            let cortex_err = if !hints.is_empty() && matches!(cortex_err, CortexError::DriverError(_)) {
                CortexError::UnresolvedIdentifier(cortex_err.to_string())
            } else {
                cortex_err
            };
            return error_result(transpiled, cortex_err, hints);
        }
    };
    let _ = tx.rollback().await;

    let columns: Vec<ColumnDescriptor> = rows
        .first()
        .map(|r| r.columns().iter().map(|c| ColumnDescriptor { name: c.name().to_string(), vendor_type: c.type_info().to_string() }).collect())
        .unwrap_or_default();

    // Step 5: truncate rows/cells; detect the probe row.
    let truncated_by_rows = rows.len() > opts.row_limit;
    let visible_rows = &rows[..rows.len().min(opts.row_limit)];
    let mut truncated = truncated_by_rows;
    let shaped_rows: Vec<Vec<Option<String>>> = visible_rows
        .iter()
        .map(|row| {
            (0..row.columns().len())
                .map(|i| {
                    let value = stringify_cell(row, i);
                    value.map(|v| {
                        if v.chars().count() > opts.max_cell_chars {
                            truncated = true;
                            v.chars().take(opts.max_cell_chars).collect()
                        } else {
                            v
                        }
                    })
                })
                .collect()
        })
        .collect();

    ExecuteResult {
        normalized_sql: transpiled,
        validation_notes: validation.notes,
        columns,
        rows: shaped_rows,
        truncated,
        status: ExecuteStatus::Ok,
        error: None,
        next_action: if truncated { NextAction::Paginate } else { NextAction::None },
    }
}

fn stringify_cell(row: &sqlx::any::AnyRow, index: usize) -> Option<String> {
    row.try_get::<Option<String>, _>(index)
        .ok()
        .flatten()
        .or_else(|| row.try_get::<Option<i64>, _>(index).ok().flatten().map(|v| v.to_string()))
        .or_else(|| row.try_get::<Option<f64>, _>(index).ok().flatten().map(|v| v.to_string()))
        .or_else(|| row.try_get::<Option<bool>, _>(index).ok().flatten().map(|v| v.to_string()))
}

/// The statement that puts an already-open transaction into a read-only
/// access mode, for dialects where that's valid mid-transaction. MySQL's
/// `SET TRANSACTION READ ONLY` only affects the *next* transaction (issuing
/// it after `BEGIN` is a driver error), and Sqlite has no session-level
/// read-only mode, so only Postgres gets this extra layer; the others still
/// rely on the AST-level SELECT-only check.
fn read_only_statement(dialect: Dialect) -> Option<&'static str> {
    match dialect {
        Dialect::Postgres => Some("SET TRANSACTION READ ONLY"),
        _ => None,
    }
}

fn hints_for(sqlast: &SqlAstService, sql: &str, error: &CortexError, dialect: Dialect, known: &KnownIdentifiers) -> Vec<String> {
    sqlast
        .assist_error(sql, &error.to_string(), dialect, known)
        .into_iter()
        .map(|s| format!("did you mean '{}' instead of '{}'?", s.suggestion, s.original))
        .collect()
}

fn error_result(normalized_sql: String, error: CortexError, hints: Vec<String>) -> ExecuteResult {
    let execute_error = ExecuteError::from_cortex_error(&error, hints);
    ExecuteResult {
        normalized_sql,
        validation_notes: Vec::new(),
        columns: Vec::new(),
        rows: Vec::new(),
        truncated: false,
        status: ExecuteStatus::Error,
        error: Some(execute_error),
        next_action: NextAction::RefinePlan,
    }
}
