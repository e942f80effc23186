//! SQL-AST Service (C11): dialect-aware parse, validate, transpile,
//! optimize, metadata extraction, and fuzzy error assistance (spec §4.11).

use std::collections::HashSet;

use regex::Regex;
use sqlparser::ast::{Expr, ObjectName, Query, Select, SelectItem, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::parser::Parser;
use std::sync::LazyLock;

use crate::db::Dialect;
use crate::error::CortexError;
use crate::sqlast::cache::ParseCache;
use crate::sqlast::types::{AssistSuggestion, KnownIdentifiers, NoteSeverity, SqlMetadata, ValidationNote, ValidationResult};

static QUOTED_IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"["'`]([A-Za-z_][A-Za-z0-9_]*)["'`]"#).unwrap());

const TRY_DIALECTS_FOR_AUTO_DETECT: &[Dialect] =
    &[Dialect::Postgres, Dialect::MySql, Dialect::Sqlite, Dialect::Tsql, Dialect::Generic];
const MAX_ASSIST_DISTANCE: usize = 2;

pub struct SqlAstService {
    cache: ParseCache,
}

impl SqlAstService {
    pub fn new() -> Self {
        Self { cache: ParseCache::new() }
    }

    /// Parses `sql` under `dialect`, consulting (and populating) the parse
    /// cache keyed by `(sql, dialect)`.
    pub fn parse(&self, sql: &str, dialect: Dialect) -> Result<Vec<Statement>, CortexError> {
        if let Some(cached) = self.cache.get(sql, dialect) {
            return Ok(cached);
        }
        let parser_dialect = dialect.as_sqlparser();
        let statements = Parser::parse_sql(parser_dialect.as_ref(), sql)
            .map_err(|e| CortexError::ParseError(format!("{e}")))?;
        self.cache.insert(sql, dialect, statements.clone());
        Ok(statements)
    }

    pub fn validate(&self, sql: &str, dialect: Dialect) -> ValidationResult {
        match self.parse(sql, dialect) {
            Ok(statements) => {
                let mut notes = Vec::new();
                if statements.len() > 1 {
                    notes.push(ValidationNote {
                        message: "multiple statements present; only a single statement is expected".to_string(),
                        severity: NoteSeverity::Warning,
                    });
                }
                if statements.is_empty() {
                    notes.push(ValidationNote { message: "no statement found".to_string(), severity: NoteSeverity::Error });
                    return ValidationResult { valid: false, notes };
                }
                ValidationResult { valid: true, notes }
            }
            Err(e) => ValidationResult {
                valid: false,
                notes: vec![ValidationNote { message: e.to_string(), severity: NoteSeverity::Error }],
            },
        }
    }

    /// Re-parses under `from`, requotes every identifier for `to`'s quoting
    /// convention, and hoists a trailing numeric `LIMIT` into a leading
    /// `TOP (n)` when `to` is `Tsql` (which has no `LIMIT` clause).
    pub fn transpile(&self, sql: &str, from: Dialect, to: Dialect) -> Result<String, CortexError> {
        let mut statements = self.parse(sql, from)?;
        let quote = to.identifier_quote_char();
        for statement in &mut statements {
            requote_statement(statement, quote);
        }
        let rendered = statements.iter().map(|s| s.to_string()).collect::<Vec<_>>().join("; ");
        Ok(rewrite_limit_for_tsql(&rendered, to))
    }

    /// Detects the source dialect by parse trial, in a fixed priority
    /// order, then transpiles to `target`.
    pub fn auto_transpile(&self, sql: &str, target: Dialect) -> Result<String, CortexError> {
        for candidate in TRY_DIALECTS_FOR_AUTO_DETECT {
            if self.parse(sql, *candidate).is_ok() {
                return self.transpile(sql, *candidate, target);
            }
        }
        Err(CortexError::ParseError("no dialect could parse this statement".to_string()))
    }

    /// Canonicalizes formatting and strips degenerate predicates. Full
    /// cost-based rewriting is out of scope; this is a best-effort tidy-up.
    pub fn optimize(&self, sql: &str, dialect: Dialect) -> Result<String, CortexError> {
        let transpiled = self.transpile(sql, dialect, dialect)?;
        let cleaned = transpiled.replace(" WHERE 1 = 1 AND ", " WHERE ").replace(" WHERE 1 = 1", "");
        Ok(sqlformat::format(&cleaned, &sqlformat::QueryParams::None, &sqlformat::FormatOptions::default()))
    }

    pub fn extract_metadata(&self, sql: &str, dialect: Dialect) -> Result<SqlMetadata, CortexError> {
        let statements = self.parse(sql, dialect)?;
        let mut tables = Vec::new();
        let mut columns = Vec::new();
        for statement in &statements {
            if let Statement::Query(query) = statement {
                walk_query(query, &mut tables, &mut columns);
            }
        }
        dedup_in_place(&mut tables);
        dedup_in_place(&mut columns);
        Ok(SqlMetadata { tables, columns })
    }

    /// Suggests fixes for a driver error by fuzzy-matching quoted
    /// identifiers in `driver_message` (falling back to identifiers
    /// extracted from `sql`) against `known`, within an edit distance of 2.
    pub fn assist_error(&self, sql: &str, driver_message: &str, dialect: Dialect, known: &KnownIdentifiers) -> Vec<AssistSuggestion> {
        let mut candidates: Vec<String> =
            QUOTED_IDENTIFIER_RE.captures_iter(driver_message).map(|c| c[1].to_string()).collect();

        if candidates.is_empty() {
            if let Ok(metadata) = self.extract_metadata(sql, dialect) {
                let known_tables: HashSet<&str> = known.tables.iter().map(String::as_str).collect();
                let known_columns: HashSet<&str> = known.columns.iter().map(String::as_str).collect();
                candidates.extend(metadata.tables.into_iter().filter(|t| !known_tables.contains(t.as_str())));
                candidates.extend(metadata.columns.into_iter().filter(|c| !known_columns.contains(c.as_str())));
            }
        }

        let pool: Vec<&str> = known.tables.iter().chain(known.columns.iter()).map(String::as_str).collect();

        let mut suggestions = Vec::new();
        for candidate in candidates {
            if let Some((best, distance)) = best_match(&candidate, &pool) {
                if distance <= MAX_ASSIST_DISTANCE {
                    suggestions.push(AssistSuggestion { original: candidate, suggestion: best.to_string(), distance });
                }
            }
        }
        suggestions
    }
}

impl Default for SqlAstService {
    fn default() -> Self {
        Self::new()
    }
}

fn best_match<'a>(candidate: &str, pool: &[&'a str]) -> Option<(&'a str, usize)> {
    pool.iter()
        .map(|name| (*name, rapidfuzz::distance::levenshtein::distance(candidate.chars(), name.chars())))
        .min_by_key(|(_, distance)| *distance)
}

fn dedup_in_place(values: &mut Vec<String>) {
    let mut seen = HashSet::new();
    values.retain(|v| seen.insert(v.clone()));
}

fn requote_statement(statement: &mut Statement, quote: Option<char>) {
    if let Statement::Query(query) = statement {
        requote_query(query, quote);
    }
}

fn requote_query(query: &mut Query, quote: Option<char>) {
    if let Some(with) = &mut query.with {
        for cte in &mut with.cte_tables {
            requote_query(&mut cte.query, quote);
        }
    }
    requote_set_expr(&mut query.body, quote);
    if let Some(order_by) = &mut query.order_by {
        for expr in &mut order_by.exprs {
            requote_expr(&mut expr.expr, quote);
        }
    }
}

fn requote_set_expr(set_expr: &mut SetExpr, quote: Option<char>) {
    match set_expr {
        SetExpr::Select(select) => requote_select(select, quote),
        SetExpr::Query(query) => requote_query(query, quote),
        SetExpr::SetOperation { left, right, .. } => {
            requote_set_expr(left, quote);
            requote_set_expr(right, quote);
        }
        _ => {}
    }
}

fn requote_select(select: &mut Select, quote: Option<char>) {
    for table_with_joins in &mut select.from {
        requote_table_with_joins(table_with_joins, quote);
    }
    for item in &mut select.projection {
        if let SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } = item {
            requote_expr(expr, quote);
        }
    }
    if let Some(selection) = &mut select.selection {
        requote_expr(selection, quote);
    }
    if let Some(having) = &mut select.having {
        requote_expr(having, quote);
    }
}

fn requote_table_with_joins(table_with_joins: &mut TableWithJoins, quote: Option<char>) {
    requote_table_factor(&mut table_with_joins.relation, quote);
    for join in &mut table_with_joins.joins {
        requote_table_factor(&mut join.relation, quote);
    }
}

fn requote_table_factor(table_factor: &mut TableFactor, quote: Option<char>) {
    match table_factor {
        TableFactor::Table { name, .. } => requote_object_name(name, quote),
        TableFactor::Derived { subquery, .. } => requote_query(subquery, quote),
        TableFactor::NestedJoin { table_with_joins, .. } => requote_table_with_joins(table_with_joins, quote),
        _ => {}
    }
}

fn requote_object_name(name: &mut ObjectName, quote: Option<char>) {
    for ident in &mut name.0 {
        ident.quote_style = quote;
    }
}

fn requote_expr(expr: &mut Expr, quote: Option<char>) {
    match expr {
        Expr::Identifier(ident) => ident.quote_style = quote,
        Expr::CompoundIdentifier(parts) => {
            for ident in parts {
                ident.quote_style = quote;
            }
        }
        Expr::BinaryOp { left, right, .. } => {
            requote_expr(left, quote);
            requote_expr(right, quote);
        }
        Expr::UnaryOp { expr, .. } => requote_expr(expr, quote),
        Expr::Nested(inner) => requote_expr(inner, quote),
        Expr::Cast { expr, .. } => requote_expr(expr, quote),
        Expr::Between { expr, low, high, .. } => {
            requote_expr(expr, quote);
            requote_expr(low, quote);
            requote_expr(high, quote);
        }
        Expr::InList { expr, list, .. } => {
            requote_expr(expr, quote);
            for item in list {
                requote_expr(item, quote);
            }
        }
        Expr::IsNull(inner) | Expr::IsNotNull(inner) => requote_expr(inner, quote),
        _ => {}
    }
}

/// `sqlparser`'s `Display` impl always renders a numeric `LIMIT` in the
/// ANSI trailing position; MSSQL has no such clause, so for a `Tsql`
/// target a simple trailing `LIMIT n` is hoisted into a leading `TOP (n)`.
fn rewrite_limit_for_tsql(sql: &str, to: Dialect) -> String {
    if to != Dialect::Tsql {
        return sql.to_string();
    }
    static LIMIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s+LIMIT\s+(\d+)\s*$").unwrap());
    static SELECT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^SELECT\b").unwrap());
    let trimmed = sql.trim_end();
    let Some(caps) = LIMIT_RE.captures(trimmed) else { return sql.to_string() };
    let top = caps[1].to_string();
    let without_limit = LIMIT_RE.replace(trimmed, "");
    SELECT_RE.replace(&without_limit, format!("SELECT TOP ({top})")).into_owned()
}

fn walk_query(query: &Query, tables: &mut Vec<String>, columns: &mut Vec<String>) {
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            walk_query(&cte.query, tables, columns);
        }
    }
    walk_set_expr(&query.body, tables, columns);
}

fn walk_set_expr(set_expr: &SetExpr, tables: &mut Vec<String>, columns: &mut Vec<String>) {
    match set_expr {
        SetExpr::Select(select) => walk_select(select, tables, columns),
        SetExpr::Query(query) => walk_query(query, tables, columns),
        SetExpr::SetOperation { left, right, .. } => {
            walk_set_expr(left, tables, columns);
            walk_set_expr(right, tables, columns);
        }
        _ => {}
    }
}

fn walk_select(select: &Select, tables: &mut Vec<String>, columns: &mut Vec<String>) {
    for table_with_joins in &select.from {
        walk_table_with_joins(table_with_joins, tables, columns);
    }
    for item in &select.projection {
        match item {
            SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => walk_expr(expr, columns),
            SelectItem::QualifiedWildcard(name, _) => tables.push(name.to_string()),
            SelectItem::Wildcard(_) => {}
        }
    }
    if let Some(selection) = &select.selection {
        walk_expr(selection, columns);
    }
    if let Some(having) = &select.having {
        walk_expr(having, columns);
    }
}

fn walk_table_with_joins(table_with_joins: &TableWithJoins, tables: &mut Vec<String>, columns: &mut Vec<String>) {
    walk_table_factor(&table_with_joins.relation, tables, columns);
    for join in &table_with_joins.joins {
        walk_table_factor(&join.relation, tables, columns);
    }
}

fn walk_table_factor(table_factor: &TableFactor, tables: &mut Vec<String>, columns: &mut Vec<String>) {
    match table_factor {
        TableFactor::Table { name, .. } => tables.push(name.to_string()),
        TableFactor::Derived { subquery, .. } => walk_query(subquery, tables, columns),
        TableFactor::NestedJoin { table_with_joins, .. } => walk_table_with_joins(table_with_joins, tables, columns),
        _ => {}
    }
}

fn walk_expr(expr: &Expr, columns: &mut Vec<String>) {
    match expr {
        Expr::Identifier(ident) => columns.push(ident.value.clone()),
        Expr::CompoundIdentifier(parts) => {
            columns.push(parts.iter().map(|p| p.value.as_str()).collect::<Vec<_>>().join("."));
        }
        Expr::BinaryOp { left, right, .. } => {
            walk_expr(left, columns);
            walk_expr(right, columns);
        }
        Expr::UnaryOp { expr, .. } => walk_expr(expr, columns),
        Expr::Nested(inner) => walk_expr(inner, columns),
        Expr::Cast { expr, .. } => walk_expr(expr, columns),
        Expr::Between { expr, low, high, .. } => {
            walk_expr(expr, columns);
            walk_expr(low, columns);
            walk_expr(high, columns);
        }
        Expr::InList { expr, list, .. } => {
            walk_expr(expr, columns);
            for item in list {
                walk_expr(item, columns);
            }
        }
        Expr::IsNull(inner) | Expr::IsNotNull(inner) => walk_expr(inner, columns),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_caches_a_simple_select() {
        let service = SqlAstService::new();
        let result = service.validate("SELECT id, name FROM customers WHERE region = 'west'", Dialect::Postgres);
        assert!(result.valid);
    }

    #[test]
    fn rejects_multiple_statements_with_a_note() {
        let service = SqlAstService::new();
        let result = service.validate("SELECT 1; SELECT 2", Dialect::Postgres);
        assert!(result.valid);
        assert!(result.notes.iter().any(|n| n.severity == NoteSeverity::Warning));
    }

    #[test]
    fn extract_metadata_collects_tables_and_columns() {
        let service = SqlAstService::new();
        let metadata = service
            .extract_metadata("SELECT o.id, o.total_amount FROM orders o JOIN customers c ON o.customer_id = c.id", Dialect::Postgres)
            .unwrap();
        assert!(metadata.tables.contains(&"orders".to_string()));
        assert!(metadata.tables.contains(&"customers".to_string()));
        assert!(metadata.columns.iter().any(|c| c.ends_with("total_amount")));
    }

    #[test]
    fn assist_error_suggests_closest_known_table() {
        let service = SqlAstService::new();
        let known = KnownIdentifiers { tables: vec!["orders".to_string()], columns: vec!["total_amount".to_string()] };
        let suggestions = service.assist_error(
            "SELECT * FROM ordrs",
            r#"relation "ordrs" does not exist"#,
            Dialect::Postgres,
            &known,
        );
        assert!(suggestions.iter().any(|s| s.suggestion == "orders"));
    }

    #[test]
    fn auto_transpile_detects_dialect_and_rewrites() {
        let service = SqlAstService::new();
        let sql = service.auto_transpile("SELECT 1", Dialect::MySql).unwrap();
        assert!(sql.to_ascii_uppercase().contains("SELECT"));
    }

    #[test]
    fn transpile_requotes_identifiers_for_the_target_dialect() {
        let service = SqlAstService::new();
        let sql = service.transpile("SELECT id FROM orders", Dialect::Postgres, Dialect::MySql).unwrap();
        assert!(sql.contains('`'), "expected backtick-quoted identifiers, got {sql}");
    }

    #[test]
    fn transpile_hoists_limit_into_top_for_tsql() {
        let service = SqlAstService::new();
        let sql = service.transpile("SELECT id FROM orders LIMIT 5", Dialect::Postgres, Dialect::Tsql).unwrap();
        assert!(sql.to_ascii_uppercase().starts_with("SELECT TOP (5)"), "got {sql}");
        assert!(!sql.to_ascii_uppercase().contains("LIMIT"));
    }
}
