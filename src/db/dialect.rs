//! Dialect identification (spec §6): `{generic, postgres, mysql, sqlite,
//! tsql, oracle, snowflake, bigquery}`. The SQL-AST service accepts the full
//! set for transpilation; only postgres/mysql/sqlite have a live driver via
//! `sqlx::Any` (§1 scope: dialect translation beyond these three is still
//! modeled here, but without a connected backend to execute against).

use std::fmt;

use sqlparser::dialect::{
    BigQueryDialect, Dialect as SqlParserDialectTrait, GenericDialect, MsSqlDialect,
    MySqlDialect, PostgreSqlDialect, SnowflakeDialect, SQLiteDialect,
};

/// Dialect identifier shared by the reflection adapter, sampler, and
/// SQL-AST service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    Generic,
    Postgres,
    MySql,
    Sqlite,
    Tsql,
    Oracle,
    Snowflake,
    Bigquery,
}

impl Dialect {
    /// Derive a dialect from a connection string's scheme (spec §6: "Active
    /// dialect is derived from the driver").
    pub fn from_connection_url(url: &str) -> Self {
        let scheme = url.split(':').next().unwrap_or("");
        match scheme.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Dialect::Postgres,
            "mysql" | "mariadb" => Dialect::MySql,
            "sqlite" => Dialect::Sqlite,
            "mssql" | "sqlserver" | "tds" => Dialect::Tsql,
            "oracle" => Dialect::Oracle,
            "snowflake" => Dialect::Snowflake,
            "bigquery" => Dialect::Bigquery,
            _ => Dialect::Generic,
        }
    }

    /// Parse a dialect name as used in MCP requests / `transpile` targets.
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "generic" => Dialect::Generic,
            "postgres" | "postgresql" => Dialect::Postgres,
            "mysql" => Dialect::MySql,
            "sqlite" => Dialect::Sqlite,
            "tsql" | "mssql" => Dialect::Tsql,
            "oracle" => Dialect::Oracle,
            "snowflake" => Dialect::Snowflake,
            "bigquery" => Dialect::Bigquery,
            _ => return None,
        })
    }

    /// The corresponding `sqlparser` dialect implementation.
    pub fn as_sqlparser(&self) -> Box<dyn SqlParserDialectTrait> {
        match self {
            Dialect::Generic => Box::new(GenericDialect {}),
            Dialect::Postgres => Box::new(PostgreSqlDialect {}),
            Dialect::MySql => Box::new(MySqlDialect {}),
            Dialect::Sqlite => Box::new(SQLiteDialect {}),
            Dialect::Tsql => Box::new(MsSqlDialect {}),
            // sqlparser has no dedicated Oracle dialect; generic is the closest safe fallback.
            Dialect::Oracle => Box::new(GenericDialect {}),
            Dialect::Snowflake => Box::new(SnowflakeDialect {}),
            Dialect::Bigquery => Box::new(BigQueryDialect {}),
        }
    }

    /// Whether this dialect has a live `sqlx::Any`-backed driver.
    pub fn has_live_driver(&self) -> bool {
        matches!(self, Dialect::Postgres | Dialect::MySql | Dialect::Sqlite)
    }

    /// The identifier-quoting character this dialect expects, used by the
    /// SQL-AST service's transpiler to requote identifiers when rewriting
    /// across dialects. `Tsql`'s brackets are a `(open, close)` pair that
    /// `sqlparser` renders specially for `quote_style == Some('[')`.
    pub fn identifier_quote_char(&self) -> Option<char> {
        match self {
            Dialect::Generic => None,
            Dialect::Postgres | Dialect::Sqlite | Dialect::Oracle | Dialect::Snowflake => Some('"'),
            Dialect::MySql | Dialect::Bigquery => Some('`'),
            Dialect::Tsql => Some('['),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Dialect::Generic => "generic",
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
            Dialect::Tsql => "tsql",
            Dialect::Oracle => "oracle",
            Dialect::Snowflake => "snowflake",
            Dialect::Bigquery => "bigquery",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_dialect_from_scheme() {
        assert_eq!(
            Dialect::from_connection_url("postgres://u:p@h/db"),
            Dialect::Postgres
        );
        assert_eq!(
            Dialect::from_connection_url("mysql://u:p@h/db"),
            Dialect::MySql
        );
        assert_eq!(Dialect::from_connection_url("sqlite::memory:"), Dialect::Sqlite);
        assert_eq!(Dialect::from_connection_url("weird://x"), Dialect::Generic);
    }

    #[test]
    fn parses_dialect_names_case_insensitively() {
        assert_eq!(Dialect::parse("Postgres"), Some(Dialect::Postgres));
        assert_eq!(Dialect::parse("unknown-thing"), None);
    }
}
