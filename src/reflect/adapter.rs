//! Reflection Adapter (spec §4.1, C1).
//!
//! Enumerates schemas, tables, columns, keys, and FKs via the database
//! driver abstraction (`CortexDb`). Vendor system schemas are dropped.
//! Reflection of an individual table that errors is skipped with a warning
//! rather than failing the whole pass; the call only fails if zero tables
//! end up reflectable.

use std::collections::BTreeSet;

use sqlx::Row;

use crate::db::{CortexDb, Dialect};
use crate::error::CortexError;
use crate::reflect::raw_schema::{table_key, RawColumn, RawForeignKey, RawSchema, RawTable};

const POSTGRES_SYSTEM_SCHEMAS: &[&str] = &["pg_catalog", "information_schema", "pg_toast"];
const MYSQL_SYSTEM_SCHEMAS: &[&str] = &[
    "information_schema",
    "mysql",
    "performance_schema",
    "sys",
];

/// Options controlling the reflected scope (spec §4.1 request fields).
#[derive(Debug, Clone, Default)]
pub struct ReflectOptions {
    pub include_schemas: Option<Vec<String>>,
    pub exclude_schemas: Option<Vec<String>>,
    pub max_tables: Option<usize>,
}

/// Reflect the live database into a `RawSchema`.
pub async fn reflect(db: &CortexDb, opts: &ReflectOptions) -> Result<RawSchema, CortexError> {
    let mut raw = match db.dialect() {
        Dialect::Postgres => reflect_postgres(db, opts).await?,
        Dialect::MySql => reflect_mysql(db, opts).await?,
        Dialect::Sqlite => reflect_sqlite(db, opts).await?,
        other => {
            return Err(CortexError::ReflectionFailed(format!(
                "no live reflection driver for dialect {other}"
            )))
        }
    };

    if let Some(max) = opts.max_tables {
        if raw.tables.len() > max {
            raw.tables.truncate(max);
        }
    }

    if raw.tables.is_empty() {
        return Err(CortexError::ReflectionFailed(
            "zero tables were reflectable".to_string(),
        ));
    }

    Ok(raw)
}

fn schema_allowed(schema: &str, opts: &ReflectOptions, system: &[&str]) -> bool {
    if system.contains(&schema) {
        return false;
    }
    if let Some(include) = &opts.include_schemas {
        if !include.iter().any(|s| s == schema) {
            return false;
        }
    }
    if let Some(exclude) = &opts.exclude_schemas {
        if exclude.iter().any(|s| s == schema) {
            return false;
        }
    }
    true
}

async fn reflect_postgres(db: &CortexDb, opts: &ReflectOptions) -> Result<RawSchema, CortexError> {
    let mut warnings = Vec::new();
    let schema_rows = db
        .fetch_all("SELECT DISTINCT table_schema FROM information_schema.tables WHERE table_type = 'BASE TABLE'")
        .await?;
    let mut schemas: BTreeSet<String> = BTreeSet::new();
    for row in &schema_rows {
        let schema: String = row.try_get(0).unwrap_or_default();
        if schema_allowed(&schema, opts, POSTGRES_SYSTEM_SCHEMAS) {
            schemas.insert(schema);
        }
    }

    let table_rows = db
        .fetch_all(
            "SELECT table_schema, table_name FROM information_schema.tables \
             WHERE table_type = 'BASE TABLE' ORDER BY table_schema, table_name",
        )
        .await?;

    let mut tables = Vec::new();
    for row in &table_rows {
        let schema: String = row.try_get(0).unwrap_or_default();
        let name: String = row.try_get(1).unwrap_or_default();
        if !schemas.contains(&schema) {
            continue;
        }
        match reflect_postgres_table(db, &schema, &name).await {
            Ok(table) => tables.push(table),
            Err(e) => warnings.push(format!("skipped {schema}.{name}: {e}")),
        }
    }

    Ok(RawSchema {
        schemas: schemas.into_iter().collect(),
        tables,
        warnings,
    })
}

async fn reflect_postgres_table(
    db: &CortexDb,
    schema: &str,
    name: &str,
) -> Result<RawTable, CortexError> {
    let column_rows = db
        .fetch_all(&format!(
            "SELECT column_name, data_type, is_nullable FROM information_schema.columns \
             WHERE table_schema = '{schema}' AND table_name = '{name}' ORDER BY ordinal_position"
        ))
        .await?;

    let pk_rows = db
        .fetch_all(&format!(
            "SELECT kcu.column_name FROM information_schema.table_constraints tc \
             JOIN information_schema.key_column_usage kcu \
               ON tc.constraint_name = kcu.constraint_name AND tc.table_schema = kcu.table_schema \
             WHERE tc.constraint_type = 'PRIMARY KEY' AND tc.table_schema = '{schema}' AND tc.table_name = '{name}'"
        ))
        .await?;
    let primary_key: Vec<String> = pk_rows.iter().filter_map(|r| r.try_get(0).ok()).collect();
    let pk_set: BTreeSet<String> = primary_key.iter().cloned().collect();

    let fk_rows = db
        .fetch_all(&format!(
            "SELECT kcu.column_name, ccu.table_schema, ccu.table_name, ccu.column_name \
             FROM information_schema.table_constraints tc \
             JOIN information_schema.key_column_usage kcu \
               ON tc.constraint_name = kcu.constraint_name AND tc.table_schema = kcu.table_schema \
             JOIN information_schema.constraint_column_usage ccu \
               ON tc.constraint_name = ccu.constraint_name \
             WHERE tc.constraint_type = 'FOREIGN KEY' AND tc.table_schema = '{schema}' AND tc.table_name = '{name}'"
        ))
        .await?;

    let mut foreign_keys = Vec::new();
    for row in &fk_rows {
        let local_column: String = row.try_get(0).unwrap_or_default();
        let remote_schema: String = row.try_get(1).unwrap_or_default();
        let remote_table: String = row.try_get(2).unwrap_or_default();
        let remote_column: String = row.try_get(3).unwrap_or_default();
        foreign_keys.push(RawForeignKey {
            local_column,
            remote_table_key: table_key(&remote_schema, &remote_table),
            remote_column,
        });
    }
    let columns = column_rows
        .iter()
        .map(|row| {
            let col_name: String = row.try_get(0).unwrap_or_default();
            RawColumn {
                is_primary_key: pk_set.contains(&col_name),
                nullable: row
                    .try_get::<String, _>(2)
                    .map(|v| v.eq_ignore_ascii_case("YES"))
                    .unwrap_or(true),
                vendor_type: row.try_get(1).unwrap_or_default(),
                name: col_name,
            }
        })
        .collect();

    let estimate_rows = db
        .fetch_all(&format!(
            "SELECT reltuples::bigint FROM pg_class c JOIN pg_namespace n ON n.oid = c.relnamespace \
             WHERE n.nspname = '{schema}' AND c.relname = '{name}'"
        ))
        .await
        .unwrap_or_default();
    let row_count_estimate = estimate_rows.first().and_then(|r| r.try_get(0).ok());

    Ok(RawTable {
        schema: schema.to_string(),
        name: name.to_string(),
        columns,
        primary_key,
        foreign_keys,
        row_count_estimate,
    })
}

async fn reflect_mysql(db: &CortexDb, opts: &ReflectOptions) -> Result<RawSchema, CortexError> {
    let mut warnings = Vec::new();
    let schema_rows = db
        .fetch_all("SELECT DISTINCT table_schema FROM information_schema.tables WHERE table_type = 'BASE TABLE'")
        .await?;
    let mut schemas: BTreeSet<String> = BTreeSet::new();
    for row in &schema_rows {
        let schema: String = row.try_get(0).unwrap_or_default();
        if schema_allowed(&schema, opts, MYSQL_SYSTEM_SCHEMAS) {
            schemas.insert(schema);
        }
    }

    let table_rows = db
        .fetch_all(
            "SELECT table_schema, table_name, table_rows FROM information_schema.tables \
             WHERE table_type = 'BASE TABLE' ORDER BY table_schema, table_name",
        )
        .await?;

    let mut tables = Vec::new();
    for row in &table_rows {
        let schema: String = row.try_get(0).unwrap_or_default();
        let name: String = row.try_get(1).unwrap_or_default();
        if !schemas.contains(&schema) {
            continue;
        }
        let estimate: Option<i64> = row.try_get(2).ok();
        match reflect_mysql_table(db, &schema, &name, estimate).await {
            Ok(table) => tables.push(table),
            Err(e) => warnings.push(format!("skipped {schema}.{name}: {e}")),
        }
    }

    Ok(RawSchema {
        schemas: schemas.into_iter().collect(),
        tables,
        warnings,
    })
}

async fn reflect_mysql_table(
    db: &CortexDb,
    schema: &str,
    name: &str,
    row_count_estimate: Option<i64>,
) -> Result<RawTable, CortexError> {
    let column_rows = db
        .fetch_all(&format!(
            "SELECT column_name, column_type, is_nullable, column_key FROM information_schema.columns \
             WHERE table_schema = '{schema}' AND table_name = '{name}' ORDER BY ordinal_position"
        ))
        .await?;

    let kcu_rows = db
        .fetch_all(&format!(
            "SELECT column_name, referenced_table_schema, referenced_table_name, referenced_column_name \
             FROM information_schema.key_column_usage \
             WHERE table_schema = '{schema}' AND table_name = '{name}' AND referenced_table_name IS NOT NULL"
        ))
        .await?;

    let mut foreign_keys = Vec::new();
    for row in &kcu_rows {
        let local_column: String = row.try_get(0).unwrap_or_default();
        let remote_schema: String = row.try_get(1).unwrap_or_default();
        let remote_table: String = row.try_get(2).unwrap_or_default();
        let remote_column: String = row.try_get(3).unwrap_or_default();
        foreign_keys.push(RawForeignKey {
            local_column,
            remote_table_key: table_key(&remote_schema, &remote_table),
            remote_column,
        });
    }

    let mut primary_key = Vec::new();
    let columns = column_rows
        .iter()
        .map(|row| {
            let col_name: String = row.try_get(0).unwrap_or_default();
            let key_flag: String = row.try_get(3).unwrap_or_default();
            let is_pk = key_flag == "PRI";
            if is_pk {
                primary_key.push(col_name.clone());
            }
            RawColumn {
                is_primary_key: is_pk,
                nullable: row
                    .try_get::<String, _>(2)
                    .map(|v| v.eq_ignore_ascii_case("YES"))
                    .unwrap_or(true),
                vendor_type: row.try_get(1).unwrap_or_default(),
                name: col_name,
            }
        })
        .collect();

    Ok(RawTable {
        schema: schema.to_string(),
        name: name.to_string(),
        columns,
        primary_key,
        foreign_keys,
        row_count_estimate,
    })
}

async fn reflect_sqlite(db: &CortexDb, opts: &ReflectOptions) -> Result<RawSchema, CortexError> {
    let mut warnings = Vec::new();
    if !schema_allowed("main", opts, &[]) {
        return Ok(RawSchema {
            schemas: vec![],
            tables: vec![],
            warnings,
        });
    }

    let table_rows = db
        .fetch_all(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .await?;

    let mut tables = Vec::new();
    for row in &table_rows {
        let name: String = row.try_get(0).unwrap_or_default();
        match reflect_sqlite_table(db, &name).await {
            Ok(table) => tables.push(table),
            Err(e) => warnings.push(format!("skipped main.{name}: {e}")),
        }
    }

    Ok(RawSchema {
        schemas: vec!["main".to_string()],
        tables,
        warnings,
    })
}

async fn reflect_sqlite_table(db: &CortexDb, name: &str) -> Result<RawTable, CortexError> {
    let column_rows = db
        .fetch_all(&format!("PRAGMA table_info('{name}')"))
        .await?;

    let mut primary_key = Vec::new();
    let columns: Vec<RawColumn> = column_rows
        .iter()
        .map(|row| {
            // PRAGMA table_info columns: cid, name, type, notnull, dflt_value, pk
            let col_name: String = row.try_get(1).unwrap_or_default();
            let pk_rank: i64 = row.try_get(5).unwrap_or(0);
            let notnull: i64 = row.try_get(3).unwrap_or(0);
            if pk_rank > 0 {
                primary_key.push(col_name.clone());
            }
            RawColumn {
                is_primary_key: pk_rank > 0,
                nullable: notnull == 0,
                vendor_type: row.try_get(2).unwrap_or_default(),
                name: col_name,
            }
        })
        .collect();

    let fk_rows = db
        .fetch_all(&format!("PRAGMA foreign_key_list('{name}')"))
        .await?;
    let foreign_keys = fk_rows
        .iter()
        .map(|row| {
            // PRAGMA foreign_key_list columns: id, seq, table, from, to, ...
            let remote_table: String = row.try_get(2).unwrap_or_default();
            let local_column: String = row.try_get(3).unwrap_or_default();
            let remote_column: String = row.try_get(4).unwrap_or_default();
            RawForeignKey {
                local_column,
                remote_table_key: table_key("main", &remote_table),
                remote_column,
            }
        })
        .collect();

    Ok(RawTable {
        schema: "main".to_string(),
        name: name.to_string(),
        columns,
        primary_key,
        foreign_keys,
        row_count_estimate: None,
    })
}
