//! Driver abstraction over the target relational database.
//!
//! Grounded on the teacher's `surrealdb::engine::any` single-handle pattern:
//! one pool type dispatches across backends by connection-string scheme, so
//! the rest of the crate never matches on dialect to pick a driver.

use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::AnyPool;

use crate::db::dialect::Dialect;
use crate::error::CortexError;

/// Unified database handle. Speaks postgres/mysql/sqlite via `sqlx::Any`,
/// dispatched by the connection string's scheme.
#[derive(Clone)]
pub struct CortexDb {
    pool: AnyPool,
    dialect: Dialect,
}

impl CortexDb {
    /// Connect using a single connection-string environment variable
    /// (spec §6). The dialect is derived from the connection itself.
    pub async fn connect(database_url: &str) -> Result<Self, CortexError> {
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(8)
            .connect(database_url)
            .await?;
        let dialect = Dialect::from_connection_url(database_url);
        tracing::info!(dialect = %dialect, "connected to database");
        Ok(Self { pool, dialect })
    }

    /// Active dialect, derived once at connect time.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Raw pool access for components that need it (reflection, sampling,
    /// guarded execution). All statements are expected to run inside a
    /// read-only transaction at the call site — see `guardrail`.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Execute a read-only query and return raw rows. Used by the
    /// Reflection Adapter and Sampler, which both need dialect-agnostic
    /// catalog access rather than typed row mapping.
    pub async fn fetch_all(&self, sql: &str) -> Result<Vec<AnyRow>, CortexError> {
        Ok(sqlx::query(sql).fetch_all(&self.pool).await?)
    }
}
