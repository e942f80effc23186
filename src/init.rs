//! Shared bootstrap logic: loads configuration, connects to the database,
//! builds the embedder, and starts the Lifecycle Coordinator.

use std::sync::Arc;

use anyhow::Context;

use crate::config::CortexConfig;
use crate::coordinator::{default_embedder, Coordinator};
use crate::db::CortexDb;

/// Starts a `Coordinator` for an already-loaded configuration.
///
/// Connection happens eagerly; the heavier enrich pass (embeddings,
/// full-table profiling) runs in the background once `coordinator.start()`
/// is called here, so callers only need to `wait_until_ready` for a usable
/// card. Kept separate from configuration loading (see `main.rs`) so the
/// two failure modes map to distinct process exit codes (spec §6).
pub async fn start_coordinator(config: CortexConfig) -> anyhow::Result<Arc<Coordinator>> {
    let db = CortexDb::connect(&config.database_url).await.context("connecting to database")?;
    tracing::info!(dialect = %db.dialect(), "database connected");

    let embedder = default_embedder(&config);
    tracing::info!(available = embedder.is_available(), "embedding service initialized");

    let coordinator = match config.cache_dir.clone() {
        Some(dir) => Coordinator::with_cache_dir(db, config, embedder, dir),
        None => Coordinator::new(db, config, embedder),
    };

    coordinator.start();
    Ok(coordinator)
}
