//! Lifecycle Coordinator (C13, spec §4.13): owns the database handle, the
//! current Schema Card, the optional embedder, and the Semantic Index built
//! from it, and drives the fast-start/enrich build protocol.
//!
//! Scheduling model (spec §5): two long-lived background workers
//! (fast-start, enrich) plus one short-lived warm-up worker. Request
//! handling never blocks on build completion beyond a bounded
//! readiness-wait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock as StdRwLock};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::card::SchemaCardStore;
use crate::config::CortexConfig;
use crate::coordinator::build::build_schema_card;
use crate::coordinator::types::{Phase, ReadinessState};
use crate::db::CortexDb;
use crate::embed::{EmbeddingService, NoopEmbeddingService, SemanticIndex};
use crate::error::CortexError;

/// How long a caller's readiness-wait will block before giving up (spec
/// §5: "bounded readiness-wait").
pub const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Coordinator {
    db: CortexDb,
    config: CortexConfig,
    card_store: SchemaCardStore,
    embedder: Arc<dyn EmbeddingService>,
    semantic_index: StdRwLock<Arc<SemanticIndex>>,
    readiness: StdRwLock<ReadinessState>,
    stopping: AtomicBool,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Coordinator {
    pub fn new(db: CortexDb, config: CortexConfig, embedder: Arc<dyn EmbeddingService>) -> Arc<Self> {
        Arc::new(Self {
            db,
            config,
            card_store: SchemaCardStore::new(None),
            embedder,
            semantic_index: StdRwLock::new(Arc::new(SemanticIndex::disabled())),
            readiness: StdRwLock::new(ReadinessState::default()),
            stopping: AtomicBool::new(false),
            workers: Mutex::new(Vec::new()),
        })
    }

    /// Construct with the on-disk cache directory wired in, so a restart can
    /// warm-start from a previously persisted card for the same connection
    /// fingerprint (spec §4.6).
    pub fn with_cache_dir(
        db: CortexDb,
        config: CortexConfig,
        embedder: Arc<dyn EmbeddingService>,
        cache_dir: std::path::PathBuf,
    ) -> Arc<Self> {
        Arc::new(Self {
            db,
            config,
            card_store: SchemaCardStore::new(Some(cache_dir)),
            embedder,
            semantic_index: StdRwLock::new(Arc::new(SemanticIndex::disabled())),
            readiness: StdRwLock::new(ReadinessState::default()),
            stopping: AtomicBool::new(false),
            workers: Mutex::new(Vec::new()),
        })
    }

    pub fn readiness(&self) -> ReadinessState {
        self.readiness.read().expect("readiness lock poisoned").clone()
    }

    pub fn card(&self) -> Option<crate::card::SchemaCard> {
        self.card_store.get()
    }

    pub fn semantic_index(&self) -> Arc<SemanticIndex> {
        self.semantic_index.read().expect("semantic index lock poisoned").clone()
    }

    pub fn embedder(&self) -> Arc<dyn EmbeddingService> {
        self.embedder.clone()
    }

    pub fn db(&self) -> &CortexDb {
        &self.db
    }

    pub fn config(&self) -> &CortexConfig {
        &self.config
    }

    /// Blocks (with a deadline) until a Schema Card is in place, for
    /// handlers that cannot proceed with zero schema knowledge. Returns
    /// immediately once `Phase::Ready` or later is observed.
    pub async fn wait_until_ready(&self, timeout: Duration) -> Result<(), CortexError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let phase = self.readiness().phase;
            match phase {
                Phase::Ready | Phase::Running | Phase::Stopped => return Ok(()),
                Phase::Failed => {
                    let message = self.readiness().error_message.unwrap_or_default();
                    return Err(CortexError::NotReady(message));
                }
                Phase::Idle | Phase::Starting => {}
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(CortexError::NotReady("schema build did not complete within the readiness deadline".to_string()));
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    /// Starts the fast-start worker, which on success hands off to the
    /// enrich worker. Idempotent beyond the first call: subsequent calls
    /// are no-ops if a build is already in flight or complete.
    pub fn start(self: &Arc<Self>) {
        {
            let mut state = self.readiness.write().expect("readiness lock poisoned");
            if state.phase != Phase::Idle {
                return;
            }
            state.phase = Phase::Starting;
            state.attempts += 1;
            state.started_at = Some(chrono::Utc::now());
        }

        self.try_warm_start_from_cache();

        let this = Arc::clone(self);
        let handle = tokio::spawn(async move { this.run_fast_start_then_enrich().await });
        if let Ok(mut workers) = self.workers.try_lock() {
            workers.push(handle);
        }
    }

    /// Warm-starts from a previously persisted card for this connection's
    /// fingerprint, if the store has a cache directory and a match exists.
    /// Lets a restart publish `Ready` immediately while the fast-start
    /// worker still runs to refresh the card against live state.
    fn try_warm_start_from_cache(&self) {
        let Some(dir) = self.card_store.cache_dir() else { return };
        let fingerprint = crate::card::hash::compute_connection_fingerprint(&self.config.database_url);
        match SchemaCardStore::load_cached(dir, &fingerprint) {
            Ok(Some(card)) => {
                tracing::info!(fingerprint = %fingerprint, "warm-starting from cached schema card");
                self.card_store.put(card);
                let mut state = self.readiness.write().expect("readiness lock poisoned");
                state.phase = Phase::Ready;
                state.fast_start_complete = true;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "failed to read cached schema card"),
        }
    }

    async fn run_fast_start_then_enrich(self: Arc<Self>) {
        match build_schema_card(&self.db, &self.config, Some(self.config.fast_start_max_tables)).await {
            Ok(card) => {
                self.card_store.put(card);
                let mut state = self.readiness.write().expect("readiness lock poisoned");
                state.phase = Phase::Ready;
                state.fast_start_complete = true;
                state.completed_at = Some(chrono::Utc::now());
            }
            Err(e) => {
                tracing::error!(error = %e, "fast-start build failed");
                let mut state = self.readiness.write().expect("readiness lock poisoned");
                // A warm-started cache hit already published a usable card;
                // a failed refresh should not regress that readiness.
                state.phase = if self.card_store.get().is_some() { Phase::Ready } else { Phase::Failed };
                state.error_message = Some(e.to_string());
                return;
            }
        }

        if self.stopping.load(Ordering::Relaxed) {
            return;
        }

        // Short-lived warm-up worker: exercises the embedder once so the
        // first real inference inside the enrich pass isn't also paying
        // model/device initialization cost.
        let warm_up_embedder = Arc::clone(&self.embedder);
        let warm_up = tokio::spawn(async move {
            if warm_up_embedder.is_available() {
                let _ = warm_up_embedder.embed_text("warm up").await;
            }
        });
        let _ = warm_up.await;

        self.run_enrich().await;
    }

    async fn run_enrich(self: &Arc<Self>) {
        {
            let mut state = self.readiness.write().expect("readiness lock poisoned");
            state.phase = Phase::Running;
        }

        let enriched = build_schema_card(&self.db, &self.config, None).await;
        let card = match enriched {
            Ok(card) => card,
            Err(e) => {
                // Enrichment failures never regress readiness: the
                // fast-start card stays active, and the failure is only
                // logged into state for observability (spec §4.13).
                tracing::warn!(error = %e, "enrich pass failed, keeping fast-start card");
                let mut state = self.readiness.write().expect("readiness lock poisoned");
                state.phase = Phase::Ready;
                state.error_message = Some(e.to_string());
                return;
            }
        };

        let index = SemanticIndex::build(&card, self.embedder.as_ref()).await;
        *self.semantic_index.write().expect("semantic index lock poisoned") = Arc::new(index);
        self.card_store.put(card);

        let mut state = self.readiness.write().expect("readiness lock poisoned");
        state.phase = Phase::Ready;
        state.enriched = true;
        state.completed_at = Some(chrono::Utc::now());
        state.error_message = None;
    }

    /// Signals background workers to stop and waits up to `grace` for them
    /// to finish, transitioning to `Phase::Stopped` regardless of whether
    /// they finished within the window.
    pub async fn shutdown(&self, grace: Duration) {
        self.stopping.store(true, Ordering::Relaxed);
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.workers.lock().await);
        for handle in handles {
            let _ = tokio::time::timeout(grace, handle).await;
        }
        self.readiness.write().expect("readiness lock poisoned").phase = Phase::Stopped;
    }
}

/// Builds the default embedder for a config: a local candle-backed encoder
/// when a model repo is configured, degrading to noop on any construction
/// failure (handled inside `LocalEmbeddingService::new` itself).
pub fn default_embedder(config: &CortexConfig) -> Arc<dyn EmbeddingService> {
    use crate::embed::service::{EmbeddingConfig, LocalEmbeddingService};
    let cache_dir = config.cache_dir.as_ref().map(|p| p.to_string_lossy().to_string());
    let service = LocalEmbeddingService::new(EmbeddingConfig {
        model_repo: config.embedding_model.clone(),
        dimensions: 384,
        cache_dir,
    });
    if service.is_available() {
        Arc::new(service)
    } else {
        Arc::new(NoopEmbeddingService::new(384))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_db() -> CortexDb {
        let db = CortexDb::connect("sqlite::memory:?cache=shared").await.unwrap();
        db.fetch_all("CREATE TABLE customers (id INTEGER PRIMARY KEY, region TEXT)").await.unwrap();
        db.fetch_all("CREATE TABLE orders (id INTEGER PRIMARY KEY, customer_id INTEGER, total_amount REAL)")
            .await
            .unwrap();
        db.fetch_all("INSERT INTO customers (id, region) VALUES (1, 'west')").await.unwrap();
        db.fetch_all("INSERT INTO orders (id, customer_id, total_amount) VALUES (1, 1, 10.0)").await.unwrap();
        db
    }

    fn test_config(database_url: &str) -> CortexConfig {
        CortexConfig {
            database_url: database_url.to_string(),
            row_limit: 200,
            max_cell_chars: 2000,
            sample_rows: 500,
            sample_timeout: Duration::from_secs(5),
            embedding_model: "BAAI/bge-small-en-v1.5".to_string(),
            debug_tools: false,
            cache_dir: None,
            fast_start_max_tables: 300,
        }
    }

    #[tokio::test]
    async fn reaches_ready_after_start_and_exposes_a_card() {
        let db = memory_db().await;
        let config = test_config("sqlite::memory:?cache=shared");
        let coordinator = Coordinator::new(db, config, Arc::new(NoopEmbeddingService::new(384)));

        coordinator.start();
        coordinator.wait_until_ready(Duration::from_secs(5)).await.unwrap();

        let card = coordinator.card().expect("schema card should be present once ready");
        assert!(card.tables.contains_key("main.orders"));
        assert_eq!(coordinator.readiness().phase, Phase::Ready);
    }

    #[tokio::test]
    async fn shutdown_transitions_to_stopped() {
        let db = memory_db().await;
        let config = test_config("sqlite::memory:?cache=shared");
        let coordinator = Coordinator::new(db, config, Arc::new(NoopEmbeddingService::new(384)));

        coordinator.start();
        coordinator.wait_until_ready(Duration::from_secs(5)).await.unwrap();
        coordinator.shutdown(Duration::from_secs(5)).await;

        assert_eq!(coordinator.readiness().phase, Phase::Stopped);
    }
}
