//! The `EmbeddingService` capability trait plus its two implementations:
//! a local candle-backed BERT encoder and a noop that reports disabled
//! (spec §4.7: "If the encoder... cannot be constructed, the component
//! reports disabled and all retrieval falls back to lexical").

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::embed::candle_backend::{download_model, select_device, BertEmbedder};
use crate::error::CortexError;

#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, CortexError>;
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CortexError>;
    fn dimensions(&self) -> usize;
    fn is_available(&self) -> bool;
}

/// Reports unavailable unconditionally; every retrieval path that checks
/// `is_available()` falls back to lexical scoring.
pub struct NoopEmbeddingService {
    dimensions: usize,
}

impl NoopEmbeddingService {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingService for NoopEmbeddingService {
    async fn embed_text(&self, _text: &str) -> Result<Vec<f32>, CortexError> {
        Err(CortexError::Unsupported("embedding service disabled".to_string()))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, CortexError> {
        Err(CortexError::Unsupported("embedding service disabled".to_string()))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn is_available(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub model_repo: String,
    pub dimensions: usize,
    pub cache_dir: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_repo: "BAAI/bge-small-en-v1.5".to_string(),
            dimensions: 384,
            cache_dir: None,
        }
    }
}

/// Local candle-backed embedding service. Construction never fails: a
/// download or load error degrades to `available = false` rather than
/// propagating, per spec §4.7 and §9's "capability interface, not
/// identity" guidance.
pub struct LocalEmbeddingService {
    embedder: Option<Arc<BertEmbedder>>,
    dimensions: usize,
}

impl LocalEmbeddingService {
    pub fn new(config: EmbeddingConfig) -> Self {
        let files = match download_model(&config.model_repo, config.cache_dir.as_deref().map(std::path::Path::new)) {
            Ok(files) => files,
            Err(e) => {
                warn!(error = %e, "failed to download embedding model, embedding service disabled");
                return Self { embedder: None, dimensions: config.dimensions };
            }
        };

        let device = select_device();
        match BertEmbedder::new(&files, device) {
            Ok(embedder) => Self { embedder: Some(Arc::new(embedder)), dimensions: config.dimensions },
            Err(e) => {
                warn!(error = %e, "failed to load embedding model, embedding service disabled");
                Self { embedder: None, dimensions: config.dimensions }
            }
        }
    }
}

#[async_trait]
impl EmbeddingService for LocalEmbeddingService {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, CortexError> {
        let mut batch = self.embed_batch(std::slice::from_ref(&text.to_string())).await?;
        batch.pop().ok_or_else(|| CortexError::Unsupported("embedding batch was empty".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CortexError> {
        let embedder = self
            .embedder
            .clone()
            .ok_or_else(|| CortexError::Unsupported("embedding service unavailable".to_string()))?;
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || embedder.embed(&texts))
            .await
            .map_err(|e| CortexError::Unsupported(format!("embedding task panicked: {e}")))?
            .map_err(|e| CortexError::Unsupported(format!("embedding inference failed: {e}")))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn is_available(&self) -> bool {
        self.embedder.is_some()
    }
}
