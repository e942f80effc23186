//! Embedder + Semantic Index (C7): an optional local encoder that, when
//! available, produces table- and column-level vectors for the Retrieval
//! Engine. Every piece here is a capability that degrades to lexical-only
//! rather than failing when the model or index cannot be constructed.

pub mod candle_backend;
pub mod index;
pub mod semantic_index;
pub mod service;

pub use index::{FlatVectorIndex, NoopVectorIndex, VectorIndex};
pub use semantic_index::SemanticIndex;
pub use service::{EmbeddingConfig, EmbeddingService, LocalEmbeddingService, NoopEmbeddingService};
