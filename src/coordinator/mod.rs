//! Lifecycle Coordinator (C13, spec §4.13): bootstraps the build pipeline,
//! tracks readiness, and owns the live Schema Card and Semantic Index.

pub mod build;
pub mod coordinator;
pub mod types;

pub use build::build_schema_card;
pub use coordinator::{default_embedder, Coordinator, DEFAULT_READINESS_TIMEOUT};
pub use types::{Phase, ReadinessState};
