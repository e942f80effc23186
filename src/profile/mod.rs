//! Profiler (C3): derives per-column statistics and an inferred role from a
//! table's raw structure plus its sample, without retaining raw values.

pub mod ner;
pub mod patterns;
pub mod profiler;
pub mod rules;
pub mod types;

pub use profiler::{profile_table, DEFAULT_VALUE_CONSTRAINT_THRESHOLD};
pub use types::{ColumnProfile, FkTarget, Role, SemanticTag, SurfacePattern, ValueRange};
