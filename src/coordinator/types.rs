//! Lifecycle Coordinator (C13) state model (spec §4.13).

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Readiness phase of the coordinated build pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Starting,
    Running,
    Ready,
    Failed,
    Stopped,
}

/// Snapshot of where the coordinator is in its build lifecycle, returned
/// verbatim by `get_init_status` (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReadinessState {
    pub phase: Phase,
    pub attempts: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    /// Set once the fast-start card is in place; an `enrich` pass refining
    /// it further does not clear this back to `false`.
    pub fast_start_complete: bool,
    /// Set once the enrich pass has run to completion at least once.
    pub enriched: bool,
}

impl Default for ReadinessState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            attempts: 0,
            started_at: None,
            completed_at: None,
            error_message: None,
            fast_start_complete: false,
            enriched: false,
        }
    }
}
