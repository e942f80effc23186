//! MCP tool surface (spec §6): seven typed tools over the Lifecycle
//! Coordinator's live Schema Card, Query Planner, and Execution Guardrail.

pub mod error;
pub mod server;
pub mod types;

pub use error::ToolError;
pub use server::{run_mcp_server, CortexServer};
pub use types::*;
