//! CLI surface (spec §6): a single entry point that starts the service.

use clap::Parser;

/// schema-cortex - schema intelligence and guarded query planning over MCP.
#[derive(Parser)]
#[command(name = "schema-cortex", version, about, long_about = None)]
pub struct Cli {
    /// Register the find_tables/find_columns debug tools (overrides
    /// SCHEMA_CORTEX_DEBUG_TOOLS).
    #[arg(long)]
    pub debug_tools: bool,
}
