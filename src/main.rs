//! schema-cortex - schema intelligence and guarded query planning over MCP.
//!
//! Reflects, profiles, and classifies a connected relational database into a
//! Schema Card, then exposes it to an LLM tool caller as a small set of
//! typed MCP tools: orientation, query planning, table inspection, and a
//! read-only execution guardrail.

use clap::Parser;

use schema_cortex::cli::Cli;
use schema_cortex::config::CortexConfig;
use schema_cortex::{init, mcp};

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("schema_cortex=info".parse().expect("valid directive")),
        )
        .init();

    let mut config = match CortexConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(2);
        }
    };
    if cli.debug_tools {
        config.debug_tools = true;
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("fatal: failed to start async runtime: {e}");
            std::process::exit(3);
        }
    };

    if let Err(e) = runtime.block_on(run(config)) {
        eprintln!("fatal: {e:#}");
        std::process::exit(3);
    }
}

async fn run(config: CortexConfig) -> anyhow::Result<()> {
    let coordinator = init::start_coordinator(config).await?;
    mcp::run_mcp_server(coordinator).await
}
