//! # memgraph MCP Server
//!
//! Entry point for the MCP (Model Context Protocol) server.
//!
//! Configuration is resolved from, in order: defaults, the optional
//! `--config` TOML file, `MEMGRAPH_*` environment variables, then flags.
//!
//! Communicates with AI clients via MCP over stdio. Logs go to stderr.

use clap::Parser;
use memgraph_core::{Dispatcher, LoadPolicy, MemoryConfig};
use memgraph_mcp::MemgraphMcp;
use rmcp::{ServiceExt, transport::stdio};
use std::path::PathBuf;
use std::time::Duration;

/// memgraph MCP server - knowledge-graph memory over stdio
#[derive(Parser, Debug)]
#[command(name = "memgraph-mcp")]
#[command(version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the backing JSONL file
    #[arg(short, long)]
    memory_path: Option<PathBuf>,

    /// What to do with an unreadable backing file: "reset" or "fail"
    #[arg(long)]
    on_corrupt_load: Option<LoadPolicy>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging to stderr only - stdout is reserved for MCP stdio transport.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memgraph_mcp=info,memgraph_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();

    let mut config = MemoryConfig::load(args.config.as_deref())?;
    if let Some(path) = args.memory_path {
        config.memory_path = path;
    }
    if let Some(policy) = args.on_corrupt_load {
        config.on_corrupt_load = policy;
    }

    let dispatcher = Dispatcher::from_config(&config)?;
    tracing::info!(
        path = %dispatcher.store().path().display(),
        policy = %config.on_corrupt_load,
        "memgraph MCP server starting"
    );

    let mcp = MemgraphMcp::new(
        dispatcher,
        Duration::from_secs(config.completion.timeout_secs),
    );

    let service = mcp.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("MCP serve error: {:?}", e);
    })?;

    service.waiting().await?;
    Ok(())
}
