//! # memgraph CLI Module
//!
//! This module implements the CLI interface for memgraph.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP bridge
//! - `status` - Show graph counters
//! - `tools` - List the tool catalogue
//! - `call` - Invoke one tool with JSON arguments
//! - `topics` - List entity names

mod commands;

use clap::{Parser, Subcommand};
use memgraph_core::{Dispatcher, LoadPolicy, MemoryConfig, MemoryError};
use std::path::{Path, PathBuf};

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// memgraph - knowledge-graph memory
///
/// Entities, relations and observations kept in one JSONL file,
/// served as nine tools over HTTP.
#[derive(Parser, Debug)]
#[command(name = "memgraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Debug-level logging (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the backing JSONL file
    #[arg(short, long, global = true)]
    pub memory_path: Option<PathBuf>,

    /// What to do with an unreadable backing file: "reset" or "fail"
    #[arg(long, global = true)]
    pub on_corrupt_load: Option<LoadPolicy>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// Show graph status
    Status,

    /// List available tools
    Tools,

    /// Invoke a tool
    Call {
        /// Tool name, e.g. create_entities
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },

    /// List entity names
    Topics,
}

impl Cli {
    /// Resolve configuration: defaults, `--config`, environment, then flags.
    pub fn resolve_config(&self) -> Result<MemoryConfig, MemoryError> {
        let mut config = MemoryConfig::load(self.config.as_deref())?;
        if let Some(path) = &self.memory_path {
            config.memory_path = path.clone();
        }
        if let Some(policy) = self.on_corrupt_load {
            config.on_corrupt_load = policy;
        }
        Ok(config)
    }
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "memgraph=debug,memgraph_core=debug,tower_http=debug"
    } else {
        "memgraph=info,memgraph_core=info,tower_http=debug"
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), MemoryError> {
    let config = cli.resolve_config()?;
    let dispatcher = Dispatcher::from_config(&config)?;
    let json_mode = cli.json_mode;

    if !cli.quiet && !json_mode {
        print_banner(dispatcher.store().path());
    }

    tracing::debug!(
        path = %dispatcher.store().path().display(),
        policy = %config.on_corrupt_load,
        "configuration resolved"
    );

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(dispatcher, &host, port).await,
        Some(Commands::Status) => cmd_status(&dispatcher, json_mode),
        Some(Commands::Tools) => cmd_tools(&dispatcher, json_mode),
        Some(Commands::Call { tool, args }) => cmd_call(&dispatcher, &tool, &args, json_mode),
        Some(Commands::Topics) => cmd_topics(&dispatcher, json_mode),
        None => {
            // No subcommand - show status by default
            cmd_status(&dispatcher, json_mode)
        }
    }
}

/// Print the startup banner with the absolute path of the backing file.
fn print_banner(memory_path: &Path) {
    let absolute =
        std::path::absolute(memory_path).unwrap_or_else(|_| memory_path.to_path_buf());
    println!(
        r#"
  memgraph v{}
  knowledge-graph memory: entities, relations, observations

  Memory file: {}
"#,
        env!("CARGO_PKG_VERSION"),
        absolute.display()
    );
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "memgraph",
            "--memory-path",
            "/tmp/graph.jsonl",
            "--on-corrupt-load",
            "fail",
            "status",
        ])
        .expect("parse");
        assert!(matches!(cli.command, Some(Commands::Status)));
        assert_eq!(cli.memory_path, Some(PathBuf::from("/tmp/graph.jsonl")));
        assert_eq!(cli.on_corrupt_load, Some(LoadPolicy::Fail));
    }

    #[test]
    fn call_defaults_to_empty_arguments() {
        let cli = Cli::try_parse_from(["memgraph", "call", "read_graph"]).expect("parse");
        match cli.command {
            Some(Commands::Call { tool, args }) => {
                assert_eq!(tool, "read_graph");
                assert_eq!(args, "{}");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let parsed = Cli::try_parse_from(["memgraph", "--on-corrupt-load", "ignore"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["memgraph", "status", "--verbose"]).expect("parse");
        assert!(cli.verbose);
        assert!(!Cli::try_parse_from(["memgraph"]).expect("parse").verbose);
    }

    #[test]
    fn verbose_raises_core_logging_to_debug() {
        assert!(default_log_filter(true).contains("memgraph_core=debug"));
        assert!(default_log_filter(false).contains("memgraph_core=info"));
    }

    #[test]
    fn server_defaults() {
        let cli = Cli::try_parse_from(["memgraph", "server"]).expect("parse");
        match cli.command {
            Some(Commands::Server { host, port }) => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 8000);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
