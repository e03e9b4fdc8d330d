// SPDX-License-Identifier: Apache-2.0
//!
//! `agentbridge` — entry point. Parses the CLI, loads layered YAML config,
//! and either serves the MCP stdio protocol or runs a one-off diagnostic
//! subcommand.
//!
//! stdout is reserved exclusively for the line-delimited JSON-RPC transport
//! once `serve` starts; all logging goes to stderr.

mod cli;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        cli::print_completions(*shell);
        return Ok(());
    }

    let config = agentbridge_config::load(cli.config.as_deref())?;
    init_logging(cli.verbose, config.logging.level.as_deref());

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::ShowConfig => {
            println!("{}", serde_yaml::to_string(&config).unwrap_or_default());
            Ok(())
        }
        Commands::Completions { .. } => unreachable!("handled above"),
        Commands::Serve => {
            let manager = Arc::new(agentbridge_core::JobManager::new(config.agent.command));
            let registry = Arc::new(agentbridge_tools::build_default_registry(manager));
            agentbridge_mcp::serve_stdio(registry).await
        }
    }
}

/// Initializes `tracing` to write exclusively to stderr.
///
/// stdout carries the MCP JSON-RPC stream once `serve` starts; anything
/// written there that isn't a protocol message corrupts the transport for
/// the coordinator on the other end of the pipe, so logging never touches it.
///
/// Precedence: `RUST_LOG` wins if set; otherwise `config_level` (from
/// `logging.level` in the config file); otherwise `-v`/`-vv` verbosity.
fn init_logging(verbosity: u8, config_level: Option<&str>) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let level = config_level.unwrap_or(default_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
