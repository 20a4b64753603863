//! # tfluna CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Flag and configuration file layering
//! - Sensor loop wiring and graceful shutdown
//! - `validate` and `info` helpers

mod cli;
mod commands;
mod error;
mod settings;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_bridge, run_info, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    observability::init_with_config(observability_config(&cli))?;

    info!(version = env!("CARGO_PKG_VERSION"), "tfluna starting");

    let verbose = cli.verbose > 0;
    let result = match &cli.command {
        None => run_bridge(&cli.run, verbose).await,
        Some(Commands::Run(args)) => run_bridge(args, verbose).await,
        Some(Commands::Validate(args)) => run_validate(args),
        Some(Commands::Info(args)) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Logging and metrics settings from CLI options
fn observability_config(cli: &Cli) -> ObservabilityConfig {
    let default_log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: cli.run_args().and_then(|args| args.metrics_port),
        default_log_level: default_log_level.to_string(),
        force_level: cli.quiet,
    }
}
