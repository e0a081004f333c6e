//! Trellis CLI Binary
//!
//! Command-line interface for resolving context templates and page contexts.

use anyhow::Context;
use clap::Parser;
use std::process;
use tracing::{error, info};
use trellis::cli::{Cli, RunContext};
use trellis::config::ConfigLoader;
use trellis::logging::{init_logging, LoggingConfig};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Build logging config from CLI args and config files
    let logging_config = build_logging_config(&cli);

    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Trellis CLI starting");

    match run(&cli).await {
        Ok(output) => {
            info!("Command completed successfully");
            println!("{}", output);
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<String> {
    let context = RunContext::new(cli.workspace.clone(), cli.config.clone())
        .map_err(|e| anyhow::anyhow!(trellis::cli::map_error(&e)))
        .with_context(|| format!("Cannot load workspace {}", cli.workspace.display()))?;

    context
        .execute(&cli.command)
        .await
        .map_err(|e| anyhow::anyhow!(trellis::cli::map_error(&e)))
}

/// Build logging configuration from CLI args and config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = ConfigLoader::load_with_file(&cli.workspace, cli.config.as_deref())
        .map(|c| c.logging)
        .unwrap_or_default();

    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    config
}
