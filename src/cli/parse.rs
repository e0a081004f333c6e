//! CLI parse: clap types for Trellis. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Trellis CLI - resolve declarative context templates into page data
#[derive(Parser, Debug)]
#[command(name = "trellis")]
#[command(about = "Resolve declarative context templates into page data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (replaces the workspace config files)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a context template file and print the result
    Resolve {
        /// Template JSON file
        template: PathBuf,
        /// Store fixture JSON (overrides store.fixture)
        #[arg(long)]
        store: Option<PathBuf>,
        /// Caller parameter, `key=value` or a bare `key`; repeatable
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, Option<String>)>,
    },
    /// Prepare the full context of a page from the context directory
    Page {
        /// Page name, read from <context_dir>/pages/<name>.json
        name: String,
        /// Store fixture JSON (overrides store.fixture)
        #[arg(long)]
        store: Option<PathBuf>,
        /// Request parameter, `key=value` or a bare `key`; repeatable
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, Option<String>)>,
    },
    /// Parse a query directive and print its parts
    Parse {
        /// Directive, e.g. `{cms}/list/article?limit=5`
        directive: String,
    },
    /// Print the effective configuration as TOML
    Config,
}

/// Parse `key=value` (value may be empty) or a bare `key`
pub fn parse_param(raw: &str) -> Result<(String, Option<String>), String> {
    let (key, value) = match raw.split_once('=') {
        Some((key, value)) => (key.trim(), Some(value.trim().to_string())),
        None => (raw.trim(), None),
    };
    if key.is_empty() {
        return Err(format!("parameter {:?} has an empty name", raw));
    }
    Ok((key.to_string(), value))
}
