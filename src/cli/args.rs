//! Command-line argument parsing for ad_report_sync
//!
//! This module defines the CLI structure using clap derive macros: running
//! the report pipeline, checking tokens, managing the configuration file and
//! inspecting campaign name decomposition.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::app::dates::parse_date;
use crate::app::models::Source;

/// ad_report_sync - Keep advertising report caches up to date
#[derive(Parser, Debug)]
#[command(
    name = "ad_report_sync",
    version,
    about = "Fetch Direct, Metrica and AppMetrica reports into per-client cache files",
    long_about = "Fetches advertising reports for every configured client, normalizes them into one tabular shape
and merges them into delimited cache files, replacing only the recently re-fetched days."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output folder for the cache files
    #[arg(long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch reports and update the cache files
    Run(RunArgs),

    /// Show which API tokens are available
    Tokens,

    /// Show or create the configuration file
    Config(ConfigArgs),

    /// Print the attributes of a campaign name
    Decompose(DecomposeArgs),
}

/// Arguments for the run command
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Process only this client (repeatable)
    #[arg(short, long = "client", value_name = "NAME")]
    pub clients: Vec<String>,

    /// Process only this source (repeatable)
    #[arg(short, long = "source", value_enum, value_name = "SOURCE")]
    pub sources: Vec<Source>,

    /// Count the date windows back from this day instead of today
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_anchor_date)]
    pub anchor_date: Option<NaiveDate>,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,

        /// Target path (defaults to --config or the user config directory)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,
    },
}

/// Arguments for the decompose command
#[derive(Args, Debug, Clone)]
pub struct DecomposeArgs {
    /// Campaign name, e.g. msk-search-auto
    #[arg(value_name = "NAME")]
    pub name: String,
}

fn parse_anchor_date(raw: &str) -> Result<NaiveDate, String> {
    parse_date(raw).map_err(|e| e.to_string())
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Logging level requested by flags, if any
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}
