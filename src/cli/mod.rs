//! Command-line interface components
//!
//! This module contains the CLI-specific code of ad_report_sync: argument
//! parsing and the command handlers that drive the library.

pub mod args;
pub mod commands;

pub use args::{
    Cli, Commands, ConfigAction, ConfigArgs, DecomposeArgs, GlobalArgs, RunArgs,
};
pub use commands::{handle_config, handle_decompose, handle_run, handle_tokens};
