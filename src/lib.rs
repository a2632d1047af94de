//! ad_report_sync library
//!
//! Fetches advertising reports from Direct, Metrica and AppMetrica, normalizes
//! them into one tabular shape and merges them into per-client cache files,
//! replacing only the recently re-fetched days.

pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
