//! API token management
//!
//! Tokens for the three report APIs are supplied through the environment.
//! This module loads them, fails fast when one is missing, and reports
//! which ones are configured without ever printing their values.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ad_report_sync::auth::{get_token_status, Tokens};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let status = get_token_status();
//! if !status.is_complete() {
//!     println!("Missing: {:?}", status.missing());
//! }
//! let tokens = Tokens::from_env()?;
//! # let _ = tokens;
//! # Ok(())
//! # }
//! ```

pub mod tokens;

// Re-export main public API
pub use tokens::{get_token_status, TokenStatus, Tokens};
