//! Prelude module for the ad_report_sync library
//!
//! This module re-exports the most commonly used items, so a typical
//! integration needs a single `use ad_report_sync::prelude::*;`.
//!
//! # Usage
//!
//! ```rust,no_run
//! use ad_report_sync::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(None).await?;
//!     let tokens = Tokens::from_env()?;
//!     let transport = Arc::new(HttpHandler::from_config(&config.http)?);
//!
//!     let coordinator = Coordinator::new(config, &tokens, transport)?;
//!     coordinator.run(&RunOptions::today()).await?;
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Orchestration and storage
pub use crate::app::{
    CacheConfig, CacheKey, CacheStore, Coordinator, DateRange, HttpHandler, ReportTable,
    ReportTransport, RunOptions, RunReport, RunStats, SaveOutcome, Source,
};

// Campaign helpers
pub use crate::app::{decompose_campaign_key, normalize_device, CampaignSchema};

// Configuration and tokens
pub use crate::auth::{get_token_status, Tokens};
pub use crate::config::{AppConfig, ClientProfile};

// Standard library re-exports that are commonly needed
pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        let config = AppConfig::default();
        let _store = CacheStore::new(config.output.clone()).unwrap();
        let _status = get_token_status();
        assert_eq!(Source::ALL.len(), 3);
    }
}
