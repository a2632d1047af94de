//! Cache files with date-range replacement and atomic writes
//!
//! Each client keeps one delimited file per source. A run re-fetches a window
//! of recent days; saving it replaces exactly those days in the file and
//! leaves older history untouched.
//!
//! # Key Features
//!
//! - **Date-range replacement**: rows of the re-fetched days are dropped and
//!   the fresh rows are written ahead of the surviving history
//! - **Legacy encodings**: files are read and written in a configurable
//!   single-byte encoding (`windows-1251` by default)
//! - **Atomic operations**: temp file + rename, so readers never see a
//!   partially written file
//!
//! # Module Organization
//!
//! - [`config`] - Configuration types and defaults
//! - [`path`] - File naming
//! - [`store`] - Load, merge and save
//!
//! # Examples
//!
//! ```rust,no_run
//! use ad_report_sync::app::cache::{CacheConfig, CacheKey, CacheStore};
//! use ad_report_sync::app::dates::DateRange;
//! use ad_report_sync::app::models::{ReportTable, Source};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = CacheStore::new(CacheConfig::default())?;
//! let key = CacheKey::new("eapteka", Source::Direct);
//!
//! let mut fresh = ReportTable::new(["Date", "CampaignName", "Cost"]);
//! fresh.push_row(vec!["2024-01-01".into(), "msk-search".into(), "1.2".into()]);
//!
//! let range = DateRange::last_days(DateRange::today(), 45);
//! let outcome = store.save(&key, fresh, &range)?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod path;
pub mod store;

#[cfg(test)]
pub mod tests;

// Re-export main public API
pub use config::{CacheConfig, DateMatch};
pub use path::CacheKey;
pub use store::{CacheStore, SaveOutcome};
