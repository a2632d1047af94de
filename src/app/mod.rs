//! Core application logic for ad_report_sync
//!
//! This module contains the report clients, the shared table model, campaign
//! decomposition, the cache store and the run coordinator.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ad_report_sync::app::{decompose_campaign_key, normalize_device, DateRange};
//!
//! let columns = vec!["Geo".to_string(), "Site_type".to_string()];
//! let attributes = decompose_campaign_key("msk-search", &columns, '-', "all");
//! assert_eq!(attributes.get("Geo"), Some("msk"));
//!
//! assert_eq!(normalize_device("PC"), Some("DESKTOP"));
//!
//! let range = DateRange::last_days(DateRange::today(), 4);
//! println!("Fetching {}", range);
//! ```

pub mod cache;
pub mod campaign;
pub mod client;
pub mod coordinator;
pub mod dates;
pub mod models;

// Re-export main public API
pub use cache::{CacheConfig, CacheKey, CacheStore, DateMatch, SaveOutcome};
pub use campaign::{decompose_campaign_key, normalize_device, CampaignAttributes, CampaignSchema, Device};
pub use client::{
    AppMetricaClient, DirectClient, HttpConfig, HttpHandler, MetricaClient, ReportClients,
    ReportTransport,
};
pub use coordinator::{Coordinator, RunOptions, RunReport, RunStats};
pub use dates::DateRange;
pub use models::{ReportTable, Source};
