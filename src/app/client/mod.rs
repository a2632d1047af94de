//! Report clients for the Direct, Metrica and AppMetrica APIs
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: the [`ReportTransport`] seam and its rate-limited implementation
//! - `direct`: asynchronous report polling and TSV parsing
//! - `metrica`: one-shot stat requests over a date span
//! - `appmetrica`: per-(day, campaign) stat requests with zero fill
//! - `stat`: JSON model shared by both stat APIs
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ad_report_sync::app::client::{HttpHandler, ReportClients};
//! use ad_report_sync::auth::Tokens;
//! use ad_report_sync::config::AppConfig;
//!
//! # fn example() -> ad_report_sync::Result<()> {
//! let config = AppConfig::default();
//! let tokens = Tokens::from_env()?;
//! let transport = Arc::new(HttpHandler::from_config(&config.http)?);
//! let clients = ReportClients::new(transport, &tokens, &config);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::auth::Tokens;
use crate::config::AppConfig;

pub mod appmetrica;
pub mod config;
pub mod direct;
pub mod http;
pub mod metrica;
pub mod stat;

#[cfg(test)]
pub mod tests;

pub use appmetrica::{AppMetricaClient, AppMetricaConfig, AppMetricaRecord};
pub use config::HttpConfig;
pub use direct::{DirectClient, DirectConfig, PolledReport};
pub use http::{ApiRequest, ApiResponse, HttpHandler, ReportTransport};
pub use metrica::{MetricaClient, MetricaConfig};

/// The three source clients sharing one transport
pub struct ReportClients {
    pub direct: DirectClient,
    pub metrica: MetricaClient,
    pub appmetrica: AppMetricaClient,
}

impl ReportClients {
    pub fn new(transport: Arc<dyn ReportTransport>, tokens: &Tokens, config: &AppConfig) -> Self {
        Self {
            direct: DirectClient::new(
                transport.clone(),
                tokens.direct.clone(),
                config.direct.clone(),
                config.campaign.clone(),
            ),
            metrica: MetricaClient::new(
                transport.clone(),
                tokens.metrica.clone(),
                config.metrica.clone(),
                config.campaign.clone(),
            ),
            appmetrica: AppMetricaClient::new(
                transport,
                tokens.appmetrica.clone(),
                config.appmetrica.clone(),
                config.campaign.clone(),
            ),
        }
    }
}
