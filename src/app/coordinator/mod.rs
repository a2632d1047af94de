//! Run orchestration across clients and sources
//!
//! The coordinator walks the client roster in order. For each client it runs
//! Direct, then Metrica, then AppMetrica, saving each source's rows into
//! that client's cache before moving on. AppMetrica reads its campaigns from
//! the Direct cache, which is why the order is fixed.
//!
//! Each client is an isolation boundary: a failing save aborts the rest of
//! that client's sources, gets logged, and the next client still runs. The
//! run as a whole fails if any client did.
//!
//! # Architecture
//!
//! - [`config`] - Run selection and per-source date windows
//! - [`stats`] - Per-source and per-run statistics
//! - [`completion`] - `KEY=value` completion markers
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ad_report_sync::app::client::HttpHandler;
//! use ad_report_sync::app::coordinator::{Coordinator, RunOptions};
//! use ad_report_sync::auth::Tokens;
//! use ad_report_sync::config::AppConfig;
//!
//! # async fn example() -> ad_report_sync::Result<()> {
//! let config = AppConfig::default();
//! let tokens = Tokens::from_env()?;
//! let transport = Arc::new(HttpHandler::from_config(&config.http)?);
//!
//! let coordinator = Coordinator::new(config, &tokens, transport)?;
//! let stats = coordinator.run(&RunOptions::today()).await?;
//! println!("Saved {} rows", stats.rows_saved());
//! # Ok(())
//! # }
//! ```

pub mod completion;
pub mod config;
pub mod stats;

#[cfg(test)]
pub mod tests;

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::app::cache::{CacheKey, CacheStore};
use crate::app::client::{ReportClients, ReportTransport};
use crate::app::dates::DateRange;
use crate::app::models::{ReportTable, Source};
use crate::auth::Tokens;
use crate::config::{AppConfig, ClientProfile};
use crate::errors::{AppError, Result};

pub use completion::RunReport;
pub use config::{RunOptions, SourceRanges};
pub use stats::{RunStats, SourceStats};

/// Drives the three report clients and the cache store
pub struct Coordinator {
    config: AppConfig,
    store: CacheStore,
    clients: ReportClients,
}

impl Coordinator {
    /// Create a coordinator
    ///
    /// # Errors
    ///
    /// Returns `CacheError::UnknownEncoding` if the output encoding is
    /// not known.
    pub fn new(
        config: AppConfig,
        tokens: &Tokens,
        transport: Arc<dyn ReportTransport>,
    ) -> Result<Self> {
        let store = CacheStore::new(config.output.clone())?;
        let clients = ReportClients::new(transport, tokens, &config);
        Ok(Self {
            config,
            store,
            clients,
        })
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Process the selected clients and sources
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an unknown client name, and
    /// `AppError::ClientsFailed` after the whole roster ran if any client
    /// failed.
    pub async fn run(&self, options: &RunOptions) -> Result<RunStats> {
        let started = Instant::now();
        let profiles = self.config.select_clients(&options.clients)?;
        let ranges = SourceRanges::for_anchor(&self.config, options.anchor);
        let sources = options.selected_sources();

        info!(
            "Starting run for {} client(s), sources: {}",
            profiles.len(),
            sources
                .iter()
                .map(Source::name)
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut stats = RunStats::default();
        for profile in &profiles {
            match self.run_client(profile, &ranges, &sources).await {
                Ok(client_stats) => stats.sources.extend(client_stats),
                Err(e) => {
                    error!(
                        "Client {} failed ({}): {}",
                        profile.name,
                        e.category(),
                        e
                    );
                    stats.failed_clients.push(profile.name.clone());
                }
            }
        }
        stats.duration = started.elapsed();

        info!(
            "Run finished in {:.1}s: {} rows saved, {} client(s) failed",
            stats.duration.as_secs_f64(),
            stats.rows_saved(),
            stats.failed_clients.len()
        );

        if stats.is_success() {
            Ok(stats)
        } else {
            Err(AppError::ClientsFailed {
                clients: stats.failed_clients,
            })
        }
    }

    /// Run the selected sources of one client, stopping at the first failure
    pub async fn run_client(
        &self,
        profile: &ClientProfile,
        ranges: &SourceRanges,
        sources: &[Source],
    ) -> Result<Vec<SourceStats>> {
        info!("Processing client {}", profile.name);
        let mut results = Vec::with_capacity(sources.len());

        for &source in sources {
            let started = Instant::now();
            let range = ranges.get(source);
            let table = self.fetch_source(profile, source, range).await;
            let rows_fetched = table.len();

            let key = CacheKey::new(profile.name.as_str(), source);
            let outcome = self.store.save(&key, table, range)?;

            let duration = started.elapsed();
            info!(
                "{} finished in {:.3}s ({:.2} min), {} rows fetched",
                key,
                duration.as_secs_f64(),
                duration.as_secs_f64() / 60.0,
                rows_fetched
            );

            results.push(SourceStats {
                client: profile.name.clone(),
                source,
                rows_fetched,
                outcome,
                duration,
            });
        }

        Ok(results)
    }

    async fn fetch_source(
        &self,
        profile: &ClientProfile,
        source: Source,
        range: &DateRange,
    ) -> ReportTable {
        match source {
            Source::Direct => self.clients.direct.fetch_all(&profile.logins, range).await,
            Source::Metrica => {
                self.clients
                    .metrica
                    .fetch_all(&profile.metrica_counter, range)
                    .await
            }
            Source::AppMetrica => {
                let direct_key = CacheKey::new(profile.name.as_str(), Source::Direct);
                self.clients
                    .appmetrica
                    .fetch_from_cache(&self.store, &direct_key, &profile.appmetrica_app, range)
                    .await
            }
        }
    }
}
