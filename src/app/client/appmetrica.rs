//! AppMetrica stat client
//!
//! AppMetrica has no campaign dimension usable here, so revenue is requested
//! once per (day, campaign) with a `utm_campaign` filter over the attribution
//! window. The campaign universe comes from the client's Direct cache file.

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::app::cache::{CacheKey, CacheStore};
use crate::app::campaign::CampaignSchema;
use crate::app::client::http::{parse_endpoint, ApiRequest, ReportTransport};
use crate::app::client::stat::StatResponse;
use crate::app::dates::{format_date, DateRange};
use crate::app::models::{format_decimal, ReportTable, Source};
use crate::constants::{appmetrica, files};
use crate::errors::{FetchError, FetchResult};

/// AppMetrica source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMetricaConfig {
    pub url: String,
    /// Days re-fetched per run
    pub days: u32,
    /// Length of the attribution window before each day
    pub attribution_days: u32,
    /// Row limit per request
    pub limit: u32,
    /// Campaigns containing this substring are skipped
    pub excluded_campaign_marker: String,
}

impl Default for AppMetricaConfig {
    fn default() -> Self {
        Self {
            url: appmetrica::URL.to_string(),
            days: appmetrica::DAYS_TO_FETCH,
            attribution_days: appmetrica::ATTRIBUTION_DAYS,
            limit: appmetrica::LIMIT,
            excluded_campaign_marker: appmetrica::EXCLUDED_CAMPAIGN_MARKER.to_string(),
        }
    }
}

/// Result of one (day, campaign) request
#[derive(Debug, Clone, PartialEq)]
pub struct AppMetricaRecord {
    pub date: String,
    pub campaign: String,
    pub transactions: i64,
    pub revenue: f64,
}

impl AppMetricaRecord {
    /// Explicit zero row for a pair the API has no data for
    pub fn zero(date: &str, campaign: &str) -> Self {
        Self {
            date: date.to_string(),
            campaign: campaign.to_string(),
            transactions: 0,
            revenue: 0.0,
        }
    }

    /// Cells in `Date, CampaignName, Transactions, Revenue` order
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.date.clone(),
            self.campaign.clone(),
            self.transactions.to_string(),
            format_decimal(self.revenue),
        ]
    }
}

/// Columns of a record, before enrichment
pub const APPMETRICA_COLUMNS: [&str; 4] = [
    files::DATE_COLUMN,
    files::CAMPAIGN_COLUMN,
    files::TRANSACTIONS_COLUMN,
    files::REVENUE_COLUMN,
];

/// Client for the AppMetrica stat API
pub struct AppMetricaClient {
    transport: Arc<dyn ReportTransport>,
    token: String,
    config: AppMetricaConfig,
    schema: CampaignSchema,
}

impl AppMetricaClient {
    pub fn new(
        transport: Arc<dyn ReportTransport>,
        token: impl Into<String>,
        config: AppMetricaConfig,
        schema: CampaignSchema,
    ) -> Self {
        Self {
            transport,
            token: token.into(),
            config,
            schema,
        }
    }

    /// `utm_campaign` filter over the attribution window ending on `day`
    pub fn campaign_filter(&self, campaign: &str, day: NaiveDate) -> String {
        let window_start = day - ChronoDuration::days(i64::from(self.config.attribution_days));
        format!(
            "(exists ym:o:device with (exists(urlParamKey=='utm_campaign' and urlParamValue=='{}') and specialDefaultDate>='{}' and specialDefaultDate<='{}'))",
            campaign,
            format_date(window_start),
            format_date(day)
        )
    }

    /// Build the stat request for one (day, campaign) pair
    pub fn build_request(
        &self,
        app_id: &str,
        day: NaiveDate,
        campaign: &str,
    ) -> FetchResult<ApiRequest> {
        let url = parse_endpoint(&self.config.url)?;
        let date = format_date(day);
        Ok(ApiRequest::get(url)
            .with_header("Authorization", format!("OAuth {}", self.token))
            .with_query("ids", app_id)
            .with_query("date1", date.as_str())
            .with_query("date2", date.as_str())
            .with_query("group", "Day")
            .with_query("metrics", appmetrica::METRICS)
            .with_query("dimensions", appmetrica::DIMENSIONS)
            .with_query("limit", self.config.limit.to_string())
            .with_query("accuracy", "1")
            .with_query("include_undefined", "true")
            .with_query("currency", "RUB")
            .with_query("event_attribution", "last_appmetrica")
            .with_query("sort", appmetrica::SORT)
            .with_query("lang", "ru")
            .with_query("request_domain", "ru")
            .with_query("filters", self.campaign_filter(campaign, day)))
    }

    /// Request one pair; empty data becomes a zero record
    pub async fn fetch_pair(
        &self,
        app_id: &str,
        day: NaiveDate,
        campaign: &str,
    ) -> FetchResult<AppMetricaRecord> {
        let request = self.build_request(app_id, day, campaign)?;
        debug!("AppMetrica request: {} {:?}", request.url, request.query);

        let response = self.transport.execute(request).await?;
        if !response.status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: response.status.as_u16(),
                request_id: response.request_id(),
                body: response.body,
            });
        }

        let date = format_date(day);
        let stat = StatResponse::parse(&response.body)?;
        let Some(first) = stat.data.first() else {
            warn!("AppMetrica: no data for campaign {} on {}", campaign, date);
            return Ok(AppMetricaRecord::zero(&date, campaign));
        };

        Ok(AppMetricaRecord {
            date,
            campaign: campaign.to_string(),
            transactions: first.metric(1).trunc() as i64,
            revenue: first.metric(0),
        })
    }

    /// Fetch every (day, campaign) pair, skipping excluded campaigns and
    /// failed pairs
    pub async fn fetch_all(
        &self,
        app_id: &str,
        campaigns: &[String],
        range: &DateRange,
    ) -> ReportTable {
        let marker = self.config.excluded_campaign_marker.as_str();
        let mut table = ReportTable::new(APPMETRICA_COLUMNS);

        for day in range.days() {
            for campaign in campaigns {
                if !marker.is_empty() && campaign.contains(marker) {
                    continue;
                }
                match self.fetch_pair(app_id, *day, campaign).await {
                    Ok(record) => table.push_row(record.cells()),
                    Err(e) => error!(
                        "AppMetrica campaign {} on {} failed: {}",
                        campaign,
                        format_date(*day),
                        e
                    ),
                }
            }
        }

        table.add_column(files::DEVICE_COLUMN, |_| appmetrica::DEVICE.to_string());
        table.add_column(files::ACCOUNT_COLUMN, |_| app_id.to_string());
        table.add_campaign_columns(files::CAMPAIGN_COLUMN, &self.schema);
        table.add_column(files::SOURCE_COLUMN, |_| {
            Source::AppMetrica.tag().to_string()
        });
        table
    }

    /// Fetch using the campaigns recorded in a Direct cache file
    ///
    /// A missing or unreadable cache file is logged and yields an empty table.
    pub async fn fetch_from_cache(
        &self,
        store: &CacheStore,
        direct_key: &CacheKey,
        app_id: &str,
        range: &DateRange,
    ) -> ReportTable {
        let campaigns = match store.load(direct_key) {
            Ok(Some(direct)) => direct.unique_values(files::CAMPAIGN_COLUMN),
            Ok(None) => {
                error!(
                    "AppMetrica: campaign file {} not found",
                    store.path_for(direct_key).display()
                );
                return ReportTable::default();
            }
            Err(e) => {
                error!("AppMetrica: cannot read campaign file: {}", e);
                return ReportTable::default();
            }
        };

        info!(
            "AppMetrica export, app {}: {} campaigns over {}",
            app_id,
            campaigns.len(),
            range
        );
        self.fetch_all(app_id, &campaigns, range).await
    }
}
