//! Metrica stat client
//!
//! One request covers the whole date span. Rows are attributed to a campaign
//! through the last-sign Direct click order dimension, whose value looks like
//! `msk-search-auto|123456`; values without the campaign delimiter are
//! untagged traffic and dropped.

use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::app::campaign::{normalize_device, CampaignSchema};
use crate::app::client::http::{parse_endpoint, ApiRequest, ReportTransport};
use crate::app::client::stat::StatResponse;
use crate::app::dates::{format_date, DateRange};
use crate::app::models::{ReportTable, Source};
use crate::constants::{files, metrica};
use crate::errors::{FetchError, FetchResult};

/// Metrica source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricaConfig {
    pub url: String,
    /// Days re-fetched per run
    pub days: u32,
    /// Row limit per request
    pub limit: u32,
}

impl Default for MetricaConfig {
    fn default() -> Self {
        Self {
            url: metrica::URL.to_string(),
            days: metrica::DAYS_TO_FETCH,
            limit: metrica::LIMIT,
        }
    }
}

/// Columns produced by the stat response, before enrichment
pub const METRICA_COLUMNS: [&str; 5] = [
    files::DATE_COLUMN,
    files::CAMPAIGN_COLUMN,
    files::DEVICE_COLUMN,
    files::TRANSACTIONS_COLUMN,
    files::REVENUE_COLUMN,
];

/// Client for the Metrica stat API
pub struct MetricaClient {
    transport: Arc<dyn ReportTransport>,
    token: String,
    config: MetricaConfig,
    schema: CampaignSchema,
}

impl MetricaClient {
    pub fn new(
        transport: Arc<dyn ReportTransport>,
        token: impl Into<String>,
        config: MetricaConfig,
        schema: CampaignSchema,
    ) -> Self {
        Self {
            transport,
            token: token.into(),
            config,
            schema,
        }
    }

    /// Build the stat request for one counter and period
    pub fn build_request(
        &self,
        counter_id: &str,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> FetchResult<ApiRequest> {
        let url = parse_endpoint(&self.config.url)?;
        Ok(ApiRequest::get(url)
            .with_header("Authorization", format!("OAuth {}", self.token))
            .with_query("ids", counter_id)
            .with_query("metrics", metrica::METRICS)
            .with_query("dimensions", metrica::DIMENSIONS)
            .with_query("date1", format_date(date_from))
            .with_query("date2", format_date(date_to))
            .with_query("accuracy", "full")
            .with_query("limit", self.config.limit.to_string()))
    }

    /// Turn a stat response into enriched rows
    pub fn parse_report(&self, response: &StatResponse, counter_id: &str) -> ReportTable {
        let mut table = ReportTable::new(METRICA_COLUMNS);

        for row in &response.data {
            let click_order = row.dimension(1);
            if !self.schema.is_tagged(click_order) {
                continue;
            }
            let campaign = click_order
                .split(metrica::CAMPAIGN_SUFFIX_SEPARATOR)
                .next()
                .unwrap_or("");
            let device = normalize_device(row.dimension(2)).unwrap_or("");
            let transactions = row.metric(0).trunc() as i64;
            let revenue = row.metric(1).trunc() as i64;

            table.push_row(vec![
                row.dimension(0).to_string(),
                campaign.to_string(),
                device.to_string(),
                transactions.to_string(),
                revenue.to_string(),
            ]);
        }

        table.add_column(files::ACCOUNT_COLUMN, |_| counter_id.to_string());
        table.add_campaign_columns(files::CAMPAIGN_COLUMN, &self.schema);
        table.add_column(files::SOURCE_COLUMN, |_| {
            Source::Metrica.tag().to_string()
        });
        table
    }

    async fn fetch_report(
        &self,
        counter_id: &str,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> FetchResult<StatResponse> {
        let request = self.build_request(counter_id, date_from, date_to)?;
        let response = self.transport.execute(request).await?;
        if response.status != StatusCode::OK {
            return Err(FetchError::UnexpectedStatus {
                status: response.status.as_u16(),
                request_id: response.request_id(),
                body: response.body,
            });
        }
        StatResponse::parse(&response.body)
    }

    /// Fetch the whole range for one counter
    ///
    /// Failures are logged and produce an empty table.
    pub async fn fetch_all(&self, counter_id: &str, range: &DateRange) -> ReportTable {
        let (Some(date_from), Some(date_to)) = (range.first_day(), range.last_day()) else {
            warn!("Metrica: empty date range, nothing to fetch");
            return ReportTable::default();
        };

        info!("Metrica export, counter {}: {}", counter_id, range);
        match self.fetch_report(counter_id, date_from, date_to).await {
            Ok(response) => {
                if response.data.is_empty() {
                    warn!("Metrica returned no data for counter {}", counter_id);
                }
                let table = self.parse_report(&response, counter_id);
                info!(
                    "Metrica counter {}: {} of {} rows attributed to campaigns",
                    counter_id,
                    table.len(),
                    response.data.len()
                );
                table
            }
            Err(e) => {
                error!("Metrica counter {} failed: {}", counter_id, e);
                ReportTable::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::client::http::ApiResponse;
    use crate::app::client::tests::ScriptedTransport;
    use crate::app::dates::parse_date;

    const BODY: &str = r#"{"data": [
        {"dimensions": [{"name": "2024-01-01"}, {"name": "msk-search-auto|123"}, {"name": "PC"}],
         "metrics": [3.0, 1500.75]},
        {"dimensions": [{"name": "2024-01-01"}, {"name": "Not attributed"}, {"name": "PC"}],
         "metrics": [9.0, 900.0]},
        {"dimensions": [{"name": "2024-01-02"}, {"name": "spb-rsya"}, {"name": "Watch"}],
         "metrics": [1.0, 99.9]},
        {"dimensions": [{"name": "2024-01-02"}, {"name": null}, {"name": "TV"}],
         "metrics": [1.0, 1.0]}
    ]}"#;

    fn client(transport: Arc<ScriptedTransport>) -> MetricaClient {
        let config = MetricaConfig {
            url: "https://metrica.test/stat/v1/data".to_string(),
            ..Default::default()
        };
        MetricaClient::new(transport, "m-token", config, CampaignSchema::default())
    }

    fn range() -> DateRange {
        DateRange::last_days(parse_date("2024-01-03").unwrap(), 2)
    }

    #[test]
    fn test_request_contract() {
        let client = client(Arc::new(ScriptedTransport::new()));
        let day = parse_date("2024-01-01").unwrap();
        let request = client.build_request("22004554", day, day).unwrap();

        assert_eq!(request.header("Authorization"), Some("OAuth m-token"));
        assert_eq!(request.query_value("ids"), Some("22004554"));
        assert_eq!(
            request.query_value("dimensions"),
            Some("ym:s:date,ym:s:lastsignDirectClickOrder, ym:s:DeviceCategory")
        );
        assert_eq!(request.query_value("accuracy"), Some("full"));
        assert_eq!(request.query_value("limit"), Some("10000"));
    }

    #[tokio::test]
    async fn test_fetch_filters_and_normalizes() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond("https://metrica.test", ApiResponse::new(StatusCode::OK, BODY)),
        );
        let table = client(transport.clone()).fetch_all("22004554", &range()).await;

        assert_eq!(table.len(), 2);
        let first = &table.rows()[0];
        assert_eq!(table.cell(first, "CampaignName"), Some("msk-search-auto"));
        assert_eq!(table.cell(first, "Device"), Some("DESKTOP"));
        assert_eq!(table.cell(first, "Transactions"), Some("3"));
        assert_eq!(table.cell(first, "Revenue"), Some("1500"));
        assert_eq!(table.cell(first, "Account"), Some("22004554"));
        assert_eq!(table.cell(first, "Category"), Some("all"));
        assert_eq!(table.cell(first, "Source"), Some("metrica"));
        assert_eq!(table.cell(&table.rows()[1], "Device"), Some(""));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query_value("date1"), Some("2024-01-01"));
        assert_eq!(requests[0].query_value("date2"), Some("2024-01-02"));
    }

    #[tokio::test]
    async fn test_error_status_yields_empty_table() {
        let transport = Arc::new(ScriptedTransport::new().respond(
            "https://metrica.test",
            ApiResponse::new(StatusCode::FORBIDDEN, "{\"errors\":[]}"),
        ));
        assert!(client(transport).fetch_all("1", &range()).await.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_yields_empty_table() {
        let transport = Arc::new(ScriptedTransport::new().fail("https://metrica.test"));
        assert!(client(transport).fetch_all("1", &range()).await.is_empty());
    }
}
