//! Direct reports client
//!
//! The reports endpoint builds reports asynchronously. A submission answers
//! `201`/`202` while the report is queued or building, with a `retryIn`
//! header telling how long to wait before submitting again, and `200` with a
//! TSV body once it is ready. `400`, `500` and `502` are terminal.
//!
//! Each login is fetched on its own: one failing account is logged and
//! skipped, the rest of the batch goes on.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::app::campaign::CampaignSchema;
use crate::app::client::http::{parse_endpoint, ApiRequest, ApiResponse, ReportTransport};
use crate::app::dates::{format_date, DateRange};
use crate::app::models::{format_decimal, parse_number, ReportTable, Source};
use crate::constants::{direct, files, http};
use crate::errors::{FetchError, FetchResult};

/// Direct source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectConfig {
    /// Reports endpoint
    pub url: String,
    /// Report name sent with each request
    pub report_name: String,
    /// Requested report columns
    pub fields: Vec<String>,
    /// Days re-fetched per run
    pub days: u32,
    /// Pause between two accounts
    #[serde(with = "humantime_serde")]
    pub account_pace: Duration,
    /// Polling delay when the server sends no `retryIn`
    #[serde(with = "humantime_serde")]
    pub default_retry_in: Duration,
    /// Submissions of one request before giving up
    pub max_poll_attempts: u32,
    /// Accumulated polling delay before giving up
    #[serde(with = "humantime_serde")]
    pub max_poll_wait: Duration,
    /// Cost multiplier (VAT)
    pub cost_multiplier: f64,
    /// Cost divisor (micro-units)
    pub cost_divisor: f64,
}

impl Default for DirectConfig {
    fn default() -> Self {
        Self {
            url: direct::URL.to_string(),
            report_name: direct::REPORT_NAME.to_string(),
            fields: direct::REPORT_FIELDS.iter().map(|f| f.to_string()).collect(),
            days: direct::DAYS_TO_FETCH,
            account_pace: direct::ACCOUNT_PACE,
            default_retry_in: direct::DEFAULT_RETRY_IN,
            max_poll_attempts: direct::MAX_POLL_ATTEMPTS,
            max_poll_wait: direct::MAX_POLL_WAIT,
            cost_multiplier: direct::COST_MULTIPLIER,
            cost_divisor: direct::COST_DIVISOR,
        }
    }
}

/// What to do after one submission
#[derive(Debug)]
pub enum PollStep {
    /// Report is ready, body attached
    Ready(String),
    /// Report is still being built, submit again after the delay
    Pending(Duration),
    /// Terminal failure
    Failed(FetchError),
}

/// Map a reports endpoint response onto the polling state machine
pub fn classify_response(response: ApiResponse, default_retry_in: Duration) -> PollStep {
    match response.status {
        StatusCode::OK => PollStep::Ready(response.body),
        StatusCode::CREATED | StatusCode::ACCEPTED => {
            let retry_in = response
                .header(http::RETRY_IN_HEADER)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(default_retry_in);
            PollStep::Pending(retry_in)
        }
        StatusCode::BAD_REQUEST => PollStep::Failed(FetchError::BadRequest {
            request_id: response.request_id(),
            body: response.body,
        }),
        StatusCode::INTERNAL_SERVER_ERROR => PollStep::Failed(FetchError::ServerError {
            request_id: response.request_id(),
            body: response.body,
        }),
        StatusCode::BAD_GATEWAY => PollStep::Failed(FetchError::ReportTimeout {
            request_id: response.request_id(),
            body: response.body,
        }),
        other => PollStep::Failed(FetchError::UnexpectedStatus {
            status: other.as_u16(),
            request_id: response.request_id(),
            body: response.body,
        }),
    }
}

/// A finished report and how it was obtained
#[derive(Debug, Clone, PartialEq)]
pub struct PolledReport {
    /// Raw TSV body
    pub body: String,
    /// Number of submissions made
    pub attempts: u32,
    /// Delays slept between submissions
    pub waits: Vec<Duration>,
}

/// Client for the Direct reports API
pub struct DirectClient {
    transport: Arc<dyn ReportTransport>,
    token: String,
    config: DirectConfig,
    schema: CampaignSchema,
}

impl DirectClient {
    pub fn new(
        transport: Arc<dyn ReportTransport>,
        token: impl Into<String>,
        config: DirectConfig,
        schema: CampaignSchema,
    ) -> Self {
        Self {
            transport,
            token: token.into(),
            config,
            schema,
        }
    }

    /// Build the report request for one login and period
    pub fn build_request(
        &self,
        login: &str,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> FetchResult<ApiRequest> {
        let url = parse_endpoint(&self.config.url)?;
        let body = json!({
            "params": {
                "SelectionCriteria": {
                    "DateFrom": format_date(date_from),
                    "DateTo": format_date(date_to),
                },
                "FieldNames": self.config.fields,
                "ReportName": self.config.report_name,
                "ReportType": "CUSTOM_REPORT",
                "DateRangeType": "CUSTOM_DATE",
                "Format": "TSV",
                "IncludeVAT": "NO",
                "IncludeDiscount": "NO",
            }
        });
        let body = serde_json::to_string_pretty(&body)?;

        Ok(ApiRequest::post(url, body)
            .with_header("Authorization", format!("Bearer {}", self.token))
            .with_header("Client-Login", login)
            .with_header("Accept-Language", "ru")
            .with_header("processingMode", "auto"))
    }

    /// Submit `request` until the report is ready, fails, or the polling
    /// budget is spent
    ///
    /// # Errors
    ///
    /// Transport failures and terminal statuses are returned as-is;
    /// exceeding `max_poll_attempts` or `max_poll_wait` yields
    /// `FetchError::PollTimeout`.
    pub async fn poll_report(&self, request: &ApiRequest) -> FetchResult<PolledReport> {
        let mut waits = Vec::new();
        let mut waited = Duration::ZERO;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let response = self.transport.execute(request.clone()).await.map_err(|e| {
                error!("Connection to the Direct API failed: {}", e);
                e
            })?;

            match classify_response(response, self.config.default_retry_in) {
                PollStep::Ready(body) => {
                    info!("Direct report received after {} attempt(s)", attempts);
                    return Ok(PolledReport {
                        body,
                        attempts,
                        waits,
                    });
                }
                PollStep::Pending(delay) => {
                    if attempts >= self.config.max_poll_attempts
                        || waited.saturating_add(delay) > self.config.max_poll_wait
                    {
                        error!(
                            "Direct report still not ready after {} attempts ({}s waited), giving up",
                            attempts,
                            waited.as_secs()
                        );
                        return Err(FetchError::PollTimeout {
                            attempts,
                            waited_secs: waited.as_secs(),
                        });
                    }
                    warn!(
                        "Direct report is still being built, retrying in {}s",
                        delay.as_secs()
                    );
                    tokio::time::sleep(delay).await;
                    waits.push(delay);
                    waited = waited.saturating_add(delay);
                }
                PollStep::Failed(e) => {
                    error!(
                        "Direct report request failed: {}\nRequest body: {}\nResponse body: {}",
                        e,
                        request.body.as_deref().unwrap_or(""),
                        failure_body(&e)
                    );
                    return Err(e);
                }
            }
        }
    }

    /// Decode a finished TSV report into enriched rows
    ///
    /// The first line is the report title and is skipped. Summary rows
    /// (`Total rows: N`) are dropped, `Cost` is converted from micro-units,
    /// and `Account`, the campaign attributes and `Source` are appended.
    pub fn parse_report(&self, tsv: &str, login: &str) -> FetchResult<ReportTable> {
        let content = tsv.split_once('\n').map(|(_, rest)| rest).unwrap_or("");

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .quoting(false)
            .from_reader(content.as_bytes());

        let headers = reader.headers()?.clone();
        if headers.is_empty() || headers.iter().all(str::is_empty) {
            return Err(FetchError::MalformedReport {
                reason: "report has no header line".to_string(),
            });
        }

        let mut table = ReportTable::new(headers.iter());
        let date_index = table.column_index(files::DATE_COLUMN).unwrap_or(0);
        for record in reader.records() {
            let record = record?;
            let row: Vec<String> = record.iter().map(str::to_string).collect();
            if row.iter().all(String::is_empty) {
                continue;
            }
            let is_summary = row
                .get(date_index)
                .is_some_and(|date| date.to_lowercase().contains("total"));
            if is_summary {
                continue;
            }
            table.push_row(row);
        }

        self.scale_cost(&mut table)?;

        table.add_column(files::ACCOUNT_COLUMN, |_| login.to_string());
        table.add_campaign_columns(files::CAMPAIGN_COLUMN, &self.schema);
        table.add_column(files::SOURCE_COLUMN, |_| Source::Direct.tag().to_string());

        Ok(table)
    }

    fn scale_cost(&self, table: &mut ReportTable) -> FetchResult<()> {
        let multiplier = self.config.cost_multiplier;
        let divisor = self.config.cost_divisor;
        let mut invalid: Option<String> = None;

        table.map_column(files::COST_COLUMN, |raw| match parse_number(raw) {
            Some(value) => format_decimal(value * multiplier / divisor),
            None => {
                invalid.get_or_insert_with(|| raw.to_string());
                raw.to_string()
            }
        });

        match invalid {
            Some(raw) => Err(FetchError::MalformedReport {
                reason: format!("unparseable Cost value '{}'", raw),
            }),
            None => Ok(()),
        }
    }

    /// Fetch and decode the report of one login
    pub async fn fetch_account(
        &self,
        login: &str,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> FetchResult<ReportTable> {
        let request = self.build_request(login, date_from, date_to)?;
        let report = self.poll_report(&request).await?;
        debug!(
            "Direct report for {} took {} attempt(s)",
            login, report.attempts
        );
        self.parse_report(&report.body, login)
    }

    /// Fetch every login for the whole range, skipping failed accounts
    pub async fn fetch_all(&self, logins: &[String], range: &DateRange) -> ReportTable {
        let mut combined = ReportTable::default();
        let (Some(date_from), Some(date_to)) = (range.first_day(), range.last_day()) else {
            warn!("Direct: empty date range, nothing to fetch");
            return combined;
        };

        for (i, login) in logins.iter().enumerate() {
            if i > 0 && !self.config.account_pace.is_zero() {
                tokio::time::sleep(self.config.account_pace).await;
            }

            info!(
                "Direct export {}/{}, account: {}",
                i + 1,
                logins.len(),
                login
            );
            match self.fetch_account(login, date_from, date_to).await {
                Ok(table) => {
                    info!("Direct account {}: {} rows", login, table.len());
                    combined.extend_aligned(table);
                }
                Err(e) => {
                    error!("Direct account {} failed: {}", login, e);
                }
            }
        }

        combined
    }
}

fn failure_body(error: &FetchError) -> &str {
    match error {
        FetchError::BadRequest { body, .. }
        | FetchError::ServerError { body, .. }
        | FetchError::ReportTimeout { body, .. }
        | FetchError::UnexpectedStatus { body, .. } => body,
        _ => "",
    }
}
