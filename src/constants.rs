//! Application constants for ad_report_sync
//!
//! This module centralizes the constants used throughout the application,
//! organized by functional domain. Most of them only seed the defaults of
//! [`crate::config::AppConfig`] and can be overridden from the config file.

use std::time::Duration;

/// Environment variable names for API tokens
pub mod env {
    /// Bearer token for the Direct reports API
    pub const DIRECT_TOKEN: &str = "YANDEX_DIRECT_TOKEN";

    /// OAuth token for the Metrica stat API
    pub const METRICA_TOKEN: &str = "YANDEX_METRICA_TOKEN";

    /// OAuth token for the AppMetrica stat API
    pub const APPMETRICA_TOKEN: &str = "YANDEX_APPMETRICA_TOKEN";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "ad-report-sync/0.1.0";

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Requests per second across all sources
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 5;

    /// Header carrying the Direct request id
    pub const REQUEST_ID_HEADER: &str = "RequestId";

    /// Header carrying the Direct polling delay in seconds
    pub const RETRY_IN_HEADER: &str = "retryIn";
}

/// Direct reports API
pub mod direct {
    use super::Duration;

    /// Report endpoint
    pub const URL: &str = "https://api.direct.yandex.com/json/v5/reports";

    /// Report name submitted with every request
    pub const REPORT_NAME: &str = "all_reports1";

    /// Requested report columns
    pub const REPORT_FIELDS: &[&str] = &[
        "Date",
        "CampaignName",
        "CampaignId",
        "Device",
        "Impressions",
        "Clicks",
        "Cost",
    ];

    /// Days fetched per run
    pub const DAYS_TO_FETCH: u32 = 45;

    /// Pause between two accounts
    pub const ACCOUNT_PACE: Duration = Duration::from_secs(1);

    /// Polling delay when the server omits `retryIn`
    pub const DEFAULT_RETRY_IN: Duration = Duration::from_secs(60);

    /// Maximum number of submissions of one report request
    pub const MAX_POLL_ATTEMPTS: u32 = 120;

    /// Maximum accumulated waiting time for one report
    pub const MAX_POLL_WAIT: Duration = Duration::from_secs(2 * 60 * 60);

    /// Cost is reported in micro-units without VAT
    pub const COST_MULTIPLIER: f64 = 1.2;

    /// Micro-units per currency unit
    pub const COST_DIVISOR: f64 = 1_000_000.0;

    /// Value of the `Source` column
    pub const SOURCE_TAG: &str = "yandex";
}

/// Metrica stat API
pub mod metrica {
    /// Stat endpoint
    pub const URL: &str = "https://api-metrika.yandex.net/stat/v1/data";

    /// Requested metrics
    pub const METRICS: &str = "ym:s:ecommercePurchases,ym:s:ecommerceRevenue";

    /// Requested dimensions, verbatim including the space before the last one
    pub const DIMENSIONS: &str = "ym:s:date,ym:s:lastsignDirectClickOrder, ym:s:DeviceCategory";

    /// Row limit per request
    pub const LIMIT: u32 = 10_000;

    /// Days fetched per run
    pub const DAYS_TO_FETCH: u32 = 4;

    /// Separator between the campaign name and the click order suffix
    pub const CAMPAIGN_SUFFIX_SEPARATOR: char = '|';

    /// Value of the `Source` column
    pub const SOURCE_TAG: &str = "metrica";
}

/// AppMetrica stat API
pub mod appmetrica {
    /// Stat endpoint
    pub const URL: &str = "https://api.appmetrica.yandex.ru/stat/v1/data";

    /// Requested metrics, revenue first
    pub const METRICS: &str = "ym:ec2:ecomRevenueFiatRUB,ym:ec2:ecomOrdersCount";

    /// Requested dimensions
    pub const DIMENSIONS: &str = "ym:ec2:date";

    /// Sort order
    pub const SORT: &str = "-ym:ec2:ecomOrdersCount";

    /// Row limit per request
    pub const LIMIT: u32 = 1_000;

    /// Days fetched per run
    pub const DAYS_TO_FETCH: u32 = 1;

    /// Attribution window length in days
    pub const ATTRIBUTION_DAYS: u32 = 7;

    /// Campaigns containing this substring are never requested
    pub const EXCLUDED_CAMPAIGN_MARKER: &str = "rmp";

    /// Device value of every AppMetrica row
    pub const DEVICE: &str = "MOBILE";

    /// Value of the `Source` column
    pub const SOURCE_TAG: &str = "appmetrica";
}

/// Campaign name decomposition
pub mod campaign {
    /// Delimiter between campaign attributes
    pub const DELIMITER: char = '-';

    /// Value of attributes missing from a campaign name
    pub const PLACEHOLDER: &str = "all";

    /// Attribute columns, in campaign name order
    pub const COLUMNS: &[&str] = &[
        "Geo",
        "Site_type",
        "Generation_method",
        "Category",
        "Subject",
        "Url_type",
    ];
}

/// Cache file constants
pub mod files {
    /// Default output folder
    pub const DEFAULT_FOLDER: &str = "data";

    /// Default cache encoding
    pub const DEFAULT_ENCODING: &str = "windows-1251";

    /// Cache field separator
    pub const FIELD_SEPARATOR: u8 = b';';

    /// Cache file extension
    pub const EXTENSION: &str = "csv";

    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Column every cache file is keyed on
    pub const DATE_COLUMN: &str = "Date";

    /// Campaign name column
    pub const CAMPAIGN_COLUMN: &str = "CampaignName";

    /// Account enrichment column
    pub const ACCOUNT_COLUMN: &str = "Account";

    /// Source enrichment column
    pub const SOURCE_COLUMN: &str = "Source";

    /// Device column
    pub const DEVICE_COLUMN: &str = "Device";

    /// Direct cost column
    pub const COST_COLUMN: &str = "Cost";

    /// Purchases column of the stat sources
    pub const TRANSACTIONS_COLUMN: &str = "Transactions";

    /// Revenue column of the stat sources
    pub const REVENUE_COLUMN: &str = "Revenue";
}

/// Date formatting
pub mod dates {
    /// Format of every date sent to the APIs and stored in caches
    pub const DATE_FORMAT: &str = "%Y-%m-%d";
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "info";

    /// Folder for dated log files
    pub const DEFAULT_LOG_DIR: &str = "logs";

    /// Dated log files kept before the oldest is removed
    pub const MAX_LOG_FILES: usize = 30;

    /// Target filtered by the `level` setting
    pub const CRATE_TARGET: &str = "ad_report_sync";

    /// Target of the run completion markers, always enabled at info
    pub const COMPLETION_TARGET: &str = "ad_report_sync::completion";
}

/// Default client roster
pub mod clients {
    /// Client name
    pub const EAPTEKA: &str = "eapteka";

    /// Direct logins
    pub const EAPTEKA_LOGINS: &[&str] = &["imedia-eapteka"];

    /// Metrica counter
    pub const EAPTEKA_METRICA_COUNTER: &str = "22004554";

    /// AppMetrica application
    pub const EAPTEKA_APPMETRICA_APP: &str = "2550202";
}

// Re-export commonly used constants for convenience
pub use env::{
    APPMETRICA_TOKEN as ENV_APPMETRICA_TOKEN, DIRECT_TOKEN as ENV_DIRECT_TOKEN,
    METRICA_TOKEN as ENV_METRICA_TOKEN,
};
pub use files::{DATE_COLUMN, TEMP_FILE_SUFFIX};
pub use http::USER_AGENT;
