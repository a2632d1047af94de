//! Error types for ad_report_sync
//!
//! Errors are grouped by concern: token loading, report fetching, cache files
//! and configuration. `AppError` wraps them all for the command layer and
//! decides how a failure is reported at the end of a run.

use std::path::PathBuf;

use thiserror::Error;

/// Token loading errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// A required token is not set in the environment
    #[error("Missing API token. Set the {var} environment variable (or add it to .env)")]
    MissingToken { var: &'static str },

    /// A token is set but contains only whitespace
    #[error("API token in {var} is empty")]
    EmptyToken { var: &'static str },
}

/// Report fetching errors for all three sources
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure (connection refused, TLS, timeout)
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Endpoint URL could not be parsed
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Direct rejected the request parameters or the report queue is full
    #[error("Report request rejected (HTTP 400, RequestId: {request_id})")]
    BadRequest { request_id: String, body: String },

    /// Direct failed to build the report, retry later
    #[error("Report service error (HTTP 500, RequestId: {request_id})")]
    ServerError { request_id: String, body: String },

    /// Direct gave up building the report, the request must be narrowed
    #[error("Report generation timed out on the server (HTTP 502, RequestId: {request_id})")]
    ReportTimeout { request_id: String, body: String },

    /// Any other non-success status
    #[error("Unexpected HTTP status {status} (RequestId: {request_id})")]
    UnexpectedStatus {
        status: u16,
        request_id: String,
        body: String,
    },

    /// The report was still being built when the polling budget ran out
    #[error("Report still not ready after {attempts} attempts and {waited_secs}s of waiting")]
    PollTimeout { attempts: u32, waited_secs: u64 },

    /// JSON response body could not be decoded
    #[error("Failed to decode JSON response")]
    Json(#[from] serde_json::Error),

    /// TSV response body could not be decoded
    #[error("Failed to decode TSV report")]
    Tsv(#[from] csv::Error),

    /// Response decoded but does not have the expected shape
    #[error("Malformed report: {reason}")]
    MalformedReport { reason: String },
}

/// Cache file errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Output folder could not be created
    #[error("Cache directory not accessible: {path}")]
    DirectoryNotAccessible { path: PathBuf },

    /// Reading or writing a cache file failed
    #[error("Cache file I/O failed for {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Delimited content could not be parsed or written
    #[error("Cache file is not valid delimited text")]
    Csv(#[from] csv::Error),

    /// Configured encoding label is not known
    #[error("Unknown cache file encoding: {label}")]
    UnknownEncoding { label: String },

    /// Content has characters the cache encoding cannot represent
    #[error("Cannot encode {path} as {encoding}: unmappable characters")]
    Unencodable { path: PathBuf, encoding: String },

    /// An existing cache file holds bytes invalid in the cache encoding
    #[error("Cannot decode {path} as {encoding}: invalid byte sequences")]
    Undecodable { path: PathBuf, encoding: String },

    /// A required column is missing from an existing cache file
    #[error("Cache file {path} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },

    /// Temp-file + rename failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Failed to serialize configuration")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Configuration validation failed
    #[error("Configuration validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<String> },
}

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    /// Token error
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Fetch error
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Cache error
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// One or more clients failed while the rest of the run completed
    #[error("Processing failed for client(s): {}", clients.join(", "))]
    ClientsFailed { clients: Vec<String> },

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is transient and a later run may succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Fetch(FetchError::Http(_))
            | AppError::Fetch(FetchError::ServerError { .. })
            | AppError::Fetch(FetchError::PollTimeout { .. }) => true,

            AppError::Auth(_)
            | AppError::Config(_)
            | AppError::Fetch(FetchError::BadRequest { .. })
            | AppError::Cache(CacheError::UnknownEncoding { .. }) => false,

            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "authentication",
            AppError::Fetch(_) => "fetch",
            AppError::Cache(_) => "cache",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::ClientsFailed { .. } => "clients",
            AppError::Generic { .. } => "generic",
        }
    }

    /// Short type name written to the `ERROR_TYPE=` completion marker
    pub fn type_name(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "AuthError",
            AppError::Fetch(_) => "FetchError",
            AppError::Cache(_) => "CacheError",
            AppError::Config(_) => "ConfigError",
            AppError::Io(_) => "IoError",
            AppError::ClientsFailed { .. } => "ClientsFailed",
            AppError::Generic { .. } => "GenericError",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Token result type alias
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Fetch result type alias
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Cache result type alias
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_is_fatal() {
        let error = AppError::from(AuthError::MissingToken {
            var: "YANDEX_DIRECT_TOKEN",
        });
        assert_eq!(error.category(), "authentication");
        assert!(!error.is_recoverable());
        assert!(error.to_string().contains("YANDEX_DIRECT_TOKEN"));
    }

    #[test]
    fn test_poll_timeout_is_recoverable() {
        let error = AppError::from(FetchError::PollTimeout {
            attempts: 3,
            waited_secs: 120,
        });
        assert_eq!(error.category(), "fetch");
        assert!(error.is_recoverable());
        assert_eq!(error.type_name(), "FetchError");
    }

    #[test]
    fn test_clients_failed_message_lists_clients() {
        let error = AppError::ClientsFailed {
            clients: vec!["eapteka".to_string(), "citilink".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Processing failed for client(s): eapteka, citilink"
        );
    }
}
