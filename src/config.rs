//! Configuration management for ad_report_sync
//!
//! All settings live in one TOML file. Every section is optional and falls
//! back to the built-in defaults, so running without any config file fetches
//! the default client roster into `./data`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, Level};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::app::cache::CacheConfig;
use crate::app::campaign::CampaignSchema;
use crate::app::client::{AppMetricaConfig, DirectConfig, HttpConfig, MetricaConfig};
use crate::constants::{clients, logging};
use crate::errors::{AppError, ConfigError, ConfigResult, Result};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Cache files
    pub output: CacheConfig,
    /// Campaign name decomposition
    pub campaign: CampaignSchema,
    /// Direct reports
    pub direct: DirectConfig,
    /// Metrica stat API
    pub metrica: MetricaConfig,
    /// AppMetrica stat API
    pub appmetrica: AppMetricaConfig,
    /// HTTP client settings
    pub http: HttpConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Client roster, processed in order
    pub clients: Vec<ClientProfile>,
}

/// Accounts of one client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientProfile {
    /// Client name, used in cache file names
    pub name: String,
    /// Direct logins
    #[serde(default)]
    pub logins: Vec<String>,
    /// Metrica counter id
    pub metrica_counter: String,
    /// AppMetrica application id
    pub appmetrica_app: String,
}

impl ClientProfile {
    /// The built-in client
    pub fn eapteka() -> Self {
        Self {
            name: clients::EAPTEKA.to_string(),
            logins: clients::EAPTEKA_LOGINS.iter().map(|l| l.to_string()).collect(),
            metrica_counter: clients::EAPTEKA_METRICA_COUNTER.to_string(),
            appmetrica_app: clients::EAPTEKA_APPMETRICA_APP.to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when neither flags nor `RUST_LOG` set one
    pub level: String,
    /// Also write logs to a daily file `<log_dir>/YYYY-MM-DD.log`
    pub file_logging: bool,
    /// Folder of the dated log files
    pub log_dir: PathBuf,
    /// Number of daily files kept
    pub max_log_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
            file_logging: true,
            log_dir: PathBuf::from(logging::DEFAULT_LOG_DIR),
            max_log_files: logging::MAX_LOG_FILES,
        }
    }
}

impl LoggingConfig {
    /// Event filter for this crate at `level_override` or the configured level
    ///
    /// Completion markers stay enabled at info on every level, quiet included.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when the level is not a valid
    /// filter directive.
    pub fn env_filter(
        &self,
        base: EnvFilter,
        level_override: Option<Level>,
    ) -> ConfigResult<EnvFilter> {
        let level = level_override
            .map(|level| level.to_string().to_lowercase())
            .unwrap_or_else(|| self.level.clone());

        let parse = |raw: String| {
            raw.parse::<Directive>()
                .map_err(|e| ConfigError::InvalidValue {
                    field: "logging.level".to_string(),
                    value: level.clone(),
                    reason: e.to_string(),
                })
        };
        let crate_directive = parse(format!("{}={}", logging::CRATE_TARGET, level))?;
        let completion_directive = parse(format!("{}=info", logging::COMPLETION_TARGET))?;

        Ok(base
            .add_directive(crate_directive)
            .add_directive(completion_directive))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output: CacheConfig::default(),
            campaign: CampaignSchema::default(),
            direct: DirectConfig::default(),
            metrica: MetricaConfig::default(),
            appmetrica: AppMetricaConfig::default(),
            http: HttpConfig::default(),
            logging: LoggingConfig::default(),
            clients: vec![ClientProfile::eapteka()],
        }
    }
}

impl AppConfig {
    /// Load configuration with precedence:
    /// 1. Explicit `--config` file
    /// 2. First file found in the standard locations
    /// 3. Built-in defaults
    ///
    /// # Errors
    ///
    /// Fails when an explicit file does not exist, a file cannot be read or
    /// parsed, or the result does not validate.
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path }.into());
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        let config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    pub fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![
            PathBuf::from("./ad-report-sync.toml"),
            PathBuf::from("./config.toml"),
        ];
        if let Ok(path) = Self::get_default_config_path() {
            search_paths.push(path);
        }

        let found = search_paths.into_iter().find(|path| path.exists());
        if let Some(path) = &found {
            debug!("Found config file: {}", path.display());
        }
        found
    }

    /// Get the default config file path for the current user
    pub fn get_default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AppError::generic("Could not determine user config directory"))?;

        Ok(config_dir.join("ad-report-sync").join("config.toml"))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::generic(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config = Self::from_toml(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Render configuration as TOML
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check cross-field rules serde cannot express
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` listing every violation.
    pub fn validate(&self) -> ConfigResult<()> {
        let mut errors = Vec::new();

        let mut seen = HashSet::new();
        for client in &self.clients {
            if client.name.trim().is_empty() {
                errors.push("clients: client name must not be empty".to_string());
            } else if !seen.insert(client.name.as_str()) {
                errors.push(format!("clients: duplicate client name '{}'", client.name));
            }
        }

        if self.campaign.columns.is_empty() {
            errors.push("campaign.columns must not be empty".to_string());
        }
        for (field, days) in [
            ("direct.days", self.direct.days),
            ("metrica.days", self.metrica.days),
            ("appmetrica.days", self.appmetrica.days),
        ] {
            if days == 0 {
                errors.push(format!("{} must be at least 1", field));
            }
        }
        if self.direct.max_poll_attempts == 0 {
            errors.push("direct.max_poll_attempts must be at least 1".to_string());
        }
        if self.direct.cost_divisor == 0.0 {
            errors.push("direct.cost_divisor must be non-zero".to_string());
        }
        if self.http.rate_limit_rps == 0 {
            errors.push("http.rate_limit_rps must be at least 1".to_string());
        }
        if self.logging.max_log_files == 0 {
            errors.push("logging.max_log_files must be at least 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationFailed { errors })
        }
    }

    /// Clients whose name is in `names`, or all of them when `names` is empty
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a name that is not configured.
    pub fn select_clients(&self, names: &[String]) -> ConfigResult<Vec<ClientProfile>> {
        if names.is_empty() {
            return Ok(self.clients.clone());
        }
        names
            .iter()
            .map(|name| {
                self.clients
                    .iter()
                    .find(|client| &client.name == name)
                    .cloned()
                    .ok_or_else(|| ConfigError::InvalidValue {
                        field: "client".to_string(),
                        value: name.clone(),
                        reason: "No such client in the configuration".to_string(),
                    })
            })
            .collect()
    }

    /// Default configuration content with a comment header
    pub fn generate_default_config_content() -> ConfigResult<String> {
        Ok(format!(
            "# ad_report_sync configuration\n\
             # Every section is optional; missing values fall back to the defaults below.\n\
             # Durations accept humantime values such as \"1s\", \"90s\" or \"2h\".\n\n{}",
            Self::default().to_toml()?
        ))
    }

    /// Write the default configuration to `path`
    ///
    /// # Errors
    ///
    /// Refuses to overwrite an existing file unless `force` is set.
    pub async fn write_default(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(AppError::generic(format!(
                "Config file {} already exists (use --force to overwrite)",
                path.display()
            )));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::generic(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = Self::generate_default_config_content()?;
        tokio::fs::write(path, content).await.map_err(|e| {
            AppError::generic(format!(
                "Failed to write config file {}: {}",
                path.display(),
                e
            ))
        })?;

        info!("Wrote default configuration to {}", path.display());
        Ok(())
    }
}
