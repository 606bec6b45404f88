//! Configuration types and loading

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_STATUS_POLL_SECS: u64 = 30;
pub const DEFAULT_INVENTORY_POLL_SECS: u64 = 300;
pub const DEFAULT_REALTIME_CHANNEL: &str = "project-updates";

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    /// Backend API configuration
    pub api: ApiConfig,

    /// Polling cadences
    pub sync: SyncConfig,

    /// Realtime change feed configuration
    pub realtime: RealtimeConfig,

    /// Session (bearer token) configuration
    pub session: SessionConfig,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL without trailing slash
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
        }
    }
}

/// Poll cadences per resource class, in seconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Fast-changing, status-like data
    pub status_poll_secs: u64,
    /// Slow-changing inventory and progress data
    pub inventory_poll_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            status_poll_secs: DEFAULT_STATUS_POLL_SECS,
            inventory_poll_secs: DEFAULT_INVENTORY_POLL_SECS,
        }
    }
}

impl SyncConfig {
    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_poll_secs)
    }

    pub fn inventory_interval(&self) -> Duration {
        Duration::from_secs(self.inventory_poll_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RealtimeConfig {
    pub enabled: bool,
    pub channel: String,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            channel: DEFAULT_REALTIME_CHANNEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SessionConfig {
    /// Bearer token; `None` means no session is present
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// Views refuse to load without a session
    #[serde(default)]
    pub require_session: bool,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Fallback filter when RUST_LOG is not set
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            default_filter: "info,cm_sync=debug,cm_client=debug".to_string(),
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl From<ConfigError> for crate::error::CmError {
    fn from(err: ConfigError) -> Self {
        crate::error::CmError::Config(err.to_string())
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("CM_API_URL").or_else(|| lookup("NEXT_PUBLIC_API_URL")) {
            config.api.base_url = normalize_base_url("CM_API_URL", &url)?;
        }

        if let Some(secs) = lookup("CM_STATUS_POLL_SECS") {
            config.sync.status_poll_secs = parse_interval("CM_STATUS_POLL_SECS", &secs)?;
        }
        if let Some(secs) = lookup("CM_INVENTORY_POLL_SECS") {
            config.sync.inventory_poll_secs = parse_interval("CM_INVENTORY_POLL_SECS", &secs)?;
        }

        if let Some(token) = lookup("CM_ACCESS_TOKEN") {
            if !token.trim().is_empty() {
                config.session.access_token = Some(token.trim().to_string());
            }
        }

        if let Some(v) = lookup("CM_REQUIRE_SESSION") {
            config.session.require_session = parse_flag(&v);
        }

        if let Some(channel) = lookup("CM_REALTIME_CHANNEL") {
            config.realtime.channel = channel;
        }
        if let Some(v) = lookup("CM_REALTIME_ENABLED") {
            config.realtime.enabled = parse_flag(&v);
        }

        if let Some(format) = lookup("CM_LOG_FORMAT") {
            config.logging.format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" | "text" => LogFormat::Pretty,
                other => {
                    return Err(ConfigError::InvalidValue {
                        key: "CM_LOG_FORMAT".to_string(),
                        message: format!("unknown format '{}'", other),
                    })
                }
            };
        }

        Ok(config)
    }

    /// Override the API base URL (CLI flag)
    pub fn with_base_url(mut self, url: &str) -> Result<Self, ConfigError> {
        self.api.base_url = normalize_base_url("api_url", url)?;
        Ok(self)
    }
}

fn normalize_base_url(key: &str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    url::Url::parse(trimmed).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    Ok(trimmed.to_string())
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

fn parse_interval(key: &str, raw: &str) -> Result<u64, ConfigError> {
    let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{}' is not a number of seconds", raw),
    })?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "interval must be greater than zero".to_string(),
        });
    }
    Ok(secs)
}
