//! Configuration management for greatness-client.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::Args;
use crate::controller::DEFAULT_ERROR_DISMISS;
use crate::transport::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine connection.
    pub server: ServerSection,
    /// Client behaviour.
    pub client: ClientSection,
    /// Analytics.
    pub analytics: AnalyticsSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Engine connection section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// API root, e.g. `http://127.0.0.1:8000/api`.
    pub base_url: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Client behaviour section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSection {
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// How long a transition error stays visible, in milliseconds.
    pub error_dismiss_ms: u64,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            error_dismiss_ms: DEFAULT_ERROR_DISMISS.as_millis() as u64,
        }
    }
}

/// Analytics section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsSection {
    /// Emit state view events.
    pub enabled: bool,
}

impl Default for AnalyticsSection {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace) or a full filter directive.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("GREATNESS_SERVER_URL") {
            if !url.is_empty() {
                self.server.base_url = url;
            }
        }

        if let Ok(secs) = std::env::var("GREATNESS_REQUEST_TIMEOUT") {
            if let Ok(secs) = secs.parse() {
                self.client.request_timeout_secs = secs;
            }
        }

        if let Ok(ms) = std::env::var("GREATNESS_ERROR_DISMISS_MS") {
            if let Ok(ms) = ms.parse() {
                self.client.error_dismiss_ms = ms;
            }
        }

        if let Ok(flag) = std::env::var("GREATNESS_ANALYTICS") {
            self.analytics.enabled = !matches!(flag.as_str(), "0" | "false" | "off" | "no");
        }

        if let Ok(level) = std::env::var("GREATNESS_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(ref server) = args.server {
            self.server.base_url = server.clone();
        }

        if let Some(secs) = args.timeout_secs {
            self.client.request_timeout_secs = secs;
        }

        if let Some(ms) = args.dismiss_ms {
            self.client.error_dismiss_ms = ms;
        }

        if args.no_analytics {
            self.analytics.enabled = false;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env();
        config.apply_args(args);

        Ok(config)
    }

    /// Validated engine API root.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.server.base_url)
            .map_err(|_| ConfigError::InvalidUrl(self.server.base_url.clone()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            _ => Err(ConfigError::InvalidUrl(self.server.base_url.clone())),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.client.request_timeout_secs)
    }

    pub fn error_dismiss(&self) -> Duration {
        Duration::from_millis(self.client.error_dismiss_ms)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parsing error.
    #[error("failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),
    /// Engine URL is not an http(s) URL.
    #[error("invalid server URL: {0}")]
    InvalidUrl(String),
}
