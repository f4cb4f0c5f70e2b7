//! Feed configuration — TOML file describing the remote API and the
//! output tree.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete feed configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Remote API settings
    pub api: ApiConfig,

    /// Output tree settings
    pub output: OutputConfig,
}

/// Remote API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the vendor API, e.g. `https://api.example-data.com/beta/`
    pub endpoint: String,

    /// Dataset resource name appended to `{endpoint}/live/`
    pub resource: String,

    /// Bearer token sent on every request
    pub auth_token: String,

    /// Budgeted fetch attempts per date (the 401 reissue is not budgeted)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts, in seconds
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,

    /// Rolling-window request allowance
    #[serde(default = "default_rate_limit_permits")]
    pub rate_limit_permits: usize,

    /// Rolling-window length, in seconds
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    /// Per-request HTTP timeout, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Output tree settings. Ledgers land under `{root}/{vendor}/{dataset}/`.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory of the output tree
    pub root: PathBuf,

    /// Vendor directory name
    #[serde(default = "default_vendor")]
    pub vendor: String,

    /// Dataset directory name
    #[serde(default = "default_dataset")]
    pub dataset: String,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_secs() -> u64 {
    1
}

fn default_rate_limit_permits() -> usize {
    100
}

fn default_rate_limit_window_secs() -> u64 {
    60
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_vendor() -> String {
    "acme".into()
}

fn default_dataset() -> String {
    "govcontracts".into()
}

impl FeedConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        fn required(field: &str, value: &str) -> Result<(), ConfigError> {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{field} must not be empty")));
            }
            Ok(())
        }

        required("api.endpoint", &self.api.endpoint)?;
        required("api.resource", &self.api.resource)?;
        required("api.auth_token", &self.api.auth_token)?;
        required("output.vendor", &self.output.vendor)?;
        required("output.dataset", &self.output.dataset)?;

        if self.api.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "api.max_attempts must be at least 1".into(),
            ));
        }
        if self.api.rate_limit_permits == 0 {
            return Err(ConfigError::Invalid(
                "api.rate_limit_permits must be at least 1".into(),
            ));
        }
        if self.api.rate_limit_window_secs == 0 {
            return Err(ConfigError::Invalid(
                "api.rate_limit_window_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl ApiConfig {
    /// A populated sample, handy as a test fixture base.
    pub fn example() -> Self {
        Self {
            endpoint: "https://api.example-data.com/beta/".into(),
            resource: "govcontractsall".into(),
            auth_token: "test-token".into(),
            max_attempts: default_max_attempts(),
            backoff_secs: default_backoff_secs(),
            rate_limit_permits: default_rate_limit_permits(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
