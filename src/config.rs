//! Client configuration
//!
//! Configuration for a Shopfront API client: where the backend lives, how
//! long requests may take, and how aggressively tokens are renewed. Loadable
//! from YAML with sensible defaults for everything but the base URL.

use crate::error::{Error, Result};
use crate::token::DEFAULT_SKEW_SECONDS;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Complete client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the storefront/admin API
    pub base_url: String,

    /// Path of the token refresh endpoint, joined onto `base_url`
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,

    /// Timeout for wrapped resource requests, in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Bound on a single refresh network call, in seconds
    #[serde(default = "default_refresh_timeout_seconds")]
    pub refresh_timeout_seconds: u64,

    /// Renewal window before token expiry, in seconds
    #[serde(default = "default_skew_seconds")]
    pub skew_seconds: u64,

    /// Headers added to every request
    #[serde(default)]
    pub default_headers: HashMap<String, String>,

    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_refresh_path() -> String {
    "/auth/refresh-token".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_refresh_timeout_seconds() -> u64 {
    10
}

fn default_skew_seconds() -> u64 {
    DEFAULT_SKEW_SECONDS
}

fn default_user_agent() -> String {
    format!("shopfront-sdk/{}", env!("CARGO_PKG_VERSION"))
}

impl ClientConfig {
    /// Create a config for the given base URL with default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            refresh_path: default_refresh_path(),
            timeout_seconds: default_timeout_seconds(),
            refresh_timeout_seconds: default_refresh_timeout_seconds(),
            skew_seconds: default_skew_seconds(),
            default_headers: HashMap::new(),
            user_agent: default_user_agent(),
        }
    }

    /// Create a new config builder.
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::new(base_url),
        }
    }

    /// Parse a config from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::missing_field("base_url"));
        }
        url::Url::parse(&self.base_url)?;

        if self.refresh_timeout_seconds == 0 {
            return Err(Error::invalid_value(
                "refresh_timeout_seconds",
                "must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Timeout for wrapped resource requests.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Bound on a single refresh network call.
    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_seconds)
    }

    /// Renewal window before token expiry.
    pub fn skew(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.skew_seconds as i64)
    }

    /// Full URL of the token refresh endpoint.
    pub fn refresh_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = self.refresh_path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

/// Builder for client config
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the refresh endpoint path.
    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.config.refresh_path = path.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_seconds = timeout.as_secs();
        self
    }

    /// Set the refresh call bound.
    pub fn refresh_timeout(mut self, timeout: Duration) -> Self {
        self.config.refresh_timeout_seconds = timeout.as_secs();
        self
    }

    /// Set the renewal window in seconds.
    pub fn skew_seconds(mut self, seconds: u64) -> Self {
        self.config.skew_seconds = seconds;
        self
    }

    /// Add a default header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set the user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
