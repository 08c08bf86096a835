//! Client configuration
//!
//! Where the backend lives, where uploaded photos are served from, and how
//! long a request may take.

use serde::{Deserialize, Serialize};
use url::Url;

/// Environment variable overriding [`ClientConfig::base_url`]
pub const ENV_API_URL: &str = "RGDIR_API_URL";

/// Environment variable overriding [`ClientConfig::uploads_url`]
pub const ENV_UPLOADS_URL: &str = "RGDIR_UPLOADS_URL";

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root, e.g. `http://localhost:8080/api`
    pub base_url: String,
    /// Static root that stored photo references are resolved against
    pub uploads_url: String,
    /// Whole-request timeout in seconds
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            uploads_url: "http://localhost:8080/uploads/".to_string(),
            timeout_seconds: 30,
            user_agent: concat!("rgdir/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Apply `RGDIR_API_URL` / `RGDIR_UPLOADS_URL` when set
    pub fn apply_env(mut self) -> Self {
        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }
        if let Ok(url) = std::env::var(ENV_UPLOADS_URL) {
            if !url.trim().is_empty() {
                self.uploads_url = url;
            }
        }
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = Url::parse(&self.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("base_url {}: {}", self.base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl(format!(
                "base_url {} cannot be a base",
                self.base_url
            )));
        }

        Url::parse(&self.uploads_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("uploads_url {}: {}", self.uploads_url, e))
        })?;

        if self.timeout_seconds == 0 {
            return Err(ConfigError::OutOfRange(
                "timeout_seconds must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Public URL of a stored photo reference; `None` means show the placeholder.
    pub fn photo_url(&self, photo_path: Option<&str>) -> Option<String> {
        let path = photo_path?.trim();
        if path.is_empty() {
            return None;
        }
        let base = self.uploads_url.trim_end_matches('/');
        Some(format!("{}/{}", base, path.trim_start_matches('/')))
    }
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A URL setting does not parse
    InvalidUrl(String),
    /// Value is out of valid range
    OutOfRange(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            ConfigError::OutOfRange(msg) => write!(f, "Value out of range: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
