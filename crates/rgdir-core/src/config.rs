//! Configuration for rgdir
//!
//! Loaded from TOML with the following structure; every key is optional:
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8080/api"
//! uploads_url = "http://localhost:8080/uploads/"
//! timeout_seconds = 30
//!
//! [cache]
//! default_stale_seconds = 300      # omit to keep results until invalidated
//! work_types_stale_seconds = 86400
//! counts_by_year_stale_seconds = 3600
//! ```
//!
//! A file ending in `.json` is read as JSON with the same structure.
//! `RGDIR_API_URL` and `RGDIR_UPLOADS_URL` override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use rgdir_api::{ClientConfig, ConfigError};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub api: ClientConfig,
    pub cache: CacheConfig,
}

/// Staleness windows for cached queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Window for ordinary queries; `None` keeps results until invalidated
    pub default_stale_seconds: Option<u64>,
    /// The provider's work-type vocabulary rarely changes
    pub work_types_stale_seconds: u64,
    pub counts_by_year_stale_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_stale_seconds: None,
            work_types_stale_seconds: 60 * 60 * 24,
            counts_by_year_stale_seconds: 60 * 60,
        }
    }
}

impl CacheConfig {
    pub fn default_stale_after(&self) -> Option<Duration> {
        self.default_stale_seconds.map(Duration::from_secs)
    }

    pub fn work_types_stale_after(&self) -> Duration {
        Duration::from_secs(self.work_types_stale_seconds)
    }

    pub fn counts_by_year_stale_after(&self) -> Duration {
        Duration::from_secs(self.counts_by_year_stale_seconds)
    }
}

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("IO error reading {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Config parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ConfigError),
}

impl DirectoryConfig {
    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigLoadError> {
        toml::from_str(toml_str).map_err(|e| ConfigLoadError::Parse(e.to_string()))
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigLoadError> {
        serde_json::from_str(json_str).map_err(|e| ConfigLoadError::Parse(e.to_string()))
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Read and validate a config file, then apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigLoadError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let mut config = if is_json {
            Self::from_json(&text)?
        } else {
            Self::from_toml(&text)?
        };
        config.api = config.api.apply_env();
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/rgdir/config.toml` (or the platform equivalent)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("rgdir").join("config.toml"))
    }

    /// Load from [`Self::default_path`] when that file exists, defaults otherwise
    pub fn load_default() -> Result<Self, ConfigLoadError> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(path),
            _ => {
                let config = Self {
                    api: ClientConfig::default().apply_env(),
                    cache: CacheConfig::default(),
                };
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api.validate()?;
        if self.cache.default_stale_seconds == Some(0) {
            return Err(ConfigError::OutOfRange(
                "default_stale_seconds must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}
