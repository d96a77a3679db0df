//! Service configuration.
//!
//! Loaded from TOML and overlaid with `LERNREISE_*` environment variables:
//!
//! ```toml
//! [catalog]
//! base_url = "https://catalog.example.org/api"
//! api_key = "secret"
//! timeout_secs = 10
//!
//! [registry]
//! base_url = "https://registry.example.org/api"
//!
//! [rewards]
//! task_xp = 10
//! module_xp = 50
//! course_xp = 200
//!
//! [http]
//! bind = "0.0.0.0:8080"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reward::RewardPolicy;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
    #[error("invalid config: {field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Complete service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LernreiseConfig {
    /// Upstream course-content service
    pub catalog: UpstreamConfig,
    /// Upstream identity-registration service
    pub registry: UpstreamConfig,
    /// XP awarded per submission
    pub rewards: RewardPolicy,
    /// Command transport
    pub http: HttpConfig,
}

impl Default for LernreiseConfig {
    fn default() -> Self {
        Self {
            catalog: UpstreamConfig::with_base_url("http://localhost:8081"),
            registry: UpstreamConfig::with_base_url("http://localhost:8082"),
            rewards: RewardPolicy::default(),
            http: HttpConfig::default(),
        }
    }
}

/// Connection settings for one upstream service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    /// Sent as `Authorization: Bearer <key>` when set
    pub api_key: Option<String>,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl UpstreamConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

impl LernreiseConfig {
    /// Parse a TOML document. Missing sections keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the clients cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // reqwest treats a zero timeout as "fail immediately"
        if self.catalog.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "catalog.timeout_secs",
                reason: "must be at least 1",
            });
        }
        if self.registry.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "registry.timeout_secs",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Overlay values from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|var| std::env::var(var).ok())
    }

    /// Overlay values from `lookup`, keyed by `LERNREISE_*` variable names.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("LERNREISE_CATALOG_URL") {
            self.catalog.base_url = url;
        }
        if let Some(key) = lookup("LERNREISE_CATALOG_API_KEY") {
            self.catalog.api_key = Some(key);
        }
        if let Some(url) = lookup("LERNREISE_REGISTRY_URL") {
            self.registry.base_url = url;
        }
        if let Some(key) = lookup("LERNREISE_REGISTRY_API_KEY") {
            self.registry.api_key = Some(key);
        }
        if let Some(value) = lookup("LERNREISE_UPSTREAM_TIMEOUT_SECS") {
            let secs = value
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::InvalidEnv {
                    var: "LERNREISE_UPSTREAM_TIMEOUT_SECS",
                    value: value.clone(),
                })?;
            self.catalog.timeout_secs = secs;
            self.registry.timeout_secs = secs;
        }
        if let Some(bind) = lookup("LERNREISE_BIND") {
            self.http.bind = bind;
        }
        self.validate()?;
        Ok(self)
    }
}
