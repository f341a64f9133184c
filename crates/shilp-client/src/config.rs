//! Client configuration.
//!
//! Configuration can be built in code, loaded from a TOML file or read from
//! `SHILP_*` environment variables.
//!
//! # Example
//!
//! ```rust,no_run
//! use shilp_client::ClientConfig;
//!
//! // Defaults pointing at a local server
//! let config = ClientConfig::default();
//!
//! // From a file with a `[shilp]` table
//! let config = ClientConfig::from_file(std::path::Path::new("shilp.toml")).expect("Failed to load");
//!
//! // From environment variables
//! let config = ClientConfig::from_env();
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use shilp_core::defaults;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ConfigError> for shilp_core::Error {
    fn from(e: ConfigError) -> Self {
        shilp_core::Error::Config(e.to_string())
    }
}

/// Environment variable names.
pub const ENV_BASE_URL: &str = "SHILP_BASE_URL";
pub const ENV_DISCOVERY_URL: &str = "SHILP_DISCOVERY_URL";
pub const ENV_TIMEOUT_SECS: &str = "SHILP_TIMEOUT_SECS";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "SHILP_CONNECT_TIMEOUT_SECS";
pub const ENV_USER_AGENT: &str = "SHILP_USER_AGENT";

/// Connection settings shared by every Shilp client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server base URL, without trailing slash.
    pub base_url: String,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            timeout_secs: defaults::TIMEOUT_SECS,
            connect_timeout_secs: defaults::CONNECT_TIMEOUT_SECS,
            user_agent: defaults::USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Config for `base_url` with default timeouts.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            ..Default::default()
        }
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Load data-plane settings from `SHILP_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(ENV_BASE_URL, defaults::BASE_URL, |key| env::var(key).ok())
    }

    /// Load discovery settings; the base URL comes from `SHILP_DISCOVERY_URL`.
    pub fn discovery_from_env() -> Self {
        Self::from_lookup(ENV_DISCOVERY_URL, defaults::DISCOVERY_URL, |key| {
            env::var(key).ok()
        })
    }

    fn from_lookup<F>(url_key: &str, default_url: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(url_key).unwrap_or_else(|| default_url.to_string());
        Self {
            base_url: normalize_base_url(&base_url),
            timeout_secs: lookup(ENV_TIMEOUT_SECS)
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::TIMEOUT_SECS),
            connect_timeout_secs: lookup(ENV_CONNECT_TIMEOUT_SECS)
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::CONNECT_TIMEOUT_SECS),
            user_agent: lookup(ENV_USER_AGENT)
                .unwrap_or_else(|| defaults::USER_AGENT.to_string()),
        }
    }

    /// Load configuration from the `[shilp]` table of a TOML file.
    ///
    /// Keys missing from the table keep their defaults.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    fn from_toml(content: &str) -> ConfigResult<Self> {
        #[derive(Deserialize)]
        struct TomlRoot {
            #[serde(default)]
            shilp: ClientConfig,
        }

        let root: TomlRoot = toml::from_str(content)?;
        let mut config = root.shilp;
        config.base_url = normalize_base_url(&config.base_url);
        config.validate()?;

        debug!(base_url = %config.base_url, "Loaded client config from TOML");
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.base_url.is_empty() {
            return Err(ConfigError::Validation(
                "base_url cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.user_agent.starts_with("shilp-rs/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_new_strips_trailing_slashes() {
        let config = ClientConfig::new("http://shilp:3000//");
        assert_eq!(config.base_url, "http://shilp:3000");
    }

    #[test]
    fn test_from_lookup_reads_all_keys() {
        let vars: HashMap<&str, &str> = [
            (ENV_BASE_URL, "https://shilp.internal/"),
            (ENV_TIMEOUT_SECS, "5"),
            (ENV_CONNECT_TIMEOUT_SECS, "2"),
            (ENV_USER_AGENT, "ingest-worker/1.0"),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::from_lookup(ENV_BASE_URL, defaults::BASE_URL, |k| {
            vars.get(k).map(|v| v.to_string())
        });
        assert_eq!(config.base_url, "https://shilp.internal");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.connect_timeout_secs, 2);
        assert_eq!(config.user_agent, "ingest-worker/1.0");
    }

    #[test]
    fn test_from_lookup_ignores_unparseable_numbers() {
        let config = ClientConfig::from_lookup(ENV_DISCOVERY_URL, defaults::DISCOVERY_URL, |k| {
            (k == ENV_TIMEOUT_SECS).then(|| "soon".to_string())
        });
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout_secs, defaults::TIMEOUT_SECS);
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        let err = ClientConfig::new("").validate().unwrap_err();
        assert!(err.to_string().contains("base_url cannot be empty"));

        let err = ClientConfig::new("ftp://shilp").validate().unwrap_err();
        assert!(err.to_string().contains("must start with http://"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let err = ClientConfig::default()
            .with_timeout_secs(0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_from_file_partial_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[shilp]\nbase_url = \"http://10.0.0.5:3000/\"\ntimeout_secs = 12"
        )
        .unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.base_url, "http://10.0.0.5:3000");
        assert_eq!(config.timeout_secs, 12);
        assert_eq!(config.connect_timeout_secs, defaults::CONNECT_TIMEOUT_SECS);
    }

    #[test]
    fn test_from_toml_rejects_invalid() {
        assert!(matches!(
            ClientConfig::from_toml("[shilp]\ntimeout_secs = \"thirty\""),
            Err(ConfigError::TomlParse(_))
        ));
        assert!(matches!(
            ClientConfig::from_toml("[shilp]\nbase_url = \"localhost\""),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_from_file_missing() {
        let err = ClientConfig::from_file(Path::new("/nonexistent/shilp.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead(_)));
    }

    #[test]
    fn test_config_error_converts_to_core_error() {
        let err: shilp_core::Error = ConfigError::Validation("bad".to_string()).into();
        assert!(matches!(err, shilp_core::Error::Config(_)));
    }
}
