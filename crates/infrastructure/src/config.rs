//! Runner configuration
//!
//! Settings come from an optional YAML file, then environment overrides:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `NETSUITE_BASE_URL` | `base_url` |
//! | `NETSUITE_TIMEOUT_MS` | `transport.timeout_ms` |
//! | `NETSUITE_USER_AGENT` | `transport.user_agent` |
//! | `NETSUITE_ACCEPT_INVALID_CERTS` | `transport.accept_invalid_certs` |

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Environment variable overriding the base URL.
pub const ENV_BASE_URL: &str = "NETSUITE_BASE_URL";
/// Environment variable overriding the request timeout.
pub const ENV_TIMEOUT_MS: &str = "NETSUITE_TIMEOUT_MS";
/// Environment variable overriding the user agent.
pub const ENV_USER_AGENT: &str = "NETSUITE_USER_AGENT";
/// Environment variable toggling certificate verification.
pub const ENV_ACCEPT_INVALID_CERTS: &str = "NETSUITE_ACCEPT_INVALID_CERTS";

/// Errors loading or validating configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file '{path}': {message}")]
    Io {
        /// File path.
        path: String,
        /// I/O error message.
        message: String,
    },

    /// The YAML document is malformed.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// An environment override has an unusable value.
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Offending value.
        value: String,
    },

    /// No base URL was configured.
    #[error("base URL is not configured")]
    MissingBaseUrl,

    /// The base URL is not an absolute http(s) URL.
    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),
}

/// Settings for the HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Maximum number of redirects followed.
    pub max_redirects: usize,
    /// Skips server certificate verification.
    pub accept_invalid_certs: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            user_agent: format!("NetSuite/{}", env!("CARGO_PKG_VERSION")),
            max_redirects: 10,
            accept_invalid_certs: false,
        }
    }
}

/// Everything needed to run a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// URL every root endpoint is joined onto.
    pub base_url: String,
    /// Transport settings.
    pub transport: TransportConfig,
}

impl RunnerConfig {
    /// Creates a configuration with default transport settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            transport: TransportConfig::default(),
        }
    }

    /// Parses a YAML document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the document is malformed.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Reads and parses a YAML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read and
    /// `ConfigError::Parse` if it is malformed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Applies overrides from a variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric or boolean variable
    /// cannot be parsed.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.base_url = base_url;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_MS) {
            self.transport.timeout_ms =
                value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: ENV_TIMEOUT_MS,
                    value: value.clone(),
                })?;
        }
        if let Some(user_agent) = lookup(ENV_USER_AGENT) {
            self.transport.user_agent = user_agent;
        }
        if let Some(value) = lookup(ENV_ACCEPT_INVALID_CERTS) {
            self.transport.accept_invalid_certs = parse_bool(&value).ok_or_else(|| {
                ConfigError::InvalidValue {
                    key: ENV_ACCEPT_INVALID_CERTS,
                    value: value.clone(),
                }
            })?;
        }
        Ok(self)
    }

    /// Applies overrides from the process environment.
    ///
    /// # Errors
    ///
    /// See [`with_overrides`](Self::with_overrides).
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Loads the file if given, applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Returns any loading, override or validation error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the base URL is an absolute http(s) URL.
    ///
    /// # Errors
    ///
    /// Returns `MissingBaseUrl` or `InvalidBaseUrl`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        let url = Url::parse(&self.base_url)
            .map_err(|_| ConfigError::InvalidBaseUrl(self.base_url.clone()))?;
        if matches!(url.scheme(), "http" | "https") && url.has_host() {
            Ok(())
        } else {
            Err(ConfigError::InvalidBaseUrl(self.base_url.clone()))
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
