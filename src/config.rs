//! Runtime adapter configuration.
//!
//! Configuration comes from three layers, later layers overriding earlier:
//!
//! 1. Built-in defaults
//! 2. A YAML file (`--config <path>`)
//! 3. Environment variables (`PODBRIDGE_ENDPOINT`, `PODBRIDGE_TIMEOUT_SECS`,
//!    `PODBRIDGE_LOG`)
//!
//! ```yaml
//! endpoint: unix:///var/run/hyper.sock
//! connection_timeout_secs: 300
//! log_level: info
//! ```

use crate::constants::{DEFAULT_ENGINE_ENDPOINT, ENGINE_CONNECTION_TIMEOUT, MAX_MANIFEST_SIZE};
use crate::engine::EngineEndpoint;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding the engine endpoint.
pub const ENV_ENDPOINT: &str = "PODBRIDGE_ENDPOINT";

/// Environment variable overriding the engine call timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "PODBRIDGE_TIMEOUT_SECS";

/// Environment variable overriding the log level.
pub const ENV_LOG: &str = "PODBRIDGE_LOG";

/// Runtime adapter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Engine endpoint (`unix:///path` or `tcp://host:port`).
    pub endpoint: String,
    /// Bound on every engine call, in seconds.
    pub connection_timeout_secs: u64,
    /// Log level (`trace`, `debug`, `info`, `warn`, `error`).
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENGINE_ENDPOINT.to_string(),
            connection_timeout_secs: ENGINE_CONNECTION_TIMEOUT.as_secs(),
            log_level: "info".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Sets the engine endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the engine call timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.connection_timeout_secs = secs;
        self
    }

    /// Sets the log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Returns the engine call timeout.
    #[must_use]
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Parses and validates a YAML config document.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the document is oversized, malformed or invalid.
    pub fn from_yaml(yaml: &[u8]) -> Result<Self> {
        if yaml.len() > MAX_MANIFEST_SIZE {
            return Err(Error::InvalidConfig(format!(
                "config size {} exceeds limit of {}",
                yaml.len(),
                MAX_MANIFEST_SIZE
            )));
        }

        let config: Self =
            serde_yaml::from_slice(yaml).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a YAML config file.
    ///
    /// # Errors
    ///
    /// `ReadFailed` if the file cannot be read, otherwise as [`Self::from_yaml`].
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| Error::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&bytes)
    }

    /// Applies overrides from the process environment.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if an override is malformed.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides using `lookup` to resolve variables.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if an override is malformed.
    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            self.endpoint = endpoint;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            self.connection_timeout_secs = secs.trim().parse().map_err(|_| {
                Error::InvalidConfig(format!("{ENV_TIMEOUT_SECS} must be an integer, got '{secs}'"))
            })?;
        }
        if let Some(level) = lookup(ENV_LOG) {
            self.log_level = level;
        }
        self.validate()?;
        Ok(self)
    }

    /// Checks the endpoint, timeout and log level.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        EngineEndpoint::parse(&self.endpoint)?;

        if self.connection_timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "connection_timeout_secs must be greater than zero".into(),
            ));
        }

        self.log_level
            .parse::<tracing::Level>()
            .map_err(|_| Error::InvalidConfig(format!("unknown log level '{}'", self.log_level)))?;

        Ok(())
    }
}
