//! Engine and application configuration
//!
//! `AppConfig` is read from TOML; every section and field is optional.
//!
//! ```toml
//! [engine]
//! settle_window_ms = 1000
//!
//! [client]
//! base_url = "https://assistant.example.com/api"
//! timeout_ms = 10000
//! ```

use crate::error::ConfigError;
use prefsync_service::ClientConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Sync engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Quiet period after the last edit before a write is dispatched
    pub settle_window_ms: u64,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With settle window
    #[inline]
    #[must_use]
    pub fn with_settle_window(mut self, window: Duration) -> Self {
        self.settle_window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Settle window
    #[inline]
    #[must_use]
    pub fn settle_window(&self) -> Duration {
        Duration::from_millis(self.settle_window_ms)
    }

    /// # Errors
    /// `ConfigError::ZeroSettleWindow` if the window is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.settle_window_ms == 0 {
            return Err(ConfigError::ZeroSettleWindow);
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settle_window_ms: 1000,
        }
    }
}

/// Full application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Engine section
    pub engine: EngineConfig,
    /// REST client section
    pub client: ClientConfig,
}

impl AppConfig {
    /// Parse and validate TOML
    ///
    /// # Errors
    /// `ConfigError::Parse` on malformed TOML, or a validation error.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`AppConfig::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// # Errors
    /// The first invalid section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.client.validate()?;
        Ok(())
    }
}
