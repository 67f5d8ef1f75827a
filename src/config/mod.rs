//! Typed configuration from environment variables or a TOML file.
//!
//! Loads once at startup. Every field has a default; malformed values fail
//! fast with [`Error::Config`].

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub otel_endpoint: Option<String>,
    pub log_level: String,
    pub store: StoreConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            otel_endpoint: None,
            log_level: "info".to_string(),
            store: StoreConfig::default(),
        }
    }
}

/// Per-store channel sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Requests that may wait in a store's mailbox before `dispatch` waits
    /// for room.
    pub mailbox_capacity: usize,
    /// Events buffered per subscriber before a slow subscriber lags.
    pub event_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 64,
            event_capacity: 256,
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.mailbox_capacity == 0 {
            return Err(Error::Config("mailbox_capacity must be at least 1".into()));
        }
        if self.event_capacity == 0 {
            return Err(Error::Config("event_capacity must be at least 1".into()));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        let defaults = StoreConfig::default();
        let config = Self {
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            store: StoreConfig {
                mailbox_capacity: parsed_var("IGLOO_MAILBOX_CAPACITY")?
                    .unwrap_or(defaults.mailbox_capacity),
                event_capacity: parsed_var("IGLOO_EVENT_CAPACITY")?
                    .unwrap_or(defaults.event_capacity),
            },
        };
        config.store.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file. Missing keys take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("bad config {}: {e}", path.display())))?;
        config.store.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.store.validate()?;
        Ok(config)
    }
}

fn parsed_var(name: &str) -> Result<Option<usize>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("{name}={value:?} is not a valid count: {e}"))),
        Err(_) => Ok(None),
    }
}
