//! Configuration file support
//!
//! Every section and field is optional; missing values take their defaults.
//!
//! ```toml
//! [template]
//! question_format = "{{Front}}"
//! css = ".card { font-size: 24px; }"
//!
//! [anki_connect]
//! url = "http://localhost:8765"
//! timeout_secs = 10
//!
//! [sync]
//! update_existing = true
//! sync_media = true
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::anki_connect::client::{API_VERSION, DEFAULT_TIMEOUT_SECS, DEFAULT_URL};
use crate::anki_connect::SyncOptions;
use crate::deck::TemplateOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Connection settings for the AnkiConnect add-on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnkiConnectConfig {
    /// Base URL the add-on listens on
    pub url: String,
    /// API version sent with every request
    pub version: u16,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for AnkiConnectConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            version: API_VERSION,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub template: TemplateOptions,
    pub anki_connect: AnkiConnectConfig,
    pub sync: SyncOptions,
}

impl AppConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}
