use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading store settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse store settings: {source}")]
    ParseError {
        #[source]
        source: toml::de::Error,
    },
}

/// Runtime flags for a store that may live outside code.
///
/// ```toml
/// strict = true
/// devtools = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Audit state changes made outside mutations (default: false).
    #[serde(default)]
    pub strict: bool,
    /// Devtools override; falls back to the host default when absent.
    #[serde(default)]
    pub devtools: Option<bool>,
}

impl StoreSettings {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::ParseError { source })
    }

    /// Loads settings from `path`.
    ///
    /// - If the file doesn't exist, returns `StoreSettings::default()`.
    /// - Returns an error if reading or parsing fails.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&content)
    }
}
