// Haseq Config Parser - JSON with Serde
// Parses the sequence configuration consumed by the matcher

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::SequenceDefinition;

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(String),

    #[error("could not determine the user config directory")]
    NoConfigDir,
}

/// Root configuration document.
///
/// Holds the sequence definitions in file order; that order is what the
/// matcher's tie-break and the validator's reports refer to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Sequence definitions in file order
    pub sequences: Vec<SequenceDefinition>,
}

impl Config {
    /// Parse a configuration from a JSON string.
    ///
    /// Structural problems (missing fields, unknown key names, wrong types)
    /// surface here; cross-definition invariants are checked by
    /// [`Config::validate`](crate::config::validate).
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            serde_json::from_str(content).map_err(|e| ConfigError::Json(e.to_string()))?;
        log::debug!(
            "parsed configuration with {} sequence(s)",
            config.sequences.len()
        );
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path)?;
        let config = Self::from_json(&content)?;
        log::debug!("loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Default configuration path: `~/.config/haseq/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("haseq").join("config.json"))
    }

    /// Load the configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Self::default_path().ok_or(ConfigError::NoConfigDir)?;
        Self::from_file(path)
    }
}
