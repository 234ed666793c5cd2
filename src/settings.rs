//! Conversion settings persistence.
//!
//! Settings live in a JSON file in the user config directory. A missing or
//! unreadable file falls back to defaults; command line flags override
//! whatever was loaded.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::parsers::types::TimeFormat;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory: {0}")]
    CreateDir(#[source] std::io::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write settings file: {0}")]
    Write(#[source] std::io::Error),
}

/// Options that shape a conversion run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertSettings {
    /// Settings file version for migration support
    pub version: u32,
    /// Fail on payloads matching no known shape instead of skipping them
    pub strict: bool,
    /// Rendering of the output `time` field
    pub time_format: TimeFormat,
    /// Extension given to output files
    pub output_extension: String,
    /// Worker threads for batch conversion (0 = one per core)
    pub jobs: usize,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self {
            version: 1,
            strict: false,
            time_format: TimeFormat::default(),
            output_extension: "json".to_string(),
            jobs: 0,
        }
    }
}

impl ConvertSettings {
    /// Get the config directory path for platypus-analytics
    pub fn get_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("platypus-analytics"))
    }

    /// Get the path to the settings JSON file
    pub fn get_settings_path() -> Option<PathBuf> {
        Self::get_config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from the default location
    pub fn load() -> Self {
        match Self::get_settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load settings from `path`, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed settings file {:?}: {}", path, e);
                Self::default()
            }),
            Err(e) => {
                tracing::warn!("Failed to read settings file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<PathBuf, SettingsError> {
        let path = Self::get_settings_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to `path`, creating parent directories as needed
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(SettingsError::CreateDir)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(SettingsError::Write)
    }
}
