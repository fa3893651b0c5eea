//! Loading and saving the configuration file.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::settings::ConfigFile;

/// Errors reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// The file could not be read or is not valid INI.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// The file could not be written.
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// A key holds a value that cannot be used.
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// The configuration directory could not be created.
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load from `~/.locwatch/config.ini`.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save to `~/.locwatch/config.ini`.
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        std::fs::write(path, self.to_ini_string())
            .map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Render as commented INI text, exactly as `save_to` writes it.
    pub fn to_ini_string(&self) -> String {
        super::writer::to_config_string(self)
    }
}

/// The configuration directory (`~/.locwatch`).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".locwatch")
}

/// The configuration file (`~/.locwatch/config.ini`).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
