//! TOML-based configuration for the composer.
//!
//! Example configuration:
//! ```toml
//! [writer]
//! tab_width = 4
//! markdown_language = "malloy"
//!
//! [builder]
//! verify_render = true  # Roll back edits whose result no longer renders
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Source text generation.
    pub writer: WriterSettings,

    /// Edit behavior.
    pub builder: BuilderSettings,
}

/// Writer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WriterSettings {
    /// Spaces per indentation level.
    pub tab_width: usize,

    /// Info string of the fenced block in markdown output.
    pub markdown_language: String,
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self {
            tab_width: 2,
            markdown_language: "malloy".to_string(),
        }
    }
}

/// Builder configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BuilderSettings {
    /// Render after definition-changing edits and roll back on failure.
    pub verify_render: bool,
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self {
            verify_render: true,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `COMPOSER_CONFIG`
    /// 2. `./composer.toml`
    /// 3. `~/.config/composer/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("COMPOSER_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("composer.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("composer").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.writer.tab_width == 0 {
            return Err(SettingsError::InvalidConfig(
                "writer.tab_width must be at least 1".to_string(),
            ));
        }
        if self.writer.markdown_language.trim().is_empty() {
            return Err(SettingsError::InvalidConfig(
                "writer.markdown_language must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
