//! Field configuration.
//!
//! ## Learning: Serde for Serialization
//!
//! `#[derive(Serialize, Deserialize)]` generates the TOML mapping and
//! `#[serde(default)]` fills missing fields from `Default::default()`,
//! so a config file only needs the keys it wants to change.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main field configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// User-visible strings
    pub labels: LabelConfig,

    /// Media field presentation
    pub media: MediaConfig,

    /// Rich-text defaults
    pub text: TextConfig,
}

impl Config {
    /// Loads config from the default location.
    pub fn load() -> Self {
        match Self::load_from_default_path() {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("Falling back to default config: {}", err);
                Self::default()
            }
        }
    }

    /// Loads config from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loads from the default config path.
    fn load_from_default_path() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("blockfields").join("config.toml"))
    }
}

/// Localisable strings shown by the media field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Prefix of the edit toggle label, followed by the media kind
    pub edit_prefix: String,

    /// Prefix of the URL input placeholder, followed by the media kind
    pub url_placeholder_prefix: String,

    /// Suffix of the URL input placeholder
    pub url_placeholder_suffix: String,

    /// Label of the URL submit button
    pub use_url: String,

    /// Label of the media library trigger
    pub media_library: String,

    /// Placeholder of the caption editor
    pub caption_placeholder: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            edit_prefix: "Edit ".to_string(),
            url_placeholder_prefix: "Enter URL of ".to_string(),
            url_placeholder_suffix: " file here…".to_string(),
            use_url: "Use URL".to_string(),
            media_library: "Add from Media Library".to_string(),
            caption_placeholder: "Write caption…".to_string(),
        }
    }
}

impl LabelConfig {
    /// Placeholder for the URL input, e.g. "Enter URL of video file here…".
    pub fn url_placeholder(&self, kind: &str) -> String {
        format!(
            "{}{}{}",
            self.url_placeholder_prefix, kind, self.url_placeholder_suffix
        )
    }

    /// Label for the edit toggle, e.g. "Edit audio".
    pub fn edit_label(&self, kind: &str) -> String {
        format!("{}{}", self.edit_prefix, kind)
    }
}

/// Media field presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Class of the element wrapping the display surface
    pub wrapper_class: String,

    /// Icon of the edit toggle
    pub edit_icon: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            wrapper_class: "middleware-media-field".to_string(),
            edit_icon: "edit".to_string(),
        }
    }
}

/// Defaults applied to every rich-text field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Show the inline formatting toolbar
    pub inline_toolbar: bool,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            inline_toolbar: true,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}
