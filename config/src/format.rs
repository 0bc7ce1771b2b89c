//! File format detection shared by rule sets and request documents.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ConfigError, Result};

/// Supported on-disk formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// `.json`
    Json,
    /// `.yml` / `.yaml`
    Yaml,
}

impl FileFormat {
    /// Picks the format from a path's extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedFormat`] for any other extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use input_rules_config::FileFormat;
    ///
    /// assert_eq!(FileFormat::from_path("rules.YAML").unwrap(), FileFormat::Yaml);
    /// assert_eq!(FileFormat::from_path("req.json").unwrap(), FileFormat::Json);
    /// assert!(FileFormat::from_path("rules.toml").is_err());
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("yml" | "yaml") => Ok(Self::Yaml),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Parses `raw` in this format.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::JsonError`] or [`ConfigError::YamlError`].
    pub fn parse<T: DeserializeOwned>(self, raw: &str) -> Result<T> {
        match self {
            Self::Json => Ok(serde_json::from_str(raw)?),
            Self::Yaml => Ok(serde_yaml::from_str(raw)?),
        }
    }

    /// Renders `value` in this format.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::JsonError`] or [`ConfigError::YamlError`].
    pub fn render<T: Serialize>(self, value: &T) -> Result<String> {
        match self {
            Self::Json => Ok(serde_json::to_string_pretty(value)?),
            Self::Yaml => Ok(serde_yaml::to_string(value)?),
        }
    }

    /// Reads and parses the file at `path`, detecting the format from its
    /// extension.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedFormat`], [`ConfigError::IoError`],
    /// or a parse error.
    pub fn load<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
        let path = path.as_ref();
        let format = Self::from_path(path)?;
        let raw = std::fs::read_to_string(path)?;
        format.parse(&raw)
    }
}
