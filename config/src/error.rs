//! Error types for loading rule sets and request documents.
//!
//! Covers I/O, JSON and YAML parsing, unsupported file extensions, and rule
//! definitions rejected by the core crate.

use input_rules_core::RuleError;
use thiserror::Error;

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// File extension is neither JSON nor YAML.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// A rule definition is misconfigured.
    #[error("invalid rule: {0}")]
    InvalidRule(#[from] RuleError),
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
