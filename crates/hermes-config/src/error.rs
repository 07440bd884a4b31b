//! Settings loading errors.

use std::path::PathBuf;
use thiserror::Error;

/// Why a settings layer could not be applied.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `with_file` was given a path that does not exist.
    #[error("settings file {path} does not exist")]
    FileNotFound {
        /// The requested path.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("cannot read settings file {path}")]
    ReadError {
        /// The file.
        path: PathBuf,
        /// I/O cause.
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML, or an unknown key.
    #[error("invalid TOML settings: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Malformed JSON, or an unknown key.
    #[error("invalid JSON settings: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A `.env` file exists but could not be loaded.
    #[error("failed to load .env file: {0}")]
    DotenvError(String),

    /// An override variable holds a value of the wrong kind.
    #[error("cannot apply {var}: {reason}")]
    EnvParseError {
        /// Full variable name.
        var: String,
        /// What was expected.
        reason: String,
    },

    /// A parsed value is out of range.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// The offending field, as `section.key`.
        field: String,
        /// The violated constraint.
        reason: String,
    },

    /// Unsupported format or other structural problem.
    #[error("unusable settings: {0}")]
    ValidationError(String),
}

impl ConfigError {
    /// Missing file.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Unreadable file.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Bad override variable.
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Out-of-range value.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Structural problem.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}
