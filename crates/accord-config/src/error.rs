//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration could not be loaded or accepted.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required file does not exist.
    #[error("config file {} does not exist", path.display())]
    Missing {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// A file exists but could not be read.
    #[error("cannot read config file {}", path.display())]
    Unreadable {
        /// The file.
        path: PathBuf,
        /// The I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A TOML source is malformed or has unknown keys.
    #[error("bad TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// A JSON source is malformed or has unknown keys.
    #[error("bad JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// A `.env` file could not be loaded.
    #[error("cannot load .env file: {0}")]
    Dotenv(String),

    /// A value parsed but is not acceptable.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted path of the field, e.g. `client.base_url`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An override variable could not be applied.
    #[error("environment override {var}: {reason}")]
    EnvOverride {
        /// The variable name.
        var: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The source format is neither TOML nor JSON.
    #[error("unsupported config format `{0}` (expected toml or json)")]
    UnsupportedFormat(String),
}

impl ConfigError {
    pub(crate) fn missing(path: impl Into<PathBuf>) -> Self {
        Self::Missing { path: path.into() }
    }

    pub(crate) fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Unreadable {
            path: path.into(),
            source,
        }
    }

    /// Builds an [`InvalidValue`](Self::InvalidValue) error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env_override(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvOverride {
            var: var.into(),
            reason: reason.into(),
        }
    }
}
