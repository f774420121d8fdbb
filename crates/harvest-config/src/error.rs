//! Settings errors

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("settings file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid value for {var}: {reason}")]
    Env { var: String, reason: String },

    #[error("invalid setting {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn env(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Env {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error comes from a bad value rather than from I/O
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Env { .. } | Self::Invalid { .. })
    }
}

/// Result alias for settings operations
pub type ConfigResult<T> = Result<T, ConfigError>;
