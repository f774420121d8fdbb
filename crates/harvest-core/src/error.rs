//! Admin Error Types
//!
//! One error enum for every fallible core operation. The `Display` output of
//! each variant is the human-readable reason surfaced to the admin UI.

use thiserror::Error;

/// Error type for schema, content and adapter operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("adapter not configured: {0}")]
    NotConfigured(String),

    #[error("underlying transport error: {0}")]
    Transport(String),

    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("invalid content path: {0}")]
    InvalidPath(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Result type for admin operations
pub type AdminResult<T> = Result<T, AdminError>;

impl AdminError {
    /// Create a not-found error for a `(collection, id)` pair
    pub fn document_not_found(collection: &str, id: &str) -> Self {
        Self::NotFound(format!("{collection}/{id}"))
    }

    /// Create an already-exists error for a `(collection, id)` pair
    pub fn document_exists(collection: &str, id: &str) -> Self {
        Self::AlreadyExists(format!("{collection}/{id}"))
    }

    /// Create a transport error
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a not-configured error
    pub fn not_configured<S: Into<String>>(msg: S) -> Self {
        Self::NotConfigured(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    /// Configuration errors are fatal and never retried
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::NotConfigured(_) | Self::InvalidSchema(_))
    }
}

impl From<serde_json::Error> for AdminError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AdminError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
