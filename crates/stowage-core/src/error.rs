//! Error types module
//!
//! Configuration problems are detected when a store or receiver is constructed,
//! before any file is processed, and are reported as [`ConfigurationError`].

/// Invalid or missing configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("{0} must be set")]
    Missing(String),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },

    #[error("Bucket override '{requested}' does not match the store bucket '{configured}'")]
    BucketMismatch {
        configured: String,
        requested: String,
    },

    #[error("Storage backend not available: {0}")]
    BackendUnavailable(String),
}

impl ConfigurationError {
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigurationError::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
