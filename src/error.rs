// src/error.rs

//! Unified error handling for the gallery synchronizer.

use std::fmt;

use thiserror::Error;

/// Result type alias for gallery-sync operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Network, timeout or HTTP status failure on a remote call
    #[error("Transport error for {context}: {message}")]
    Transport { context: String, message: String },

    /// Remote response body did not have the expected shape
    #[error("Decode error for {context}: {message}")]
    Decode { context: String, message: String },

    /// Transactional read/write failure in the item store
    #[error("Storage error: {0}")]
    Storage(String),

    /// Read of an identifier that is not stored
    #[error("Item not found: {0}")]
    NotFound(String),

    /// A sync run is already in progress
    #[error("A sync run is already in progress")]
    SyncInProgress,

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a transport error with context.
    pub fn transport(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Transport {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a decode error with context.
    pub fn decode(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Decode {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a storage error.
    pub fn storage(message: impl fmt::Display) -> Self {
        Self::Storage(message.to_string())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether this error came from talking to the remote service.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Decode { .. })
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(value.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Storage(format!("storage task failed: {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_display_includes_context() {
        let err = AppError::transport("listing page 3", "connection reset");
        assert_eq!(
            err.to_string(),
            "Transport error for listing page 3: connection reset"
        );
        assert!(err.is_remote());
    }

    #[test]
    fn test_storage_is_not_remote() {
        let err = AppError::storage("disk full");
        assert!(!err.is_remote());
        assert_eq!(err.to_string(), "Storage error: disk full");
    }
}
