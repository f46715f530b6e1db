//! Custom error types for translation sessions

use thiserror::Error;

/// Translation-related errors
#[derive(Error, Debug)]
pub enum TranslationError {
    /// API request failed with a non-success status
    #[error("API error: {status} - {message}")]
    ApiError {
        status: u16,
        message: String,
    },

    /// Network error
    #[error("Network error: {message}")]
    NetworkError {
        message: String,
    },

    /// Invalid response from API
    #[error("Invalid response: {message}")]
    InvalidResponseError {
        message: String,
    },

    /// Request timeout
    #[error("Request timeout")]
    TimeoutError,

    /// Host capability (speech, clipboard, share) is not available
    #[error("{capability} is not supported on this host")]
    UnsupportedCapability {
        capability: String,
    },

    /// Swap attempted while the source language is auto-detect
    #[error("Cannot swap languages while the source is auto-detect")]
    InvalidSwap,

    /// Operation would overwrite state a running translation is about to write
    #[error("Cannot {action} while a translation is in progress")]
    Busy {
        action: String,
    },

    /// Language code is not usable in this position
    #[error("Invalid language: {code}")]
    InvalidLanguage {
        code: String,
    },

    /// History lookup outside the stored range
    #[error("No history entry at position {index} (history holds {len})")]
    HistoryIndex {
        index: usize,
        len: usize,
    },

    /// Action needs a translation that does not exist yet
    #[error("Nothing to {action} yet")]
    EmptyTranslation {
        action: String,
    },

    /// Durable storage error
    #[error("Storage error: {path} - {message}")]
    StorageError {
        path: String,
        message: String,
    },

    /// Host command failed
    #[error("Command `{command}` failed: {message}")]
    CommandError {
        command: String,
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
    },

    /// Wrapper for anyhow errors
    #[error("Internal error: {0}")]
    InternalError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Reqwest error
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl TranslationError {
    /// Whether the error came from the translation call itself
    /// (network, service or payload failure).
    pub fn is_translation_failure(&self) -> bool {
        matches!(
            self,
            TranslationError::ApiError { .. }
                | TranslationError::NetworkError { .. }
                | TranslationError::InvalidResponseError { .. }
                | TranslationError::TimeoutError
                | TranslationError::HttpError(_)
        )
    }

    pub(crate) fn unsupported(capability: impl Into<String>) -> Self {
        TranslationError::UnsupportedCapability {
            capability: capability.into(),
        }
    }
}

impl From<anyhow::Error> for TranslationError {
    fn from(err: anyhow::Error) -> Self {
        TranslationError::InternalError(err.to_string())
    }
}

/// Result type for translation operations
pub type Result<T> = std::result::Result<T, TranslationError>;
