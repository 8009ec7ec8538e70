//! Error types for the mirroring engine

use std::time::Duration;

/// Result type alias for mirror operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Error taxonomy for a sync run
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Endpoint address could not be parsed
    #[error("Address error for '{address}': {message}")]
    Address { address: String, message: String },

    /// A tree snapshot failed; fatal to the run
    #[error("Scan error at '{address}': {message}")]
    Scan { address: String, message: String },

    /// A single-file copy failed; recoverable, counted against the error budget
    #[error("Copy error from '{origin}' to '{target}': {message}")]
    Copy {
        origin: String,
        target: String,
        message: String,
    },

    /// The remote answered 429; recoverable, the engine pauses before moving on
    #[error("Rate limited by '{target}'")]
    RateLimited {
        target: String,
        retry_after: Option<Duration>,
    },

    /// The fingerprint store could not be read or written
    #[error("Persist error for '{path}': {message}")]
    Persist { path: String, message: String },

    /// Ignore pattern could not be compiled
    #[error("Filter pattern error: {0}")]
    FilterPattern(String),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl SyncError {
    /// Create a new address error
    pub fn address_error(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Address {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Create a new scan error
    pub fn scan_error(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Scan {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Create a new copy error
    pub fn copy_error(
        source: impl Into<String>,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Copy {
            origin: source.into(),
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a new persist error
    pub fn persist_error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Persist {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error is fatal to the whole run rather than to one file
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Scan { .. } | Self::Address { .. })
    }
}
