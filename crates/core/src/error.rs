//! Error types for archiving operations.
//!
//! This module defines the main error type [`ArchiveError`] which represents
//! everything that can go wrong while loading configuration, navigating
//! pages, parsing listing payloads, and writing archive files.
//!
//! Most of these never reach the caller of [`crate::Archiver::archive`]:
//! per-post and per-page failures are logged, counted, and skipped. Only
//! configuration errors are meant to be fatal.
//!
//! # Example
//!
//! ```rust
//! use quire_core::{ArchiveError, Result};
//!
//! fn require_handle(handle: &str) -> Result<&str> {
//!     if handle.is_empty() {
//!         return Err(ArchiveError::ConfigError("missing handle".to_string()));
//!     }
//!     Ok(handle)
//! }
//! ```

use thiserror::Error;

/// Main error type for archive operations.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// HTTP request errors from reqwest.
    ///
    /// This variant wraps network errors, DNS failures, connection issues,
    /// and other transport-level problems.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Navigation exceeded its time budget.
    #[error("Navigation to {url} timed out after {timeout} seconds")]
    Timeout { url: String, timeout: u64 },

    /// The page load was refused before any content arrived.
    ///
    /// This is the signature of a paywalled or otherwise inaccessible post and
    /// is treated as a soft skip by the orchestrator.
    #[error("Navigation to {url} was aborted (HTTP {status})")]
    NavigationAborted { url: String, status: u16 },

    /// Any other non-success HTTP status.
    #[error("Request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// JSON (de)serialization errors.
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File system errors.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors.
    ///
    /// Returned when the publication list is missing, unparseable, or its
    /// root is not a list.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A CSS selector could not be parsed.
    #[error("Invalid selector: {0}")]
    SelectorError(String),

    /// Login with the configured credentials did not succeed.
    #[error("Login failed: {0}")]
    LoginFailed(String),

    /// The stored browser session could not be read.
    #[error("Storage state error: {0}")]
    StorageStateError(String),

    /// A background task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    TaskError(String),
}

impl ArchiveError {
    /// Whether this error means the page was refused rather than broken.
    pub fn is_inaccessible(&self) -> bool {
        matches!(self, ArchiveError::NavigationAborted { .. })
    }
}

impl From<tokio::task::JoinError> for ArchiveError {
    fn from(err: tokio::task::JoinError) -> Self {
        ArchiveError::TaskError(err.to_string())
    }
}

/// Result type alias for ArchiveError.
pub type Result<T> = std::result::Result<T, ArchiveError>;
