//! Storage error types

use hyper::StatusCode;
use std::io;
use thiserror::Error;

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Failure of a listing or delete request
///
/// The `Display` text is sent verbatim as the plain-text response body.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Delete target does not exist
    #[error("Unknown file {name}")]
    NotFound { name: String },

    /// Delete target exists but could not be removed
    #[error("Failed to delete file {name}: {source}")]
    Delete { name: String, source: io::Error },

    /// Directory enumeration failed
    #[error("failed to read directory: {0}")]
    ReadDir(#[source] io::Error),

    /// Entry metadata could not be read
    #[error("failed to read metadata of {name}: {source}")]
    Metadata { name: String, source: io::Error },

    /// Entry content could not be read for hashing
    #[error("failed to hash {name}: {source}")]
    Hash { name: String, source: io::Error },
}

impl StorageError {
    /// HTTP status reported for this error
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
