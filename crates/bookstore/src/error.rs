//! Error types for the bookstore core

use thiserror::Error;

use crate::storage::StorageError;

/// Bookstore-specific errors
#[derive(Error, Debug)]
pub enum BookstoreError {
    /// Invalid caller input: empty model, wrong content type, bad path.
    /// Maps to a 400-class response at the HTTP surface.
    #[error("{0}")]
    InvalidRequest(String),

    /// Requested object or path does not exist (or must be reported as
    /// missing, e.g. path-escape attempts).
    #[error("{0}")]
    NotFound(String),

    /// Error reported by the object-store backend. The remote status code
    /// is preserved so synchronous operations can surface it.
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BookstoreError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

/// Result type for bookstore operations
pub type Result<T> = std::result::Result<T, BookstoreError>;
