//! Error handling for the API server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bookstore::storage::StorageError;
use bookstore::BookstoreError;
use serde_json::json;
use thiserror::Error;

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Bookstore(#[from] BookstoreError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn bad_request(msg: &str) -> Self {
        Self::BadRequest(msg.to_string())
    }

    /// Status for a storage-layer failure. Remote-reported statuses are
    /// surfaced to the caller rather than collapsed to a generic error.
    fn storage_status(err: &StorageError) -> StatusCode {
        match err {
            StorageError::NotFound(_) => StatusCode::NOT_FOUND,
            StorageError::AccessDenied(_) => StatusCode::FORBIDDEN,
            StorageError::InvalidKey(_) => StatusCode::BAD_REQUEST,
            StorageError::Backend { status, .. } => status
                .and_then(|code| StatusCode::from_u16(code).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Bookstore(BookstoreError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            ApiError::Bookstore(BookstoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Bookstore(BookstoreError::Storage(e)) => Self::storage_status(e),
            ApiError::Bookstore(BookstoreError::Serialization(_)) => StatusCode::BAD_REQUEST,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Config(_)
            | ApiError::Io(_)
            | ApiError::Bookstore(BookstoreError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}
