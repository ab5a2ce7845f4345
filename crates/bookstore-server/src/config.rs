//! Server configuration management

use crate::error::{ApiError, Result};
use serde::{Deserialize, Serialize};

/// HTTP server configuration. Bookstore behavior itself is configured via
/// `bookstore::BookstoreSettings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Maximum request body size in megabytes
    pub max_body_mb: usize,

    /// Root directory the contents manager persists documents under
    pub notebook_dir: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ApiError::Config("Invalid PORT value".to_string()))?,
            max_body_mb: std::env::var("MAX_BODY_MB")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .map_err(|_| ApiError::Config("Invalid MAX_BODY_MB value".to_string()))?,
            notebook_dir: std::env::var("BOOKSTORE_NOTEBOOK_DIR")
                .unwrap_or_else(|_| ".".to_string()),
        })
    }

    /// Address string the server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_body_mb: 50,
            notebook_dir: ".".to_string(),
        }
    }
}
