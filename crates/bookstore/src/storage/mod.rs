//! Object-store abstraction
//!
//! The core never speaks the S3 wire protocol itself; everything goes
//! through [`ObjectStore`]. The bucket is a per-call argument because
//! cloning reads from caller-supplied buckets, not only the configured one.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[cfg(feature = "s3")]
pub mod s3;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Backend failure, with the remote HTTP status when the backend
    /// reported one.
    #[error("Storage backend error: {message}")]
    Backend {
        status: Option<u16>,
        message: String,
    },

    #[error("Invalid key format: {0}")]
    InvalidKey(String),
}

impl StorageError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            status: None,
            message: message.into(),
        }
    }
}

/// Metadata returned from a successful write.
#[derive(Debug, Clone, Default)]
pub struct PutReceipt {
    /// Version token, when the backend has versioning enabled.
    pub version_id: Option<String>,
}

/// A fetched object with its version token, when available.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub version_id: Option<String>,
}

/// Abstraction over S3-compatible object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `body` at `key` in `bucket`, overwriting any existing object.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> Result<PutReceipt, StorageError>;

    /// Fetch the object at `key` in `bucket`.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject, StorageError>;
}

/// In-memory object store for testing and development.
///
/// Records every put and issues a per-key incrementing version token so
/// tests can assert on write counts and version propagation.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<(String, String), (Vec<u8>, u64)>>,
    puts: Mutex<Vec<(String, String)>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// History of (bucket, key) pairs written, in order.
    pub fn put_history(&self) -> Vec<(String, String)> {
        self.puts.lock().unwrap().clone()
    }

    /// Total number of writes observed.
    pub fn put_count(&self) -> usize {
        self.puts.lock().unwrap().len()
    }

    /// Stored body for a key, if present.
    pub fn body(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .map(|(body, _)| body.clone())
    }

    /// Seed an object without recording a put.
    pub fn insert(&self, bucket: &str, key: &str, body: Vec<u8>) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), (body, 1));
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> Result<PutReceipt, StorageError> {
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| StorageError::backend("Lock poisoned"))?;

        let entry = objects
            .entry((bucket.to_string(), key.to_string()))
            .or_insert((Vec::new(), 0));
        entry.0 = body;
        entry.1 += 1;
        let version = entry.1;
        drop(objects);

        self.puts
            .lock()
            .map_err(|_| StorageError::backend("Lock poisoned"))?
            .push((bucket.to_string(), key.to_string()));

        Ok(PutReceipt {
            version_id: Some(version.to_string()),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject, StorageError> {
        let objects = self
            .objects
            .lock()
            .map_err(|_| StorageError::backend("Lock poisoned"))?;

        objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|(body, version)| StoredObject {
                body: body.clone(),
                version_id: Some(version.to_string()),
            })
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}
