//! S3-compatible object store backed by the MinIO client
//!
//! Works with AWS S3, MinIO, and any S3-compatible service. Credentials may
//! be left unset to use the ambient (IAM) credential chain; that case is
//! only validated on the first write.

use async_trait::async_trait;
use bytes::Bytes;
use minio::s3::{
    client::Client,
    creds::{Provider, StaticProvider},
    http::BaseUrl,
    segmented_bytes::SegmentedBytes,
    types::S3Api,
};
use std::str::FromStr;
use tracing::info;

use crate::settings::BookstoreSettings;
use crate::storage::{ObjectStore, PutReceipt, StorageError, StoredObject};

/// Object store speaking to an S3-compatible endpoint.
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from bookstore settings.
    ///
    /// Credentials are resolved once, here; absence means the ambient
    /// credential chain and is logged so operators are not surprised by a
    /// failing first write.
    pub fn from_settings(settings: &BookstoreSettings) -> Result<Self, StorageError> {
        let base_url = BaseUrl::from_str(&settings.s3_endpoint_url).map_err(|e| {
            StorageError::backend(format!(
                "Invalid S3 endpoint URL '{}': {}",
                settings.s3_endpoint_url, e
            ))
        })?;

        let provider: Option<Box<dyn Provider + Send + Sync>> = match (
            &settings.s3_access_key_id,
            &settings.s3_secret_access_key,
        ) {
            (Some(access_key), Some(secret_key)) => {
                Some(Box::new(StaticProvider::new(access_key, secret_key, None)))
            }
            _ => {
                info!("No S3 credentials configured, relying on ambient IAM credentials");
                None
            }
        };

        let client = Client::new(base_url, provider, None, None)
            .map_err(|e| StorageError::backend(format!("Failed to create S3 client: {}", e)))?;

        Ok(Self::new(client))
    }

    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty() || key.len() > 1024 {
            return Err(StorageError::InvalidKey(
                "Key must be between 1 and 1024 characters".into(),
            ));
        }
        if key.starts_with('/') || key.ends_with('/') {
            return Err(StorageError::InvalidKey(
                "Key cannot start or end with '/'".into(),
            ));
        }
        Ok(())
    }

    /// Map a MinIO error string to the storage taxonomy, keeping the remote
    /// status when it is recognizable.
    fn map_error(key: &str, err: impl std::fmt::Display) -> StorageError {
        let message = err.to_string();
        if message.contains("NoSuchKey") || message.contains("404") {
            StorageError::NotFound(key.to_string())
        } else if message.contains("AccessDenied") || message.contains("403") {
            StorageError::AccessDenied(key.to_string())
        } else {
            StorageError::Backend {
                status: None,
                message: format!("Storage request for '{}' failed: {}", key, message),
            }
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> Result<PutReceipt, StorageError> {
        Self::validate_key(key)?;

        let bytes = SegmentedBytes::from(Bytes::from(body));

        let response = self
            .client
            .put_object(bucket, key, bytes)
            .send()
            .await
            .map_err(|e| Self::map_error(key, e))?;

        Ok(PutReceipt {
            version_id: response.version_id,
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject, StorageError> {
        Self::validate_key(key)?;

        let response = self
            .client
            .get_object(bucket, key)
            .send()
            .await
            .map_err(|e| Self::map_error(key, e))?;

        let version_id = response.version_id.clone();
        let content = response
            .content
            .to_segmented_bytes()
            .await
            .map_err(|e| StorageError::backend(format!("Failed to read '{}' content: {}", key, e)))?;

        Ok(StoredObject {
            body: content.to_bytes().to_vec(),
            version_id,
        })
    }
}
