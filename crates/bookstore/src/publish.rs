//! Publishing notebooks to the curated prefix
//!
//! Publishing is a deliberate, synchronous, user-initiated write; unlike
//! archival its failures are surfaced, with the backend's own status when
//! storage rejects the write. No locking: publish targets are not a
//! high-frequency autosave stream.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::{BookstoreError, Result};
use crate::notebook::validate_notebook;
use crate::paths::{s3_display_path, s3_key};
use crate::settings::BookstoreSettings;
use crate::storage::ObjectStore;

/// Inbound publish payload, matching the contents-API PUT body.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishModel {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Value,
}

/// Outcome of a successful publish.
#[derive(Debug, Clone, Serialize)]
pub struct PublishReceipt {
    /// Display path of the published object
    pub s3_path: String,
    /// Version token, when the bucket has versioning enabled
    #[serde(rename = "versionID", skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

/// Writes notebooks to the published prefix.
pub struct Publisher {
    settings: BookstoreSettings,
    store: Arc<dyn ObjectStore>,
}

impl Publisher {
    pub fn new(settings: BookstoreSettings, store: Arc<dyn ObjectStore>) -> Self {
        Self { settings, store }
    }

    /// Publish `model` at `path` under the published prefix.
    pub async fn publish(&self, path: &str, model: &PublishModel) -> Result<PublishReceipt> {
        if path.is_empty() || path == "/" {
            return Err(BookstoreError::invalid_request(
                "Must have a path to publish to",
            ));
        }
        if model.kind != "notebook" {
            return Err(BookstoreError::invalid_request(
                "bookstore only publishes notebooks",
            ));
        }
        if model.content.is_null()
            || model.content.as_object().is_some_and(|o| o.is_empty())
        {
            return Err(BookstoreError::invalid_request(
                "Cannot publish a notebook with empty content",
            ));
        }
        validate_notebook(&model.content)?;

        let path = path.trim_start_matches('/');
        let file_key = s3_key(&self.settings.published_prefix, path);
        let display_path = s3_display_path(
            &self.settings.s3_bucket,
            &self.settings.published_prefix,
            path,
        );

        info!("Publishing to {}", display_path);
        let body = serde_json::to_string(&model.content)?;
        let receipt = self
            .store
            .put_object(&self.settings.s3_bucket, &file_key, body.into_bytes())
            .await?;
        info!("Done with published write of {}", path);

        Ok(PublishReceipt {
            s3_path: display_path,
            version_id: receipt.version_id,
        })
    }
}
