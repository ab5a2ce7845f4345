//! Cloning objects from storage into the local workspace
//!
//! A clone fetches a remote object, builds a contents model (notebook or
//! plain file, judged by extension), de-conflicts the destination filename
//! and delegates the local save to the host's contents manager. Validation
//! or fetch failures terminate the request with no partial local writes.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::content::{basename, increment_filename, ContentModel, ContentsManager};
use crate::error::{BookstoreError, Result};
use crate::notebook::{is_notebook_path, validate_notebook};
use crate::paths::{s3_display_path, validate_relpath};
use crate::settings::BookstoreSettings;
use crate::storage::ObjectStore;

/// Inbound S3 clone payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CloneRequest {
    #[serde(default)]
    pub s3_bucket: String,
    #[serde(default)]
    pub s3_key: String,
    #[serde(default)]
    pub target_path: Option<String>,
}

/// Inbound filesystem clone payload.
#[derive(Debug, Clone, Deserialize)]
pub struct FsCloneRequest {
    #[serde(default)]
    pub relpath: String,
    #[serde(default)]
    pub target_path: Option<String>,
}

/// Contents-API-compatible clone response with provenance.
#[derive(Debug, Clone, Serialize)]
pub struct CloneResponse {
    #[serde(flatten)]
    pub model: ContentModel,
    /// Display path of the clone source, for S3 clones
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_path: Option<String>,
    #[serde(rename = "versionID", skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

/// Build a contents model from raw bytes, typed by the source extension.
fn build_model(source: &str, body: Vec<u8>) -> Result<ContentModel> {
    let text = String::from_utf8(body).map_err(|_| {
        BookstoreError::invalid_request(format!("Cloned content of {} is not valid UTF-8", source))
    })?;

    if is_notebook_path(source) {
        let content = serde_json::from_str(&text)?;
        validate_notebook(&content)?;
        Ok(ContentModel::notebook(content))
    } else {
        Ok(ContentModel::file(text))
    }
}

/// Clones objects out of S3-compatible storage.
pub struct S3Cloner {
    store: Arc<dyn ObjectStore>,
    contents: Arc<dyn ContentsManager>,
}

impl S3Cloner {
    pub fn new(store: Arc<dyn ObjectStore>, contents: Arc<dyn ContentsManager>) -> Self {
        Self { store, contents }
    }

    pub async fn clone(&self, request: &CloneRequest) -> Result<CloneResponse> {
        if request.s3_bucket.is_empty() || request.s3_bucket == "/" {
            return Err(BookstoreError::invalid_request(
                "Must have a bucket to clone from",
            ));
        }
        if request.s3_key.is_empty() || request.s3_key == "/" {
            return Err(BookstoreError::invalid_request(
                "Must have a key to clone from",
            ));
        }

        let target = match request.target_path.as_deref() {
            Some(target) if !target.is_empty() => target.to_string(),
            _ => basename(&request.s3_key).to_string(),
        };

        info!("About to clone from {}", request.s3_key);
        let object = self
            .store
            .get_object(&request.s3_bucket, &request.s3_key)
            .await?;

        let model = build_model(&request.s3_key, object.body)?;

        let path = increment_filename(self.contents.as_ref(), &target).await?;
        let model = model.at_path(&path);
        self.contents.save(&model, &path).await?;
        info!("Done cloning {} to {}", request.s3_key, path);

        Ok(CloneResponse {
            model,
            s3_path: Some(s3_display_path(&request.s3_bucket, &request.s3_key, "")),
            version_id: object.version_id,
        })
    }
}

/// Clones files from a configured base directory on the local filesystem.
pub struct FsCloner {
    basedir: PathBuf,
    contents: Arc<dyn ContentsManager>,
}

impl FsCloner {
    pub fn new(settings: &BookstoreSettings, contents: Arc<dyn ContentsManager>) -> Self {
        Self {
            basedir: PathBuf::from(&settings.fs_cloning_basedir),
            contents,
        }
    }

    pub async fn clone(&self, request: &FsCloneRequest) -> Result<CloneResponse> {
        let source = validate_relpath(&request.relpath, &self.basedir)?;

        let target = match request.target_path.as_deref() {
            Some(target) if !target.is_empty() => target.to_string(),
            _ => basename(&request.relpath).to_string(),
        };

        info!("About to clone from {}", request.relpath);
        let body = fs::read(&source).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BookstoreError::not_found(format!("{} not found", request.relpath))
            } else {
                BookstoreError::Io(e)
            }
        })?;

        let model = build_model(&request.relpath, body)?;

        let path = increment_filename(self.contents.as_ref(), &target).await?;
        let model = model.at_path(&path);
        self.contents.save(&model, &path).await?;
        info!("Done cloning {} to {}", request.relpath, path);

        Ok(CloneResponse {
            model,
            s3_path: None,
            version_id: None,
        })
    }
}
