//! Contents-API models and the host save seam
//!
//! [`ContentModel`] matches the shape of the Jupyter contents API; the
//! [`ContentsManager`] trait is the host's storage layer that cloning
//! delegates local persistence to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::fs;

use crate::error::{BookstoreError, Result};

/// Content type of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Notebook,
    File,
}

/// A contents-API-compatible document model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentModel {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    pub content: Value,
    pub name: String,
    pub path: String,
}

impl ContentModel {
    /// A notebook model carrying structured JSON content.
    pub fn notebook(content: Value) -> Self {
        Self {
            kind: ContentKind::Notebook,
            format: "json".to_string(),
            mimetype: None,
            content,
            name: String::new(),
            path: String::new(),
        }
    }

    /// An opaque text-file model.
    pub fn file(content: String) -> Self {
        Self {
            kind: ContentKind::File,
            format: "text".to_string(),
            mimetype: Some("text/plain".to_string()),
            content: Value::String(content),
            name: String::new(),
            path: String::new(),
        }
    }

    /// Fill in `name` and `path` from the final destination path.
    pub fn at_path(mut self, path: &str) -> Self {
        self.name = basename(path).to_string();
        self.path = path.to_string();
        self
    }
}

/// Last component of a `/`-delimited path.
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// The host's document-save API.
#[async_trait]
pub trait ContentsManager: Send + Sync {
    /// Whether a document already exists at `path`.
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Persist `model` at `path`.
    async fn save(&self, model: &ContentModel, path: &str) -> Result<()>;
}

/// De-conflict a destination filename.
///
/// If `target` is free it is returned unchanged; otherwise a `-N` suffix is
/// inserted before the extension (`nb.ipynb` → `nb-1.ipynb`, `nb-2.ipynb`,
/// …) so cloning never silently clobbers existing work.
pub async fn increment_filename(contents: &dyn ContentsManager, target: &str) -> Result<String> {
    if !contents.exists(target).await? {
        return Ok(target.to_string());
    }

    let (dir, file) = match target.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, target),
    };
    let (stem, ext) = match file.split_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (file, None),
    };

    let mut n: u64 = 1;
    loop {
        let candidate_file = match ext {
            Some(ext) => format!("{}-{}.{}", stem, n, ext),
            None => format!("{}-{}", stem, n),
        };
        let candidate = match dir {
            Some(dir) => format!("{}/{}", dir, candidate_file),
            None => candidate_file,
        };
        if !contents.exists(&candidate).await? {
            return Ok(candidate);
        }
        n += 1;
    }
}

/// Contents manager persisting documents under a root directory.
pub struct FileContentsManager {
    root: PathBuf,
}

impl FileContentsManager {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

#[async_trait]
impl ContentsManager for FileContentsManager {
    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(fs::try_exists(self.resolve(path)).await?)
    }

    async fn save(&self, model: &ContentModel, path: &str) -> Result<()> {
        let target = self.resolve(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        match model.kind {
            ContentKind::Notebook => {
                let body = serde_json::to_string_pretty(&model.content)?;
                fs::write(&target, body).await?;
            }
            ContentKind::File => {
                let body = model.content.as_str().ok_or_else(|| {
                    BookstoreError::invalid_request("File content must be a string")
                })?;
                fs::write(&target, body).await?;
            }
        }
        Ok(())
    }
}

/// In-memory contents manager for tests.
#[derive(Debug, Default)]
pub struct MemoryContentsManager {
    saved: Mutex<HashMap<String, ContentModel>>,
}

impl MemoryContentsManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a path so de-duplication can be exercised.
    pub fn touch(&self, path: &str) {
        self.saved.lock().unwrap().insert(
            path.to_string(),
            ContentModel::file(String::new()).at_path(path),
        );
    }

    pub fn saved(&self, path: &str) -> Option<ContentModel> {
        self.saved.lock().unwrap().get(path).cloned()
    }

    pub fn saved_paths(&self) -> Vec<String> {
        self.saved.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl ContentsManager for MemoryContentsManager {
    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.saved.lock().unwrap().contains_key(path))
    }

    async fn save(&self, model: &ContentModel, path: &str) -> Result<()> {
        self.saved
            .lock()
            .unwrap()
            .insert(path.to_string(), model.clone());
        Ok(())
    }
}
