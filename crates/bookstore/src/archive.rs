//! Archival of notebooks
//!
//! Archival mirrors saved documents to object storage, detached from the
//! save that triggered it. Per path, at most one write is in flight at a
//! time: an archive attempt that finds the path locked is dropped rather
//! than queued, and the next save is the natural retry.

use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::content::{ContentKind, ContentModel, ContentsManager};
use crate::error::Result;
use crate::locks::PathLockRegistry;
use crate::paths::{s3_display_path, s3_key};
use crate::settings::BookstoreSettings;
use crate::storage::ObjectStore;

/// An archival record: one saved document queued for mirroring.
///
/// Immutable; consumed exactly once by [`Archiver::archive`].
#[derive(Debug, Clone)]
pub struct ArchiveRecord {
    /// Storage-relative identifier of the document
    pub path: String,
    /// Serialized document body
    pub content: String,
    /// When the record was queued for archival
    pub queued_at: OffsetDateTime,
}

impl ArchiveRecord {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            queued_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Mirrors saved documents to object storage when saves occur.
pub struct Archiver {
    settings: BookstoreSettings,
    store: Arc<dyn ObjectStore>,
    locks: PathLockRegistry,
    /// Admission budget for detached archive tasks, sized from
    /// `max_threads`. Records beyond the budget are dropped with a log.
    budget: Arc<Semaphore>,
}

impl Archiver {
    pub fn new(settings: BookstoreSettings, store: Arc<dyn ObjectStore>) -> Self {
        info!(
            "Archiving notebooks to {}",
            s3_display_path(&settings.s3_bucket, &settings.workspace_prefix, "")
        );
        let budget = Arc::new(Semaphore::new(settings.max_threads.max(1)));
        Self {
            settings,
            store,
            locks: PathLockRegistry::new(),
            budget,
        }
    }

    /// The per-path lock registry. Exposed so the skip policy can be
    /// exercised directly in tests.
    pub fn locks(&self) -> &PathLockRegistry {
        &self.locks
    }

    /// Process a record: write it to storage unless a write for the same
    /// path is already in flight.
    ///
    /// Failures are logged and swallowed; archival runs detached from the
    /// request that initiated the save and must never surface errors to it.
    pub async fn archive(&self, record: ArchiveRecord) {
        let lock = self.locks.acquire_or_create(&record.path).await;

        // Skip writes when a given path is already locked
        let Some(_permit) = lock.try_acquire() else {
            info!("Skipping archive of {}", record.path);
            return;
        };

        let file_key = s3_key(&self.settings.workspace_prefix, &record.path);
        info!("Processing storage write of {}", record.path);
        match self
            .store
            .put_object(&self.settings.s3_bucket, &file_key, record.content.into_bytes())
            .await
        {
            Ok(_) => info!("Done with storage write of {}", record.path),
            Err(e) => error!("Error while archiving file: {} {}", record.path, e),
        }
        // permit drops here, releasing the path for the next archive
    }

    /// Fire-and-forget handoff: schedule `record` on the runtime and return
    /// immediately. The caller never observes the outcome.
    pub fn schedule(self: &Arc<Self>, record: ArchiveRecord) {
        let Ok(slot) = Arc::clone(&self.budget).try_acquire_owned() else {
            warn!(
                "Archive budget exhausted, dropping archive of {}",
                record.path
            );
            return;
        };

        let archiver = Arc::clone(self);
        tokio::spawn(async move {
            archiver.archive(record).await;
            drop(slot);
        });
    }
}

/// Contents manager that mirrors notebook saves to object storage.
///
/// Wraps the host's contents manager: every successful save of a notebook
/// model schedules an archive of its serialized content. Non-notebook saves
/// pass through untouched.
pub struct ArchivingContents {
    inner: Arc<dyn ContentsManager>,
    archiver: Arc<Archiver>,
}

impl ArchivingContents {
    pub fn new(inner: Arc<dyn ContentsManager>, archiver: Arc<Archiver>) -> Self {
        Self { inner, archiver }
    }
}

#[async_trait]
impl ContentsManager for ArchivingContents {
    async fn exists(&self, path: &str) -> Result<bool> {
        self.inner.exists(path).await
    }

    async fn save(&self, model: &ContentModel, path: &str) -> Result<()> {
        self.inner.save(model, path).await?;

        if model.kind != ContentKind::Notebook {
            debug!(
                "Bookstore only archives notebooks, request does not state that {} is a notebook",
                path
            );
            return Ok(());
        }

        match serde_json::to_string(&model.content) {
            Ok(content) => self.archiver.schedule(ArchiveRecord::new(path, content)),
            Err(e) => error!("Could not serialize notebook content for {}: {}", path, e),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MemoryContentsManager;
    use crate::storage::MemoryObjectStore;
    use serde_json::json;

    fn settings() -> BookstoreSettings {
        BookstoreSettings {
            s3_bucket: "mybucket".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_archive_writes_to_workspace_key() {
        let store = Arc::new(MemoryObjectStore::new());
        let archiver = Archiver::new(settings(), store.clone());

        archiver
            .archive(ArchiveRecord::new("nb.ipynb", r#"{"cells":[]}"#))
            .await;

        assert_eq!(
            store.put_history(),
            vec![("mybucket".to_string(), "workspace/nb.ipynb".to_string())]
        );
        assert_eq!(
            store.body("mybucket", "workspace/nb.ipynb").unwrap(),
            br#"{"cells":[]}"#
        );
    }

    #[tokio::test]
    async fn test_archive_skips_when_path_locked() {
        let store = Arc::new(MemoryObjectStore::new());
        let archiver = Archiver::new(settings(), store.clone());

        // Synthetically hold the path's lock, as a prior in-flight write would
        let lock = archiver.locks().acquire_or_create("nb.ipynb").await;
        let held = lock.try_acquire().unwrap();

        archiver
            .archive(ArchiveRecord::new("nb.ipynb", r#"{"cells":[]}"#))
            .await;
        assert_eq!(store.put_count(), 0);

        // Once released, the next save goes through
        drop(held);
        archiver
            .archive(ArchiveRecord::new("nb.ipynb", r#"{"cells":[]}"#))
            .await;
        assert_eq!(store.put_count(), 1);
    }

    #[tokio::test]
    async fn test_archive_releases_lock_after_failure() {
        // A store error must not leave the path permanently locked
        struct FailingStore;

        #[async_trait]
        impl ObjectStore for FailingStore {
            async fn put_object(
                &self,
                _bucket: &str,
                _key: &str,
                _body: Vec<u8>,
            ) -> std::result::Result<crate::storage::PutReceipt, crate::storage::StorageError>
            {
                Err(crate::storage::StorageError::backend("boom"))
            }

            async fn get_object(
                &self,
                _bucket: &str,
                key: &str,
            ) -> std::result::Result<crate::storage::StoredObject, crate::storage::StorageError>
            {
                Err(crate::storage::StorageError::NotFound(key.to_string()))
            }
        }

        let archiver = Archiver::new(settings(), Arc::new(FailingStore));
        archiver
            .archive(ArchiveRecord::new("nb.ipynb", "{}"))
            .await;

        let lock = archiver.locks().acquire_or_create("nb.ipynb").await;
        assert!(!lock.is_locked());
    }

    #[tokio::test]
    async fn test_concurrent_archives_distinct_paths() {
        let store = Arc::new(MemoryObjectStore::new());
        let archiver = Arc::new(Archiver::new(settings(), store.clone()));

        let mut handles = Vec::new();
        for i in 0..8 {
            let archiver = Arc::clone(&archiver);
            handles.push(tokio::spawn(async move {
                archiver
                    .archive(ArchiveRecord::new(format!("nb-{}.ipynb", i), "{}"))
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.put_count(), 8);
    }

    #[tokio::test]
    async fn test_archiving_contents_hooks_notebook_saves() {
        let store = Arc::new(MemoryObjectStore::new());
        let archiver = Arc::new(Archiver::new(settings(), store.clone()));
        let inner = Arc::new(MemoryContentsManager::new());
        let contents = ArchivingContents::new(inner.clone(), archiver);

        let model = ContentModel::notebook(json!({"cells": [], "metadata": {}, "nbformat": 4}))
            .at_path("nb.ipynb");
        contents.save(&model, "nb.ipynb").await.unwrap();

        // The local save happens synchronously
        assert!(inner.saved("nb.ipynb").is_some());

        // The archive is fire-and-forget; give the detached task a chance
        for _ in 0..50 {
            if store.put_count() > 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(
            store.put_history(),
            vec![("mybucket".to_string(), "workspace/nb.ipynb".to_string())]
        );
    }

    #[tokio::test]
    async fn test_archiving_contents_ignores_plain_files() {
        let store = Arc::new(MemoryObjectStore::new());
        let archiver = Arc::new(Archiver::new(settings(), store.clone()));
        let inner = Arc::new(MemoryContentsManager::new());
        let contents = ArchivingContents::new(inner.clone(), archiver);

        let model = ContentModel::file("hello".to_string()).at_path("notes.txt");
        contents.save(&model, "notes.txt").await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(inner.saved("notes.txt").is_some());
        assert_eq!(store.put_count(), 0);
    }
}
