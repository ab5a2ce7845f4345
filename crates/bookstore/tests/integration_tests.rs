//! Integration tests for the bookstore core

use std::sync::Arc;

use bookstore::content::MemoryContentsManager;
use bookstore::storage::MemoryObjectStore;
use bookstore::{
    validate_bookstore, ArchiveRecord, Archiver, ArchivingContents, BookstoreSettings,
    CloneRequest, ContentKind, ContentModel, ContentsManager, FsCloneRequest, FsCloner,
    PublishModel, Publisher, S3Cloner,
};
use serde_json::json;

fn settings() -> BookstoreSettings {
    BookstoreSettings {
        s3_bucket: "mybucket".to_string(),
        ..Default::default()
    }
}

fn notebook_content() -> serde_json::Value {
    json!({
        "cells": [{"cell_type": "code", "source": "1 + 1"}],
        "metadata": {"kernelspec": {"name": "python3"}},
        "nbformat": 4,
        "nbformat_minor": 5
    })
}

#[tokio::test]
async fn test_archive_publish_clone_roundtrip() {
    let store = Arc::new(MemoryObjectStore::new());
    let contents = Arc::new(MemoryContentsManager::new());

    // Archive a saved notebook into the workspace prefix
    let archiver = Archiver::new(settings(), store.clone());
    let body = serde_json::to_string(&notebook_content()).unwrap();
    archiver
        .archive(ArchiveRecord::new("project/nb.ipynb", body.clone()))
        .await;
    assert_eq!(
        store.body("mybucket", "workspace/project/nb.ipynb").unwrap(),
        body.as_bytes()
    );

    // Publish the same notebook to the curated prefix
    let publisher = Publisher::new(settings(), store.clone());
    let receipt = publisher
        .publish(
            "project/nb.ipynb",
            &PublishModel {
                kind: "notebook".to_string(),
                content: notebook_content(),
            },
        )
        .await
        .unwrap();
    assert_eq!(receipt.s3_path, "s3://mybucket/published/project/nb.ipynb");
    assert!(receipt.version_id.is_some());

    // Clone the published notebook back into the workspace
    let cloner = S3Cloner::new(store.clone(), contents.clone());
    let response = cloner
        .clone(&CloneRequest {
            s3_bucket: "mybucket".to_string(),
            s3_key: "published/project/nb.ipynb".to_string(),
            target_path: None,
        })
        .await
        .unwrap();

    assert_eq!(response.model.kind, ContentKind::Notebook);
    assert_eq!(response.model.path, "nb.ipynb");
    assert_eq!(response.model.content, notebook_content());
    assert!(response.version_id.is_some());
    assert!(contents.saved("nb.ipynb").is_some());
}

#[tokio::test]
async fn test_save_hook_drives_archive_end_to_end() {
    let store = Arc::new(MemoryObjectStore::new());
    let archiver = Arc::new(Archiver::new(settings(), store.clone()));
    let inner = Arc::new(MemoryContentsManager::new());
    let contents = ArchivingContents::new(inner.clone(), archiver.clone());

    let model = ContentModel::notebook(notebook_content()).at_path("nb.ipynb");
    contents.save(&model, "nb.ipynb").await.unwrap();

    // Wait for the detached archive task
    for _ in 0..100 {
        if store.put_count() > 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    assert_eq!(
        store.put_history(),
        vec![("mybucket".to_string(), "workspace/nb.ipynb".to_string())]
    );

    // A second save while the path lock is held is skipped, not queued
    let lock = archiver.locks().acquire_or_create("nb.ipynb").await;
    let held = lock.try_acquire().unwrap();
    archiver
        .archive(ArchiveRecord::new("nb.ipynb", "{}"))
        .await;
    drop(held);
    assert_eq!(store.put_count(), 1);
}

#[tokio::test]
async fn test_repeated_clones_never_clobber() {
    let store = Arc::new(MemoryObjectStore::new());
    store.insert(
        "shared",
        "nb.ipynb",
        serde_json::to_vec(&notebook_content()).unwrap(),
    );
    let contents = Arc::new(MemoryContentsManager::new());
    let cloner = S3Cloner::new(store, contents.clone());

    let request = CloneRequest {
        s3_bucket: "shared".to_string(),
        s3_key: "nb.ipynb".to_string(),
        target_path: None,
    };

    let first = cloner.clone(&request).await.unwrap();
    let second = cloner.clone(&request).await.unwrap();
    let third = cloner.clone(&request).await.unwrap();

    assert_eq!(first.model.path, "nb.ipynb");
    assert_eq!(second.model.path, "nb-1.ipynb");
    assert_eq!(third.model.path, "nb-2.ipynb");
    assert_eq!(contents.saved_paths().len(), 3);
}

#[tokio::test]
async fn test_fs_clone_under_tempdir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("course")).unwrap();
    std::fs::write(
        dir.path().join("course/nb.ipynb"),
        serde_json::to_vec(&notebook_content()).unwrap(),
    )
    .unwrap();

    let settings = BookstoreSettings {
        enable_fs_cloning: true,
        fs_cloning_basedir: dir.path().to_string_lossy().into_owned(),
        ..Default::default()
    };
    assert!(validate_bookstore(&settings).fs_clone_valid);

    let contents = Arc::new(MemoryContentsManager::new());
    let cloner = FsCloner::new(&settings, contents.clone());

    let response = cloner
        .clone(&FsCloneRequest {
            relpath: "course/nb.ipynb".to_string(),
            target_path: None,
        })
        .await
        .unwrap();
    assert_eq!(response.model.kind, ContentKind::Notebook);
    assert_eq!(response.model.path, "nb.ipynb");

    // Escapes are rejected as not-found, with nothing saved
    let err = cloner
        .clone(&FsCloneRequest {
            relpath: "course/../../elsewhere.ipynb".to_string(),
            target_path: None,
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("outside root cloning directory"));
    assert_eq!(contents.saved_paths().len(), 1);
}

#[tokio::test]
async fn test_concurrent_archives_one_winner_per_path() {
    let store = Arc::new(MemoryObjectStore::new());
    let archiver = Arc::new(Archiver::new(settings(), store.clone()));

    // Hold the lock while a burst of archives arrives for the same path
    let lock = archiver.locks().acquire_or_create("hot.ipynb").await;
    let held = lock.try_acquire().unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let archiver = Arc::clone(&archiver);
        handles.push(tokio::spawn(async move {
            archiver
                .archive(ArchiveRecord::new("hot.ipynb", "{}"))
                .await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // All burst writes observed the lock and skipped
    assert_eq!(store.put_count(), 0);
    drop(held);

    archiver
        .archive(ArchiveRecord::new("hot.ipynb", "{}"))
        .await;
    assert_eq!(store.put_count(), 1);
}
