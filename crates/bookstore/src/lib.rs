//! # Bookstore
//!
//! Notebook persistence against S3-compatible object storage:
//! - **Archive**: best-effort, fire-and-forget mirroring of saved notebooks
//!   to a workspace prefix, with at most one in-flight write per path
//! - **Publish**: explicit, synchronous writes of notebooks to a curated
//!   published prefix
//! - **Clone**: importing objects from S3 or a local base directory into the
//!   workspace under a de-duplicated name
//!
//! The concurrency core is [`locks::PathLockRegistry`]: one lazily-created
//! lock per storage path, so concurrent save-triggered writes to the same
//! destination never race while writes to unrelated paths stay fully
//! concurrent.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bookstore::{ArchiveRecord, Archiver, BookstoreSettings};
//! use bookstore::storage::MemoryObjectStore;
//!
//! # async fn example() {
//! let settings = BookstoreSettings {
//!     s3_bucket: "notebooks".to_string(),
//!     ..Default::default()
//! };
//! let store = Arc::new(MemoryObjectStore::new());
//! let archiver = Arc::new(Archiver::new(settings, store));
//!
//! // Fire-and-forget: the save path is never delayed by the mirror write
//! archiver.schedule(ArchiveRecord::new("nb.ipynb", r#"{"cells":[]}"#));
//! # }
//! ```

pub mod archive;
pub mod clone;
pub mod content;
pub mod error;
pub mod locks;
pub mod notebook;
pub mod paths;
pub mod publish;
pub mod settings;
pub mod storage;

pub use archive::{ArchiveRecord, Archiver, ArchivingContents};
pub use clone::{CloneRequest, CloneResponse, FsCloneRequest, FsCloner, S3Cloner};
pub use content::{ContentKind, ContentModel, ContentsManager, FileContentsManager};
pub use error::{BookstoreError, Result};
pub use locks::{PathLock, PathLockRegistry};
pub use publish::{PublishModel, PublishReceipt, Publisher};
pub use settings::{validate_bookstore, BookstoreFeatures, BookstoreSettings};
pub use storage::ObjectStore;

#[cfg(feature = "s3")]
pub use storage::s3::S3ObjectStore;
