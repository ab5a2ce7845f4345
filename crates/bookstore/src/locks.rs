//! Per-path mutual exclusion for archive writes
//!
//! The registry owns one [`PathLock`] per storage path, created lazily the
//! first time a path is seen. Creation is serialized by a registry-level
//! guard so two concurrent first-time archives of the same path resolve to
//! the same lock instance. The guard is held only for the lookup-or-insert
//! step; holding a per-path lock never blocks the registry.
//!
//! Entries are never evicted within the process lifetime, one per distinct
//! path ever archived.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, Semaphore, SemaphorePermit};

/// A binary lock associated with exactly one storage path.
///
/// Built on a one-permit semaphore so holders get an RAII permit (released
/// on drop on every exit path) and observers get a non-blocking probe.
#[derive(Debug)]
pub struct PathLock {
    permit: Semaphore,
}

impl PathLock {
    fn new() -> Self {
        Self {
            permit: Semaphore::new(1),
        }
    }

    /// Attempt to take the lock without waiting. Returns `None` when another
    /// operation currently holds it.
    pub fn try_acquire(&self) -> Option<SemaphorePermit<'_>> {
        self.permit.try_acquire().ok()
    }

    /// Non-blocking check of whether the lock is currently held.
    pub fn is_locked(&self) -> bool {
        self.permit.available_permits() == 0
    }
}

/// Registry mapping storage paths to their locks.
#[derive(Debug, Default)]
pub struct PathLockRegistry {
    locks: Mutex<HashMap<String, Arc<PathLock>>>,
}

impl PathLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the lock for `path`, creating it on first sight.
    ///
    /// At most one lock instance ever exists per path; concurrent callers
    /// for a never-seen path race only on the registry guard and both
    /// receive the same instance.
    pub async fn acquire_or_create(&self, path: &str) -> Arc<PathLock> {
        let mut locks = self.locks.lock().await;
        match locks.get(path) {
            Some(lock) => Arc::clone(lock),
            None => {
                let lock = Arc::new(PathLock::new());
                locks.insert(path.to_string(), Arc::clone(&lock));
                lock
            }
        }
    }

    /// Number of paths the registry has seen.
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.locks.lock().await.is_empty()
    }
}
