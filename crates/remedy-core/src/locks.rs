//! Per-path mutual exclusion
//!
//! One async mutex per target path. Tasks on the same file queue behind each
//! other; tasks on different files never contend.

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lazily created async mutex per path
///
/// An entry lives only while someone holds or waits for its path.
#[derive(Debug, Default)]
pub struct FileLocks {
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

/// Exclusive hold on one path
///
/// Dropping it releases the path and discards the entry if nobody else is
/// waiting.
#[derive(Debug)]
pub struct FileLockGuard<'a> {
    locks: &'a FileLocks,
    path: PathBuf,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for FileLockGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.prune(&self.path);
    }
}

impl FileLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `path`
    ///
    /// The guard owns its mutex, so it can be held across await points.
    pub async fn lock(&self, path: &Path) -> FileLockGuard<'_> {
        // Clone out of the map before awaiting; never hold a shard lock across .await
        let mutex = self
            .locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        FileLockGuard {
            locks: self,
            path: path.to_path_buf(),
            guard: Some(guard),
        }
    }

    /// Drop the entry for `path` when the map holds the only reference
    fn prune(&self, path: &Path) {
        // Runs under the shard lock, so no `lock` call can clone in between
        self.locks.remove_if(path, |_, mutex| Arc::strong_count(mutex) == 1);
    }

    /// Whether someone currently holds `path`
    #[must_use]
    pub fn is_locked(&self, path: &Path) -> bool {
        self.locks
            .get(path)
            .is_some_and(|mutex| mutex.try_lock().is_err())
    }

    /// Number of paths currently held or waited on
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_path_is_exclusive() {
        let locks = FileLocks::new();
        let path = Path::new("a.txt");

        let guard = locks.lock(path).await;
        assert!(locks.is_locked(path));
        drop(guard);
        assert!(!locks.is_locked(path));
    }

    #[tokio::test]
    async fn distinct_paths_do_not_contend() {
        let locks = FileLocks::new();
        let _a = locks.lock(Path::new("a.txt")).await;
        let _b = locks.lock(Path::new("b.txt")).await;
        assert!(locks.is_locked(Path::new("a.txt")));
        assert!(locks.is_locked(Path::new("b.txt")));
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn waiter_proceeds_after_release() {
        let locks = Arc::new(FileLocks::new());
        let guard = locks.lock(Path::new("a.txt")).await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock(Path::new("a.txt")).await;
            })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn released_paths_are_forgotten() {
        let locks = FileLocks::new();
        for n in 0..10 {
            let _guard = locks.lock(Path::new(&format!("f{n}.txt"))).await;
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn entry_survives_while_someone_waits() {
        let locks = Arc::new(FileLocks::new());
        let guard = locks.lock(Path::new("a.txt")).await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock(Path::new("a.txt")).await;
            })
        };
        // Map, held guard, and the waiter's clone
        while Arc::strong_count(locks.locks.get(Path::new("a.txt")).unwrap().value()) < 3 {
            tokio::task::yield_now().await;
        }

        drop(guard);
        assert_eq!(locks.len(), 1);
        waiter.await.unwrap();
        assert!(locks.is_empty());
    }
}
