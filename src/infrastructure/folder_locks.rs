// src/infrastructure/folder_locks.rs
//
// Per-media-folder exclusivity scopes
//
// CRITICAL RULES:
// - Keyed by the canonical folder path, so equivalent spellings share a lock
// - Held only around filesystem mutation, never around confirmation waits
// - Different folders never block each other
// - Entries nobody holds or waits on are pruned

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::path_safety::canonical_form;

type LockTable = HashMap<String, Arc<AsyncMutex<()>>>;

#[derive(Default)]
pub struct FolderLocks {
    locks: Mutex<LockTable>,
}

/// Exclusive access to one media folder until dropped
#[derive(Debug)]
pub struct FolderLockGuard {
    folder: String,
    _guard: OwnedMutexGuard<()>,
}

impl FolderLockGuard {
    pub fn folder(&self) -> &str {
        &self.folder
    }
}

impl FolderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other holder has `media_folder_path`, then take it.
    pub async fn acquire(&self, media_folder_path: &str) -> FolderLockGuard {
        let (folder, lock) = self.lock_for(media_folder_path);
        let guard = lock.lock_owned().await;
        log::debug!("Acquired folder lock for {}", folder);
        FolderLockGuard {
            folder,
            _guard: guard,
        }
    }

    /// Take the folder lock only if it is free right now.
    pub fn try_acquire(&self, media_folder_path: &str) -> Option<FolderLockGuard> {
        let (folder, lock) = self.lock_for(media_folder_path);
        lock.try_lock_owned().ok().map(|guard| FolderLockGuard {
            folder,
            _guard: guard,
        })
    }

    /// Number of folders with a live lock entry
    pub fn tracked_folders(&self) -> usize {
        let mut table = self.table();
        prune(&mut table);
        table.len()
    }

    fn lock_for(&self, media_folder_path: &str) -> (String, Arc<AsyncMutex<()>>) {
        let folder = canonical_form(media_folder_path);
        let mut table = self.table();
        prune(&mut table);
        let lock = Arc::clone(
            table
                .entry(folder.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        );
        (folder, lock)
    }

    fn table(&self) -> MutexGuard<'_, LockTable> {
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// An entry whose only reference is the table itself has no holder and no waiter.
fn prune(table: &mut LockTable) {
    table.retain(|_, lock| Arc::strong_count(lock) > 1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_folder_is_exclusive() {
        let locks = FolderLocks::new();
        let held = locks.acquire("/media/Show").await;

        assert!(locks.try_acquire("/media/Show").is_none());

        drop(held);
        assert!(locks.try_acquire("/media/Show").is_some());
    }

    #[tokio::test]
    async fn test_equivalent_spellings_share_a_lock() {
        let locks = FolderLocks::new();
        let held = locks.acquire("C:\\media\\Show\\").await;

        assert_eq!(held.folder(), "/media/Show");
        assert!(locks.try_acquire("/media/./Show").is_none());
    }

    #[tokio::test]
    async fn test_different_folders_do_not_block() {
        let locks = FolderLocks::new();
        let _a = locks.acquire("/media/ShowA").await;

        assert!(locks.try_acquire("/media/ShowB").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiter_proceeds_after_release() {
        let locks = Arc::new(FolderLocks::new());
        let held = locks.acquire("/media/Show").await;

        let waiter_locks = Arc::clone(&locks);
        let waiter = tokio::spawn(async move {
            let guard = waiter_locks.acquire("/media/Show").await;
            guard.folder().to_string()
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        drop(held);
        assert_eq!(waiter.await.unwrap(), "/media/Show");
    }

    #[tokio::test]
    async fn test_released_entries_are_pruned() {
        let locks = FolderLocks::new();
        {
            let _a = locks.acquire("/media/A").await;
            let _b = locks.acquire("/media/B").await;
            assert_eq!(locks.tracked_folders(), 2);
        }
        assert_eq!(locks.tracked_folders(), 0);
    }
}
