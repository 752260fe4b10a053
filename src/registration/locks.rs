use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// One async mutex per project, serializing the part of group registration
/// that reads existing groups and writes a new one.
pub struct ProjectLocks {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl ProjectLocks {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Waits for the project's lock. Released when the guard is dropped.
    pub async fn acquire(&self, project_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(project_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drops locks nobody holds or waits on.
    pub fn cleanup(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Default for ProjectLocks {
    fn default() -> Self {
        Self::new()
    }
}
