//! Per-session serialization shared by HTTP handlers and the scheduler.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Keyed async mutex. Every mutation of a session's ledger (trades, clock
/// moves, snapshots) holds that session's guard, so reads of cash and lots
/// inside one operation are not interleaved with another writer.
#[derive(Clone, Default)]
pub struct SessionLocks {
    inner: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, session_id: &str) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the DashMap shard lock is released before awaiting.
        let mutex = self
            .inner
            .entry(session_id.to_string())
            .or_default()
            .clone();
        mutex.lock_owned().await
    }

    /// Drops the entry for a deleted session.
    pub fn forget(&self, session_id: &str) {
        self.inner.remove(session_id);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
