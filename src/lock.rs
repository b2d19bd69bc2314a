//! Per-session lock registry.
//!
//! Serializes load → merge → save for one session key while leaving other
//! keys fully concurrent. The registry is owned by the engine instance, so
//! independent engines (tests in particular) never share lock state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::RapportError;

pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

struct LockEntry {
    /// tokio's mutex queues waiters fairly, which gives per-key FIFO
    /// admission for free.
    mutex: tokio::sync::Mutex<()>,
    /// Operations queued or running for this key. Maintained under the
    /// registry map lock; the entry is removed when it reaches zero.
    pending: AtomicUsize,
}

pub struct SessionLocks {
    entries: parking_lot::Mutex<HashMap<String, Arc<LockEntry>>>,
    acquire_timeout: Duration,
}

/// Decrements the pending count on every exit path, including cancellation
/// while still queued, and drops the map entry once the key is idle.
struct PendingGuard<'a> {
    locks: &'a SessionLocks,
    key: String,
    entry: Arc<LockEntry>,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut map = self.locks.entries.lock();
        if self.entry.pending.fetch_sub(1, Ordering::Relaxed) == 1 {
            map.remove(&self.key);
        }
    }
}

impl SessionLocks {
    pub fn new(acquire_timeout: Duration) -> Self {
        Self {
            entries: parking_lot::Mutex::new(HashMap::new()),
            acquire_timeout,
        }
    }

    /// Run `op` holding the exclusive lock for `key`.
    ///
    /// Waits at most the configured timeout for admission, then surfaces
    /// `LockTimeout`. `op` runs exactly once; its result is propagated and
    /// the lock is released whether it succeeds or fails, so a failing
    /// operation never wedges the key's queue.
    pub async fn with_lock<T, F, Fut>(&self, key: &str, op: F) -> Result<T, RapportError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, RapportError>>,
    {
        let entry = {
            let mut map = self.entries.lock();
            let entry = map
                .entry(key.to_string())
                .or_insert_with(|| {
                    Arc::new(LockEntry {
                        mutex: tokio::sync::Mutex::new(()),
                        pending: AtomicUsize::new(0),
                    })
                })
                .clone();
            entry.pending.fetch_add(1, Ordering::Relaxed);
            entry
        };
        let pending = PendingGuard {
            locks: self,
            key: key.to_string(),
            entry,
        };

        let guard = tokio::time::timeout(self.acquire_timeout, pending.entry.mutex.lock())
            .await
            .map_err(|_| {
                tracing::warn!(key, timeout_ms = self.acquire_timeout.as_millis() as u64, "session lock wait exceeded");
                RapportError::LockTimeout(key.to_string())
            })?;

        let result = op().await;
        drop(guard);
        result
    }

    /// Keys with at least one queued or running operation.
    pub fn active_keys(&self) -> usize {
        self.entries.lock().len()
    }
}
