//! Engine composition: sanitize → lock → load → transform → save.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::RapportError;
use crate::lock::SessionLocks;
use crate::merge::merge;
use crate::policy::{self, LayerCounts};
use crate::record::{now_ms, FollowupSignal, MemoryFragment, Record, Role, Turn};
use crate::session::sanitize_session_key;
use crate::store::RecordStore;

const MAX_TURN_LEN: usize = 8192;

fn join_err(e: tokio::task::JoinError) -> RapportError {
    RapportError::Internal(e.to_string())
}

/// Per-session memory engine. Owns the record store and the lock registry;
/// independent instances share nothing.
pub struct MemoryEngine {
    store: RecordStore,
    locks: SessionLocks,
}

impl MemoryEngine {
    pub fn open(root: impl Into<PathBuf>, acquire_timeout: Duration) -> Result<Self, RapportError> {
        Ok(Self {
            store: RecordStore::open(root)?,
            locks: SessionLocks::new(acquire_timeout),
        })
    }

    /// Read-through fetch: first access creates the default record.
    ///
    /// Takes the same per-key lock as mutations, so the result is always a
    /// committed state, never a mid-update snapshot.
    pub async fn get(&self, session_id: &str) -> Result<Record, RapportError> {
        let key = sanitize_session_key(session_id);
        let store = self.store.clone();
        let load_key = key.clone();
        self.locks
            .with_lock(&key, move || async move {
                tokio::task::spawn_blocking(move || store.load(&load_key))
                    .await
                    .map_err(join_err)?
            })
            .await
    }

    /// Read-modify-write under the per-key lock. `transform` receives the
    /// current record and returns the record to persist; `updated_at` is
    /// refreshed on commit. A failing transform persists nothing — the
    /// previous version stays intact.
    ///
    /// Store I/O runs on the blocking pool (synchronous file calls in async
    /// context must not starve tokio workers); the logical session lock is
    /// held across all of it.
    pub async fn update<F>(&self, session_id: &str, transform: F) -> Result<Record, RapportError>
    where
        F: FnOnce(Record) -> Result<Record, RapportError> + Send + 'static,
    {
        let key = sanitize_session_key(session_id);
        let store = self.store.clone();
        let inner_key = key.clone();
        self.locks
            .with_lock(&key, move || async move {
                let load_store = store.clone();
                let load_key = inner_key.clone();
                let current = tokio::task::spawn_blocking(move || load_store.load(&load_key))
                    .await
                    .map_err(join_err)??;

                let mut next = transform(current)?;
                next.updated_at = now_ms();

                let committed = next.clone();
                tokio::task::spawn_blocking(move || store.save(&inner_key, &next))
                    .await
                    .map_err(join_err)??;
                Ok(committed)
            })
            .await
    }

    /// Append one transcript turn verbatim. The caller's timestamp wins when
    /// supplied.
    pub async fn append_turn(
        &self,
        session_id: &str,
        role: Role,
        content: String,
        timestamp: Option<i64>,
    ) -> Result<Record, RapportError> {
        if content.trim().is_empty() {
            return Err(RapportError::Validation("turn content must not be empty".into()));
        }
        if content.chars().count() > MAX_TURN_LEN {
            return Err(RapportError::Validation(format!(
                "turn content exceeds {MAX_TURN_LEN} characters"
            )));
        }
        let turn = Turn {
            role,
            content,
            created_at: timestamp.unwrap_or_else(now_ms),
        };
        self.update(session_id, move |mut record| {
            record.transcript.push(turn);
            Ok(record)
        })
        .await
    }

    /// Merge an extracted fragment and optionally attach a follow-up signal.
    ///
    /// The signal is validated against the merged record; a roots-targeting
    /// decision without enough shallow material fails the whole call and
    /// persists nothing (callers can resubmit without the signal).
    pub async fn ingest(
        &self,
        session_id: &str,
        fragment: MemoryFragment,
        followup: Option<FollowupSignal>,
    ) -> Result<Record, RapportError> {
        self.update(session_id, move |record| {
            let mut next = merge(&record, &fragment, now_ms());
            if let Some(signal) = followup {
                policy::validate_followup(&next, &signal)?;
                next.last_followup = Some(signal);
            }
            Ok(next)
        })
        .await
    }

    /// Read-side input for the external follow-up policy.
    pub async fn layer_counts(&self, session_id: &str) -> Result<LayerCounts, RapportError> {
        Ok(policy::layer_counts(&self.get(session_id).await?))
    }

    pub fn session_count(&self) -> usize {
        self.store.session_count()
    }

    pub fn active_locks(&self) -> usize {
        self.locks.active_keys()
    }
}
