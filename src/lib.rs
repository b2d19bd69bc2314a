//! rapport — per-session profile memory engine for conversational agents.
//!
//! One durable record per session, built incrementally from fragments an
//! external extraction step pulls out of each utterance. Updates for the
//! same session are serialized by a per-key lock; the merge is idempotent
//! and deduplicating, so re-reported facts never produce duplicates.

pub mod api;
pub mod engine;
pub mod error;
pub mod lock;
pub mod merge;
pub mod policy;
pub mod record;
pub mod session;
pub mod store;

use std::sync::Arc;

pub use engine::MemoryEngine;
pub use error::RapportError;

pub type SharedEngine = Arc<MemoryEngine>;

#[derive(Clone)]
pub struct AppState {
    pub engine: SharedEngine,
    pub api_key: Option<String>,
    pub started_at: std::time::Instant,
}
