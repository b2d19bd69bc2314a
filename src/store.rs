//! JSON-file-per-session record store.
//!
//! One durable document per sanitized session key, whole-record overwrite.
//! Saves go through a unique temp file plus rename, so a failed write never
//! clobbers the previous version.

use std::fs;
use std::path::PathBuf;

use crate::error::RapportError;
use crate::record::{now_ms, Record};

#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    /// Open a store rooted at `root`, creating the directory if absent.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, RapportError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    // Keys are sanitized by the engine before they reach the store, so the
    // join cannot leave the root.
    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Load the record for `key`. First access creates and persists a
    /// default empty record. Undecodable persisted data is an error, not a
    /// reset.
    pub fn load(&self, key: &str) -> Result<Record, RapportError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| RapportError::corrupt(key, e))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(key, "materializing default record");
                let record = Record::new(key, now_ms());
                self.save(key, &record)?;
                Ok(record)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist `record` for `key`, fully superseding the prior version.
    pub fn save(&self, key: &str, record: &Record) -> Result<(), RapportError> {
        let bytes = serde_json::to_vec_pretty(record)
            .map_err(|e| RapportError::Internal(format!("encode record: {e}")))?;
        // Unique temp name: concurrent savers for different keys (or a
        // racing first-access create) never collide.
        let tmp = self
            .root
            .join(format!(".{key}.{}.tmp", uuid::Uuid::new_v4().simple()));
        fs::write(&tmp, &bytes)?;
        if let Err(e) = fs::rename(&tmp, self.path_for(key)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    /// Number of persisted sessions.
    pub fn session_count(&self) -> usize {
        fs::read_dir(&self.root)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| {
                        e.path().extension().is_some_and(|ext| ext == "json")
                            && !e.file_name().to_string_lossy().starts_with('.')
                    })
                    .count()
            })
            .unwrap_or(0)
    }
}
