//! Key-value persistence.
//!
//! The engine only needs string get/set by key. Values are JSON, versioned
//! by key name alone; a missing or unreadable value is treated as "nothing
//! stored" rather than an error.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::game::ranking::{Ranking, RankingEntry};

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying storage could not be written.
    #[error("storage unavailable: {0}")]
    Io(#[from] io::Error),
    /// Value could not be encoded.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Synchronous string key-value store.
pub trait KeyValueStore {
    /// Read the value under `key`, `None` when absent or unreadable.
    fn get(&self, key: &str) -> Option<String>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// Store that lives for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

/// Store backed by one JSON object on disk mapping keys to string values.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Use the file at `path`. It is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "store unreadable, starting empty");
                return BTreeMap::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "store corrupted, starting empty");
            BTreeMap::new()
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_all().remove(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.read_all();
        values.insert(key.to_string(), value.to_string());
        let encoded = serde_json::to_string_pretty(&values)?;

        // Write beside the target then rename so a crash never leaves half a file
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, encoded)?;
        fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), key, "store written");
        Ok(())
    }
}

// =============================================================================
// RANKING PERSISTENCE
// =============================================================================

/// Read the ranking under `key`.
///
/// Absent or malformed data reads as an empty ranking.
pub fn load_ranking<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Ranking {
    let Some(raw) = store.get(key) else {
        return Ranking::new();
    };

    match serde_json::from_str::<Vec<RankingEntry>>(&raw) {
        Ok(entries) => Ranking::from_entries(entries),
        Err(e) => {
            warn!(key, error = %e, "ignoring malformed ranking");
            Ranking::new()
        }
    }
}

/// Replace the ranking under `key`.
pub fn save_ranking<S: KeyValueStore + ?Sized>(
    store: &mut S,
    key: &str,
    ranking: &Ranking,
) -> Result<(), StoreError> {
    let encoded = serde_json::to_string(ranking)?;
    store.set(key, &encoded)
}
