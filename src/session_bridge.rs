//! Session bridge: carries the last prediction from the form page to
//! the results page.
//!
//! Exactly one result is held under the reserved key `diagnosisResult`.
//! Storing overwrites; retrieving never consumes. Two backends:
//! - `MemoryResultStore`: lives as long as the process
//! - `FileResultStore`: `<data_dir>/diagnosisResult.json`, survives restarts

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::config::{AppConfig, StoreKind};
use crate::models::StoredResult;

/// Reserved storage key.
pub const RESULT_KEY: &str = "diagnosisResult";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Result storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Result serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Internal lock error")]
    LockPoisoned,
}

pub trait ResultStore: Send + Sync {
    /// Replace whatever is stored with `result`.
    fn store(&self, result: &StoredResult) -> Result<(), StoreError>;

    /// The stored result, if any. Does not remove it.
    fn retrieve(&self) -> Result<Option<StoredResult>, StoreError>;

    fn clear(&self) -> Result<(), StoreError>;
}

/// Build the store selected by configuration.
pub fn open_store(config: &AppConfig) -> Result<Box<dyn ResultStore>, StoreError> {
    match config.store {
        StoreKind::Memory => Ok(Box::new(MemoryResultStore::new())),
        StoreKind::File => Ok(Box::new(FileResultStore::open(&config.data_dir)?)),
    }
}

// ═══════════════════════════════════════════════════════════
// MemoryResultStore
// ═══════════════════════════════════════════════════════════

#[derive(Default)]
pub struct MemoryResultStore {
    slot: RwLock<Option<StoredResult>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultStore for MemoryResultStore {
    fn store(&self, result: &StoredResult) -> Result<(), StoreError> {
        let mut slot = self.slot.write().map_err(|_| StoreError::LockPoisoned)?;
        *slot = Some(result.clone());
        Ok(())
    }

    fn retrieve(&self) -> Result<Option<StoredResult>, StoreError> {
        let slot = self.slot.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(slot.clone())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut slot = self.slot.write().map_err(|_| StoreError::LockPoisoned)?;
        *slot = None;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// FileResultStore
// ═══════════════════════════════════════════════════════════

/// JSON file store. Writes go through a temp file and a rename so a
/// reader never sees a half-written result.
pub struct FileResultStore {
    path: PathBuf,
    // Serializes writers within this process
    write_lock: RwLock<()>,
}

impl FileResultStore {
    /// Open (and create if needed) the store directory.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(format!("{RESULT_KEY}.json")),
            write_lock: RwLock::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl ResultStore for FileResultStore {
    fn store(&self, result: &StoredResult) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(result)?;
        let _guard = self.write_lock.write().map_err(|_| StoreError::LockPoisoned)?;
        let temp = self.temp_path();
        std::fs::write(&temp, bytes)?;
        std::fs::rename(&temp, &self.path)?;
        tracing::debug!(path = %self.path.display(), "Stored prediction result");
        Ok(())
    }

    fn retrieve(&self) -> Result<Option<StoredResult>, StoreError> {
        let _guard = self.write_lock.read().map_err(|_| StoreError::LockPoisoned)?;
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&bytes) {
            Ok(result) => Ok(Some(result)),
            Err(e) => {
                // Unreadable content is treated as no result at all
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Stored result is corrupt, ignoring"
                );
                Ok(None)
            }
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.write().map_err(|_| StoreError::LockPoisoned)?;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
