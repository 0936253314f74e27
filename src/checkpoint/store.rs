//! Durable checkpoint store backing resumable runs.
//!
//! Epistemic foundation:
//! - K_i: One store document per working directory, whole-map reads/writes
//! - K_i: Entries are created on step success and never mutated afterwards
//! - B_i: Store file may not exist → empty map
//! - B_i: Store file may be unreadable → CorruptStore, no silent repair

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::models::{PodbriefError, Result};

/// File name of the store document inside a working directory.
pub const STORE_FILE: &str = "checkpoints.json";

/// Record of one completed guarded step.
///
/// The recorded inputs are a human-readable audit trail only. They are never
/// consulted for equality or lookup; identity lives entirely in the entry's
/// key (`<label>-<counter>`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointEntry {
    /// Stringified inputs of the call that produced this entry
    pub args: Vec<String>,
    /// When the step completed
    pub recorded_at: DateTime<Utc>,
}

impl CheckpointEntry {
    pub fn new(args: Vec<String>) -> Self {
        Self {
            args,
            recorded_at: Utc::now(),
        }
    }
}

/// Mapping of step names to completed entries.
pub type CheckpointMap = BTreeMap<String, CheckpointEntry>;

/// Checkpoint store bound to one working directory.
///
/// Single-writer, single-threaded use is assumed: the whole map is read
/// before each guard decision and the whole map is rewritten after each
/// successful step. No locking.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
    path: PathBuf,
}

impl CheckpointStore {
    /// Bind a store to a working directory, creating the directory if absent.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| PodbriefError::io("creating working directory", e))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            path: dir.join(STORE_FILE),
        })
    }

    /// Whether the store document exists on disk.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the full map. A missing file is an empty store; a present but
    /// unparseable file is a corrupt store and requires manual intervention.
    pub fn load(&self) -> Result<CheckpointMap> {
        if !self.path.exists() {
            return Ok(CheckpointMap::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| PodbriefError::io("reading checkpoint store", e))?;

        serde_json::from_str(&content).map_err(|e| PodbriefError::CorruptStore {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Overwrite the store document with the full map (temp write + rename).
    pub fn save(&self, entries: &CheckpointMap) -> Result<()> {
        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| PodbriefError::Internal(format!("Serializing checkpoint store: {e}")))?;

        let temp_path = self.dir.join("checkpoints.tmp.json");
        fs::write(&temp_path, content)
            .map_err(|e| PodbriefError::io("writing temp checkpoint store", e))?;
        fs::rename(&temp_path, &self.path)
            .map_err(|e| PodbriefError::io("renaming checkpoint store", e))?;

        debug!(entries = entries.len(), "Checkpoint store saved");
        Ok(())
    }

    /// Working directory this store lives in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the store document.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = CheckpointStore::open(temp_dir.path()).unwrap();
        assert!(!store.exists());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = CheckpointStore::open(temp_dir.path()).unwrap();

        let mut entries = CheckpointMap::new();
        entries.insert(
            "fetch_source-1".to_string(),
            CheckpointEntry::new(vec!["abc123".to_string()]),
        );
        store.save(&entries).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["fetch_source-1"].args, vec!["abc123".to_string()]);
    }

    #[test]
    fn test_corrupt_file_is_an_error_not_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = CheckpointStore::open(temp_dir.path()).unwrap();
        fs::write(store.path(), "{not valid json").unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, PodbriefError::CorruptStore { .. }));
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = CheckpointStore::open(temp_dir.path()).unwrap();
        store.save(&CheckpointMap::new()).unwrap();
        assert!(!temp_dir.path().join("checkpoints.tmp.json").exists());
    }

    #[test]
    fn test_open_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("nested").join("workdir");
        let store = CheckpointStore::open(&dir).unwrap();
        assert!(dir.is_dir());
        assert!(store.load().unwrap().is_empty());
    }
}
