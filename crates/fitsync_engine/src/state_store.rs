//! Durable key-value storage for sync state.

use crate::error::{SyncError, SyncResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Durable key-value storage used to persist the sync ledger.
///
/// One namespaced key, one opaque value. Implementations must make
/// `save` atomic enough that a crash mid-write leaves either the old
/// or the new value, never a torn one.
pub trait StateStore: Send + Sync {
    /// Loads the value stored under `key`, if any.
    fn load(&self, key: &str) -> SyncResult<Option<Vec<u8>>>;

    /// Durably stores `value` under `key`, replacing any previous
    /// value.
    fn save(&self, key: &str, value: &[u8]) -> SyncResult<()>;
}

/// An in-memory state store for tests.
#[derive(Default)]
pub struct MemoryStateStore {
    values: RwLock<HashMap<String, Vec<u8>>>,
    fail_saves: RwLock<bool>,
}

impl MemoryStateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent save fail, or restores normal saves.
    pub fn set_fail_saves(&self, fail: bool) {
        *self.fail_saves.write() = fail;
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self, key: &str) -> SyncResult<Option<Vec<u8>>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn save(&self, key: &str, value: &[u8]) -> SyncResult<()> {
        if *self.fail_saves.read() {
            return Err(SyncError::Persistence("simulated save failure".into()));
        }
        self.values.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// A file-backed state store.
///
/// Each key maps to one file in the store directory. Writes go to a
/// temporary file first and are renamed into place, so a crash between
/// the write and the rename leaves the previous value intact.
pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    /// Creates a store rooted at `dir`, creating the directory if
    /// needed.
    pub fn open(dir: impl Into<PathBuf>) -> SyncResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| SyncError::Persistence(format!("create {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are dot-namespaced, never path-like.
        self.dir.join(key)
    }
}

impl StateStore for FileStateStore {
    fn load(&self, key: &str) -> SyncResult<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SyncError::Persistence(format!(
                "read {}: {e}",
                path.display()
            ))),
        }
    }

    fn save(&self, key: &str, value: &[u8]) -> SyncResult<()> {
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.tmp"));

        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value)?;
            file.sync_all()?;
            fs::rename(&tmp, &path)
        };

        write().map_err(|e| SyncError::Persistence(format!("write {}: {e}", path.display())))
    }
}
