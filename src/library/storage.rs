//! Key-value persistence for library snapshots.
//!
//! Each key holds one complete serialized value; a write replaces it whole.
//! [`Storage::revision`] lets a reader notice that another process rewrote a
//! key since it last looked.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use crate::error::{Error, Result};

/// A process-local key-value store holding whole snapshots.
pub trait Storage {
    /// Read the value stored under `key`, or `None` if nothing is stored.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    fn put(&mut self, key: &str, value: &str) -> Result<()>;

    /// Opaque change marker for `key`; differs after any write, including
    /// writes by other processes. `None` if the key has never been written.
    fn revision(&self, key: &str) -> Option<u64>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs_err::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(e, path)),
        }
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        fs_err::create_dir_all(&self.dir).map_err(|e| Error::io(e, self.dir.clone()))?;

        // Write beside the target and rename over it so readers never see half a snapshot.
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        fs_err::write(&tmp, value).map_err(|e| Error::io(e, tmp.clone()))?;
        fs_err::rename(&tmp, &path).map_err(|e| Error::io(e, path.clone()))?;
        Ok(())
    }

    fn revision(&self, key: &str) -> Option<u64> {
        let meta = std::fs::metadata(self.path_for(key)).ok()?;
        let modified = meta.modified().ok()?.duration_since(UNIX_EPOCH).ok()?;
        let nanos = u64::try_from(modified.as_nanos()).ok()?;
        // Fold in the length so two writes within one mtime tick still differ
        // whenever their sizes do.
        Some(nanos ^ meta.len().rotate_left(48))
    }
}

/// In-memory storage for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
    writes: HashMap<String, u64>,
    fail_writes: bool,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value without going through a store.
    pub fn with_value(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_string(), value.into());
        *self.writes.entry(key.to_string()).or_insert(0) += 1;
        self
    }

    /// Make subsequent writes fail, to exercise unsaved-change handling.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Raw stored value for `key`.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes {
            return Err(Error::Storage(format!("write to {key} refused")));
        }
        self.values.insert(key.to_string(), value.to_string());
        *self.writes.entry(key.to_string()).or_insert(0) += 1;
        Ok(())
    }

    fn revision(&self, key: &str) -> Option<u64> {
        self.writes.get(key).copied()
    }
}
