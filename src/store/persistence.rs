//! Key-Value Persistence
//!
//! The account store writes its three co-dependent keys through
//! `write_batch`, which implementations must apply all-or-nothing.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{PlutusError, PlutusResult};

/// One pending write; `None` removes the key
pub type BatchWrite = (String, Option<String>);

/// String key-value storage (browser storage, a file, a keychain...)
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> PlutusResult<Option<String>>;

    /// Apply every write or none of them
    fn write_batch(&self, writes: Vec<BatchWrite>) -> PlutusResult<()>;
}

// =============================================================================
// In-memory store
// =============================================================================

/// Process-local store, used by tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw write of a single key, bypassing batching
    pub fn set(&self, key: &str, value: &str) -> PlutusResult<()> {
        self.write_batch(vec![(key.to_string(), Some(value.to_string()))])
    }

    /// Copy of every entry
    pub fn snapshot(&self) -> PlutusResult<HashMap<String, String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| PlutusError::internal("Memory store lock poisoned"))?;
        Ok(entries.clone())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> PlutusResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| PlutusError::internal("Memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn write_batch(&self, writes: Vec<BatchWrite>) -> PlutusResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| PlutusError::internal("Memory store lock poisoned"))?;

        for (key, value) in writes {
            match value {
                Some(value) => {
                    entries.insert(key, value);
                }
                None => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// File store
// =============================================================================

/// JSON object on disk, replaced atomically on every batch
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> PlutusResult<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                PlutusError::persistence(format!(
                    "Corrupt store file {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(PlutusError::persistence(format!("read failed: {}", e))),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> PlutusResult<()> {
        let bytes = serde_json::to_vec_pretty(map)?;
        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut file = std::fs::File::create(&tmp_path)
                .map_err(|e| PlutusError::persistence(format!("create failed: {}", e)))?;
            file.write_all(&bytes)
                .map_err(|e| PlutusError::persistence(format!("write failed: {}", e)))?;
            file.sync_all()
                .map_err(|e| PlutusError::persistence(format!("fsync failed: {}", e)))?;
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| PlutusError::persistence(format!("chmod failed: {}", e)))?;
        }
        std::fs::rename(&tmp_path, &self.path)
            .map_err(|e| PlutusError::persistence(format!("rename failed: {}", e)))?;
        if let Some(parent) = self.path.parent() {
            if let Ok(dir) = std::fs::File::open(parent) {
                let _ = dir.sync_all();
            }
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> PlutusResult<Option<String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| PlutusError::internal("File store lock poisoned"))?;
        Ok(self.read_map()?.remove(key))
    }

    fn write_batch(&self, writes: Vec<BatchWrite>) -> PlutusResult<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| PlutusError::internal("File store lock poisoned"))?;

        let mut map = self.read_map()?;
        for (key, value) in writes {
            match value {
                Some(value) => {
                    map.insert(key, value);
                }
                None => {
                    map.remove(&key);
                }
            }
        }
        self.write_map(&map)
    }
}
