//! Key-value persistence backends

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::CareError;

/// Persistence injected into the app state
pub trait KeyValueStore {
    /// Value stored under `key`, if any
    fn load(&self, key: &str) -> Result<Option<String>, CareError>;

    /// Store `value` under `key`, replacing any previous value
    fn save(&mut self, key: &str, value: &str) -> Result<(), CareError>;

    /// Remove `key`; removing an absent key is not an error
    fn remove(&mut self, key: &str) -> Result<(), CareError>;
}

/// Process-local store, used by tests and hosts that persist elsewhere
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, CareError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), CareError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CareError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key under a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CareError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `key`. Anything outside `[A-Za-z0-9_-]` maps to `_`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, CareError> {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        if name.trim_matches('_').is_empty() {
            return Err(CareError::StorageError(format!("unusable storage key: {key:?}")));
        }
        Ok(self.root.join(format!("{name}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, CareError> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), CareError> {
        let path = self.path_for(key)?;
        // write-then-rename
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        log::debug!("saved {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CareError> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("touchcare-store-{}", Uuid::new_v4()))
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.load("k").unwrap(), None);

        store.save("k", "v1").unwrap();
        store.save("k", "v2").unwrap();
        assert_eq!(store.load("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(store.len(), 1);

        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_file_store_round_trip() {
        let root = temp_root();
        let mut store = FileStore::open(&root).unwrap();

        assert_eq!(store.load("@touchcare_devices").unwrap(), None);
        store.save("@touchcare_devices", "[]").unwrap();
        assert_eq!(store.load("@touchcare_devices").unwrap().as_deref(), Some("[]"));
        assert!(root.join("_touchcare_devices.json").exists());

        let reopened = FileStore::open(&root).unwrap();
        assert_eq!(reopened.load("@touchcare_devices").unwrap().as_deref(), Some("[]"));

        store.remove("@touchcare_devices").unwrap();
        store.remove("@touchcare_devices").unwrap();
        assert_eq!(store.load("@touchcare_devices").unwrap(), None);

        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_file_store_rejects_empty_key() {
        let root = temp_root();
        let store = FileStore::open(&root).unwrap();
        assert!(matches!(store.path_for("@/."), Err(CareError::StorageError(_))));
        fs::remove_dir_all(root).unwrap();
    }
}
