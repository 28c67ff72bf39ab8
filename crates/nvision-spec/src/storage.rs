//! Artifact storage.
//!
//! Backends and the orchestrator write artifacts (result documents, rendered
//! images) through the [`ArtifactStore`] trait instead of touching a shared
//! temp directory, so everything above the process boundary can be tested
//! in memory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::error::CodedError;

/// Errors from artifact storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The key is empty or could escape the store.
    #[error("Invalid artifact key: '{0}'")]
    InvalidKey(String),

    /// IO error reading or writing an artifact.
    #[error("Artifact IO error for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

impl CodedError for StorageError {
    fn code(&self) -> &'static str {
        match self {
            StorageError::InvalidKey(_) => "STORAGE_001",
            StorageError::Io { .. } => "STORAGE_002",
        }
    }

    fn category(&self) -> &'static str {
        "storage"
    }
}

/// Key-addressed artifact storage.
pub trait ArtifactStore: Send + Sync {
    /// Writes `bytes` under `key`, replacing any previous value.
    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Reads the artifact stored under `key`.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Returns true if an artifact exists under `key`.
    fn contains(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.read(key)?.is_some())
    }
}

impl<S: ArtifactStore + ?Sized> ArtifactStore for Arc<S> {
    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        (**self).write(key, bytes)
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).read(key)
    }
}

/// Rejects keys that are empty or contain path syntax.
pub fn check_key(key: &str) -> Result<(), StorageError> {
    let bad = key.is_empty()
        || key.starts_with('.')
        || key.contains("..")
        || key.contains('/')
        || key.contains('\\');
    if bad {
        Err(StorageError::InvalidKey(key.to_string()))
    } else {
        Ok(())
    }
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.keys().cloned().collect()
    }

    /// Returns the number of stored artifacts.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactStore for MemoryStore {
    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        check_key(key)?;
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        check_key(key)?;
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }
}

/// Store backed by a flat directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Creates a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the file path used for `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        check_key(key)?;
        Ok(self.root.join(key))
    }
}

impl ArtifactStore for DirStore {
    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };
        std::fs::create_dir_all(&self.root).map_err(io_err)?;
        std::fs::write(&path, bytes).map_err(io_err)
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_key() {
        assert!(check_key("abc123.json").is_ok());
        assert!(check_key("").is_err());
        assert!(check_key("../etc/passwd").is_err());
        assert!(check_key("a/b").is_err());
        assert!(check_key(".hidden").is_err());
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        store.write("k.json", b"{}").unwrap();
        assert_eq!(store.read("k.json").unwrap(), Some(b"{}".to_vec()));
        assert_eq!(store.read("missing").unwrap(), None);
        assert!(store.contains("k.json").unwrap());
        assert_eq!(store.keys(), vec!["k.json".to_string()]);
    }

    #[test]
    fn test_dir_store_creates_root_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("results");
        let store = DirStore::new(&root);
        assert_eq!(store.read("x.png").unwrap(), None);
        assert!(!root.exists());

        store.write("x.png", &[1, 2, 3]).unwrap();
        assert!(root.join("x.png").exists());
        assert_eq!(store.read("x.png").unwrap(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_dir_store_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());
        assert!(matches!(
            store.write("../escape", b""),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
