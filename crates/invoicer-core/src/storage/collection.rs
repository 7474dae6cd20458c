//! One JSON array document on disk, guarded by a reader/writer lock.

use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{InvoicerError, Result};

/// A collection persisted as a pretty-printed JSON array.
///
/// Readers share the lock. A mutation holds the write lock across the whole
/// load, change and store sequence, so concurrent writers never lose each
/// other's updates.
pub(crate) struct Collection<T> {
    name: &'static str,
    path: PathBuf,
    lock: RwLock<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> Collection<T> {
    /// Open `dir/file_name`, creating it as `[]` if it does not exist.
    pub(crate) fn open(dir: &Path, file_name: &str, name: &'static str) -> Result<Self> {
        let collection = Self {
            name,
            path: dir.join(file_name),
            lock: RwLock::new(()),
            _marker: PhantomData,
        };
        if !collection.path.exists() {
            collection.store(&[])?;
            debug!(collection = name, path = %collection.path.display(), "created empty collection");
        }
        Ok(collection)
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the whole collection.
    pub(crate) fn read(&self) -> Result<Vec<T>> {
        let _guard = self.read_guard()?;
        self.load()
    }

    /// Apply `change` to a fresh snapshot and write it back.
    ///
    /// Nothing is written if `change` returns an error.
    pub(crate) fn mutate<R>(&self, change: impl FnOnce(&mut Vec<T>) -> Result<R>) -> Result<R> {
        let _guard = self.write_guard()?;
        let mut items = self.load()?;
        let outcome = change(&mut items)?;
        self.store(&items)?;
        Ok(outcome)
    }

    /// Overwrite the whole collection.
    pub(crate) fn replace(&self, items: &[T]) -> Result<()> {
        let _guard = self.write_guard()?;
        self.store(items)
    }

    pub(crate) fn write_guard(&self) -> Result<RwLockWriteGuard<'_, ()>> {
        self.lock.write().map_err(|_| {
            InvoicerError::Storage(format!("{} lock poisoned", self.name))
        })
    }

    fn read_guard(&self) -> Result<RwLockReadGuard<'_, ()>> {
        self.lock.read().map_err(|_| {
            InvoicerError::Storage(format!("{} lock poisoned", self.name))
        })
    }

    fn load(&self) -> Result<Vec<T>> {
        let bytes = fs::read(&self.path).map_err(|e| {
            InvoicerError::Storage(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        let items: Vec<T> = serde_json::from_slice(&bytes).map_err(|e| {
            InvoicerError::Serialization(format!(
                "Failed to parse {}: {}",
                self.path.display(),
                e
            ))
        })?;
        debug!(collection = self.name, count = items.len(), "loaded collection");
        Ok(items)
    }

    /// Serialize fully before touching the file, then swap it in atomically.
    pub(crate) fn store(&self, items: &[T]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(items).map_err(|e| {
            InvoicerError::Serialization(format!(
                "Failed to encode {}: {}",
                self.path.display(),
                e
            ))
        })?;
        crate::fs::write_atomic(&self.path, &bytes)?;
        debug!(collection = self.name, count = items.len(), "stored collection");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_empty_array() {
        let dir = tempdir().unwrap();
        let collection: Collection<String> = Collection::open(dir.path(), "names.json", "names").unwrap();

        assert_eq!(fs::read_to_string(collection.path()).unwrap(), "[]");
        assert!(collection.read().unwrap().is_empty());
    }

    #[test]
    fn test_open_keeps_existing_document() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("names.json"), r#"["a","b"]"#).unwrap();

        let collection: Collection<String> = Collection::open(dir.path(), "names.json", "names").unwrap();
        assert_eq!(collection.read().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_failed_mutation_writes_nothing() {
        let dir = tempdir().unwrap();
        let collection: Collection<String> = Collection::open(dir.path(), "names.json", "names").unwrap();
        collection
            .mutate(|items| {
                items.push("kept".to_string());
                Ok(())
            })
            .unwrap();

        let result: Result<()> = collection.mutate(|items| {
            items.clear();
            Err(InvoicerError::NotFound("x".to_string()))
        });

        assert!(result.unwrap_err().is_not_found());
        assert_eq!(collection.read().unwrap(), vec!["kept"]);
    }

    #[test]
    fn test_malformed_document_is_a_serialization_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("names.json"), "{not json").unwrap();

        let collection: Collection<String> = Collection::open(dir.path(), "names.json", "names").unwrap();
        let err = collection.read().unwrap_err();
        assert!(matches!(err, InvoicerError::Serialization(ref msg) if msg.contains("names.json")));
    }

    #[test]
    fn test_document_is_pretty_printed() {
        let dir = tempdir().unwrap();
        let collection: Collection<String> = Collection::open(dir.path(), "names.json", "names").unwrap();
        collection.replace(&["x".to_string()]).unwrap();

        assert_eq!(fs::read_to_string(collection.path()).unwrap(), "[\n  \"x\"\n]");
    }
}
