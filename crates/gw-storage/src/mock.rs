//! Mock storage implementation for testing.
//!
//! Provides [`MockStorage`] for unit testing without filesystem access.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use crate::storage::{Entry, Storage, StorageError, StorageErrorKind};

const BACKEND: &str = "Mock";

/// Mock storage for testing.
///
/// Stores files in memory. Use the builder methods to configure the mock with
/// test data and to inject failures.
///
/// # Example
///
/// ```ignore
/// use gw_storage::{MockStorage, Storage};
///
/// let storage = MockStorage::new()
///     .with_file("A.md", "# A")
///     .with_read_failure("broken.md");
///
/// assert!(storage.exists("A.md"));
/// ```
#[derive(Debug, Default)]
pub struct MockStorage {
    files: RwLock<BTreeMap<String, Bytes>>,
    dirs: RwLock<Vec<String>>,
    read_failures: RwLock<Vec<String>>,
    write_failures: RwLock<Vec<String>>,
    list_failure: RwLock<bool>,
    writes: RwLock<Vec<String>>,
}

impl MockStorage {
    /// Create a new empty mock storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_file(self, name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        self.files
            .write()
            .unwrap()
            .insert(name.into(), content.into());
        self
    }

    /// Add a directory entry (listed, never readable).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_dir(self, name: impl Into<String>) -> Self {
        self.dirs.write().unwrap().push(name.into());
        self
    }

    /// Make reads of `name` fail with a permission error.
    ///
    /// The file still reports as existing.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_read_failure(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.files
            .write()
            .unwrap()
            .entry(name.clone())
            .or_default();
        self.read_failures.write().unwrap().push(name);
        self
    }

    /// Make writes of `name` fail.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_write_failure(self, name: impl Into<String>) -> Self {
        self.write_failures.write().unwrap().push(name.into());
        self
    }

    /// Make directory listing fail.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_list_failure(self) -> Self {
        *self.list_failure.write().unwrap() = true;
        self
    }

    /// Insert or replace a file after construction.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set_file(&self, name: impl Into<String>, content: impl Into<Bytes>) {
        self.files
            .write()
            .unwrap()
            .insert(name.into(), content.into());
    }

    /// Remove a file after construction.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn remove_file(&self, name: &str) {
        self.files.write().unwrap().remove(name);
    }

    /// Current content of a file, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<Bytes> {
        self.files.read().unwrap().get(name).cloned()
    }

    /// Names passed to successful `write` calls, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn writes(&self) -> Vec<String> {
        self.writes.read().unwrap().clone()
    }

    fn read_inner(&self, name: &str) -> Result<Bytes, StorageError> {
        if self.read_failures.read().unwrap().iter().any(|n| n == name) {
            return Err(StorageError::new(StorageErrorKind::PermissionDenied)
                .with_path(name)
                .with_backend(BACKEND));
        }
        self.files
            .read()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::not_found(name).with_backend(BACKEND))
    }
}

#[async_trait]
impl Storage for MockStorage {
    fn absolute_path(&self, name: &str) -> PathBuf {
        PathBuf::from("/mock").join(name)
    }

    fn exists(&self, name: &str) -> bool {
        self.files.read().unwrap().contains_key(name)
    }

    fn read(&self, name: &str) -> Result<Bytes, StorageError> {
        self.read_inner(name)
    }

    async fn read_async(&self, name: &str) -> Result<Bytes, StorageError> {
        self.read_inner(name)
    }

    async fn list(&self) -> Result<Vec<Entry>, StorageError> {
        if *self.list_failure.read().unwrap() {
            return Err(StorageError::new(StorageErrorKind::Unavailable).with_backend(BACKEND));
        }
        let mut entries: Vec<Entry> = self
            .files
            .read()
            .unwrap()
            .keys()
            .map(|name| Entry::file(name.as_str()))
            .collect();
        entries.extend(self.dirs.read().unwrap().iter().map(|d| Entry::dir(d.as_str())));
        Ok(entries)
    }

    async fn write(&self, name: &str, content: &[u8]) -> Result<(), StorageError> {
        if self.write_failures.read().unwrap().iter().any(|n| n == name) {
            return Err(StorageError::new(StorageErrorKind::PermissionDenied)
                .with_path(name)
                .with_backend(BACKEND));
        }
        self.set_file(name, Bytes::copy_from_slice(content));
        self.writes.write().unwrap().push(name.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_file_is_readable() {
        let storage = MockStorage::new().with_file("a.md", "# A");

        assert!(storage.exists("a.md"));
        assert_eq!(storage.read("a.md").unwrap(), "# A");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let storage = MockStorage::new();
        assert!(storage.read("a.md").unwrap_err().is_not_found());
    }

    #[test]
    fn test_read_failure_exists_but_fails() {
        let storage = MockStorage::new().with_read_failure("b.md");

        assert!(storage.exists("b.md"));
        let err = storage.read("b.md").unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::PermissionDenied);
    }

    #[tokio::test]
    async fn test_list_and_write() {
        let storage = MockStorage::new()
            .with_file("a.md", "")
            .with_dir("assets");

        storage.write("index.md", b"# Index").await.unwrap();

        let entries = storage.list().await.unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries.contains(&Entry::dir("assets")));
        assert_eq!(storage.writes(), vec!["index.md".to_owned()]);
        assert_eq!(storage.file("index.md").unwrap(), "# Index");
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let storage = MockStorage::new()
            .with_list_failure()
            .with_write_failure("index.md");

        assert!(storage.list().await.is_err());
        assert!(storage.write("index.md", b"").await.is_err());
        assert!(storage.writes().is_empty());
    }
}
