//! Filesystem storage implementation.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use crate::storage::{Entry, Storage, StorageError, StorageErrorKind};

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// Filesystem storage rooted at the repository working tree.
///
/// # Example
///
/// ```ignore
/// use std::path::PathBuf;
/// use gw_storage::{FsStorage, Storage};
///
/// let storage = FsStorage::new(PathBuf::from("wiki"));
/// let sidebar = storage.read("_sidebar.md")?;
/// ```
#[derive(Clone, Debug)]
pub struct FsStorage {
    /// Root directory of the wiki repository.
    root: PathBuf,
}

impl FsStorage {
    /// Create a new filesystem storage.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Repository root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `name` below the root.
    ///
    /// Rejects names containing parent or root components so that a page name
    /// like `../../etc/passwd` cannot escape the repository.
    fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if name.is_empty() || escapes {
            return Err(StorageError::new(StorageErrorKind::InvalidPath)
                .with_path(relative)
                .with_backend(BACKEND));
        }
        Ok(self.root.join(relative))
    }

    fn io_error(err: std::io::Error, path: PathBuf) -> StorageError {
        StorageError::io(err, Some(path)).with_backend(BACKEND)
    }
}

#[async_trait]
impl Storage for FsStorage {
    fn absolute_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn exists(&self, name: &str) -> bool {
        self.resolve(name).is_ok_and(|path| path.exists())
    }

    fn read(&self, name: &str) -> Result<Bytes, StorageError> {
        let path = self.resolve(name)?;
        std::fs::read(&path)
            .map(Bytes::from)
            .map_err(|e| Self::io_error(e, path))
    }

    async fn read_async(&self, name: &str) -> Result<Bytes, StorageError> {
        let path = self.resolve(name)?;
        tokio::fs::read(&path)
            .await
            .map(Bytes::from)
            .map_err(|e| Self::io_error(e, path))
    }

    async fn list(&self) -> Result<Vec<Entry>, StorageError> {
        let mut reader = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| Self::io_error(e, self.root.clone()))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| Self::io_error(e, self.root.clone()))?
        {
            let Ok(name) = entry.file_name().into_string() else {
                tracing::debug!(path = %entry.path().display(), "Skipping non UTF-8 file name");
                continue;
            };
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            entries.push(Entry { name, is_file });
        }

        Ok(entries)
    }

    async fn write(&self, name: &str, content: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(name)?;
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| Self::io_error(e, path.clone()))?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "Wrote file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn storage() -> (tempfile::TempDir, FsStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path().to_path_buf());
        (dir, storage)
    }

    #[test]
    fn test_read_existing_file() {
        let (dir, storage) = storage();
        std::fs::write(dir.path().join("a.md"), "# A").unwrap();

        assert!(storage.exists("a.md"));
        assert_eq!(storage.read("a.md").unwrap(), Bytes::from_static(b"# A"));
    }

    #[test]
    fn test_read_missing_file_is_not_found() {
        let (_dir, storage) = storage();

        assert!(!storage.exists("missing.md"));
        let err = storage.read("missing.md").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.backend, Some("Fs"));
    }

    #[test]
    fn test_rejects_path_traversal() {
        let (_dir, storage) = storage();

        let err = storage.read("../etc/passwd").unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::InvalidPath);
        assert!(!storage.exists("../etc/passwd"));
        assert!(storage.read("/etc/passwd").is_err());
    }

    #[test]
    fn test_absolute_path() {
        let storage = FsStorage::new(PathBuf::from("/srv/wiki"));
        assert_eq!(
            storage.absolute_path("_footer.md"),
            PathBuf::from("/srv/wiki/_footer.md")
        );
    }

    #[tokio::test]
    async fn test_read_async() {
        let (dir, storage) = storage();
        std::fs::write(dir.path().join("b.md"), "body").unwrap();

        assert_eq!(storage.read_async("b.md").await.unwrap(), "body");
        assert!(storage.read_async("nope.md").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_reports_files_and_directories() {
        let (dir, storage) = storage();
        std::fs::write(dir.path().join("a.md"), "").unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();

        let mut entries = storage.list().await.unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(entries, vec![Entry::file("a.md"), Entry::dir("assets")]);
    }

    #[tokio::test]
    async fn test_list_missing_root_fails() {
        let storage = FsStorage::new(PathBuf::from("/definitely/not/a/wiki"));
        assert!(storage.list().await.is_err());
    }

    #[tokio::test]
    async fn test_write_replaces_content() {
        let (dir, storage) = storage();
        storage.write("index.md", b"first").await.unwrap();
        storage.write("index.md", b"second").await.unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("index.md")).unwrap(),
            "second"
        );
    }
}
