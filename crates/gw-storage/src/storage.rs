//! Storage trait and error types.
//!
//! Provides the core [`Storage`] trait for reading and writing files in the
//! wiki repository, along with [`StorageError`] for unified error handling
//! across backends.
//!
//! # Name Convention
//!
//! All name parameters are **file names relative to the repository root**,
//! extension included (`"index.md"`, `"_sidebar.md"`, `"_style.css"`).

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;

/// Directory entry returned by [`Storage::list`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// File name relative to the repository root.
    pub name: String,
    /// True for regular files, false for directories and other entries.
    pub is_file: bool,
}

impl Entry {
    /// Create a regular file entry.
    #[must_use]
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_file: true,
        }
    }

    /// Create a directory entry.
    #[must_use]
    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_file: false,
        }
    }
}

/// What went wrong, independent of the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    NotFound,
    PermissionDenied,
    /// Name escapes the repository root or is otherwise unusable.
    InvalidPath,
    /// Backend refused to serve the request.
    Unavailable,
    /// Interrupted or timed out; the same call may succeed later.
    Transient,
    Other,
}

impl StorageErrorKind {
    fn from_io(kind: std::io::ErrorKind) -> Self {
        use std::io::ErrorKind as Io;

        match kind {
            Io::NotFound => Self::NotFound,
            Io::PermissionDenied => Self::PermissionDenied,
            Io::InvalidInput => Self::InvalidPath,
            Io::TimedOut | Io::Interrupted | Io::WouldBlock => Self::Transient,
            _ => Self::Other,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::NotFound => "no such file",
            Self::PermissionDenied => "permission denied",
            Self::InvalidPath => "invalid file name",
            Self::Unavailable => "storage unavailable",
            Self::Transient => "temporary failure",
            Self::Other => "storage failure",
        }
    }
}

/// Error returned by every [`Storage`] operation.
///
/// Built with chained `with_*` calls so backends can attach the file name and
/// their own identifier without a variant per backend.
#[derive(Debug)]
pub struct StorageError {
    pub kind: StorageErrorKind,
    /// File the operation was about, relative or absolute.
    pub path: Option<PathBuf>,
    /// Short backend tag such as `"Fs"` or `"Mock"`.
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            path: None,
            backend: None,
            source: None,
        }
    }

    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(StorageErrorKind::NotFound).with_path(path)
    }

    /// Classify an I/O failure on `path`.
    #[must_use]
    pub fn io(err: std::io::Error, path: Option<PathBuf>) -> Self {
        Self {
            kind: StorageErrorKind::from_io(err.kind()),
            path,
            backend: None,
            source: Some(Box::new(err)),
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// True when the file is simply absent.
    ///
    /// Callers treat this as an empty answer rather than a failure.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == StorageErrorKind::NotFound
    }

    /// True when retrying the same call may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.kind == StorageErrorKind::Transient
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.kind.describe())?;
        if let Some(path) = &self.path {
            write!(f, " '{}'", path.display())?;
        }
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        if let Some(backend) = self.backend {
            write!(f, " [{backend}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let source = self.source.as_deref()?;
        Some(source)
    }
}

/// Storage abstraction over the wiki repository working tree.
///
/// Reads come in a blocking flavour for callers that cannot suspend (layout
/// assembly of style and script components) and an async flavour for
/// everything else.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Absolute location of `name` inside the backend.
    fn absolute_path(&self, name: &str) -> PathBuf;

    /// Check whether `name` exists.
    ///
    /// Returns `false` on errors (treats errors as "doesn't exist").
    fn exists(&self, name: &str) -> bool;

    /// Read the full contents of `name`, blocking the current thread.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] with [`StorageErrorKind::NotFound`] when the
    /// file is absent, or another kind when it can't be read.
    fn read(&self, name: &str) -> Result<Bytes, StorageError>;

    /// Read the full contents of `name`.
    ///
    /// # Errors
    ///
    /// Same as [`Storage::read`].
    async fn read_async(&self, name: &str) -> Result<Bytes, StorageError>;

    /// List the entries of the repository root.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the directory can't be listed.
    async fn list(&self) -> Result<Vec<Entry>, StorageError>;

    /// Replace the contents of `name`.
    ///
    /// This is a plain file write; committing is left to the Git layer.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file can't be written.
    async fn write(&self, name: &str, content: &[u8]) -> Result<(), StorageError>;
}
