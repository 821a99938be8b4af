//! Component error types.

use gw_storage::StorageError;

/// Error reading a component file.
///
/// A missing file is not an error: fetches resolve to `Ok(None)` instead.
#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
    #[error("Failed to read component: {0}")]
    Read(#[source] StorageError),
}

/// Error regenerating the index and sidebar pages.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The repository could not be listed; nothing was written.
    #[error("Failed to list repository: {0}")]
    List(#[source] StorageError),

    /// A generated file could not be written; later files were skipped.
    #[error("Failed to write {file}: {source}")]
    Write {
        file: String,
        #[source]
        source: StorageError,
    },
}
