//! Page error types.

use gw_storage::StorageError;

/// Error returned when a page cannot be served.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// Page file does not exist.
    #[error("Page not found: {0}")]
    NotFound(String),

    /// A historical revision was requested but no reader is configured.
    #[error("Revision {revision} of {page} is unavailable")]
    RevisionUnavailable { page: String, revision: String },

    /// The page name is taken by a component file.
    #[error("Page name `{0}` is reserved for a generated component")]
    Reserved(String),

    #[error("{0}")]
    Storage(#[from] StorageError),
}
