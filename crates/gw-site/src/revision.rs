//! Access to historical page revisions.

use async_trait::async_trait;
use bytes::Bytes;
use gw_storage::StorageError;

/// Reads a page as it was at a given revision.
///
/// Implemented by the version control layer. A missing page or revision is
/// reported with a not-found [`StorageError`].
#[async_trait]
pub trait RevisionReader: Send + Sync {
    async fn read_revision(&self, page: &str, revision: &str) -> Result<Bytes, StorageError>;
}
