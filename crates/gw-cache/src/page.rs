//! Rendered page cache keyed by page name and revision.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use bytes::Bytes;
use tracing::{debug, warn};

use crate::weighted::{WeightedLru, WeightedLruConfig};

/// Revision of a rendered page.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Revision {
    /// Current working copy.
    Head,
    /// Specific commit.
    At(String),
}

impl From<Option<&str>> for Revision {
    fn from(revision: Option<&str>) -> Self {
        revision.map_or(Self::Head, |rev| Self::At(rev.to_owned()))
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Head => f.write_str("HEAD"),
            Self::At(rev) => f.write_str(rev),
        }
    }
}

/// Cache key: `(page, revision)`.
///
/// Displays as `page/revision`, but compares structurally, so page `Foo/1`
/// never collides with revision `1` of page `Foo`.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct PageKey {
    pub page: String,
    pub revision: Revision,
}

impl PageKey {
    pub fn new(page: impl Into<String>, revision: Option<&str>) -> Self {
        Self {
            page: page.into(),
            revision: revision.into(),
        }
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.page, self.revision)
    }
}

/// Cache of rendered page HTML.
///
/// Implemented by [`RenderCache`] and by the no-op [`NullPageCache`] used when
/// caching is disabled.
pub trait PageCache: Send + Sync {
    /// Cached content for `page` at `revision` (`None` means HEAD).
    fn get(&self, page: &str, revision: Option<&str>) -> Option<Bytes>;

    /// Store rendered content.
    fn put(&self, page: &str, revision: Option<&str>, content: Bytes);

    /// Drop every cached revision of `page`.
    fn invalidate(&self, page: &str);

    /// Drop everything.
    fn reset(&self);
}

/// No-op cache: always misses, discards stored content.
#[derive(Debug, Default)]
pub struct NullPageCache;

impl PageCache for NullPageCache {
    fn get(&self, _page: &str, _revision: Option<&str>) -> Option<Bytes> {
        None
    }

    fn put(&self, _page: &str, _revision: Option<&str>, _content: Bytes) {}

    fn invalidate(&self, _page: &str) {}

    fn reset(&self) {}
}

/// In-memory LRU of rendered pages, weighted by content length.
///
/// All operations take one mutex, including lookups (which update recency),
/// so readers never observe a partially applied invalidation.
#[derive(Debug)]
pub struct RenderCache {
    entries: Mutex<WeightedLru<PageKey, Bytes>>,
}

impl RenderCache {
    #[must_use]
    pub fn new(config: WeightedLruConfig) -> Self {
        Self {
            entries: Mutex::new(WeightedLru::new(config)),
        }
    }

    pub fn get(&self, page: &str, revision: Option<&str>) -> Option<Bytes> {
        let key = PageKey::new(page, revision);
        let hit = self.entries().get(&key).cloned();
        debug!(key = %key, hit = hit.is_some(), "Render cache lookup");
        hit
    }

    pub fn put(&self, page: &str, revision: Option<&str>, content: Bytes) {
        let key = PageKey::new(page, revision);
        let size = content.len();
        let mut entries = self.entries();
        if size > entries.config().capacity {
            debug!(key = %key, size, "Page larger than cache capacity, not cached");
        }
        let evicted = entries.put(key, content);
        if evicted > 0 {
            debug!(evicted, weight = entries.weight(), "Evicted pages from render cache");
        }
    }

    /// Remove every cached revision of `page`; returns how many were dropped.
    pub fn invalidate(&self, page: &str) -> usize {
        let removed = self.entries().remove_where(|key| key.page == page);
        debug!(page, removed, "Invalidated page in render cache");
        removed
    }

    pub fn reset(&self) {
        self.entries().clear();
        debug!("Render cache reset");
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Total cached bytes.
    pub fn weight(&self) -> usize {
        self.entries().weight()
    }

    /// Every operation leaves the map consistent, so a panicking holder
    /// cannot leave a half-applied change behind.
    fn entries(&self) -> MutexGuard<'_, WeightedLru<PageKey, Bytes>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Recovered from poisoned render cache lock");
            poisoned.into_inner()
        })
    }
}

impl PageCache for RenderCache {
    fn get(&self, page: &str, revision: Option<&str>) -> Option<Bytes> {
        Self::get(self, page, revision)
    }

    fn put(&self, page: &str, revision: Option<&str>, content: Bytes) {
        Self::put(self, page, revision, content);
    }

    fn invalidate(&self, page: &str) {
        Self::invalidate(self, page);
    }

    fn reset(&self) {
        Self::reset(self);
    }
}
