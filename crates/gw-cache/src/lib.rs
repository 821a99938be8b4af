//! In-memory caches for rendered wiki pages.
//!
//! - [`WeightedLru`]: LRU map bounded by total value size, with lazy TTL expiry
//! - [`RenderCache`]: `(page, revision) -> HTML` cache built on it
//! - [`PageCache`]: trait shared by [`RenderCache`] and [`NullPageCache`]
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use bytes::Bytes;
//! use gw_cache::{RenderCache, WeightedLruConfig};
//!
//! let cache = RenderCache::new(WeightedLruConfig {
//!     capacity: 1024,
//!     ttl: Some(Duration::from_secs(60)),
//! });
//! cache.put("Home", None, Bytes::from_static(b"<p>hi</p>"));
//! assert!(cache.get("Home", None).is_some());
//! cache.invalidate("Home");
//! assert!(cache.get("Home", None).is_none());
//! ```

mod page;
mod weighted;

pub use page::{NullPageCache, PageCache, PageKey, RenderCache, Revision};
pub use weighted::{Weigh, WeightedLru, WeightedLruConfig};
