//! Page-fetch boundary of gitwiki.
//!
//! [`Wiki`] ties storage, the renderer, the render cache and the component
//! registry together, and exposes the lifecycle hooks that keep the caches
//! consistent when pages change.

mod error;
mod revision;
mod wiki;

pub use error::PageError;
pub use revision::RevisionReader;
pub use wiki::{Wiki, page_file};
