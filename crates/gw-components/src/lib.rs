//! Special wiki pages: index, sidebar, footer, custom style and script.
//!
//! Each [`Component`] caches its content in memory and re-checks the
//! filesystem only when its configured file changes, its staleness interval
//! elapses, or it is expired explicitly. [`ComponentRegistry`] owns the five
//! components and regenerates the index and sidebar pages from the repository
//! listing.

mod component;
mod error;
mod registry;

pub use component::Component;
pub use error::{ComponentError, GenerateError};
pub use registry::{ComponentRegistry, GenerateReport, PageEntry, display_title};
