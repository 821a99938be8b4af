//! File store abstraction for the gitwiki content repository.
//!
//! Pages live as plain files in the working tree of a Git repository. This
//! crate provides a [`Storage`] trait covering the handful of operations the
//! rendering pipeline needs, so the component registry and the page facade can
//! be tested without touching the real filesystem.
//!
//! # Architecture
//!
//! The crate provides:
//! - [`Storage`] trait with `exists()`, `read()`, `read_async()`, `list()` and `write()`
//! - [`FsStorage`] implementation rooted at the repository working tree
//! - [`MockStorage`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::path::PathBuf;
//! use gw_storage::{FsStorage, Storage};
//!
//! let storage = FsStorage::new(PathBuf::from("wiki"));
//! for entry in storage.list().await? {
//!     println!("{}", entry.name);
//! }
//! ```

mod fs;
#[cfg(feature = "mock")]
mod mock;
mod storage;

pub use fs::FsStorage;
#[cfg(feature = "mock")]
pub use mock::MockStorage;
pub use storage::{Entry, Storage, StorageError, StorageErrorKind};
