//! Shared, runtime-updatable configuration handle.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::{ComponentName, Config};

/// Cheaply cloneable handle to the current configuration.
///
/// Every accessor reads the latest snapshot, so values replaced through
/// [`ConfigHandle::update`] are observed by the next call.
#[derive(Clone, Debug)]
pub struct ConfigHandle {
    inner: Arc<RwLock<Arc<Config>>>,
}

impl ConfigHandle {
    /// Wrap a loaded configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// Current configuration snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Config> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replace the configuration.
    pub fn update(&self, config: Config) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(config);
        tracing::debug!("Configuration updated");
    }

    /// Modify a copy of the current configuration and store it.
    pub fn modify(&self, f: impl FnOnce(&mut Config)) {
        let mut config = (*self.snapshot()).clone();
        f(&mut config);
        self.update(config);
    }

    #[must_use]
    pub fn cache_enabled(&self) -> bool {
        self.snapshot().cache.enabled
    }

    /// Render cache byte budget.
    #[must_use]
    pub fn cache_capacity(&self) -> usize {
        self.snapshot().cache.capacity
    }

    /// Render cache time-to-live.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.snapshot().cache.ttl_secs)
    }

    /// Interval after which components re-check the filesystem.
    #[must_use]
    pub fn staleness(&self) -> Duration {
        Duration::from_secs(self.snapshot().customizations.staleness_secs)
    }

    /// Filename mapped to a component, default extension applied.
    #[must_use]
    pub fn component_file(&self, name: ComponentName) -> String {
        self.snapshot().customizations.file_for(name)
    }

    #[must_use]
    pub fn repository_dir(&self) -> PathBuf {
        self.snapshot().application.repository.clone()
    }

    /// URL prefix for generated links.
    #[must_use]
    pub fn proxy_path(&self) -> String {
        self.snapshot().application.proxy_path.clone()
    }

    #[must_use]
    pub fn gfm_breaks(&self) -> bool {
        self.snapshot().application.gfm_breaks
    }

    #[must_use]
    pub fn arrow_class(&self) -> String {
        self.snapshot().rendering.arrow_class.clone()
    }

    #[must_use]
    pub fn anchor_level(&self) -> u8 {
        self.snapshot().rendering.anchor_level
    }
}

impl From<Config> for ConfigHandle {
    fn from(config: Config) -> Self {
        Self::new(config)
    }
}
