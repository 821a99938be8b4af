//! A single special page with time-boxed existence and content caching.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use bytes::Bytes;
use gw_config::{ComponentName, ConfigHandle};
use gw_renderer::WikiRenderer;
use gw_storage::Storage;
use tracing::{debug, warn};

use crate::error::ComponentError;

#[derive(Debug, Default)]
struct ComponentState {
    /// File mapped at the last check.
    file: Option<String>,
    content: Option<Bytes>,
    checked_at: Option<Instant>,
    exists: bool,
}

/// One of the special wiki pages.
///
/// The mapped file is re-read from configuration on every existence check. The
/// filesystem is consulted only when that mapping changed, when the staleness
/// interval elapsed, or after [`expire`](Self::expire); otherwise the last
/// answer is reused.
pub struct Component {
    name: ComponentName,
    config: ConfigHandle,
    storage: Arc<dyn Storage>,
    renderer: Arc<WikiRenderer>,
    state: Mutex<ComponentState>,
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("state", &*self.state())
            .finish_non_exhaustive()
    }
}

impl Component {
    pub(crate) fn new(
        name: ComponentName,
        config: ConfigHandle,
        storage: Arc<dyn Storage>,
        renderer: Arc<WikiRenderer>,
    ) -> Self {
        Self {
            name,
            config,
            storage,
            renderer,
            state: Mutex::new(ComponentState::default()),
        }
    }

    #[must_use]
    pub fn name(&self) -> ComponentName {
        self.name
    }

    /// File currently mapped to this component by configuration.
    #[must_use]
    pub fn file(&self) -> String {
        self.config.component_file(self.name)
    }

    /// Whether the component file exists.
    pub fn exists(&self) -> bool {
        self.exists_at(Instant::now())
    }

    pub(crate) fn exists_at(&self, now: Instant) -> bool {
        let file = self.file();
        let staleness = self.config.staleness();
        let mut state = self.state();

        let moved = state.file.as_deref() != Some(file.as_str());
        let stale = state
            .checked_at
            .is_none_or(|checked| now.saturating_duration_since(checked) > staleness);
        if !moved && !stale {
            return state.exists;
        }

        let exists = self.storage.exists(&file);
        debug!(component = %self.name, file, exists, moved, "Checked component file");

        state.content = None;
        state.exists = exists;
        state.checked_at = Some(now);
        state.file = Some(file);
        exists
    }

    /// Rendered HTML of the component, `None` when the file does not exist.
    pub async fn fetch(&self) -> Result<Option<Bytes>, ComponentError> {
        if !self.exists() {
            return Ok(None);
        }
        let file = {
            let state = self.state();
            if let Some(content) = &state.content {
                return Ok(Some(content.clone()));
            }
            state.file.clone().unwrap_or_else(|| self.file())
        };

        let raw = match self.storage.read_async(&file).await {
            Ok(raw) => raw,
            Err(e) => return self.read_failed(&file, e),
        };
        let html = Bytes::from(self.renderer.render(&String::from_utf8_lossy(&raw)));
        self.store(&file, html.clone());
        Ok(Some(html))
    }

    /// Raw file content, read synchronously and not rendered.
    pub fn fetch_sync(&self) -> Result<Option<Bytes>, ComponentError> {
        if !self.exists() {
            return Ok(None);
        }
        let mut state = self.state();
        if let Some(content) = &state.content {
            return Ok(Some(content.clone()));
        }
        let file = state.file.clone().unwrap_or_else(|| self.file());

        match self.storage.read(&file) {
            Ok(raw) => {
                state.content = Some(raw.clone());
                Ok(Some(raw))
            }
            Err(e) => {
                drop(state);
                self.read_failed(&file, e)
            }
        }
    }

    /// Drop cached content and force the next call to re-check the filesystem.
    pub fn expire(&self) {
        let mut state = self.state();
        state.content = None;
        state.checked_at = None;
        debug!(component = %self.name, "Component expired");
    }

    fn store(&self, file: &str, content: Bytes) {
        let mut state = self.state();
        // Skip if the mapping changed or the component expired during the read
        if state.file.as_deref() == Some(file) && state.checked_at.is_some() {
            state.content = Some(content);
        }
    }

    fn read_failed(
        &self,
        file: &str,
        error: gw_storage::StorageError,
    ) -> Result<Option<Bytes>, ComponentError> {
        let mut state = self.state();
        state.content = None;
        if error.is_not_found() {
            debug!(component = %self.name, file, "Component file vanished before read");
            state.exists = false;
            state.checked_at = None;
            return Ok(None);
        }
        warn!(component = %self.name, file, error = %error, "Failed to read component");
        Err(ComponentError::Read(error))
    }

    fn state(&self) -> MutexGuard<'_, ComponentState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!(component = %self.name, "Recovered from poisoned component lock");
            poisoned.into_inner()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use gw_config::Config;
    use gw_renderer::RendererOptions;
    use gw_storage::MockStorage;
    use pretty_assertions::assert_eq;

    use super::*;

    fn setup(storage: MockStorage) -> (Component, Arc<MockStorage>, ConfigHandle) {
        let storage = Arc::new(storage);
        let config = ConfigHandle::new(Config::default());
        let component = Component::new(
            ComponentName::Footer,
            config.clone(),
            Arc::clone(&storage) as Arc<dyn Storage>,
            Arc::new(WikiRenderer::new(RendererOptions::default())),
        );
        (component, storage, config)
    }

    #[test]
    fn test_missing_file() {
        let (component, _, _) = setup(MockStorage::new());
        assert!(!component.exists());
        assert_eq!(component.fetch_sync().unwrap(), None);
    }

    #[tokio::test]
    async fn test_fetch_renders_and_caches() {
        let (component, storage, _) = setup(MockStorage::new().with_file("_footer.md", "**bye**"));

        let html = component.fetch().await.unwrap().unwrap();
        assert_eq!(html, Bytes::from_static(b"<p><strong>bye</strong></p>"));

        // Served from cache while fresh
        storage.set_file("_footer.md", "changed");
        assert_eq!(component.fetch().await.unwrap(), Some(html));
    }

    #[tokio::test]
    async fn test_expire_reloads() {
        let (component, storage, _) = setup(MockStorage::new().with_file("_footer.md", "one"));
        component.fetch().await.unwrap();

        storage.set_file("_footer.md", "two");
        component.expire();
        assert_eq!(
            component.fetch().await.unwrap(),
            Some(Bytes::from_static(b"<p>two</p>"))
        );
    }

    #[test]
    fn test_existence_cached_until_stale() {
        let (component, storage, _) = setup(MockStorage::new().with_file("_footer.md", "x"));
        let start = Instant::now();
        assert!(component.exists_at(start));

        storage.remove_file("_footer.md");
        assert!(component.exists_at(start + Duration::from_secs(30)));
        assert!(!component.exists_at(start + Duration::from_secs(31)));
    }

    #[test]
    fn test_stale_check_clears_content() {
        let (component, storage, _) = setup(MockStorage::new().with_file("_footer.md", "old"));
        let start = Instant::now();
        assert!(component.exists_at(start));
        assert_eq!(component.fetch_sync().unwrap(), Some(Bytes::from_static(b"old")));

        storage.set_file("_footer.md", "new");
        assert!(component.exists_at(start + Duration::from_secs(60)));
        assert_eq!(component.fetch_sync().unwrap(), Some(Bytes::from_static(b"new")));
    }

    #[test]
    fn test_missing_file_cached_until_stale() {
        let (component, storage, _) = setup(MockStorage::new());
        let start = Instant::now();
        assert!(!component.exists_at(start));

        storage.set_file("_footer.md", "now here");
        assert!(!component.exists_at(start + Duration::from_secs(1)));
        assert!(component.exists_at(start + Duration::from_secs(31)));
    }

    #[test]
    fn test_expire_picks_up_new_file() {
        let (component, storage, _) = setup(MockStorage::new());
        assert!(!component.exists());

        storage.set_file("_footer.md", "now here");
        component.expire();
        assert!(component.exists());
    }

    #[test]
    fn test_config_change_remaps_file() {
        let (component, _, config) = setup(
            MockStorage::new()
                .with_file("_footer.md", "a")
                .with_file("Footer.md", "b"),
        );
        assert_eq!(component.fetch_sync().unwrap(), Some(Bytes::from_static(b"a")));

        config.modify(|c| c.customizations.footer = "Footer".to_owned());
        assert_eq!(component.file(), "Footer.md");
        assert_eq!(component.fetch_sync().unwrap(), Some(Bytes::from_static(b"b")));
    }

    #[test]
    fn test_usable_after_panic_while_locked() {
        let (component, _, _) = setup(MockStorage::new().with_file("_footer.md", "x"));

        let result = std::thread::scope(|scope| {
            scope
                .spawn(|| {
                    let _guard = component.state();
                    panic!("holder panicked");
                })
                .join()
        });
        assert!(result.is_err());

        assert!(component.exists());
        assert_eq!(component.fetch_sync().unwrap(), Some(Bytes::from_static(b"x")));
    }

    #[tokio::test]
    async fn test_read_failure_is_error() {
        let (component, _, _) = setup(MockStorage::new().with_read_failure("_footer.md"));
        assert!(component.exists());
        assert!(matches!(component.fetch().await, Err(ComponentError::Read(_))));
        assert!(matches!(component.fetch_sync(), Err(ComponentError::Read(_))));
    }

    #[tokio::test]
    async fn test_vanished_file_resolves_to_none() {
        let (component, storage, _) = setup(MockStorage::new().with_file("_footer.md", "x"));
        assert!(component.exists());
        storage.remove_file("_footer.md");

        // Existence is still cached as true, the read reports not found
        assert_eq!(component.fetch().await.unwrap(), None);
        assert!(!component.exists());
    }
}
