//! Wiki facade: cached page rendering and page lifecycle hooks.

use std::sync::Arc;

use bytes::Bytes;
use gw_cache::{NullPageCache, PageCache, RenderCache, WeightedLruConfig};
use gw_components::{ComponentRegistry, GenerateError, GenerateReport};
use gw_config::{ComponentName, ConfigHandle};
use gw_renderer::WikiRenderer;
use gw_storage::{Storage, StorageError};
use tracing::{debug, info};

use crate::error::PageError;
use crate::revision::RevisionReader;

/// File name backing a page.
#[must_use]
pub fn page_file(page: &str) -> String {
    format!("{page}.md")
}

/// Rendering entry point for ordinary pages and components.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use gw_config::{Config, ConfigHandle};
/// use gw_site::Wiki;
/// use gw_storage::FsStorage;
///
/// let config = ConfigHandle::new(Config::load(None, None)?);
/// let storage = Arc::new(FsStorage::new(config.repository_dir()));
/// let wiki = Wiki::new(config, storage);
///
/// let html = wiki.render_page("Home", None).await?;
/// wiki.page_saved("Home").await?;
/// ```
pub struct Wiki {
    storage: Arc<dyn Storage>,
    renderer: Arc<WikiRenderer>,
    cache: Box<dyn PageCache>,
    components: ComponentRegistry,
    revisions: Option<Arc<dyn RevisionReader>>,
}

impl std::fmt::Debug for Wiki {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wiki")
            .field("renderer", &self.renderer)
            .field("components", &self.components)
            .finish_non_exhaustive()
    }
}

impl Wiki {
    /// Create a wiki whose renderer follows `config`.
    #[must_use]
    pub fn new(config: ConfigHandle, storage: Arc<dyn Storage>) -> Self {
        let renderer = Arc::new(WikiRenderer::from_config(config.clone()));
        Self::with_renderer(config, storage, renderer)
    }

    /// Create a wiki with a custom renderer (e.g. extra directives).
    #[must_use]
    pub fn with_renderer(
        config: ConfigHandle,
        storage: Arc<dyn Storage>,
        renderer: Arc<WikiRenderer>,
    ) -> Self {
        let cache: Box<dyn PageCache> = if config.cache_enabled() {
            Box::new(RenderCache::new(WeightedLruConfig {
                capacity: config.cache_capacity(),
                ttl: Some(config.cache_ttl()),
            }))
        } else {
            Box::new(NullPageCache)
        };
        let components =
            ComponentRegistry::new(config, Arc::clone(&storage), Arc::clone(&renderer));
        Self {
            storage,
            renderer,
            cache,
            components,
            revisions: None,
        }
    }

    /// Enable rendering of historical revisions.
    #[must_use]
    pub fn with_revision_reader(mut self, reader: Arc<dyn RevisionReader>) -> Self {
        self.revisions = Some(reader);
        self
    }

    #[must_use]
    pub fn renderer(&self) -> &WikiRenderer {
        &self.renderer
    }

    #[must_use]
    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// Rendered HTML of `page` at `revision` (`None` for the working copy).
    pub async fn render_page(
        &self,
        page: &str,
        revision: Option<&str>,
    ) -> Result<Bytes, PageError> {
        if let Some(html) = self.cache.get(page, revision) {
            return Ok(html);
        }

        let source = match revision {
            None => self.storage.read_async(&page_file(page)).await,
            Some(rev) => {
                let reader =
                    self.revisions
                        .as_ref()
                        .ok_or_else(|| PageError::RevisionUnavailable {
                            page: page.to_owned(),
                            revision: rev.to_owned(),
                        })?;
                reader.read_revision(page, rev).await
            }
        }
        .map_err(|e| not_found_as_page(e, page))?;

        let html = Bytes::from(self.renderer.render(&String::from_utf8_lossy(&source)));
        self.cache.put(page, revision, html.clone());
        debug!(page, revision = revision.unwrap_or("HEAD"), "Rendered page");
        Ok(html)
    }

    /// Reject new page names that would overwrite a component file.
    pub fn check_new_page(&self, page: &str) -> Result<(), PageError> {
        if self.components.is_component(page) {
            return Err(PageError::Reserved(page.to_owned()));
        }
        Ok(())
    }

    /// Page content was written; regenerate the page listings.
    pub async fn page_saved(&self, page: &str) -> Result<GenerateReport, GenerateError> {
        self.forget(page);
        self.components.generate().await
    }

    pub async fn page_deleted(&self, page: &str) -> Result<GenerateReport, GenerateError> {
        self.forget(page);
        self.components.generate().await
    }

    pub async fn page_renamed(
        &self,
        from: &str,
        to: &str,
    ) -> Result<GenerateReport, GenerateError> {
        self.forget(from);
        self.forget(to);
        self.components.generate().await
    }

    /// Page was reverted to an older revision; listings are unaffected.
    pub fn page_reverted(&self, page: &str) {
        self.forget(page);
    }

    /// Repository was updated from upstream: any page may have changed.
    ///
    /// Caches are cleared even when regeneration fails.
    pub async fn repository_pulled(&self) -> Result<GenerateReport, GenerateError> {
        let result = self.components.generate().await;
        self.cache.reset();
        for name in ComponentName::ALL {
            self.components.expire(name);
        }
        info!(ok = result.is_ok(), "Caches reset after pull");
        result
    }

    fn forget(&self, page: &str) {
        self.cache.invalidate(page);
        if self.components.invalidate_for_page(page) {
            debug!(page, "Expired component backing page");
        }
    }
}

fn not_found_as_page(error: StorageError, page: &str) -> PageError {
    if error.is_not_found() {
        PageError::NotFound(page.to_owned())
    } else {
        PageError::Storage(error)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use gw_config::Config;
    use gw_storage::{FsStorage, MockStorage};
    use pretty_assertions::assert_eq;

    use super::*;

    fn wiki(storage: &Arc<MockStorage>) -> Wiki {
        Wiki::new(
            ConfigHandle::new(Config::default()),
            Arc::clone(storage) as Arc<dyn Storage>,
        )
    }

    struct FixedRevisions;

    #[async_trait]
    impl RevisionReader for FixedRevisions {
        async fn read_revision(&self, page: &str, revision: &str) -> Result<Bytes, StorageError> {
            if revision == "abc" {
                Ok(Bytes::from(format!("{page} at {revision}")))
            } else {
                Err(StorageError::not_found(page))
            }
        }
    }

    #[tokio::test]
    async fn test_render_page_is_cached() {
        let storage = Arc::new(MockStorage::new().with_file("Home.md", "one"));
        let wiki = wiki(&storage);

        assert_eq!(wiki.render_page("Home", None).await.unwrap(), "<p>one</p>");
        storage.set_file("Home.md", "two");
        assert_eq!(wiki.render_page("Home", None).await.unwrap(), "<p>one</p>");
    }

    #[tokio::test]
    async fn test_page_saved_invalidates_and_generates() {
        let storage = Arc::new(MockStorage::new().with_file("Home.md", "one"));
        let wiki = wiki(&storage);
        wiki.render_page("Home", None).await.unwrap();

        storage.set_file("Home.md", "two");
        let report = wiki.page_saved("Home").await.unwrap();
        assert_eq!(report.pages.len(), 1);
        assert_eq!(wiki.render_page("Home", None).await.unwrap(), "<p>two</p>");
        assert!(storage.file("index.md").is_some());
    }

    #[tokio::test]
    async fn test_missing_page() {
        let storage = Arc::new(MockStorage::new());
        let wiki = wiki(&storage);
        let err = wiki.render_page("Nope", None).await.unwrap_err();
        assert!(matches!(err, PageError::NotFound(ref p) if p == "Nope"));
    }

    #[tokio::test]
    async fn test_storage_failure_is_distinct() {
        let storage = Arc::new(MockStorage::new().with_read_failure("Locked.md"));
        let wiki = wiki(&storage);
        let err = wiki.render_page("Locked", None).await.unwrap_err();
        assert!(matches!(err, PageError::Storage(_)));
    }

    #[tokio::test]
    async fn test_revisions() {
        let storage = Arc::new(MockStorage::new().with_file("Home.md", "head"));
        let wiki = wiki(&storage);
        assert!(matches!(
            wiki.render_page("Home", Some("abc")).await,
            Err(PageError::RevisionUnavailable { .. })
        ));

        let wiki = wiki.with_revision_reader(Arc::new(FixedRevisions));
        assert_eq!(
            wiki.render_page("Home", Some("abc")).await.unwrap(),
            "<p>Home at abc</p>"
        );
        assert_eq!(wiki.render_page("Home", None).await.unwrap(), "<p>head</p>");
        assert!(matches!(
            wiki.render_page("Home", Some("zzz")).await,
            Err(PageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_page_reverted_drops_all_revisions() {
        let storage = Arc::new(MockStorage::new().with_file("Home.md", "v1"));
        let wiki = wiki(&storage).with_revision_reader(Arc::new(FixedRevisions));
        wiki.render_page("Home", None).await.unwrap();
        wiki.render_page("Home", Some("abc")).await.unwrap();

        storage.set_file("Home.md", "v0");
        wiki.page_reverted("Home");
        assert_eq!(wiki.render_page("Home", None).await.unwrap(), "<p>v0</p>");
    }

    #[tokio::test]
    async fn test_page_renamed() {
        let storage = Arc::new(MockStorage::new().with_file("Old.md", "content"));
        let wiki = wiki(&storage);
        wiki.render_page("Old", None).await.unwrap();

        storage.remove_file("Old.md");
        storage.set_file("New.md", "content");
        let report = wiki.page_renamed("Old", "New").await.unwrap();

        let files: Vec<&str> = report.pages.iter().map(|p| p.file.as_str()).collect();
        assert_eq!(files, vec!["New.md"]);
        assert!(matches!(
            wiki.render_page("Old", None).await,
            Err(PageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_saving_footer_expires_component() {
        let storage = Arc::new(MockStorage::new().with_file("_footer.md", "old"));
        let wiki = wiki(&storage);
        assert_eq!(
            wiki.components().footer().await.unwrap().unwrap(),
            "<p>old</p>"
        );

        storage.set_file("_footer.md", "new");
        wiki.page_saved("_footer").await.unwrap();
        assert_eq!(
            wiki.components().footer().await.unwrap().unwrap(),
            "<p>new</p>"
        );
    }

    #[tokio::test]
    async fn test_repository_pulled_resets_even_on_failure() {
        let storage = Arc::new(
            MockStorage::new()
                .with_file("Home.md", "one")
                .with_write_failure("index.md"),
        );
        let wiki = wiki(&storage);
        wiki.render_page("Home", None).await.unwrap();

        storage.set_file("Home.md", "two");
        assert!(wiki.repository_pulled().await.is_err());
        assert_eq!(wiki.render_page("Home", None).await.unwrap(), "<p>two</p>");
    }

    #[test]
    fn test_check_new_page() {
        let storage = Arc::new(MockStorage::new());
        let wiki = wiki(&storage);
        assert!(wiki.check_new_page("Home").is_ok());
        assert!(matches!(
            wiki.check_new_page("_sidebar"),
            Err(PageError::Reserved(_))
        ));
    }

    #[tokio::test]
    async fn test_cache_disabled() {
        let storage = Arc::new(MockStorage::new().with_file("Home.md", "one"));
        let mut config = Config::default();
        config.cache.enabled = false;
        let wiki = Wiki::new(
            ConfigHandle::new(config),
            Arc::clone(&storage) as Arc<dyn Storage>,
        );

        wiki.render_page("Home", None).await.unwrap();
        storage.set_file("Home.md", "two");
        assert_eq!(wiki.render_page("Home", None).await.unwrap(), "<p>two</p>");
    }

    #[tokio::test]
    async fn test_filesystem_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Home.md"), "See [[Guide]]").unwrap();

        let config = ConfigHandle::new(Config::default_with_base(dir.path()));
        let storage = Arc::new(FsStorage::new(config.repository_dir()));
        let wiki = Wiki::new(config, storage);

        assert_eq!(
            wiki.render_page("Home", None).await.unwrap(),
            r#"<p>See <a class="internal" href="/wiki/Guide">Guide</a></p>"#
        );
    }
}
