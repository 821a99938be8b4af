//! Registry of the five special pages, plus index and sidebar generation.

use std::sync::Arc;

use bytes::Bytes;
use gw_config::{ComponentName, ConfigHandle};
use gw_renderer::WikiRenderer;
use gw_storage::Storage;
use tracing::{debug, info};

use crate::component::Component;
use crate::error::{ComponentError, GenerateError};

/// Sidebar section separator.
const SEPARATOR: &str = "-----";

/// A page listed by [`ComponentRegistry::generate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageEntry {
    /// File name, e.g. `Getting-Started.md`.
    pub file: String,
    /// Display title, e.g. `Getting Started`.
    pub title: String,
}

impl PageEntry {
    fn from_file(file: &str) -> Self {
        let stem = file.strip_suffix(".md").unwrap_or(file);
        Self {
            file: file.to_owned(),
            title: display_title(stem),
        }
    }

    fn stem(&self) -> &str {
        self.file.strip_suffix(".md").unwrap_or(&self.file)
    }

    fn link(&self, proxy_path: &str) -> String {
        format!("[{}]({proxy_path}/wiki/{})", self.title, self.stem())
    }
}

/// Outcome of a successful [`ComponentRegistry::generate`].
#[derive(Clone, Debug, Default)]
pub struct GenerateReport {
    /// Pages listed in the index, sorted by file name.
    pub pages: Vec<PageEntry>,
    /// Files written, in write order.
    pub written: Vec<String>,
}

/// Display title of a page file stem.
///
/// Dashes become spaces and the first dot becomes `": "`, so
/// `Miscs.Build-Notes` reads `Miscs: Build Notes`.
#[must_use]
pub fn display_title(stem: &str) -> String {
    stem.replace('-', " ").replacen('.', ": ", 1)
}

/// The five components, looked up by name.
pub struct ComponentRegistry {
    components: Vec<Component>,
    config: ConfigHandle,
    storage: Arc<dyn Storage>,
    generating: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.components)
            .finish_non_exhaustive()
    }
}

impl ComponentRegistry {
    /// Create the registry; component files are resolved lazily.
    #[must_use]
    pub fn new(
        config: ConfigHandle,
        storage: Arc<dyn Storage>,
        renderer: Arc<WikiRenderer>,
    ) -> Self {
        let components = ComponentName::ALL
            .iter()
            .map(|&name| {
                Component::new(
                    name,
                    config.clone(),
                    Arc::clone(&storage),
                    Arc::clone(&renderer),
                )
            })
            .collect();
        Self {
            components,
            config,
            storage,
            generating: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub fn component(&self, name: ComponentName) -> &Component {
        let index = ComponentName::ALL
            .iter()
            .position(|&n| n == name)
            .unwrap_or_default();
        &self.components[index]
    }

    pub fn expire(&self, name: ComponentName) {
        self.component(name).expire();
    }

    /// Component whose mapped file is `page + ".md"`, if any.
    #[must_use]
    pub fn component_for_page(&self, page: &str) -> Option<&Component> {
        let file = format!("{page}.md");
        self.components.iter().find(|c| c.file() == file)
    }

    /// Whether `page` is stored in a component file.
    #[must_use]
    pub fn is_component(&self, page: &str) -> bool {
        self.component_for_page(page).is_some()
    }

    /// Expire the component backed by `page`, if any.
    ///
    /// Returns whether a component was expired.
    pub fn invalidate_for_page(&self, page: &str) -> bool {
        match self.component_for_page(page) {
            Some(component) => {
                component.expire();
                true
            }
            None => false,
        }
    }

    pub fn has_index(&self) -> bool {
        self.component(ComponentName::Index).exists()
    }

    pub fn has_sidebar(&self) -> bool {
        self.component(ComponentName::Sidebar).exists()
    }

    pub fn has_footer(&self) -> bool {
        self.component(ComponentName::Footer).exists()
    }

    pub fn has_custom_style(&self) -> bool {
        self.component(ComponentName::Style).exists()
    }

    pub fn has_custom_script(&self) -> bool {
        self.component(ComponentName::Script).exists()
    }

    pub async fn index(&self) -> Result<Option<Bytes>, ComponentError> {
        self.component(ComponentName::Index).fetch().await
    }

    pub async fn sidebar(&self) -> Result<Option<Bytes>, ComponentError> {
        self.component(ComponentName::Sidebar).fetch().await
    }

    pub async fn footer(&self) -> Result<Option<Bytes>, ComponentError> {
        self.component(ComponentName::Footer).fetch().await
    }

    /// Raw custom stylesheet.
    pub fn custom_style(&self) -> Result<Option<Bytes>, ComponentError> {
        self.component(ComponentName::Style).fetch_sync()
    }

    /// Raw custom script.
    pub fn custom_script(&self) -> Result<Option<Bytes>, ComponentError> {
        self.component(ComponentName::Script).fetch_sync()
    }

    /// Regenerate the index and sidebar pages from the repository listing.
    ///
    /// Stops at the first failure: a listing error writes nothing, and an
    /// index write error skips the sidebar. Concurrent calls run one at a time.
    pub async fn generate(&self) -> Result<GenerateReport, GenerateError> {
        let _guard = self.generating.lock().await;

        let index_file = self.config.component_file(ComponentName::Index);
        let sidebar_file = self.config.component_file(ComponentName::Sidebar);
        let proxy_path = self.config.proxy_path();

        let mut entries = self.storage.list().await.map_err(GenerateError::List)?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        let pages: Vec<PageEntry> = entries
            .iter()
            .filter(|entry| entry.is_file)
            .map(|entry| entry.name.as_str())
            .filter(|name| !name.starts_with('.') && !name.starts_with('_'))
            .filter(|name| name.ends_with(".md"))
            .filter(|name| name.trim() != index_file)
            .map(PageEntry::from_file)
            .collect();
        debug!(pages = pages.len(), "Collected pages for generation");

        let mut report = GenerateReport {
            pages,
            written: Vec::new(),
        };

        let index = index_page(&report.pages, &proxy_path);
        self.write(&index_file, &index).await?;
        report.written.push(index_file);

        let sidebar = sidebar_page(&report.pages, &proxy_path);
        self.write(&sidebar_file, &sidebar).await?;
        report.written.push(sidebar_file);

        self.expire(ComponentName::Index);
        self.expire(ComponentName::Sidebar);
        info!(pages = report.pages.len(), "Generated index and sidebar");
        Ok(report)
    }

    async fn write(&self, file: &str, content: &str) -> Result<(), GenerateError> {
        self.storage
            .write(file, content.as_bytes())
            .await
            .map_err(|source| GenerateError::Write {
                file: file.to_owned(),
                source,
            })?;
        info!(file, "Generated");
        Ok(())
    }
}

fn index_page(pages: &[PageEntry], proxy_path: &str) -> String {
    let mut out = String::from("# Index\n\n");
    for page in pages {
        out.push_str(&page.link(proxy_path));
        out.push('\n');
    }
    out
}

fn sidebar_page(pages: &[PageEntry], proxy_path: &str) -> String {
    let mut out = format!(
        "\n[New]({proxy_path}/pages/new)\n[All]({proxy_path}/)\n[List]({proxy_path}/wiki)\n"
    );
    for prefix in ["TODO", "Miscs"] {
        out.push('\n');
        out.push_str(SEPARATOR);
        out.push('\n');
        for page in pages.iter().filter(|p| p.title.starts_with(prefix)) {
            out.push_str(&page.link(proxy_path));
            out.push('\n');
        }
    }
    out
}
