//! Markdown renderer for gitwiki pages.
//!
//! The crate is layered:
//!
//! - [`MarkdownRenderer`] turns a pulldown-cmark event stream into HTML,
//!   delegating format-specific elements to a [`RenderBackend`]
//!   ([`HtmlBackend`]). It handles footnotes, heading anchors, task lists,
//!   tables and definition lists.
//! - [`ArrowSpans`] and [`Linkify`] are event adapters for the wiki's inline
//!   extensions.
//! - [`TagTable`] and [`DirectiveTable`] resolve `[[Page]]` links and
//!   `{{NAME}}` directives on the raw source before parsing.
//! - [`WikiRenderer`] runs the whole pipeline.
//!
//! # Example
//!
//! ```
//! use gw_renderer::{RendererOptions, WikiRenderer};
//!
//! let renderer = WikiRenderer::new(RendererOptions::default());
//! let html = renderer.render("# Hello\n\n<<Note<< see [[Other Page]]");
//! assert!(html.contains(r#"<span class="arrow">Note</span>"#));
//! ```

mod arrow;
mod backend;
mod container;
mod fence;
mod highlight;
mod html;
mod linkify;
mod renderer;
mod state;
mod util;
pub mod wiki;
mod wiki_renderer;

pub use arrow::ArrowSpans;
pub use backend::RenderBackend;
pub use container::expand_containers;
pub use html::HtmlBackend;
pub use linkify::Linkify;
pub use renderer::MarkdownRenderer;
pub use state::{SlugCounter, escape_html, slugify};
pub use wiki::{DirectiveTable, TagTable, wikify};
pub use wiki_renderer::{RendererOptions, WikiRenderer};
