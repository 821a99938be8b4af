//! Full page pipeline: wiki syntax resolution, markdown parsing, HTML output.

use std::sync::Arc;

use gw_config::ConfigHandle;
use pulldown_cmark::{Parser, TextMergeStream};

use crate::arrow::ArrowSpans;
use crate::container::expand_containers;
use crate::html::HtmlBackend;
use crate::linkify::Linkify;
use crate::renderer::MarkdownRenderer;
use crate::util::parser_options;
use crate::wiki::{DirectiveTable, TagTable};

/// Rendering options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RendererOptions {
    /// Prefix for internal wiki links (empty or starting with `/`).
    pub proxy_path: String,
    /// Render soft line breaks as `<br>`.
    pub gfm_breaks: bool,
    /// Class stamped on arrow spans.
    pub arrow_class: String,
    /// Minimum heading level that gets a permalink.
    pub anchor_level: u8,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            proxy_path: String::new(),
            gfm_breaks: true,
            arrow_class: "arrow".to_owned(),
            anchor_level: 2,
        }
    }
}

impl RendererOptions {
    /// Snapshot the rendering options of a configuration.
    #[must_use]
    pub fn from_config(config: &ConfigHandle) -> Self {
        Self {
            proxy_path: config.proxy_path(),
            gfm_breaks: config.gfm_breaks(),
            arrow_class: config.arrow_class(),
            anchor_level: config.anchor_level(),
        }
    }
}

#[derive(Clone, Debug)]
enum OptionsSource {
    Fixed(RendererOptions),
    /// Re-read on every render so configuration updates apply immediately.
    Live(ConfigHandle),
}

/// Wiki page renderer.
///
/// Stateless between calls: every [`render`](Self::render) builds its own tag
/// table and markdown renderer, so one instance can be shared across threads.
///
/// # Example
///
/// ```
/// use gw_renderer::{RendererOptions, WikiRenderer};
///
/// let renderer = WikiRenderer::new(RendererOptions::default());
/// let html = renderer.render("See [[Foo Bar]]");
/// assert!(html.contains(r#"href="/wiki/Foo-Bar""#));
/// ```
#[derive(Clone, Debug)]
pub struct WikiRenderer {
    options: OptionsSource,
    directives: Arc<DirectiveTable>,
}

impl WikiRenderer {
    /// Create a renderer with fixed options and the built-in directives.
    #[must_use]
    pub fn new(options: RendererOptions) -> Self {
        Self {
            options: OptionsSource::Fixed(options),
            directives: Arc::new(DirectiveTable::builtin()),
        }
    }

    /// Create a renderer that follows `config`.
    #[must_use]
    pub fn from_config(config: ConfigHandle) -> Self {
        Self {
            options: OptionsSource::Live(config),
            directives: Arc::new(DirectiveTable::builtin()),
        }
    }

    /// Replace the directive table.
    #[must_use]
    pub fn with_directives(mut self, directives: Arc<DirectiveTable>) -> Self {
        self.directives = directives;
        self
    }

    #[must_use]
    pub fn options(&self) -> RendererOptions {
        match &self.options {
            OptionsSource::Fixed(options) => options.clone(),
            OptionsSource::Live(config) => RendererOptions::from_config(config),
        }
    }

    /// Render wiki markdown to HTML.
    #[must_use]
    pub fn render(&self, text: &str) -> String {
        let options = self.options();

        let mut tags = TagTable::new(options.proxy_path.as_str());
        let source = tags.extract_tags(text);
        let source = self.directives.apply(&source);
        let source = tags.eval_tags(&source);
        let source = expand_containers(&source);

        let events = Parser::new_ext(&source, parser_options()).into_offset_iter();
        let events = ArrowSpans::new(events, &source, &options.arrow_class);
        let events = Linkify::new(TextMergeStream::new(events));

        let html = MarkdownRenderer::<HtmlBackend>::new()
            .with_anchor_level(options.anchor_level)
            .with_breaks(options.gfm_breaks)
            .render(events);

        tracing::debug!(
            input_len = text.len(),
            output_len = html.len(),
            tags = tags.len(),
            "Rendered page"
        );
        html
    }
}

#[cfg(test)]
mod tests {
    use gw_config::Config;
    use pretty_assertions::assert_eq;

    use super::*;

    fn render(text: &str) -> String {
        WikiRenderer::new(RendererOptions::default()).render(text)
    }

    #[test]
    fn test_wiki_link() {
        assert_eq!(
            render("See [[Foo Bar]]"),
            r#"<p>See <a class="internal" href="/wiki/Foo-Bar">Foo Bar</a></p>"#
        );
    }

    #[test]
    fn test_escaped_wiki_link() {
        // The escape quote stays, typeset as an apostrophe
        assert_eq!(render("See '[[Foo Bar]]"), "<p>See \u{2019}[[Foo Bar]]</p>");
    }

    #[test]
    fn test_smart_punctuation() {
        assert_eq!(
            render("a -- b --- \"c\" 'd' e..."),
            "<p>a \u{2013} b \u{2014} \u{201c}c\u{201d} \u{2018}d\u{2019} e\u{2026}</p>"
        );
    }

    #[test]
    fn test_smart_punctuation_skips_code() {
        assert_eq!(render("`a -- 'b'`"), "<p><code>a -- &#x27;b&#x27;</code></p>");
    }

    #[test]
    fn test_escaped_arrow_markers() {
        assert_eq!(render(r"\<\<x\<\<"), "<p>&lt;&lt;x&lt;&lt;</p>");
        assert_eq!(render("&lt;&lt;x&lt;&lt;"), "<p>&lt;&lt;x&lt;&lt;</p>");
    }

    #[test]
    fn test_arrow_span() {
        assert_eq!(
            render("<<important<<"),
            r#"<p><span class="arrow">important</span></p>"#
        );
    }

    #[test]
    fn test_wiki_link_inside_arrow() {
        assert_eq!(
            render("<<[[A]]<<"),
            r#"<p><span class="arrow"><a class="internal" href="/wiki/A">A</a></span></p>"#
        );
    }

    #[test]
    fn test_unknown_directive_kept() {
        assert_eq!(render("{{NOPE}}"), "<p>{{NOPE}}</p>");
    }

    #[test]
    fn test_toc_directive() {
        let html = render("{{TOC}}\n\n## First\n\n## Second\n");
        assert!(html.contains(r##"<a href="#first">First</a>"##));
        assert!(html.contains(r##"<a href="#second">Second</a>"##));
        assert!(html.contains(r#"<h2 id="first""#));
    }

    #[test]
    fn test_container() {
        assert_eq!(
            render("::: warning\nCareful\n:::\n"),
            "<div class=\"warning\">\n<p>Careful</p></div>\n"
        );
    }

    #[test]
    fn test_breaks_follow_options() {
        let options = RendererOptions {
            gfm_breaks: false,
            ..RendererOptions::default()
        };
        let html = WikiRenderer::new(options).render("a\nb");
        assert_eq!(html, "<p>a\nb</p>");
        assert_eq!(render("a\nb"), "<p>a<br>\nb</p>");
    }

    #[test]
    fn test_custom_directive_table() {
        let table = DirectiveTable::new().with("NOW", |_, _| "noon".to_owned());
        let renderer =
            WikiRenderer::new(RendererOptions::default()).with_directives(Arc::new(table));
        assert_eq!(renderer.render("at {{NOW}}"), "<p>at noon</p>");
        assert_eq!(renderer.render("{{TOC}}"), "<p>{{TOC}}</p>");
    }

    #[test]
    fn test_live_options_follow_config_updates() {
        let handle = ConfigHandle::new(Config::default());
        let renderer = WikiRenderer::from_config(handle.clone());
        assert_eq!(
            renderer.render("[[A]]"),
            r#"<p><a class="internal" href="/wiki/A">A</a></p>"#
        );

        handle.modify(|config| {
            config.application.proxy_path = "/wiki-app".to_owned();
            config.rendering.arrow_class = "hl".to_owned();
        });
        assert_eq!(
            renderer.render("[[A]] <<x<<"),
            r#"<p><a class="internal" href="/wiki-app/wiki/A">A</a> <span class="hl">x</span></p>"#
        );
    }

    #[test]
    fn test_render_is_shareable_across_threads() {
        let renderer = Arc::new(WikiRenderer::new(RendererOptions::default()));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let renderer = Arc::clone(&renderer);
                std::thread::spawn(move || renderer.render(&format!("[[Page {i}]]")))
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            let html = handle.join().unwrap();
            assert!(html.contains(&format!("/wiki/Page-{i}")));
        }
    }
}
