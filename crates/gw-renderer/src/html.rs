//! HTML backend for markdown rendering.

use std::fmt::Write;

use crate::backend::RenderBackend;
use crate::highlight;
use crate::state::escape_html;

/// HTML render backend.
///
/// Produces HTML5 with:
/// - syntect-highlighted `<pre class="syntax-highlight"><code class="md-code">` blocks
/// - `<img>` for images
/// - disabled task list checkboxes
pub struct HtmlBackend;

impl RenderBackend for HtmlBackend {
    fn code_block(lang: Option<&str>, content: &str, out: &mut String) {
        let body = highlight::highlight(lang, content).unwrap_or_else(|| highlight::plain(content));
        match lang {
            Some(lang) => write!(
                out,
                r#"<pre class="syntax-highlight"><code class="md-code language-{}">{body}</code></pre>"#,
                escape_html(lang)
            )
            .unwrap(),
            None => write!(
                out,
                r#"<pre class="syntax-highlight"><code class="md-code">{body}</code></pre>"#
            )
            .unwrap(),
        }
    }

    fn image(src: &str, alt: &str, title: &str, out: &mut String) {
        let title_attr = if title.is_empty() {
            String::new()
        } else {
            format!(r#" title="{}""#, escape_html(title))
        };
        write!(
            out,
            r#"<img src="{}"{title_attr} alt="{}">"#,
            escape_html(src),
            escape_html(alt)
        )
        .unwrap();
    }
}
