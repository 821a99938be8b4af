//! Output format hooks for [`MarkdownRenderer`](crate::MarkdownRenderer).

/// Leaf elements whose markup depends on the output format.
///
/// The renderer owns document structure (paragraphs, lists, tables, links);
/// everything here is written straight into `out`. Only code blocks and
/// images have no sensible default.
pub trait RenderBackend {
    /// Fenced or indented code; `lang` is the info string's first word.
    fn code_block(lang: Option<&str>, content: &str, out: &mut String);

    fn image(src: &str, alt: &str, title: &str, out: &mut String);

    fn blockquote_start(out: &mut String) {
        out.push_str("<blockquote>");
    }

    fn blockquote_end(out: &mut String) {
        out.push_str("</blockquote>");
    }

    /// Used for explicit hard breaks and, with GFM breaks on, for soft ones.
    fn hard_break(out: &mut String) {
        out.push_str("<br>");
    }

    fn horizontal_rule(out: &mut String) {
        out.push_str("<hr>");
    }

    /// Read-only checkbox; task items are toggled by editing the page source.
    fn task_list_marker(checked: bool, out: &mut String) {
        out.push_str(r#"<input class="task-list-item-checkbox" type="checkbox""#);
        if checked {
            out.push_str(" checked");
        }
        out.push_str(" disabled> ");
    }
}
