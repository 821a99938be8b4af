//! Syntax highlighting for fenced code blocks.

use once_cell::sync::Lazy;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::state::escape_html;

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "syntax-" };

/// Highlight `code` as `language`, returning classed HTML spans.
///
/// Unknown or absent languages fall back to plain text, which still escapes
/// the content. Returns `None` only when syntect fails on a line; callers
/// then emit the escaped source instead.
pub(crate) fn highlight(language: Option<&str>, code: &str) -> Option<String> {
    let syntax_set = &*SYNTAX_SET;
    let syntax = language
        .and_then(|lang| find_syntax(syntax_set, lang))
        .unwrap_or_else(|| syntax_set.find_syntax_plain_text());

    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, syntax_set, CLASS_STYLE);

    let mut source = code.to_owned();
    if !source.ends_with('\n') {
        source.push('\n');
    }

    for line in LinesWithEndings::from(source.as_str()) {
        if let Err(err) = generator.parse_html_for_line_which_includes_newline(line) {
            tracing::warn!(
                language = language.unwrap_or("text"),
                error = %err,
                "Syntax highlighting failed"
            );
            return None;
        }
    }

    Some(generator.finalize())
}

/// Escaped source used when highlighting is unavailable.
pub(crate) fn plain(code: &str) -> String {
    escape_html(code)
}

fn find_syntax<'a>(syntax_set: &'a SyntaxSet, token: &str) -> Option<&'a SyntaxReference> {
    let lowercase = token.to_ascii_lowercase();
    syntax_set
        .find_syntax_by_token(&lowercase)
        .or_else(|| syntax_set.find_syntax_by_name(token))
        .or_else(|| syntax_set.find_syntax_by_extension(&lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_language_produces_classes() {
        let html = highlight(Some("rust"), "fn main() {}").unwrap();
        assert!(html.contains("syntax-"));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_unknown_language_escapes_as_plain_text() {
        let html = highlight(Some("no-such-language"), "a < b").unwrap();
        assert!(html.contains("a &lt; b"));
    }

    #[test]
    fn test_plain_escapes() {
        assert_eq!(plain("<b>"), "&lt;b&gt;");
    }
}
