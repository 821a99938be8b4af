//! Turns bare `http(s)://` URLs in text into links.

use std::collections::VecDeque;

use once_cell::sync::Lazy;
use pulldown_cmark::{CowStr, Event, LinkType, Tag, TagEnd};
use regex::Regex;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s<>"]+"#).unwrap());

/// Trailing characters that end a sentence rather than a URL.
const TRAILING: &[char] = &['.', ',', ':', ';', '!', '?', '\'', '"'];

/// Event adapter that wraps bare URLs in `Tag::Link` events.
///
/// Text already inside links, images or code blocks is left as-is.
pub struct Linkify<'a, I> {
    inner: I,
    pending: VecDeque<Event<'a>>,
    /// Depth of links, images and code blocks.
    skip_depth: usize,
}

impl<'a, I> Linkify<'a, I>
where
    I: Iterator<Item = Event<'a>>,
{
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            pending: VecDeque::new(),
            skip_depth: 0,
        }
    }
}

impl<'a, I> Iterator for Linkify<'a, I>
where
    I: Iterator<Item = Event<'a>>,
{
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Event<'a>> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }

        let event = self.inner.next()?;
        match &event {
            Event::Start(Tag::Link { .. } | Tag::Image { .. } | Tag::CodeBlock(_)) => {
                self.skip_depth += 1;
            }
            Event::End(TagEnd::Link | TagEnd::Image | TagEnd::CodeBlock) => {
                self.skip_depth = self.skip_depth.saturating_sub(1);
            }
            Event::Text(text) if self.skip_depth == 0 && URL_RE.is_match(text) => {
                self.pending = split_urls(text);
                return self.pending.pop_front();
            }
            _ => {}
        }
        Some(event)
    }
}

/// Byte length of `url` once sentence punctuation and unbalanced `)` are cut.
fn trimmed_len(url: &str) -> usize {
    let mut end = url.len();
    loop {
        let candidate = &url[..end];
        if let Some(stripped) = candidate.strip_suffix(TRAILING) {
            end = stripped.len();
        } else if candidate.ends_with(')')
            && candidate.matches(')').count() > candidate.matches('(').count()
        {
            end -= 1;
        } else {
            return end;
        }
    }
}

fn split_urls<'a>(text: &str) -> VecDeque<Event<'a>> {
    let mut events = VecDeque::new();
    let mut last = 0;

    for found in URL_RE.find_iter(text) {
        let url = &found.as_str()[..trimmed_len(found.as_str())];
        if url.len() <= "https://".len() {
            continue;
        }
        if found.start() > last {
            events.push_back(Event::Text(text[last..found.start()].to_owned().into()));
        }
        events.push_back(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: url.to_owned().into(),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        }));
        events.push_back(Event::Text(url.to_owned().into()));
        events.push_back(Event::End(TagEnd::Link));
        last = found.start() + url.len();
    }

    if last < text.len() {
        events.push_back(Event::Text(text[last..].to_owned().into()));
    }
    events
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use pulldown_cmark::{Parser, TextMergeStream};

    use super::*;
    use crate::{HtmlBackend, MarkdownRenderer};
    use crate::util::parser_options;

    fn render(markdown: &str) -> String {
        let events = TextMergeStream::new(Parser::new_ext(markdown, parser_options()));
        MarkdownRenderer::<HtmlBackend>::new().render(Linkify::new(events))
    }

    #[test]
    fn test_bare_url_becomes_link() {
        assert_eq!(
            render("See https://example.com/a?b=c for more"),
            r#"<p>See <a href="https://example.com/a?b=c">https://example.com/a?b=c</a> for more</p>"#
        );
    }

    #[test]
    fn test_trailing_punctuation_excluded() {
        assert_eq!(
            render("Visit http://example.com."),
            r#"<p>Visit <a href="http://example.com">http://example.com</a>.</p>"#
        );
    }

    #[test]
    fn test_unbalanced_paren_excluded() {
        assert_eq!(
            render("(see http://x.org/a_(b))"),
            r#"<p>(see <a href="http://x.org/a_(b)">http://x.org/a_(b)</a>)</p>"#
        );
    }

    #[test]
    fn test_existing_link_untouched() {
        assert_eq!(
            render("[http://a.com](http://a.com)"),
            r#"<p><a href="http://a.com">http://a.com</a></p>"#
        );
    }

    #[test]
    fn test_code_untouched() {
        assert_eq!(
            render("`http://a.com`"),
            "<p><code>http://a.com</code></p>"
        );
    }

    #[test]
    fn test_trimmed_len() {
        assert_eq!(trimmed_len("http://a.com/x),."), "http://a.com/x".len());
        assert_eq!(trimmed_len("http://a.com/(x)"), "http://a.com/(x)".len());
    }
}
