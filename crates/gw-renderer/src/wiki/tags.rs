//! `[[Page]]` and `[[Label|Page]]` internal links.
//!
//! Links are resolved in two steps around directive expansion: extraction
//! swaps each tag for an opaque identifier so that directives and the markdown
//! parser never see bracket syntax, and evaluation swaps identifiers for the
//! final anchor HTML.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;
use sha1::{Digest, Sha1};

use crate::state::escape_html;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[(.+?)\]\]").unwrap());

/// Characters left unencoded in page URLs (matches `encodeURIComponent`).
const PAGE_NAME: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Marker that keeps a tag literal when placed right before it.
const ESCAPE: char = '\'';

/// Characters removed from page names.
const FORBIDDEN: &[char] = &['/', '\\', '?', '%', '*', ':', '|', '"', '<', '>'];

/// Convert a page title into its file name stem.
///
/// Whitespace becomes `-`; path and shell metacharacters are removed.
///
/// ```
/// use gw_renderer::wikify;
///
/// assert_eq!(wikify("Foo Bar"), "Foo-Bar");
/// assert_eq!(wikify("What? Now: a/b"), "What-Now-ab");
/// ```
#[must_use]
pub fn wikify(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_whitespace() {
            result.push('-');
        } else if !FORBIDDEN.contains(&c) {
            result.push(c);
        }
    }
    result
}

/// Render-scoped table of extracted wiki link tags.
///
/// A fresh table is created for every render call, so concurrent renders never
/// share state.
#[derive(Debug)]
pub struct TagTable {
    proxy_path: String,
    /// Identifier -> bracket payload.
    tags: BTreeMap<String, String>,
}

impl TagTable {
    /// Create an empty table; links are prefixed with `proxy_path`.
    #[must_use]
    pub fn new(proxy_path: impl Into<String>) -> Self {
        Self {
            proxy_path: proxy_path.into(),
            tags: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Replace every unescaped tag with its identifier and record it.
    ///
    /// Tags preceded by `'` are left untouched, escape marker included.
    pub fn extract_tags(&mut self, text: &str) -> String {
        let mut output = String::with_capacity(text.len());
        let mut last = 0;

        for caps in TAG_RE.captures_iter(text) {
            let (Some(whole), Some(payload)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if text[..whole.start()].ends_with(ESCAPE) {
                continue;
            }
            let id = tag_id(payload.as_str());
            output.push_str(&text[last..whole.start()]);
            output.push_str(&id);
            self.tags.entry(id).or_insert_with(|| payload.as_str().to_owned());
            last = whole.end();
        }

        output.push_str(&text[last..]);
        output
    }

    /// Replace every recorded identifier with an internal link.
    #[must_use]
    pub fn eval_tags(&self, text: &str) -> String {
        self.tags
            .iter()
            .fold(text.to_owned(), |acc, (id, payload)| {
                acc.replace(id.as_str(), &self.anchor(payload))
            })
    }

    /// Anchor HTML for a `label|target` payload.
    fn anchor(&self, payload: &str) -> String {
        let (label, target) = match payload.split_once('|') {
            Some((label, target)) if !target.trim().is_empty() => (label.trim(), target.trim()),
            Some((label, _)) => (label.trim(), label.trim()),
            None => (payload.trim(), payload.trim()),
        };
        let page = utf8_percent_encode(&wikify(target), PAGE_NAME).to_string();
        format!(
            r#"<a class="internal" href="{}/wiki/{page}">{}</a>"#,
            escape_html(&self.proxy_path),
            escape_html(label)
        )
    }
}

/// Content-derived identifier of a tag payload.
fn tag_id(payload: &str) -> String {
    hex::encode(Sha1::digest(payload.as_bytes()))
}
