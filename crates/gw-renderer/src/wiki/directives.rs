//! `{{name}}` directive expansion.
//!
//! A directive block is `{{` + body + `}}`, where the first body line is the
//! directive name and any further lines are its arguments:
//!
//! ```text
//! {{TOC}}
//!
//! {{include
//! some/page
//! }}
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fmt::Write;
use std::sync::Arc;

use once_cell::sync::Lazy;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use regex::{Captures, Regex};

use crate::state::SlugCounter;
use crate::util::{heading_level_to_num, parser_options};

static DIRECTIVE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{\{(.+?)\}\}").unwrap());

/// Directive function: `(full_text, args) -> replacement`.
pub type DirectiveFn = dyn Fn(&str, &str) -> String + Send + Sync;

/// Registry of named directives.
///
/// Read-only once built; share it between renderers with an `Arc`.
#[derive(Clone, Default)]
pub struct DirectiveTable {
    directives: HashMap<String, Arc<DirectiveFn>>,
}

impl fmt::Debug for DirectiveTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.directives.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("DirectiveTable")
            .field("directives", &names)
            .finish()
    }
}

impl DirectiveTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the built-in directives (`TOC`).
    #[must_use]
    pub fn builtin() -> Self {
        Self::new().with("TOC", |text, _args| table_of_contents(text))
    }

    /// Register a directive, replacing any previous one with the same name.
    #[must_use]
    pub fn with<F>(mut self, name: impl Into<String>, directive: F) -> Self
    where
        F: Fn(&str, &str) -> String + Send + Sync + 'static,
    {
        self.directives.insert(name.into(), Arc::new(directive));
        self
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.directives.contains_key(name)
    }

    /// Expand every known directive block in `text`.
    ///
    /// Blocks naming an unknown directive are kept verbatim.
    #[must_use]
    pub fn apply(&self, text: &str) -> String {
        DIRECTIVE_RE
            .replace_all(text, |caps: &Captures<'_>| {
                let body = &caps[1];
                let mut lines = body.lines();
                let name = lines.next().unwrap_or_default().trim();
                match self.directives.get(name) {
                    Some(directive) => {
                        let args = lines.collect::<Vec<_>>().join("\n");
                        tracing::debug!(directive = name, "Expanding directive");
                        directive(text, &args)
                    }
                    None => caps[0].to_owned(),
                }
            })
            .into_owned()
    }
}

/// Nested markdown list linking to every heading of `text`.
///
/// Anchor ids are assigned the same way the renderer assigns them, so the
/// links resolve in the rendered page.
#[must_use]
pub fn table_of_contents(text: &str) -> String {
    let mut headings: Vec<(u8, String)> = Vec::new();
    let mut current: Option<(u8, String)> = None;

    for event in Parser::new_ext(text, parser_options()) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some((heading_level_to_num(level), String::new()));
            }
            Event::Text(t) | Event::Code(t) => {
                if let Some((_, buffer)) = current.as_mut() {
                    buffer.push_str(&t);
                }
            }
            Event::SoftBreak => {
                if let Some((_, buffer)) = current.as_mut() {
                    buffer.push(' ');
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, buffer)) = current.take() {
                    headings.push((level, buffer.trim().to_owned()));
                }
            }
            _ => {}
        }
    }

    let Some(min_level) = headings.iter().map(|(level, _)| *level).min() else {
        return String::new();
    };

    let mut ids = SlugCounter::new();
    let mut toc = String::new();
    for (level, title) in &headings {
        let id = ids.next_id(title);
        let indent = "  ".repeat(usize::from(level - min_level));
        writeln!(toc, "{indent}- [{}](#{id})", escape_link_text(title)).unwrap();
    }
    toc
}

fn escape_link_text(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_known_directive_replaced() {
        let table = DirectiveTable::new().with("HELLO", |_, _| "hi".to_owned());
        assert_eq!(table.apply("say {{HELLO}}!"), "say hi!");
    }

    #[test]
    fn test_unknown_directive_verbatim() {
        let table = DirectiveTable::new();
        assert_eq!(table.apply("x {{NOPE}} y"), "x {{NOPE}} y");
    }

    #[test]
    fn test_multiline_args() {
        let table = DirectiveTable::new().with("ECHO", |_, args| format!("[{args}]"));
        assert_eq!(table.apply("{{ ECHO \none\ntwo}}"), "[one\ntwo]");
    }

    #[test]
    fn test_directive_receives_full_text() {
        let table = DirectiveTable::new().with("LEN", |text, _| text.len().to_string());
        assert_eq!(table.apply("abc {{LEN}}"), "abc 11");
    }

    #[test]
    fn test_unbalanced_braces_literal() {
        let table = DirectiveTable::builtin();
        assert_eq!(table.apply("{{TOC"), "{{TOC");
        assert_eq!(table.apply("TOC}}"), "TOC}}");
    }

    #[test]
    fn test_table_of_contents_nesting() {
        let text = "# Intro\n\n## Setup\n\n### Details\n\n## Setup\n";
        assert_eq!(
            table_of_contents(text),
            "- [Intro](#intro)\n  - [Setup](#setup)\n    - [Details](#details)\n  - [Setup](#setup-1)\n"
        );
    }

    #[test]
    fn test_table_of_contents_skips_fenced_headings() {
        let text = "## Real\n\n```\n# not a heading\n```\n";
        assert_eq!(table_of_contents(text), "- [Real](#real)\n");
    }

    #[test]
    fn test_table_of_contents_empty() {
        assert_eq!(table_of_contents("no headings"), "");
    }

    #[test]
    fn test_builtin_has_toc() {
        let table = DirectiveTable::builtin();
        assert!(table.contains("TOC"));
        assert_eq!(table.apply("{{TOC}}\n\n## A"), "- [A](#a)\n\n\n## A");
    }
}
