//! Bookkeeping for the renderer's walk over the event stream.

use std::collections::HashMap;

use pulldown_cmark::Alignment;

/// Text collected between a start and an end event.
///
/// `M` carries what the start tag knew (code language, image source) so it
/// comes back together with the text.
pub(crate) struct Capture<M> {
    open: Option<M>,
    text: String,
}

impl<M> Default for Capture<M> {
    fn default() -> Self {
        Self {
            open: None,
            text: String::new(),
        }
    }
}

impl<M> Capture<M> {
    pub(crate) fn begin(&mut self, meta: M) {
        self.open = Some(meta);
        self.text.clear();
    }

    /// Close the capture; `None` if none was open.
    pub(crate) fn finish(&mut self) -> Option<(M, String)> {
        let meta = self.open.take()?;
        Some((meta, std::mem::take(&mut self.text)))
    }

    pub(crate) fn is_active(&self) -> bool {
        self.open.is_some()
    }

    pub(crate) fn push_str(&mut self, text: &str) {
        self.text.push_str(text);
    }
}

/// State for tracking table rendering.
#[derive(Default)]
pub(crate) struct TableState {
    in_head: bool,
    alignments: Vec<Alignment>,
    cell_index: usize,
}

impl TableState {
    /// Start a new table with column alignments.
    pub(crate) fn start(&mut self, alignments: Vec<Alignment>) {
        self.alignments = alignments;
        self.in_head = false;
        self.cell_index = 0;
    }

    pub(crate) fn start_head(&mut self) {
        self.in_head = true;
        self.cell_index = 0;
    }

    pub(crate) fn end_head(&mut self) {
        self.in_head = false;
    }

    pub(crate) fn start_row(&mut self) {
        self.cell_index = 0;
    }

    pub(crate) fn next_cell(&mut self) {
        self.cell_index += 1;
    }

    pub(crate) fn is_in_head(&self) -> bool {
        self.in_head
    }

    /// Get the alignment style for the current cell.
    pub(crate) fn current_alignment_style(&self) -> &'static str {
        match self.alignments.get(self.cell_index) {
            Some(Alignment::Left) => r#" style="text-align:left""#,
            Some(Alignment::Center) => r#" style="text-align:center""#,
            Some(Alignment::Right) => r#" style="text-align:right""#,
            Some(Alignment::None) | None => "",
        }
    }
}

/// Generates unique heading anchor ids.
///
/// The first occurrence of a slug is used as-is, later duplicates get a
/// numeric suffix: `faq`, `faq-1`, `faq-2`.
#[derive(Debug, Default)]
pub struct SlugCounter {
    counts: HashMap<String, usize>,
}

impl SlugCounter {
    /// Create an empty counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Unique id for a heading with the given plain text.
    pub fn next_id(&mut self, text: &str) -> String {
        let base_id = slugify(text);
        let count = self.counts.entry(base_id.clone()).or_default();
        let id = match *count {
            0 => base_id,
            n => format!("{base_id}-{n}"),
        };
        *count += 1;
        id
    }
}

/// A heading that has been fully collected.
pub(crate) struct CompletedHeading {
    pub(crate) level: u8,
    pub(crate) id: String,
    pub(crate) text: String,
    pub(crate) html: String,
}

/// State for tracking heading text and anchor ids.
#[derive(Default)]
pub(crate) struct HeadingState {
    current_level: Option<u8>,
    /// Plain text (for `data-toc-text` and the slug).
    text: String,
    /// Inline HTML (with formatting).
    html: String,
    ids: SlugCounter,
}

impl HeadingState {
    pub(crate) fn is_active(&self) -> bool {
        self.current_level.is_some()
    }

    pub(crate) fn start_heading(&mut self, level: u8) {
        self.current_level = Some(level);
        self.text.clear();
        self.html.clear();
    }

    /// Complete the heading and assign its id.
    pub(crate) fn complete_heading(&mut self) -> Option<CompletedHeading> {
        let level = self.current_level.take()?;
        let text = std::mem::take(&mut self.text).trim().to_owned();
        let html = std::mem::take(&mut self.html);
        let id = self.ids.next_id(&text);
        Some(CompletedHeading {
            level,
            id,
            text,
            html,
        })
    }

    pub(crate) fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub(crate) fn push_html(&mut self, html: &str) {
        self.html.push_str(html);
    }
}

/// Footnote numbering and collected definitions.
///
/// References are numbered by first use. Definitions are rendered into their
/// own buffer and emitted together at the end of the document.
#[derive(Default)]
pub(crate) struct FootnoteState {
    /// Label -> (number, reference count).
    numbers: HashMap<String, (usize, usize)>,
    /// Rendered definitions by label.
    definitions: HashMap<String, String>,
    /// Label of the definition currently being rendered.
    current: Option<String>,
    /// Output saved while a definition is being rendered.
    saved_output: String,
}

impl FootnoteState {
    /// Register a reference and return `(number, occurrence)`.
    ///
    /// `occurrence` is 0 for the first reference to a label.
    pub(crate) fn reference(&mut self, label: &str) -> (usize, usize) {
        let next = self.numbers.len() + 1;
        let entry = self.numbers.entry(label.to_owned()).or_insert((next, 0));
        let occurrence = entry.1;
        entry.1 += 1;
        (entry.0, occurrence)
    }

    pub(crate) fn is_defining(&self) -> bool {
        self.current.is_some()
    }

    /// Begin a definition, parking the main output.
    pub(crate) fn start_definition(&mut self, label: &str, output: &mut String) {
        self.current = Some(label.to_owned());
        self.saved_output = std::mem::take(output);
    }

    /// Finish a definition, restoring the main output.
    pub(crate) fn end_definition(&mut self, output: &mut String) {
        let body = std::mem::replace(output, std::mem::take(&mut self.saved_output));
        if let Some(label) = self.current.take() {
            self.definitions.insert(label, body);
        }
    }

    /// Referenced definitions ordered by footnote number.
    pub(crate) fn take_ordered(&mut self) -> Vec<(usize, String)> {
        let mut ordered: Vec<(usize, String)> = self
            .numbers
            .iter()
            .filter_map(|(label, (number, _))| {
                self.definitions.remove(label).map(|body| (*number, body))
            })
            .collect();
        ordered.sort_by_key(|(number, _)| *number);
        ordered
    }
}

/// Convert text to URL-safe slug.
///
/// Converts to lowercase, replaces whitespace/dashes/underscores with single
/// dashes, and removes other non-alphanumeric characters. Non-ASCII letters are
/// kept so headings in other scripts still get meaningful ids.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true; // Prevents leading dash

    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            result.extend(c.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
