//! Arrow spans: `<<text<<` renders as `<span class="arrow">text</span>`.
//!
//! Implemented as an adapter over the pulldown-cmark event stream. Inline
//! events are buffered per block, runs of `<` inside text become delimiters,
//! and delimiters are paired with the same rules used for emphasis:
//!
//! - A run of two or more markers is split into pairs. With an odd length the
//!   leftover marker comes first and stays literal.
//! - Open and close eligibility follow left/right flanking rules computed from
//!   the characters around the whole run.
//! - A closer pairs with the nearest unmatched opener at the same link depth,
//!   skipping pairs of its own run.
//!   Emphasis and strong nesting is not considered, so a span may open inside
//!   `<em>` and close after it.
//! - Unmatched pairs are emitted as literal `<<`.
//! - A leftover marker directly before a matched closer is moved behind the
//!   run of consecutive closers so it never ends up inside the span.
//!
//! Text inside code blocks and inline code is never touched, and neither is
//! a `<` written as `\<` or as an entity such as `&lt;`. The adapter reads the
//! parser's offset stream to tell those apart from literal markers, and merges
//! adjacent text itself.

use std::collections::VecDeque;
use std::ops::Range;

use pulldown_cmark::{Event, Tag, TagEnd};

const MARKER: char = '<';
const PAIR: &str = "<<";

/// Character class used for flanking decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CharClass {
    Whitespace,
    Punctuation,
    Other,
}

impl CharClass {
    fn of(c: char) -> Self {
        if c.is_whitespace() {
            Self::Whitespace
        } else if c.is_ascii_punctuation() || (!c.is_ascii() && !c.is_alphanumeric()) {
            Self::Punctuation
        } else {
            Self::Other
        }
    }

    /// Class of the neighbouring event when a run touches a text boundary.
    fn of_neighbour(event: Option<&Event<'_>>, take_last: bool) -> Self {
        match event {
            None | Some(Event::SoftBreak | Event::HardBreak) => Self::Whitespace,
            Some(Event::Text(text)) => {
                let c = if take_last {
                    text.chars().next_back()
                } else {
                    text.chars().next()
                };
                c.map_or(Self::Whitespace, Self::of)
            }
            // Markup around inline elements (`*`, `]`, `` ` ``, `>`) is punctuation
            Some(_) => Self::Punctuation,
        }
    }
}

/// Open/close eligibility of a marker run.
fn flanking(before: CharClass, after: CharClass) -> (bool, bool) {
    let left = after != CharClass::Whitespace
        && (after != CharClass::Punctuation || before != CharClass::Other);
    let right = before != CharClass::Whitespace
        && (before != CharClass::Punctuation || after != CharClass::Other);
    (left, right)
}

#[derive(Debug)]
struct Delimiter {
    /// Index into the piece list.
    piece: usize,
    /// Delimiters to skip when walking back from this one.
    jump: usize,
    /// Link nesting depth.
    level: usize,
    open: bool,
    close: bool,
    /// Index of the matching closer once paired as an opener.
    end: Option<usize>,
    /// Set when paired as a closer.
    closed: bool,
}

enum Piece<'a> {
    Event(Event<'a>),
    Text(String),
    /// Odd leftover marker of a run.
    Lone,
    /// A `<<` pair; index into the delimiter list.
    Pair(usize),
}

/// Event adapter that turns `<<...<<` into arrow spans.
///
/// Consumes `(event, source range)` pairs as produced by
/// [`Parser::into_offset_iter`](pulldown_cmark::Parser::into_offset_iter).
pub struct ArrowSpans<'a, I> {
    inner: I,
    source: &'a str,
    open_tag: String,
    segment: Vec<Event<'a>>,
    /// Byte offsets of escaped markers, parallel to `segment`.
    escaped: Vec<Vec<usize>>,
    ready: VecDeque<Event<'a>>,
    /// Depth of code or metadata blocks.
    raw_depth: usize,
    exhausted: bool,
}

impl<'a, I> ArrowSpans<'a, I>
where
    I: Iterator<Item = (Event<'a>, Range<usize>)>,
{
    /// Wrap the offset stream parsed from `source`, stamping `class` on
    /// opening spans.
    pub fn new(inner: I, source: &'a str, class: &str) -> Self {
        Self {
            inner,
            source,
            open_tag: format!(r#"<span class="{}">"#, crate::escape_html(class)),
            segment: Vec::new(),
            escaped: Vec::new(),
            ready: VecDeque::new(),
            raw_depth: 0,
            exhausted: false,
        }
    }

    fn flush_segment(&mut self) {
        if self.segment.is_empty() {
            return;
        }
        let events = std::mem::take(&mut self.segment);
        let escaped = std::mem::take(&mut self.escaped);
        let processed = process_segment(events, &escaped, &self.open_tag);
        self.ready.extend(processed);
    }

    fn accept(&mut self, event: Event<'a>, range: Range<usize>) {
        match &event {
            Event::Start(Tag::CodeBlock(_) | Tag::MetadataBlock(_)) => {
                self.flush_segment();
                self.raw_depth += 1;
                self.ready.push_back(event);
            }
            Event::End(TagEnd::CodeBlock | TagEnd::MetadataBlock(_)) => {
                self.raw_depth = self.raw_depth.saturating_sub(1);
                self.ready.push_back(event);
            }
            _ if self.raw_depth > 0 => self.ready.push_back(event),
            _ if is_block_boundary(&event) => {
                self.flush_segment();
                self.ready.push_back(event);
            }
            Event::Text(text) => {
                let escaped = escaped_markers(self.source, text, range);
                self.push_text(event, escaped);
            }
            _ => {
                self.segment.push(event);
                self.escaped.push(Vec::new());
            }
        }
    }

    /// Append text to the segment, merging with a preceding text event.
    fn push_text(&mut self, event: Event<'a>, escaped: Vec<usize>) {
        let Event::Text(text) = event else {
            return;
        };
        if let (Some(Event::Text(last)), Some(last_escaped)) =
            (self.segment.last_mut(), self.escaped.last_mut())
        {
            let shift = last.len();
            last_escaped.extend(escaped.into_iter().map(|offset| offset + shift));
            let mut merged = std::mem::replace(last, "".into()).into_string();
            merged.push_str(&text);
            *last = merged.into();
            return;
        }
        self.segment.push(Event::Text(text));
        self.escaped.push(escaped);
    }
}

/// Offsets of the markers in `text` that do not stand for themselves.
///
/// A backslash escape starts a new text node at the escaped character, so an
/// escaped marker is one at the start of the node behind an odd number of
/// backslashes. Entity references produce nodes whose text differs from the
/// source they were read from.
fn escaped_markers(source: &str, text: &str, range: Range<usize>) -> Vec<usize> {
    let Some(raw) = source.get(range.clone()) else {
        return Vec::new();
    };
    if raw == text {
        let backslashes = source[..range.start]
            .bytes()
            .rev()
            .take_while(|&b| b == b'\\')
            .count();
        return if text.starts_with(MARKER) && backslashes % 2 == 1 {
            vec![0]
        } else {
            Vec::new()
        };
    }
    if raw.contains(MARKER) {
        return Vec::new();
    }
    text.match_indices(MARKER).map(|(offset, _)| offset).collect()
}

impl<'a, I> Iterator for ArrowSpans<'a, I>
where
    I: Iterator<Item = (Event<'a>, Range<usize>)>,
{
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Event<'a>> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return Some(event);
            }
            if self.exhausted {
                return None;
            }
            match self.inner.next() {
                Some((event, range)) => self.accept(event, range),
                None => {
                    self.exhausted = true;
                    self.flush_segment();
                }
            }
        }
    }
}

/// Events that end an inline run.
fn is_block_boundary(event: &Event<'_>) -> bool {
    match event {
        Event::Start(tag) => !is_inline_tag(tag),
        Event::End(tag) => !is_inline_tag_end(*tag),
        Event::Html(_) | Event::Rule | Event::TaskListMarker(_) | Event::DisplayMath(_) => true,
        _ => false,
    }
}

fn is_inline_tag(tag: &Tag<'_>) -> bool {
    matches!(
        tag,
        Tag::Emphasis
            | Tag::Strong
            | Tag::Strikethrough
            | Tag::Superscript
            | Tag::Subscript
            | Tag::Link { .. }
            | Tag::Image { .. }
    )
}

fn is_inline_tag_end(tag: TagEnd) -> bool {
    matches!(
        tag,
        TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Superscript
            | TagEnd::Subscript
            | TagEnd::Link
            | TagEnd::Image
    )
}

/// Tokenize, balance and rewrite one inline run.
fn process_segment<'a>(
    events: Vec<Event<'a>>,
    escaped: &[Vec<usize>],
    open_tag: &str,
) -> Vec<Event<'a>> {
    if !events
        .iter()
        .any(|e| matches!(e, Event::Text(t) if t.contains(PAIR)))
    {
        return events;
    }

    let (mut pieces, mut delimiters) = tokenize(events, escaped);
    balance_pairs(&mut delimiters);
    relocate_lone_markers(&mut pieces, &delimiters);

    let mut output = Vec::with_capacity(pieces.len());
    let mut text = String::new();
    for piece in pieces {
        match piece {
            Piece::Text(s) => text.push_str(&s),
            Piece::Lone => text.push(MARKER),
            Piece::Pair(d) => {
                let delimiter = &delimiters[d];
                let tag = if delimiter.end.is_some() {
                    open_tag
                } else if delimiter.closed {
                    "</span>"
                } else {
                    text.push_str(PAIR);
                    continue;
                };
                flush_text(&mut text, &mut output);
                output.push(Event::InlineHtml(tag.to_owned().into()));
            }
            Piece::Event(event) => {
                flush_text(&mut text, &mut output);
                output.push(event);
            }
        }
    }
    flush_text(&mut text, &mut output);
    output
}

fn flush_text(text: &mut String, output: &mut Vec<Event<'_>>) {
    if !text.is_empty() {
        output.push(Event::Text(std::mem::take(text).into()));
    }
}

/// Split text events into literal pieces and `<<` delimiters.
fn tokenize<'a>(
    events: Vec<Event<'a>>,
    escaped: &[Vec<usize>],
) -> (Vec<Piece<'a>>, Vec<Delimiter>) {
    let edges: Vec<(CharClass, CharClass)> = (0..events.len())
        .map(|i| {
            let before = CharClass::of_neighbour(i.checked_sub(1).and_then(|p| events.get(p)), true);
            let after = CharClass::of_neighbour(events.get(i + 1), false);
            (before, after)
        })
        .collect();

    let mut pieces = Vec::new();
    let mut delimiters = Vec::new();
    let mut level = 0usize;
    let mut image_depth = 0usize;

    for (i, (event, edge)) in events.into_iter().zip(edges).enumerate() {
        match event {
            Event::Text(text) if image_depth == 0 && text.contains(PAIR) => {
                let run = TextRun {
                    text: &text,
                    escaped: escaped.get(i).map_or(&[][..], Vec::as_slice),
                    edge,
                    level,
                };
                run.tokenize(&mut pieces, &mut delimiters);
            }
            other => {
                match &other {
                    Event::Start(Tag::Link { .. }) => level += 1,
                    Event::End(TagEnd::Link) => level = level.saturating_sub(1),
                    Event::Start(Tag::Image { .. }) => image_depth += 1,
                    Event::End(TagEnd::Image) => image_depth = image_depth.saturating_sub(1),
                    _ => {}
                }
                pieces.push(Piece::Event(other));
            }
        }
    }

    (pieces, delimiters)
}

/// One merged text event being split into pieces.
struct TextRun<'t> {
    text: &'t str,
    /// Sorted offsets of markers that must stay literal.
    escaped: &'t [usize],
    /// Character classes just outside the text.
    edge: (CharClass, CharClass),
    level: usize,
}

impl TextRun<'_> {
    fn is_marker(&self, offset: usize, c: char) -> bool {
        c == MARKER && self.escaped.binary_search(&offset).is_err()
    }

    fn tokenize(&self, pieces: &mut Vec<Piece<'_>>, delimiters: &mut Vec<Delimiter>) {
        let text = self.text;
        let mut literal_start = 0;
        let mut chars = text.char_indices().peekable();

        while let Some((start, c)) = chars.next() {
            if !self.is_marker(start, c) {
                continue;
            }
            let mut end = start + 1;
            while let Some(&(offset, c)) = chars.peek() {
                if !self.is_marker(offset, c) {
                    break;
                }
                end = offset + 1;
                chars.next();
            }
            // Markers are one byte each
            let run_len = end - start;
            if run_len < 2 {
                continue;
            }

            let before = text[..start].chars().next_back().map_or(self.edge.0, CharClass::of);
            let after = text[end..].chars().next().map_or(self.edge.1, CharClass::of);
            let (can_open, can_close) = flanking(before, after);

            if literal_start < start {
                pieces.push(Piece::Text(text[literal_start..start].to_owned()));
            }
            if run_len % 2 == 1 {
                pieces.push(Piece::Lone);
            }
            for jump in 0..run_len / 2 {
                delimiters.push(Delimiter {
                    piece: pieces.len(),
                    jump,
                    level: self.level,
                    open: can_open,
                    close: can_close,
                    end: None,
                    closed: false,
                });
                pieces.push(Piece::Pair(delimiters.len() - 1));
            }
            literal_start = end;
        }

        if literal_start < text.len() {
            pieces.push(Piece::Text(text[literal_start..].to_owned()));
        }
    }
}

/// Pair closers with the nearest eligible opener.
fn balance_pairs(delimiters: &mut [Delimiter]) {
    for i in 0..delimiters.len() {
        if !delimiters[i].close {
            continue;
        }

        let mut j = i.checked_sub(delimiters[i].jump + 1);
        while let Some(candidate) = j {
            let opener = &delimiters[candidate];
            if opener.open && opener.end.is_none() && opener.level == delimiters[i].level {
                delimiters[i].jump = i - candidate;
                delimiters[i].open = false;
                delimiters[i].closed = true;
                delimiters[candidate].end = Some(i);
                delimiters[candidate].jump = 0;
                break;
            }
            j = candidate.checked_sub(opener.jump + 1);
        }
    }
}

/// Move leftover markers found right before a closer behind the closer run.
fn relocate_lone_markers(pieces: &mut [Piece<'_>], delimiters: &[Delimiter]) {
    let is_closer =
        |piece: &Piece<'_>| matches!(piece, Piece::Pair(d) if delimiters[*d].closed);

    let mut lone: Vec<usize> = delimiters
        .iter()
        .filter_map(|opener| opener.end)
        .map(|closer| delimiters[closer].piece)
        .filter(|&piece| piece > 0 && matches!(pieces[piece - 1], Piece::Lone))
        .map(|piece| piece - 1)
        .collect();

    while let Some(i) = lone.pop() {
        let mut j = i + 1;
        while j < pieces.len() && is_closer(&pieces[j]) {
            j += 1;
        }
        j -= 1;
        if i != j {
            pieces.swap(i, j);
        }
    }
}
