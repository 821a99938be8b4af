//! Generic markdown renderer with pluggable backend.

use std::fmt::Write;
use std::marker::PhantomData;

use pulldown_cmark::{CodeBlockKind, Event, LinkType, Tag, TagEnd};

use crate::backend::RenderBackend;
use crate::state::{Capture, FootnoteState, HeadingState, TableState, escape_html};
use crate::util::heading_level_to_num;

/// Default minimum heading level that receives a permalink.
const DEFAULT_ANCHOR_LEVEL: u8 = 2;

/// Generic markdown renderer with pluggable backend.
///
/// Uses the [`RenderBackend`] trait to delegate format-specific rendering
/// while handling common elements (tables, lists, inline formatting,
/// footnotes, heading anchors) generically.
///
/// A renderer instance holds per-document state; create one per document.
pub struct MarkdownRenderer<B: RenderBackend> {
    output: String,
    /// Code block body, keyed by language.
    code: Capture<Option<String>>,
    table: TableState,
    /// Image alt text, keyed by `(src, title)`.
    image: Capture<(String, String)>,
    heading: HeadingState,
    footnotes: FootnoteState,
    anchor_level: u8,
    breaks: bool,
    _backend: PhantomData<B>,
}

impl<B: RenderBackend> MarkdownRenderer<B> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            code: Capture::default(),
            table: TableState::default(),
            image: Capture::default(),
            heading: HeadingState::default(),
            footnotes: FootnoteState::default(),
            anchor_level: DEFAULT_ANCHOR_LEVEL,
            breaks: false,
            _backend: PhantomData,
        }
    }

    /// Set the minimum heading level that gets a `¶` permalink.
    ///
    /// All headings get an `id` regardless of this setting.
    #[must_use]
    pub fn with_anchor_level(mut self, level: u8) -> Self {
        self.anchor_level = level;
        self
    }

    /// Render soft line breaks as `<br>`.
    #[must_use]
    pub fn with_breaks(mut self, enabled: bool) -> Self {
        self.breaks = enabled;
        self
    }

    /// Push content to output or heading buffer based on context.
    fn push_inline(&mut self, content: &str) {
        if self.image.is_active() {
            // Alt text is plain; formatting inside it is dropped
            return;
        }
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    /// Render markdown events and return the HTML.
    pub fn render<'a, I>(mut self, events: I) -> String
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in events {
            self.process_event(event);
        }
        self.write_footnotes();
        self.output
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) => self.output.push_str(&html),
            Event::InlineHtml(html) => self.push_inline(&html),
            Event::FootnoteReference(label) => self.footnote_reference(&label),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => B::hard_break(&mut self.output),
            Event::Rule => B::horizontal_rule(&mut self.output),
            Event::TaskListMarker(checked) => B::task_list_marker(checked, &mut self.output),
            Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not enabled
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.output.push_str("<p>"),
            Tag::Heading { level, .. } => {
                // Opening tag is written in end_tag after we have the ID.
                self.heading.start_heading(heading_level_to_num(level));
            }
            Tag::BlockQuote(_) => B::blockquote_start(&mut self.output),
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info.split_whitespace().next().map(str::to_owned),
                    CodeBlockKind::Indented => None,
                };
                self.code.begin(lang);
            }
            Tag::List(start) => match start {
                Some(1) => self.output.push_str("<ol>"),
                Some(n) => write!(self.output, r#"<ol start="{n}">"#).unwrap(),
                None => self.output.push_str("<ul>"),
            },
            Tag::Item => self.output.push_str("<li>"),
            Tag::FootnoteDefinition(label) => {
                self.footnotes.start_definition(&label, &mut self.output);
            }
            Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.start_head();
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let align = self.table.current_alignment_style();
                let tag = if self.table.is_in_head() { "th" } else { "td" };
                write!(self.output, "<{tag}{align}>").unwrap();
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<s>"),
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => {
                let href = if link_type == LinkType::Email {
                    format!("mailto:{dest_url}")
                } else {
                    dest_url.to_string()
                };
                let mut link_tag = format!(r#"<a href="{}""#, escape_html(&href));
                if !title.is_empty() {
                    write!(link_tag, r#" title="{}""#, escape_html(&title)).unwrap();
                }
                link_tag.push('>');
                self.push_inline(&link_tag);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                self.image.begin((dest_url.to_string(), title.to_string()));
            }
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.output.push_str("</p>"),
            TagEnd::Heading(_) => self.write_heading(),
            TagEnd::BlockQuote(_) => B::blockquote_end(&mut self.output),
            TagEnd::CodeBlock => {
                if let Some((lang, content)) = self.code.finish() {
                    B::code_block(lang.as_deref(), &content, &mut self.output);
                }
            }
            TagEnd::List(ordered) => self
                .output
                .push_str(if ordered { "</ol>" } else { "</ul>" }),
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::FootnoteDefinition => self.footnotes.end_definition(&mut self.output),
            TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
            TagEnd::Image => {
                if let Some(((src, title), alt)) = self.image.finish() {
                    let mut html = String::new();
                    B::image(&src, &alt, &title, &mut html);
                    self.push_inline(&html);
                }
            }
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.end_head();
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                self.output.push_str(if self.table.is_in_head() {
                    "</th>"
                } else {
                    "</td>"
                });
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</s>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
            TagEnd::Link => self.push_inline("</a>"),
        }
    }

    fn write_heading(&mut self) {
        let Some(heading) = self.heading.complete_heading() else {
            return;
        };
        let level = heading.level;
        let id = escape_html(&heading.id);
        write!(
            self.output,
            r#"<h{level} id="{id}" data-toc-text="{}">"#,
            escape_html(&heading.text)
        )
        .unwrap();
        if level >= self.anchor_level {
            write!(
                self.output,
                r##"<a class="header-anchor" href="#{id}" aria-hidden="true">¶</a> "##
            )
            .unwrap();
        }
        write!(self.output, "{}</h{level}>", heading.html.trim()).unwrap();
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push_str(text);
        } else if self.image.is_active() {
            self.image.push_str(text);
        } else if self.heading.is_active() {
            self.heading.push_text(text);
            self.heading.push_html(&escape_html(text));
        } else {
            self.output.push_str(&escape_html(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if self.image.is_active() {
            self.image.push_str(code);
            return;
        }
        if self.heading.is_active() {
            self.heading.push_text(code);
        }
        self.push_inline(&format!("<code>{}</code>", escape_html(code)));
    }

    fn soft_break(&mut self) {
        if self.image.is_active() {
            self.image.push_str(" ");
        } else if self.heading.is_active() {
            self.heading.push_text(" ");
            self.heading.push_html("\n");
        } else if self.breaks {
            B::hard_break(&mut self.output);
            self.output.push('\n');
        } else {
            self.output.push('\n');
        }
    }

    fn footnote_reference(&mut self, label: &str) {
        let (number, occurrence) = self.footnotes.reference(label);
        let ref_id = if occurrence == 0 {
            format!("fnref{number}")
        } else {
            format!("fnref{number}:{occurrence}")
        };
        self.push_inline(&format!(
            r##"<sup class="footnote-ref"><a href="#fn{number}" id="{ref_id}">[{number}]</a></sup>"##
        ));
    }

    fn write_footnotes(&mut self) {
        if self.footnotes.is_defining() {
            self.footnotes.end_definition(&mut self.output);
        }
        let definitions = self.footnotes.take_ordered();
        if definitions.is_empty() {
            return;
        }

        self.output.push_str(
            r#"<hr class="footnotes-sep"><section class="footnotes"><ol class="footnotes-list">"#,
        );
        for (number, mut body) in definitions {
            let backref =
                format!(r##" <a href="#fnref{number}" class="footnote-backref">↩</a>"##);
            if body.ends_with("</p>") {
                body.insert_str(body.len() - "</p>".len(), &backref);
            } else {
                body.push_str(&backref);
            }
            write!(
                self.output,
                r#"<li id="fn{number}" class="footnote-item">{body}</li>"#
            )
            .unwrap();
        }
        self.output.push_str("</ol></section>");
    }
}

impl<B: RenderBackend> Default for MarkdownRenderer<B> {
    fn default() -> Self {
        Self::new()
    }
}
