//! Fenced code block detection for the line-based rewriting passes.

/// How a line relates to fenced code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LineKind {
    /// Ordinary Markdown, safe to rewrite.
    Text,
    /// An opening or closing fence line.
    Fence,
    /// Content inside a fenced block.
    Code,
}

impl LineKind {
    /// Whether the line must be copied through untouched.
    pub(crate) fn is_verbatim(self) -> bool {
        self != Self::Text
    }
}

/// Line-by-line scanner that remembers the currently open fence, if any.
///
/// A fence opens with three or more backticks or tildes and closes with a run
/// of the same character at least as long, followed by nothing but spaces.
#[derive(Debug, Default)]
pub(crate) struct CodeFences {
    open: Option<(char, usize)>,
}

impl CodeFences {
    /// Classify `line` and advance the scanner past it.
    pub(crate) fn classify(&mut self, line: &str) -> LineKind {
        let line = line.trim_start();
        match self.open {
            Some((marker, len)) => {
                let run = marker_run(line, marker);
                if run >= len && line[run..].trim().is_empty() {
                    self.open = None;
                    LineKind::Fence
                } else {
                    LineKind::Code
                }
            }
            None => {
                let Some(marker) = line.chars().next().filter(|&c| matches!(c, '`' | '~')) else {
                    return LineKind::Text;
                };
                let run = marker_run(line, marker);
                if run < 3 {
                    return LineKind::Text;
                }
                self.open = Some((marker, run));
                LineKind::Fence
            }
        }
    }
}

/// Length in bytes of the leading run of `marker` (both markers are ASCII).
fn marker_run(line: &str, marker: char) -> usize {
    line.bytes().take_while(|&b| char::from(b) == marker).count()
}
