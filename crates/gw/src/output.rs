//! Status lines on stderr, colored when the terminal supports it.

use console::{Style, Term};

/// Writes one styled line per call to stderr.
///
/// Write failures are ignored: losing a status line must not fail a command.
pub(crate) struct Output {
    term: Term,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    pub(crate) fn success(&self, msg: &str) {
        self.line(&Style::new().green(), msg);
    }

    pub(crate) fn warning(&self, msg: &str) {
        self.line(&Style::new().yellow(), msg);
    }

    pub(crate) fn error(&self, msg: &str) {
        self.line(&Style::new().red().bold(), msg);
    }

    /// Secondary information, dimmed.
    pub(crate) fn detail(&self, msg: &str) {
        self.line(&Style::new().dim(), msg);
    }

    fn line(&self, style: &Style, msg: &str) {
        let _ = self.term.write_line(&style.apply_to(msg).to_string());
    }
}
