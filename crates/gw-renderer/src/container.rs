//! `::: name` container blocks.
//!
//! ```text
//! ::: warning
//! Body is **markdown**.
//! :::
//! ```
//!
//! becomes a `<div class="warning">` around the rendered body. Containers nest;
//! any left open at the end of the page are closed there. Lines inside fenced
//! code are never treated as container markers.

use crate::fence::CodeFences;

enum Marker<'a> {
    Open(&'a str),
    Close,
}

fn parse_marker(line: &str) -> Option<Marker<'_>> {
    let rest = line.trim().strip_prefix(":::")?;
    let name = rest.trim();
    if name.is_empty() {
        return Some(Marker::Close);
    }
    let valid = name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_');
    valid.then_some(Marker::Open(name))
}

/// Rewrite container markers into raw `<div>` HTML blocks.
#[must_use]
pub fn expand_containers(text: &str) -> String {
    if !text.contains(":::") {
        return text.to_owned();
    }

    let mut output = String::with_capacity(text.len());
    let mut fences = CodeFences::default();
    let mut depth = 0usize;

    for line in text.lines() {
        if fences.classify(line).is_verbatim() {
            output.push_str(line);
            output.push('\n');
            continue;
        }

        match parse_marker(line) {
            Some(Marker::Open(name)) => {
                depth += 1;
                output.push_str("<div class=\"");
                output.push_str(name);
                output.push_str("\">\n\n");
            }
            Some(Marker::Close) if depth > 0 => {
                depth -= 1;
                output.push_str("\n</div>\n\n");
            }
            _ => {
                output.push_str(line);
                output.push('\n');
            }
        }
    }

    for _ in 0..depth {
        output.push_str("\n</div>\n");
    }
    output
}
