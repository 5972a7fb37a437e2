//! Indented JavaScript source building.

use std::fmt::{self, Write};

use once_cell::sync::Lazy;
use regex::Regex;

/// Accumulates generated source. Every line written through [`fmt::Write`]
/// is prefixed with the indent unit repeated to the current depth.
#[derive(Debug, Clone)]
pub struct SourceWriter {
    unit: String,
    depth: usize,
    out: String,
    line_start: bool,
}

impl SourceWriter {
    pub fn new(unit: &str) -> Self {
        SourceWriter {
            unit: unit.to_string(),
            depth: 0,
            out: String::new(),
            line_start: true,
        }
    }

    /// Set the depth for the following lines.
    pub fn at(&mut self, depth: usize) -> &mut Self {
        self.depth = depth;
        self
    }

    /// Write `text` verbatim, with no indentation added to its lines.
    pub fn write_raw(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.out.push_str(text);
        self.line_start = text.ends_with('\n');
    }

    pub fn finish(self) -> String {
        self.out
    }
}

impl Write for SourceWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for piece in s.split_inclusive('\n') {
            if self.line_start && piece != "\n" {
                for _ in 0..self.depth {
                    self.out.push_str(&self.unit);
                }
            }
            self.out.push_str(piece);
            self.line_start = piece.ends_with('\n');
        }
        Ok(())
    }
}

/// One emitted construct, rendered at a given depth.
pub trait Fragment {
    fn render(&self, w: &mut SourceWriter, depth: usize) -> fmt::Result;
}

/// Escape a value for embedding inside a quoted JavaScript string.
pub fn escape_special(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '/' => out.push_str("\\/"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() || c == '\u{2028}' || c == '\u{2029}' => {
                out.push_str(&format!("\\u{:04x}", c as u32))
            }
            c => out.push(c),
        }
    }
    out
}

/// Single-quoted JavaScript string literal.
pub fn js_string(value: &str) -> String {
    format!("'{}'", escape_special(value))
}

/// Escape a value for embedding inside a template literal.
pub fn escape_template(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[$a-z_][0-9a-z_$]*$").unwrap());

/// Object key: bare when a valid identifier, quoted otherwise.
pub fn quote_name(name: &str) -> String {
    if IDENTIFIER.is_match(name) {
        name.to_string()
    } else {
        js_string(name)
    }
}
