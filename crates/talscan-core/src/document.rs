//! Immutable document snapshots and line positions

use serde::Serialize;

/// Zero-based line/character position
///
/// Characters are counted in UTF-16 code units, the unit editors use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Span between two positions, end inclusive of the last line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Range covering `start_line` through `end_line` in full
    pub fn spanning<L: AsRef<str>>(lines: &[L], start_line: usize, end_line: usize) -> Self {
        Self {
            start: Position::new(start_line as u32, 0),
            end: Position::new(end_line as u32, line_width(lines, end_line)),
        }
    }

    /// Range covering a single line in full
    pub fn line<L: AsRef<str>>(lines: &[L], line: usize) -> Self {
        Self::spanning(lines, line, line)
    }

    /// Whether `line` falls within this range
    pub fn contains_line(&self, line: u32) -> bool {
        self.start.line <= line && line <= self.end.line
    }

    /// Number of lines covered
    pub fn line_count(&self) -> u32 {
        self.end.line.saturating_sub(self.start.line) + 1
    }
}

/// Width of a line in UTF-16 code units, zero past the end of the document
pub(crate) fn line_width<L: AsRef<str>>(lines: &[L], line: usize) -> u32 {
    lines
        .get(line)
        .map(|text| text.as_ref().encode_utf16().count() as u32)
        .unwrap_or(0)
}

/// One version of a document as supplied by the host
///
/// The scanner only reads it; every edit produces a new snapshot with a
/// higher version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    uri: String,
    version: i32,
    lines: Vec<String>,
}

impl Document {
    /// Split `text` into lines. `\r\n` and `\n` both end a line, and a
    /// trailing newline leaves an empty last line the way editors show it.
    pub fn new(uri: impl Into<String>, version: i32, text: &str) -> Self {
        let lines = if text.is_empty() {
            Vec::new()
        } else {
            text.split('\n')
                .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
                .collect()
        };
        Self::from_lines(uri, version, lines)
    }

    pub fn from_lines(uri: impl Into<String>, version: i32, lines: Vec<String>) -> Self {
        Self {
            uri: uri.into(),
            version,
            lines,
        }
    }

    /// Stable identity key of the document
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, line: usize) -> Option<&str> {
        self.lines.get(line).map(String::as_str)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Clamp a requested line to the document bounds
    pub fn clamp_line(&self, line: u32) -> u32 {
        let last = self.lines.len().saturating_sub(1) as u32;
        line.min(last)
    }
}
