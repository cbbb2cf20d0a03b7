//! Folding range generation for TAL documents
//!
//! Generates folding ranges for:
//! - Toggle regions (`?if id` / `?ifnot id` / `?endif id`)
//! - Comment blocks (contiguous `--` or pure `!...!` lines)
//! - `begin`/`end` bodies
//!
//! A construct whose open and close are on the same or adjacent lines
//! produces no range.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use tokio_util::sync::CancellationToken;

use super::mask::{Keyword, LineMasker};
use crate::error::{check_cancelled, Result};

/// Maximum leading whitespace before a comment marker
const MAX_COMMENT_INDENT: usize = 70;

/// What a folding range covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FoldKind {
    Region,
    Comment,
}

impl FoldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FoldKind::Region => "region",
            FoldKind::Comment => "comment",
        }
    }
}

/// A collapsible line span, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FoldingRange {
    pub start_line: u32,
    pub end_line: u32,
    pub kind: FoldKind,
}

impl FoldingRange {
    pub fn region(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line: start_line as u32,
            end_line: end_line as u32,
            kind: FoldKind::Region,
        }
    }

    pub fn comment(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line: start_line as u32,
            end_line: end_line as u32,
            kind: FoldKind::Comment,
        }
    }
}

/// Analyzer for generating folding ranges
pub struct FoldingAnalyzer;

impl FoldingAnalyzer {
    /// Generate folding ranges for the entire document
    pub fn generate_ranges<L: AsRef<str>>(lines: &[L]) -> Vec<FoldingRange> {
        // Without a cancellation token the scan cannot fail
        Self::scan(lines, None).unwrap_or_default()
    }

    /// Same as [`generate_ranges`](Self::generate_ranges), polling `cancel`
    /// between lines
    pub fn generate_ranges_cancellable<L: AsRef<str>>(
        lines: &[L],
        cancel: &CancellationToken,
    ) -> Result<Vec<FoldingRange>> {
        Self::scan(lines, Some(cancel))
    }

    fn scan<L: AsRef<str>>(
        lines: &[L],
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<FoldingRange>> {
        let mut toggles = ToggleTracker::default();
        let mut comments = CommentBlockTracker::default();
        let mut blocks = BeginEndTracker::default();

        for (i, line) in lines.iter().enumerate() {
            if let Some(cancel) = cancel {
                check_cancelled(cancel)?;
            }
            let line = line.as_ref();
            toggles.feed(i, line);
            comments.feed(i, line);
            blocks.feed(i, line);
        }

        // Each analyzer keeps its own discovery order
        let mut ranges = toggles.finish();
        ranges.extend(comments.finish());
        ranges.extend(blocks.finish());
        Ok(ranges)
    }

    /// Toggle regions only
    pub fn toggle_ranges<L: AsRef<str>>(lines: &[L]) -> Vec<FoldingRange> {
        let mut toggles = ToggleTracker::default();
        for (i, line) in lines.iter().enumerate() {
            toggles.feed(i, line.as_ref());
        }
        toggles.finish()
    }

    /// Comment blocks only
    pub fn comment_block_ranges<L: AsRef<str>>(lines: &[L]) -> Vec<FoldingRange> {
        let mut comments = CommentBlockTracker::default();
        for (i, line) in lines.iter().enumerate() {
            comments.feed(i, line.as_ref());
        }
        comments.finish()
    }

    /// `begin`/`end` bodies only
    pub fn begin_end_ranges<L: AsRef<str>>(lines: &[L]) -> Vec<FoldingRange> {
        let mut blocks = BeginEndTracker::default();
        for (i, line) in lines.iter().enumerate() {
            blocks.feed(i, line.as_ref());
        }
        blocks.finish()
    }
}

// ----- TOGGLES -----

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToggleDirective {
    If,
    IfNot,
    EndIf,
}

/// Parse a leading `?if id`, `?ifnot id` or `?endif id`
fn parse_toggle(line: &str) -> Option<(ToggleDirective, &str)> {
    static TOGGLE_RE: OnceLock<Regex> = OnceLock::new();
    let toggle_re = TOGGLE_RE
        .get_or_init(|| Regex::new(r"(?i)^\?(if(?:not)?|endif)\s+([a-zA-Z0-9^_]+)").unwrap());

    let caps = toggle_re.captures(line)?;
    let directive = match caps.get(1)?.as_str().to_ascii_lowercase().as_str() {
        "if" => ToggleDirective::If,
        "ifnot" => ToggleDirective::IfNot,
        _ => ToggleDirective::EndIf,
    };
    Some((directive, caps.get(2)?.as_str()))
}

/// Open `?if`/`?ifnot` waiting for its close
#[derive(Debug)]
struct ToggleEntry {
    kind: ToggleDirective,
    id: String,
    start: usize,
}

#[derive(Default)]
struct ToggleTracker {
    open: Vec<ToggleEntry>,
    ranges: Vec<FoldingRange>,
}

impl ToggleTracker {
    fn feed(&mut self, line_num: usize, line: &str) {
        let Some((directive, id)) = parse_toggle(line) else {
            return;
        };

        match directive {
            ToggleDirective::If => self.push_entry(ToggleDirective::If, id, line_num),
            ToggleDirective::IfNot => {
                // ?ifnot closes the matching ?if and opens its own region
                if let Some(entry) = self.take_last(id, &[ToggleDirective::If]) {
                    self.close(entry, line_num);
                }
                self.push_entry(ToggleDirective::IfNot, id, line_num);
            }
            ToggleDirective::EndIf => {
                if let Some(entry) =
                    self.take_last(id, &[ToggleDirective::If, ToggleDirective::IfNot])
                {
                    self.close(entry, line_num);
                }
            }
        }
    }

    fn push_entry(&mut self, kind: ToggleDirective, id: &str, start: usize) {
        self.open.push(ToggleEntry {
            kind,
            id: id.to_string(),
            start,
        });
    }

    /// Remove the innermost open entry with this id and one of `kinds`
    fn take_last(&mut self, id: &str, kinds: &[ToggleDirective]) -> Option<ToggleEntry> {
        let index = self
            .open
            .iter()
            .rposition(|entry| entry.id.eq_ignore_ascii_case(id) && kinds.contains(&entry.kind))?;
        Some(self.open.remove(index))
    }

    fn close(&mut self, entry: ToggleEntry, line_num: usize) {
        if line_num - entry.start > 1 {
            self.ranges
                .push(FoldingRange::region(entry.start, line_num - 1));
        }
    }

    /// Toggles still open at EOF are dropped
    fn finish(self) -> Vec<FoldingRange> {
        self.ranges
    }
}

// ----- COMMENT BLOCKS -----

fn is_comment_line(line: &str) -> bool {
    static COMMENT_RE: OnceLock<Regex> = OnceLock::new();
    let comment_re = COMMENT_RE.get_or_init(|| {
        Regex::new(&format!(r"^\s{{0,{}}}(--|!)", MAX_COMMENT_INDENT)).unwrap()
    });

    let Some(caps) = comment_re.captures(line) else {
        return false;
    };
    match caps.get(1).map(|m| m.as_str()) {
        Some("--") => true,
        // A `!` line only counts when nothing but comments is on it
        _ => LineMasker::strip_comments(line).trim().is_empty(),
    }
}

#[derive(Default)]
struct CommentBlockTracker {
    pending: Option<(usize, usize)>,
    ranges: Vec<FoldingRange>,
}

impl CommentBlockTracker {
    fn feed(&mut self, line_num: usize, line: &str) {
        if !is_comment_line(line) {
            self.flush();
            return;
        }

        match self.pending {
            Some((start, end)) if end + 1 == line_num => self.pending = Some((start, line_num)),
            _ => {
                self.flush();
                self.pending = Some((line_num, line_num));
            }
        }
    }

    fn flush(&mut self) {
        if let Some((start, end)) = self.pending.take() {
            if end > start {
                self.ranges.push(FoldingRange::comment(start, end));
            }
        }
    }

    /// A block still open at EOF is closed at the last comment line
    fn finish(mut self) -> Vec<FoldingRange> {
        self.flush();
        self.ranges
    }
}

// ----- BEGIN/END -----

#[derive(Default)]
struct BeginEndTracker {
    open: Vec<usize>,
    ranges: Vec<FoldingRange>,
}

impl BeginEndTracker {
    fn feed(&mut self, line_num: usize, line: &str) {
        let code = LineMasker::strip_comments(line);
        for keyword in LineMasker::block_keywords(&code) {
            match keyword {
                Keyword::Begin => self.open.push(line_num),
                _ => {
                    if let Some(start) = self.open.pop() {
                        if line_num - start > 1 {
                            self.ranges.push(FoldingRange::region(start, line_num - 1));
                        }
                    }
                }
            }
        }
    }

    /// Unclosed `begin`s are dropped
    fn finish(self) -> Vec<FoldingRange> {
        self.ranges
    }
}
