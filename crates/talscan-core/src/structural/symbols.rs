//! Document symbol generation for TAL documents
//!
//! Generates the outline hierarchy:
//! - Procs with their subprocs as children, plus a synthetic `main: <proc>`
//!   child for proc body that follows the last subproc
//! - `?section` / `?page` directives, only when the document has no procs
//!
//! Proc bodies are delimited by counting `begin`/`end` on comment-free
//! lines. A `forward` or `external` seen before the first `begin` marks the
//! declaration as bodyless.

use regex::Regex;
use serde::{Serialize, Serializer};
use std::sync::OnceLock;
use tokio_util::sync::CancellationToken;

use super::mask::{Keyword, LineMasker};
use crate::document::{line_width, Position, Range};
use crate::error::{check_cancelled, Result};

/// Outline entry kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Proc,
    Subproc,
    Section,
    Page,
    /// Proc body after its last subproc
    SyntheticMain,
}

impl SymbolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Proc => "proc",
            SymbolKind::Subproc => "subproc",
            SymbolKind::Section => "section",
            SymbolKind::Page => "page",
            SymbolKind::SyntheticMain => "synthetic_main",
        }
    }
}

/// Declaration qualifier of a proc or subproc
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SymbolDetail {
    #[default]
    None,
    Forward,
    External,
}

impl SymbolDetail {
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolDetail::None => "",
            SymbolDetail::Forward => "forward",
            SymbolDetail::External => "external",
        }
    }

    fn from_keyword(keyword: Keyword) -> Self {
        match keyword {
            Keyword::Forward => SymbolDetail::Forward,
            Keyword::External => SymbolDetail::External,
            _ => SymbolDetail::None,
        }
    }
}

impl Serialize for SymbolDetail {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One node of the outline forest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolNode {
    pub name: String,
    pub detail: SymbolDetail,
    pub kind: SymbolKind,
    pub range: Range,
    pub selection_range: Range,
    pub children: Vec<SymbolNode>,
}

impl SymbolNode {
    /// Symbol whose range is, for now, just its declaration line
    fn at_line<L: AsRef<str>>(
        lines: &[L],
        line: usize,
        name: impl Into<String>,
        kind: SymbolKind,
    ) -> Self {
        let range = Range::line(lines, line);
        Self {
            name: name.into(),
            detail: SymbolDetail::None,
            kind,
            range,
            selection_range: range,
            children: Vec::new(),
        }
    }

    /// `forward`/`external` declaration without a body
    pub fn is_bodyless(&self) -> bool {
        self.detail != SymbolDetail::None
    }

    /// Extend the range so it ends with `end_line`
    fn close_at<L: AsRef<str>>(&mut self, lines: &[L], end_line: usize) {
        self.range.end = Position::new(end_line as u32, line_width(lines, end_line));
    }
}

/// Main analyzer for extracting document symbols
pub struct SymbolAnalyzer;

impl SymbolAnalyzer {
    /// Extract symbols from document lines
    pub fn extract_symbols<L: AsRef<str>>(lines: &[L]) -> Vec<SymbolNode> {
        // Without a cancellation token the scan cannot fail
        Self::scan(lines, None).unwrap_or_default()
    }

    /// Same as [`extract_symbols`](Self::extract_symbols), polling `cancel`
    /// between lines
    pub fn extract_symbols_cancellable<L: AsRef<str>>(
        lines: &[L],
        cancel: &CancellationToken,
    ) -> Result<Vec<SymbolNode>> {
        Self::scan(lines, Some(cancel))
    }

    fn scan<L: AsRef<str>>(
        lines: &[L],
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<SymbolNode>> {
        let scan = ProcScan { lines, cancel };
        let procs = scan.procs()?;
        if !procs.is_empty() {
            return Ok(procs);
        }
        section_symbols(lines, cancel)
    }
}

// ----- DECLARATIONS -----

/// Parse a `proc` declaration, returning the proc name
fn parse_proc(code: &str) -> Option<&str> {
    static PROC_RE: OnceLock<Regex> = OnceLock::new();
    let proc_re = PROC_RE.get_or_init(|| declaration_re("proc"));
    proc_re.captures(code)?.get(1).map(|m| m.as_str())
}

/// Parse a `subproc` declaration, returning the subproc name
fn parse_subproc(code: &str) -> Option<&str> {
    static SUBPROC_RE: OnceLock<Regex> = OnceLock::new();
    let subproc_re = SUBPROC_RE.get_or_init(|| declaration_re("subproc"));
    subproc_re.captures(code)?.get(1).map(|m| m.as_str())
}

/// `[forward|external] [type[(width)]] <keyword> <name>` at line start
fn declaration_re(keyword: &str) -> Regex {
    let pattern = format!(
        concat!(
            r"(?i)^\s*(?:(?:forward|external)\s+)?",
            r"(?:(?:string|int|unsigned|fixed|real)",
            r"(?:\s*\(\s*(?:[0-9]{{1,2}}|\*|[a-zA-Z^_][a-zA-Z0-9^_]*)\s*\))?)?",
            r"\s*{}\s+([a-zA-Z^_][a-zA-Z0-9^_]*)"
        ),
        keyword
    );
    Regex::new(&pattern).unwrap()
}

// ----- PROCS AND SUBPROCS -----

/// Where a balanced body stopped
enum BodyEnd {
    /// Depth fell to zero on this line
    Closed(usize),
    /// `forward`/`external` found on this line before any body opened
    Bodyless(SymbolDetail, usize),
    /// Document ended first
    Eof,
}

struct ProcScan<'a, L> {
    lines: &'a [L],
    cancel: Option<&'a CancellationToken>,
}

impl<L: AsRef<str>> ProcScan<'_, L> {
    fn poll(&self) -> Result<()> {
        match self.cancel {
            Some(cancel) => check_cancelled(cancel),
            None => Ok(()),
        }
    }

    fn code(&self, line_num: usize) -> String {
        LineMasker::strip_comments(self.lines[line_num].as_ref())
    }

    fn last_line(&self) -> usize {
        self.lines.len().saturating_sub(1)
    }

    /// Outer pass: every proc in the document, in order
    fn procs(&self) -> Result<Vec<SymbolNode>> {
        let mut symbols = Vec::new();
        let mut line_num = 0;

        while line_num < self.lines.len() {
            self.poll()?;
            let code = self.code(line_num);
            match parse_proc(&code) {
                Some(name) => {
                    let (symbol, resume) = self.map_proc(line_num, name)?;
                    symbols.push(symbol);
                    line_num = resume;
                }
                None => line_num += 1,
            }
        }

        Ok(symbols)
    }

    /// Balance one proc starting at its declaration line. Returns the symbol
    /// and the line where the outer pass resumes.
    fn map_proc(&self, start: usize, name: &str) -> Result<(SymbolNode, usize)> {
        let mut proc_symbol = SymbolNode::at_line(self.lines, start, name, SymbolKind::Proc);
        let mut depth: i64 = 0;
        let mut line_num = start;
        let mut end = BodyEnd::Eof;

        while line_num < self.lines.len() {
            self.poll()?;
            let code = self.code(line_num);

            if depth <= 0 {
                if let Some(keyword) = LineMasker::bodyless_keyword(&code) {
                    end = BodyEnd::Bodyless(SymbolDetail::from_keyword(keyword), line_num);
                    break;
                }
            }

            if line_num > start {
                if let Some(sub_name) = parse_subproc(&code) {
                    let (subproc, resume) = self.map_subproc(line_num, sub_name)?;
                    proc_symbol.children.push(subproc);
                    line_num = resume;
                    continue;
                }
            }

            if let Some(closed) = Self::balance(&code, &mut depth, line_num) {
                end = closed;
                break;
            }
            line_num += 1;
        }

        let end_line = match end {
            BodyEnd::Bodyless(detail, keyword_line) => {
                proc_symbol.detail = detail;
                proc_symbol.children.clear();
                return Ok((proc_symbol, keyword_line + 1));
            }
            BodyEnd::Closed(end_line) => end_line,
            BodyEnd::Eof => self.last_line(),
        };

        proc_symbol.close_at(self.lines, end_line);
        self.append_synthetic_main(&mut proc_symbol, end_line);
        Ok((proc_symbol, end_line + 1))
    }

    /// Balance one subproc. Subproc bodies are not searched for further
    /// declarations.
    fn map_subproc(&self, start: usize, name: &str) -> Result<(SymbolNode, usize)> {
        let mut subproc = SymbolNode::at_line(self.lines, start, name, SymbolKind::Subproc);
        let mut depth: i64 = 0;
        let mut end = BodyEnd::Eof;

        for line_num in start..self.lines.len() {
            self.poll()?;
            let code = self.code(line_num);

            if depth <= 0 {
                if let Some(keyword) = LineMasker::bodyless_keyword(&code) {
                    end = BodyEnd::Bodyless(SymbolDetail::from_keyword(keyword), line_num);
                    break;
                }
            }

            if let Some(closed) = Self::balance(&code, &mut depth, line_num) {
                end = closed;
                break;
            }
        }

        let end_line = match end {
            BodyEnd::Bodyless(detail, keyword_line) => {
                subproc.detail = detail;
                return Ok((subproc, keyword_line + 1));
            }
            BodyEnd::Closed(end_line) => end_line,
            BodyEnd::Eof => self.last_line(),
        };

        subproc.close_at(self.lines, end_line);
        Ok((subproc, end_line + 1))
    }

    /// Apply one line's `begin`/`end` counts. The body only closes on a line
    /// that holds an `end`, so lines before the first `begin` never close it.
    fn balance(code: &str, depth: &mut i64, line_num: usize) -> Option<BodyEnd> {
        let (begins, ends) = LineMasker::count_block_keywords(code);
        *depth += begins as i64;
        if ends > 0 {
            *depth -= ends as i64;
            if *depth <= 0 {
                return Some(BodyEnd::Closed(line_num));
            }
        }
        None
    }

    /// Add `main: <proc>` for the body lines after the last subproc
    fn append_synthetic_main(&self, proc_symbol: &mut SymbolNode, proc_end: usize) {
        let Some(last_subproc) = proc_symbol.children.last() else {
            return;
        };
        let main_start = last_subproc.range.end.line as usize + 1;
        if main_start > proc_end {
            return;
        }

        let range = Range::spanning(self.lines, main_start, proc_end);
        proc_symbol.children.push(SymbolNode {
            name: format!("main: {}", proc_symbol.name),
            detail: SymbolDetail::None,
            kind: SymbolKind::SyntheticMain,
            range,
            selection_range: Range::line(self.lines, main_start),
            children: Vec::new(),
        });
    }
}

// ----- SECTIONS AND PAGES -----

/// Parse `?section name`
fn parse_section(line: &str) -> Option<&str> {
    static SECTION_RE: OnceLock<Regex> = OnceLock::new();
    let section_re = SECTION_RE
        .get_or_init(|| Regex::new(r"(?i)^\?\s*section\s+([a-zA-Z^_][a-zA-Z0-9^_]*)").unwrap());
    section_re.captures(line)?.get(1).map(|m| m.as_str())
}

/// Parse `?page "heading"`; an empty heading is not a page
fn parse_page(line: &str) -> Option<&str> {
    static PAGE_RE: OnceLock<Regex> = OnceLock::new();
    let page_re = PAGE_RE.get_or_init(|| Regex::new(r#"(?i)^\?\s*page\s*"([^"]*)""#).unwrap());
    let heading = page_re.captures(line)?.get(1)?.as_str();
    (!heading.is_empty()).then_some(heading)
}

/// Close the last top-level item and, for a section, its last page
fn close_last<L: AsRef<str>>(symbols: &mut [SymbolNode], lines: &[L], end_line: usize) {
    let Some(last) = symbols.last_mut() else {
        return;
    };
    last.close_at(lines, end_line);
    if last.kind == SymbolKind::Section {
        if let Some(page) = last.children.last_mut() {
            page.close_at(lines, end_line);
        }
    }
}

/// Outline built from `?section` and `?page` directives
fn section_symbols<L: AsRef<str>>(
    lines: &[L],
    cancel: Option<&CancellationToken>,
) -> Result<Vec<SymbolNode>> {
    let mut symbols: Vec<SymbolNode> = Vec::new();

    for (line_num, line) in lines.iter().enumerate() {
        if let Some(cancel) = cancel {
            check_cancelled(cancel)?;
        }
        let line = line.as_ref();

        if let Some(name) = parse_section(line) {
            if line_num > 0 {
                close_last(&mut symbols, lines, line_num - 1);
            }
            symbols.push(SymbolNode::at_line(lines, line_num, name, SymbolKind::Section));
            continue;
        }

        let Some(heading) = parse_page(line) else {
            continue;
        };
        let page = SymbolNode::at_line(lines, line_num, heading, SymbolKind::Page);

        match symbols.last_mut() {
            Some(last) if last.kind == SymbolKind::Page => {
                last.close_at(lines, line_num - 1);
                symbols.push(page);
            }
            Some(section) if section.kind == SymbolKind::Section => {
                if let Some(previous) = section.children.last_mut() {
                    previous.close_at(lines, line_num - 1);
                }
                section.children.push(page);
            }
            _ => symbols.push(page),
        }
    }

    // A section or top-level page still open at EOF ends with the document
    if !lines.is_empty() {
        close_last(&mut symbols, lines, lines.len() - 1);
    }

    Ok(symbols)
}
