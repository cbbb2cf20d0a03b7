//! Line masking ahead of structural matching
//!
//! Comments are stripped before any keyword is looked at. A keyword hit only
//! counts when it is a whole word, is not escaped with `^` on either side,
//! and sits outside a string literal on the same line.
//!
//! String detection is quote parity only: a hit followed by an odd number of
//! `"` on its line is inside a string. Strings running across lines are not
//! tracked. The `regex` crate has no lookaround, so the caret and parity
//! checks are done by looking at the text around each candidate.

use regex::Regex;
use std::sync::OnceLock;

/// Reserved words the structural analyzers care about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Begin,
    End,
    Proc,
    Subproc,
    Forward,
    External,
}

impl Keyword {
    /// Parse a keyword, ignoring ASCII case
    pub fn parse(word: &str) -> Option<Self> {
        const ALL: [Keyword; 6] = [
            Keyword::Begin,
            Keyword::End,
            Keyword::Proc,
            Keyword::Subproc,
            Keyword::Forward,
            Keyword::External,
        ];
        ALL.into_iter().find(|kw| kw.as_str().eq_ignore_ascii_case(word))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Begin => "begin",
            Keyword::End => "end",
            Keyword::Proc => "proc",
            Keyword::Subproc => "subproc",
            Keyword::Forward => "forward",
            Keyword::External => "external",
        }
    }
}

/// Comment stripping and keyword location for a single line
pub struct LineMasker;

impl LineMasker {
    /// Remove `--` line comments and `!...!` bracket comments.
    ///
    /// An unterminated `!` runs to the end of this line only.
    pub fn strip_comments(line: &str) -> String {
        static LINE_COMMENT_RE: OnceLock<Regex> = OnceLock::new();
        static BRACKET_COMMENT_RE: OnceLock<Regex> = OnceLock::new();

        let line_comment_re = LINE_COMMENT_RE.get_or_init(|| Regex::new(r"\s*--.*").unwrap());
        let bracket_comment_re =
            BRACKET_COMMENT_RE.get_or_init(|| Regex::new(r"\s*![^!]*(?:!\s*|$)").unwrap());

        let without_line = line_comment_re.replace_all(line, "");
        bracket_comment_re
            .replace_all(&without_line, "")
            .into_owned()
    }

    /// Keywords in comment-free `code`, in order of appearance
    pub fn keywords(code: &str) -> impl Iterator<Item = Keyword> + '_ {
        static KEYWORD_RE: OnceLock<Regex> = OnceLock::new();
        let keyword_re = KEYWORD_RE.get_or_init(|| {
            Regex::new(r"(?i)\b(?:begin|end|proc|subproc|forward|external)\b").unwrap()
        });

        keyword_re
            .find_iter(code)
            .filter(move |m| Self::is_code(code, m.start(), m.end()))
            .filter_map(|m| Keyword::parse(m.as_str()))
    }

    /// `begin`/`end` occurrences in order of appearance
    pub fn block_keywords(code: &str) -> impl Iterator<Item = Keyword> + '_ {
        Self::keywords(code).filter(|kw| matches!(kw, Keyword::Begin | Keyword::End))
    }

    /// Number of `begin` and `end` occurrences
    pub fn count_block_keywords(code: &str) -> (usize, usize) {
        Self::block_keywords(code).fold((0, 0), |(begins, ends), kw| match kw {
            Keyword::Begin => (begins + 1, ends),
            _ => (begins, ends + 1),
        })
    }

    /// First `forward` or `external` on the line
    pub fn bodyless_keyword(code: &str) -> Option<Keyword> {
        Self::keywords(code).find(|kw| matches!(kw, Keyword::Forward | Keyword::External))
    }

    /// Whether the match at `start..end` is live code
    fn is_code(code: &str, start: usize, end: usize) -> bool {
        if code[..start].ends_with('^') || code[end..].starts_with('^') {
            return false;
        }
        let quotes_after = code[end..].bytes().filter(|b| *b == b'"').count();
        quotes_after % 2 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_line_comment() {
        assert_eq!(LineMasker::strip_comments("x := 1; -- begin"), "x := 1;");
        assert_eq!(LineMasker::strip_comments("-- whole line"), "");
    }

    #[test]
    fn test_strip_bracket_comment() {
        assert_eq!(LineMasker::strip_comments("a ! begin ! b"), "ab");
        assert_eq!(LineMasker::strip_comments("a ! runs to eol begin"), "a");
        assert_eq!(LineMasker::strip_comments("  ! one ! ! two !  "), "");
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let found: Vec<Keyword> = LineMasker::keywords("BEGIN x; End;").collect();
        assert_eq!(found, vec![Keyword::Begin, Keyword::End]);
    }

    #[test]
    fn test_keywords_whole_words_only() {
        assert_eq!(LineMasker::keywords("beginning endx my_end").count(), 0);
    }

    #[test]
    fn test_caret_escapes_keyword() {
        assert_eq!(LineMasker::keywords("^begin").count(), 0);
        assert_eq!(LineMasker::keywords("begin^").count(), 0);
        assert_eq!(LineMasker::keywords("a^end").count(), 0);
    }

    #[test]
    fn test_keyword_inside_string_ignored() {
        assert_eq!(
            LineMasker::keywords(r#"s := "begin is not code";"#).count(),
            0
        );
        let found: Vec<Keyword> = LineMasker::keywords(r#"s := "x"; begin"#).collect();
        assert_eq!(found, vec![Keyword::Begin]);
    }

    #[test]
    fn test_count_block_keywords() {
        assert_eq!(
            LineMasker::count_block_keywords("begin begin end; proc"),
            (2, 1)
        );
    }

    #[test]
    fn test_bodyless_keyword() {
        assert_eq!(
            LineMasker::bodyless_keyword("proc a; external;"),
            Some(Keyword::External)
        );
        assert_eq!(
            LineMasker::bodyless_keyword("FORWARD;"),
            Some(Keyword::Forward)
        );
        assert_eq!(LineMasker::bodyless_keyword("call ^forward;"), None);
    }
}
