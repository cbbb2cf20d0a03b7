//! Scan orchestration
//!
//! [`Scanner`] runs the analyzers for one document version and memoizes the
//! results per document. A cancelled scan is never cached.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::DocumentCache;
use crate::config::Settings;
use crate::document::Document;
use crate::error::Result;
use crate::structural::{FoldingAnalyzer, FoldingRange, SymbolAnalyzer, SymbolNode};

pub type Folds = Arc<Vec<FoldingRange>>;
pub type Outline = Arc<Vec<SymbolNode>>;

/// Entry point for folding and outline requests
#[derive(Debug, Default)]
pub struct Scanner {
    settings: Settings,
    folds: DocumentCache<Folds>,
    symbols: DocumentCache<Outline>,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn caching(&self) -> bool {
        self.settings.cache.enabled
    }

    /// Folding ranges for `doc`, reusing the cached result for its version
    pub fn folding_ranges(&self, doc: &Document, cancel: &CancellationToken) -> Result<Folds> {
        if self.caching() {
            if let Some(folds) = self.folds.get(doc.uri(), doc.version()) {
                return Ok(folds);
            }
        }

        debug!(uri = doc.uri(), version = doc.version(), "scanning folding ranges");
        let folds = FoldingAnalyzer::generate_ranges_cancellable(doc.lines(), cancel)
            .inspect_err(|e| info!(uri = doc.uri(), error = %e, "folding scan abandoned"))?;
        let folds = Arc::new(folds);
        debug!(uri = doc.uri(), count = folds.len(), "folding ranges ready");

        if self.caching() {
            self.folds.set(doc.uri(), doc.version(), Arc::clone(&folds));
        }
        Ok(folds)
    }

    /// Symbol outline for `doc`, reusing the cached result for its version
    pub fn document_symbols(&self, doc: &Document, cancel: &CancellationToken) -> Result<Outline> {
        if self.caching() {
            if let Some(symbols) = self.symbols.get(doc.uri(), doc.version()) {
                return Ok(symbols);
            }
        }

        debug!(uri = doc.uri(), version = doc.version(), "scanning symbols");
        let symbols = SymbolAnalyzer::extract_symbols_cancellable(doc.lines(), cancel)
            .inspect_err(|e| info!(uri = doc.uri(), error = %e, "symbol scan abandoned"))?;
        let symbols = Arc::new(symbols);
        debug!(uri = doc.uri(), count = symbols.len(), "symbols ready");

        if self.caching() {
            self.symbols
                .set(doc.uri(), doc.version(), Arc::clone(&symbols));
        }
        Ok(symbols)
    }

    /// Most recent outline for `uri`, possibly from an older version
    pub fn latest_symbols(&self, uri: &str) -> Option<Outline> {
        self.symbols.get_latest(uri)
    }

    /// Line bounds of the innermost known symbol containing `line`.
    ///
    /// Reads the latest cached outline without rescanning, so after an edit
    /// the bounds may lag the text until the next outline request.
    pub fn narrowing_span(&self, uri: &str, line: u32) -> Option<(u32, u32)> {
        let symbols = self.latest_symbols(uri)?;
        let symbol = innermost(&symbols, line)?;
        Some((symbol.range.start.line, symbol.range.end.line))
    }

    /// Drop every cached result for `uri`
    pub fn forget(&self, uri: &str) {
        let folds = self.folds.remove(uri);
        let symbols = self.symbols.remove(uri);
        if folds || symbols {
            debug!(uri, "evicted cached scan results");
        }
    }
}

/// Deepest symbol whose range holds `line`
fn innermost(symbols: &[SymbolNode], line: u32) -> Option<&SymbolNode> {
    let symbol = symbols.iter().find(|s| s.range.contains_line(line))?;
    innermost(&symbol.children, line).or(Some(symbol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheSettings;

    const SOURCE: &str = "\
proc outer main;
begin
  subproc inner;
  begin
    x := 1;
  end;
  call inner;
end;";

    fn doc(version: i32, text: &str) -> Document {
        Document::new("file:///test.tal", version, text)
    }

    #[test]
    fn test_symbols_cached_per_version() {
        let scanner = Scanner::new();
        let cancel = CancellationToken::new();

        let first = scanner.document_symbols(&doc(1, SOURCE), &cancel).unwrap();
        let second = scanner.document_symbols(&doc(1, SOURCE), &cancel).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let third = scanner.document_symbols(&doc(2, SOURCE), &cancel).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(first, third);
    }

    #[test]
    fn test_folds_cached_per_version() {
        let scanner = Scanner::new();
        let cancel = CancellationToken::new();

        let first = scanner.folding_ranges(&doc(1, SOURCE), &cancel).unwrap();
        let second = scanner.folding_ranges(&doc(1, SOURCE), &cancel).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_cache_disabled_rescans() {
        let settings = Settings {
            cache: CacheSettings { enabled: false },
            ..Settings::default()
        };
        let scanner = Scanner::with_settings(settings);
        let cancel = CancellationToken::new();

        let first = scanner.document_symbols(&doc(1, SOURCE), &cancel).unwrap();
        let second = scanner.document_symbols(&doc(1, SOURCE), &cancel).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(scanner.latest_symbols("file:///test.tal").is_none());
    }

    #[test]
    fn test_cancelled_scan_not_cached() {
        let scanner = Scanner::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = scanner
            .document_symbols(&doc(1, SOURCE), &cancel)
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(scanner.folding_ranges(&doc(1, SOURCE), &cancel).is_err());
        assert!(scanner.latest_symbols("file:///test.tal").is_none());
    }

    #[test]
    fn test_empty_document_finishes_despite_cancel() {
        let scanner = Scanner::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        // Nothing to poll between, so an empty scan completes
        let symbols = scanner.document_symbols(&doc(1, ""), &cancel).unwrap();
        assert!(symbols.is_empty());
    }

    #[test]
    fn test_narrowing_span_innermost() {
        let scanner = Scanner::new();
        let cancel = CancellationToken::new();
        scanner.document_symbols(&doc(1, SOURCE), &cancel).unwrap();

        let uri = "file:///test.tal";
        assert_eq!(scanner.narrowing_span(uri, 4), Some((2, 5)));
        assert_eq!(scanner.narrowing_span(uri, 6), Some((6, 7)));
        assert_eq!(scanner.narrowing_span(uri, 1), Some((0, 7)));
        assert_eq!(scanner.narrowing_span(uri, 40), None);
        assert_eq!(scanner.narrowing_span("file:///other.tal", 1), None);
    }

    #[test]
    fn test_narrowing_span_stale_after_edit() {
        let scanner = Scanner::new();
        let cancel = CancellationToken::new();
        scanner.document_symbols(&doc(1, SOURCE), &cancel).unwrap();

        // Version 2 has not been scanned yet; the old outline still answers
        let uri = "file:///test.tal";
        assert_eq!(scanner.narrowing_span(uri, 4), Some((2, 5)));
    }

    #[test]
    fn test_forget_evicts() {
        let scanner = Scanner::new();
        let cancel = CancellationToken::new();
        scanner.document_symbols(&doc(1, SOURCE), &cancel).unwrap();
        scanner.folding_ranges(&doc(1, SOURCE), &cancel).unwrap();

        scanner.forget("file:///test.tal");
        assert!(scanner.latest_symbols("file:///test.tal").is_none());
    }
}
