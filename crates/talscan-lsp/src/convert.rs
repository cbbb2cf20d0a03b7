//! Mapping from scanner records to LSP types
//!
//! The core crate knows nothing about the protocol; every `lsp_types` value
//! the server returns is built here.

use talscan_core::{FoldKind, FoldingRange, Position, Range, SymbolKind, SymbolNode};
use tower_lsp::lsp_types;

/// Protocol symbol kind for an outline entry
///
/// Bodyless procs and subprocs show as interfaces, the way declarations
/// without a body are shown elsewhere in editors.
pub fn symbol_kind(symbol: &SymbolNode) -> lsp_types::SymbolKind {
    if symbol.is_bodyless() {
        return lsp_types::SymbolKind::INTERFACE;
    }
    match symbol.kind {
        SymbolKind::Proc => lsp_types::SymbolKind::CLASS,
        SymbolKind::Subproc => lsp_types::SymbolKind::METHOD,
        SymbolKind::SyntheticMain => lsp_types::SymbolKind::FUNCTION,
        SymbolKind::Section => lsp_types::SymbolKind::PACKAGE,
        SymbolKind::Page => lsp_types::SymbolKind::STRING,
    }
}

pub fn fold_kind(kind: FoldKind) -> lsp_types::FoldingRangeKind {
    match kind {
        FoldKind::Region => lsp_types::FoldingRangeKind::Region,
        FoldKind::Comment => lsp_types::FoldingRangeKind::Comment,
    }
}

pub fn position(position: Position) -> lsp_types::Position {
    lsp_types::Position::new(position.line, position.character)
}

pub fn range(range: Range) -> lsp_types::Range {
    lsp_types::Range::new(position(range.start), position(range.end))
}

pub fn folding_range(fold: &FoldingRange) -> lsp_types::FoldingRange {
    lsp_types::FoldingRange {
        start_line: fold.start_line,
        end_line: fold.end_line,
        kind: Some(fold_kind(fold.kind)),
        start_character: None,
        end_character: None,
        collapsed_text: None,
    }
}

pub fn folding_ranges(folds: &[FoldingRange]) -> Vec<lsp_types::FoldingRange> {
    folds.iter().map(folding_range).collect()
}

/// Convert one outline node and its children
pub fn document_symbol(symbol: &SymbolNode) -> lsp_types::DocumentSymbol {
    let detail = symbol.detail.as_str();
    let children = if symbol.children.is_empty() {
        None
    } else {
        Some(document_symbols(&symbol.children))
    };

    #[allow(deprecated)]
    lsp_types::DocumentSymbol {
        name: symbol.name.clone(),
        detail: (!detail.is_empty()).then(|| detail.to_string()),
        kind: symbol_kind(symbol),
        tags: None,
        deprecated: None,
        range: range(symbol.range),
        selection_range: range(symbol.selection_range),
        children,
    }
}

pub fn document_symbols(symbols: &[SymbolNode]) -> Vec<lsp_types::DocumentSymbol> {
    symbols.iter().map(document_symbol).collect()
}
