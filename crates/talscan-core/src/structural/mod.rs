//! Structural intelligence for TAL sources
//!
//! This module provides document structure analysis for:
//! - Folding ranges (toggles, comment blocks, begin/end bodies)
//! - Document symbols (procs and subprocs, or sections and pages)
//!
//! Everything works on single lines with pattern matching. Per-scan state
//! lives in local stacks and is dropped when the scan returns.

pub mod folding;
pub mod mask;
pub mod symbols;

pub use folding::{FoldKind, FoldingAnalyzer, FoldingRange};
pub use mask::{Keyword, LineMasker};
pub use symbols::{SymbolAnalyzer, SymbolDetail, SymbolKind, SymbolNode};
