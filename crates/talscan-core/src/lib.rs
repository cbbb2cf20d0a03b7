//! talscan structural scanner
//!
//! Line-oriented structure recognition for TAL source documents:
//! - Folding ranges for `?if`/`?ifnot`/`?endif` toggles, comment blocks and
//!   `begin`/`end` bodies
//! - A symbol outline of procs and subprocs, or of `?section`/`?page`
//!   directives when a document holds no procs
//! - A version-keyed cache with stale reads for outline consumers
//!
//! Nothing here builds a parse tree. Malformed input is never an error; an
//! unrecognized construct is simply skipped.
//!
//! # Library Usage
//!
//! ```
//! use talscan_core::{Document, Scanner};
//! use tokio_util::sync::CancellationToken;
//!
//! let scanner = Scanner::new();
//! let doc = Document::new("file:///demo.tal", 1, "proc demo main;\nbegin\n  call x;\nend;");
//! let cancel = CancellationToken::new();
//!
//! let folds = scanner.folding_ranges(&doc, &cancel).unwrap();
//! let symbols = scanner.document_symbols(&doc, &cancel).unwrap();
//! assert_eq!(folds.len(), 1);
//! assert_eq!(symbols[0].name, "demo");
//! ```

pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod scanner;
pub mod structural;

pub use cache::DocumentCache;
pub use config::Settings;
pub use document::{Document, Position, Range};
pub use error::{Result, TalscanError};
pub use scanner::Scanner;
pub use structural::{
    FoldKind, FoldingAnalyzer, FoldingRange, SymbolAnalyzer, SymbolDetail, SymbolKind, SymbolNode,
};
