//! talscan CLI - Command-line interface library
//!
//! Prints the structural views of a TAL source file:
//! - Folds: collapsible regions and comment blocks
//! - Symbols: the proc/subproc or section/page outline
//!
//! # Library Usage
//!
//! ```ignore
//! use talscan_cli::{symbols_output, OutputFormat};
//!
//! let json = symbols_output(&input, OutputFormat::Json, None)?;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Outline of a source file
//! talscan symbols module.tal
//!
//! # Folding ranges as JSON, with explicit settings
//! talscan --config talscan.toml folds module.tal --format json
//! ```

pub mod app;

pub use app::{
    folds_command, folds_output, load_settings, render_folds, render_symbols, run_cli,
    symbols_command, symbols_output, OutputFormat,
};
