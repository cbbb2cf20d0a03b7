//! talscan Language Server Protocol implementation
//!
//! Serves the structural views of TAL source files to editors:
//! - Folding ranges for toggles, comment blocks and `begin`/`end` bodies
//! - Document symbols for procs, subprocs, sections and pages
//!
//! # Library Usage
//!
//! ```ignore
//! use talscan_lsp::run_server;
//!
//! run_server().await;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Start the language server (typically called by an editor)
//! talscan-lsp
//!
//! # With debug logging
//! RUST_LOG=debug talscan-lsp
//! ```

pub mod convert;
pub mod server;

pub use server::{run_server, Backend};
