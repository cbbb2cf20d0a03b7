//! Scanner configuration
//!
//! Settings are loaded from `talscan.toml`:
//!
//! ```toml
//! [symbols]
//! enabled = true
//!
//! [folding]
//! enabled = true
//!
//! [cache]
//! enabled = false
//! ```
//!
//! Every section is optional. Missing keys fall back to their defaults and
//! unknown keys are ignored.

mod settings;


pub use settings::{CacheSettings, FoldingSettings, Settings, SymbolSettings, CONFIG_FILE_NAME};
