//! Configuration settings

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TalscanError};

/// File looked up in the workspace root
pub const CONFIG_FILE_NAME: &str = "talscan.toml";

/// Top-level settings structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Document outline
    pub symbols: SymbolSettings,
    /// Folding ranges
    pub folding: FoldingSettings,
    /// Result memoization
    pub cache: CacheSettings,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Read and parse a settings file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| TalscanError::config_io(path, e))?;
        let settings =
            Self::from_toml_str(&text).map_err(|e| TalscanError::config_parse(path, e))?;
        debug!(path = %path.display(), ?settings, "loaded settings");
        Ok(settings)
    }

    /// Load `talscan.toml` from `dir` when present, defaults otherwise
    pub fn discover(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Outline settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolSettings {
    /// Offer document symbols to the host
    pub enabled: bool,
}

impl Default for SymbolSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Folding settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoldingSettings {
    pub enabled: bool,
}

impl Default for FoldingSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Keep the latest result per document. When off every request rescans
    /// and stale reads find nothing.
    pub enabled: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}
