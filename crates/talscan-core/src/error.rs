//! Error types for talscan.
//!
//! Malformed source text never produces an error. These cover the edges
//! around a scan: cancellation and configuration loading.

use std::path::PathBuf;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Result type for talscan operations
pub type Result<T> = std::result::Result<T, TalscanError>;

/// Errors that can occur around a scan
#[derive(Error, Debug)]
pub enum TalscanError {
    /// The caller cancelled the request before the scan finished
    #[error("Scan cancelled")]
    Cancelled,

    /// Configuration file could not be read
    #[error("Failed to read configuration {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for `Settings`
    #[error("Invalid configuration {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl TalscanError {
    /// Create a configuration I/O error
    pub fn config_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigIo {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration parse error
    pub fn config_parse(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::ConfigParse {
            path: path.into(),
            source,
        }
    }

    /// Whether the error only means the request was abandoned
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Get the error code for diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            Self::Cancelled => "TALSCAN001",
            Self::ConfigIo { .. } => "TALSCAN002",
            Self::ConfigParse { .. } => "TALSCAN003",
        }
    }
}

/// Bail out of a scan loop once the caller has cancelled
pub(crate) fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(TalscanError::Cancelled);
    }
    Ok(())
}
