//! Version-keyed result cache
//!
//! Holds the most recent scan result per document. A lookup either asks for
//! an exact version or takes whatever was stored last (a stale read, used
//! when a slightly outdated outline is good enough).

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::trace;

/// Stored result together with the document version it was computed for
#[derive(Debug, Clone)]
struct Entry<T> {
    version: i32,
    value: T,
}

/// Thread-safe map from document identity to its latest result
#[derive(Debug)]
pub struct DocumentCache<T> {
    entries: RwLock<HashMap<String, Entry<T>>>,
}

impl<T> Default for DocumentCache<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Clone> DocumentCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Result stored for exactly `version`
    pub fn get(&self, uri: &str, version: i32) -> Option<T> {
        let entries = self.entries.read();
        match entries.get(uri) {
            Some(entry) if entry.version == version => {
                trace!(uri, version, "cache hit");
                Some(entry.value.clone())
            }
            Some(entry) => {
                trace!(uri, version, cached = entry.version, "cache version mismatch");
                None
            }
            None => {
                trace!(uri, version, "cache miss");
                None
            }
        }
    }

    /// Last stored result for `uri`, whatever its version
    pub fn get_latest(&self, uri: &str) -> Option<T> {
        self.get_latest_with_version(uri).map(|(_, value)| value)
    }

    /// Last stored result along with the version it belongs to
    pub fn get_latest_with_version(&self, uri: &str) -> Option<(i32, T)> {
        self.entries
            .read()
            .get(uri)
            .map(|entry| (entry.version, entry.value.clone()))
    }

    /// Store `value` as the result for `version`, replacing any older entry
    pub fn set(&self, uri: &str, version: i32, value: T) {
        self.entries
            .write()
            .insert(uri.to_string(), Entry { version, value });
    }

    /// Drop the entry for `uri`. Returns whether one existed.
    pub fn remove(&self, uri: &str) -> bool {
        self.entries.write().remove(uri).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
