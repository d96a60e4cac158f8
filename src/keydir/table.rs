//! Key Directory implementation
//!
//! HashMap-based index with RwLock for concurrency.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::KeyDirEntry;

/// Volatile key → record location index
#[derive(Debug, Default)]
pub struct KeyDir {
    entries: RwLock<HashMap<String, KeyDirEntry>>,
}

impl KeyDir {
    /// Create a new empty KeyDir
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for `key` (write lock).
    ///
    /// Returns the previous entry, if any.
    pub fn insert(&self, key: impl Into<String>, entry: KeyDirEntry) -> Option<KeyDirEntry> {
        self.entries.write().insert(key.into(), entry)
    }

    /// Look up a key (read lock)
    pub fn get(&self, key: &str) -> Option<KeyDirEntry> {
        self.entries.read().get(key).copied()
    }

    /// Remove a key (write lock)
    pub fn remove(&self, key: &str) -> Option<KeyDirEntry> {
        self.entries.write().remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Number of indexed keys, tombstoned keys included
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of all indexed keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
