//! Configuration for DriftKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a DriftKV store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the single append-only data file.
    /// The compactor writes its output next to it as `{path}.compact`.
    pub path: PathBuf,

    // -------------------------------------------------------------------------
    // Read Path Configuration
    // -------------------------------------------------------------------------
    /// When a `get` finds an expired record, append a tombstone for the key
    /// so the index stops pointing at it
    pub expire_on_read: bool,

    // -------------------------------------------------------------------------
    // Lifecycle Configuration
    // -------------------------------------------------------------------------
    /// Run compaction over the data file when the engine is closed
    pub compact_on_close: bool,

    // -------------------------------------------------------------------------
    // Validation Configuration
    // -------------------------------------------------------------------------
    /// Reject empty keys before anything is written
    pub validate_keys: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./driftkv.db"),
            expire_on_read: true,
            compact_on_close: true,
            validate_keys: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Path of the compaction output file for this store
    pub fn compaction_path(&self) -> PathBuf {
        crate::compaction::output_path(&self.path)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Enable or disable eager tombstoning of expired keys on read
    pub fn expire_on_read(mut self, enabled: bool) -> Self {
        self.config.expire_on_read = enabled;
        self
    }

    /// Enable or disable compaction on close
    pub fn compact_on_close(mut self, enabled: bool) -> Self {
        self.config.compact_on_close = enabled;
        self
    }

    /// Enable or disable the empty-key check
    pub fn validate_keys(mut self, enabled: bool) -> Self {
        self.config.validate_keys = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
