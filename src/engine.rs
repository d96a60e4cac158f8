//! Engine Module
//!
//! The core storage engine that coordinates all components.
//!
//! ## Responsibilities
//! - Own the data file, the append cursor and the key directory
//! - Rebuild the key directory by replaying the data file on startup
//! - Serve set/get/delete with fsync-before-acknowledge durability
//! - Hand the data file to the compactor on close

use std::path::Path;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::compaction::{self, CompactionOutcome};
use crate::config::Config;
use crate::error::{DriftError, Result};
use crate::keydir::{KeyDir, KeyDirEntry};
use crate::record::{now_secs, RawRecord, Record};
use crate::storage::{self, DataFile, RecoveryResult};
use crate::value::{canonical_key, canonical_value, Datum};

/// Outcome of a read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetResult {
    /// The key's current value
    Value(String),

    /// Never written, deleted, or expired
    NotFound,

    /// The stored value failed its checksum
    Corrupted,
}

impl GetResult {
    pub fn value(&self) -> Option<&str> {
        match self {
            GetResult::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<String> {
        match self {
            GetResult::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GetResult::NotFound)
    }

    pub fn is_corrupted(&self) -> bool {
        matches!(self, GetResult::Corrupted)
    }
}

/// The main storage engine
///
/// ## Concurrency Model
///
/// The store is designed for one logical owner, but the handle is
/// `Send + Sync` so it can sit behind an `Arc`:
///
/// - `data_file`: Mutex. Every read and append holds it, and a write updates
///   the key directory before releasing it, so the index never points past
///   what has been appended
/// - `keydir`: internal RwLock, lookups do not block each other
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Data file and append cursor (exclusive access needed)
    data_file: Mutex<DataFile>,

    /// Key → latest record location (internal RwLock)
    keydir: KeyDir,

    /// What replay found when the store was opened
    recovery: RecoveryResult,
}

impl Engine {
    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Open/create the data file
    /// 2. Replay it into the key directory if it has any content
    /// 3. Ready to serve requests
    pub fn open(config: Config) -> Result<Self> {
        // Step 1: Open the data file (creates it and its directory if missing)
        let mut data_file = DataFile::open(&config.path)?;

        // Step 2: Rebuild the key directory from the log
        let keydir = KeyDir::new();
        let recovery = if data_file.write_offset() > 0 {
            storage::replay(&mut data_file, &keydir)?
        } else {
            RecoveryResult::default()
        };

        info!(
            path = %config.path.display(),
            records = recovery.records_replayed,
            keys = recovery.live_keys,
            truncated = recovery.was_truncated,
            "Store opened"
        );

        Ok(Self {
            config,
            data_file: Mutex::new(data_file),
            keydir,
            recovery,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data file
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let config = Config::builder().path(path.as_ref()).build();
        Self::open(config)
    }

    /// Store a value with no expiry
    pub fn set(&self, key: impl Into<Datum>, value: impl Into<Datum>) -> Result<()> {
        self.set_with_ttl(key, value, 0)
    }

    /// Store a value that expires `ttl_seconds` from now (0 = never)
    ///
    /// Returns only after the record is fsynced.
    pub fn set_with_ttl(
        &self,
        key: impl Into<Datum>,
        value: impl Into<Datum>,
        ttl_seconds: u32,
    ) -> Result<()> {
        let key = self.canonical_key(&key.into())?;
        let value = canonical_value(&value.into());

        let timestamp = now_secs();
        let expiry = if ttl_seconds > 0 {
            timestamp.saturating_add(ttl_seconds)
        } else {
            0
        };

        debug!(key = %key, value_len = value.len(), expiry, "set");
        self.append(Record::new(key, value, timestamp, expiry)?)
    }

    /// Get a value by key
    ///
    /// Resolution order:
    /// 1. Not indexed → `NotFound`
    /// 2. Expired → `NotFound` (tombstoned on the spot if `expire_on_read`)
    /// 3. Tombstone → `NotFound`
    /// 4. Checksum mismatch → `Corrupted`
    pub fn get(&self, key: impl Into<Datum>) -> Result<GetResult> {
        let key = self.canonical_key(&key.into())?;

        let entry = match self.keydir.get(&key) {
            Some(entry) => entry,
            None => return Ok(GetResult::NotFound),
        };

        let bytes = self.data_file.lock().read_at(entry.offset, entry.size)?;
        let raw = RawRecord::parse(&bytes)?;

        if raw.header.is_expired(now_secs()) {
            if self.config.expire_on_read {
                self.expire(&key, entry)?;
            }
            return Ok(GetResult::NotFound);
        }

        if raw.header.is_tombstone() {
            return Ok(GetResult::NotFound);
        }

        if !raw.header.is_checksum_valid(raw.value) {
            warn!(key = %key, offset = entry.offset, "Checksum mismatch");
            return Ok(GetResult::Corrupted);
        }

        match std::str::from_utf8(raw.value) {
            Ok(value) => Ok(GetResult::Value(value.to_string())),
            Err(_) => {
                warn!(key = %key, offset = entry.offset, "Stored value is not valid UTF-8");
                Ok(GetResult::Corrupted)
            }
        }
    }

    /// Delete a key
    ///
    /// Appends a tombstone; the key stays indexed (pointing at the tombstone)
    /// until compaction drops it.
    pub fn delete(&self, key: impl Into<Datum>) -> Result<()> {
        let key = self.canonical_key(&key.into())?;

        debug!(key = %key, "delete");
        self.append(Record::tombstone(key, now_secs())?)
    }

    /// Close the store
    ///
    /// Flushes and syncs the data file, releases it, then compacts it if
    /// `compact_on_close` is set. A failed compaction is logged and leaves
    /// the data file as it was; it is not an error for the caller.
    pub fn close(self) -> Result<()> {
        let Engine {
            config, data_file, ..
        } = self;

        // Step 1: Make everything durable and release the handle
        {
            let mut data_file = data_file.into_inner();
            data_file.sync()?;
        }

        // Step 2: Reclaim space from deleted and expired keys
        if config.compact_on_close {
            match compaction::compact(&config.path) {
                Ok(CompactionOutcome::Compacted(stats)) => {
                    info!(reclaimed = stats.bytes_reclaimed(), "Compacted on close");
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(path = %config.path.display(), error = %e, "Compaction on close failed");
                }
            }
        }

        Ok(())
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    fn canonical_key(&self, key: &Datum) -> Result<String> {
        let key = canonical_key(key)?;
        if self.config.validate_keys && key.is_empty() {
            return Err(DriftError::InvalidKey("key must not be empty".to_string()));
        }
        Ok(key)
    }

    /// Append a record and point the key directory at it
    fn append(&self, record: Record) -> Result<()> {
        let (size, bytes) = record.encode()?;
        let timestamp = record.timestamp();

        let mut data_file = self.data_file.lock();
        let offset = data_file.append(&bytes)?;
        self.keydir.insert(record.key, KeyDirEntry::new(timestamp, offset, size));

        Ok(())
    }

    /// Tombstone an expired key, unless it was rewritten since `seen` was read
    fn expire(&self, key: &str, seen: KeyDirEntry) -> Result<()> {
        let record = Record::tombstone(key, now_secs())?;
        let (size, bytes) = record.encode()?;

        let mut data_file = self.data_file.lock();
        if self.keydir.get(key) != Some(seen) {
            return Ok(());
        }

        debug!(key = %key, "Tombstoning expired key");
        let offset = data_file.append(&bytes)?;
        self.keydir
            .insert(record.key, KeyDirEntry::new(record.header.timestamp, offset, size));

        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data file path
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of indexed keys (tombstoned keys included)
    pub fn len(&self) -> usize {
        self.keydir.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keydir.is_empty()
    }

    /// All indexed keys, sorted
    pub fn keys(&self) -> Vec<String> {
        self.keydir.keys()
    }

    /// Key directory entry for a canonical key
    pub fn entry(&self, key: &str) -> Option<KeyDirEntry> {
        self.keydir.get(key)
    }

    /// Offset the next record will be written at
    pub fn write_offset(&self) -> u64 {
        self.data_file.lock().write_offset()
    }

    /// What replay found when the store was opened
    pub fn recovery(&self) -> &RecoveryResult {
        &self.recovery
    }
}
