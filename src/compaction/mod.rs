//! Compaction Module
//!
//! Rewrites the data file without the records of deleted and expired keys.
//!
//! ## Procedure
//! ```text
//!   data file ──► Pass 1: classify ──► purge set empty? ──► done (nothing to reclaim)
//!                                             │
//!                                             ▼
//!                 Pass 2: rewrite ──► {file}.compact (fsync per record)
//!                                             │
//!                                             ▼
//!                 fsync ──► rename over the data file
//! ```
//!
//! Once a key is found tombstoned or expired anywhere in the file, every
//! record of that key is dropped, not just the tombstone.
//!
//! An error in either pass deletes the partial output and leaves the data
//! file exactly as it was.
//!
//! The compactor works on a path, not on an open engine. An engine's key
//! directory is stale after compaction; reopen the store before using it.

mod compactor;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub use compactor::{compact, compact_at};

/// Extension appended to the data file name for the rewrite output
pub const COMPACTION_SUFFIX: &str = "compact";

/// Sibling path the rewrite pass writes to: `{path}.compact`
pub fn output_path(path: &Path) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(COMPACTION_SUFFIX);
    path.with_file_name(name)
}

/// What a compaction run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompactionOutcome {
    /// The data file does not exist
    NoFile,

    /// No tombstoned or expired keys were found; the file was not touched
    NothingToReclaim,

    /// The data file was rewritten
    Compacted(CompactionStats),
}

/// Statistics for a completed rewrite
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompactionStats {
    /// Complete records read from the source
    pub records_scanned: u64,

    /// Records copied into the new file
    pub records_kept: u64,

    /// Records omitted from the new file
    pub records_dropped: u64,

    /// Distinct keys whose records were purged
    pub keys_purged: usize,

    /// Source file size
    pub bytes_before: u64,

    /// Rewritten file size
    pub bytes_after: u64,
}

impl CompactionStats {
    pub fn bytes_reclaimed(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }
}
