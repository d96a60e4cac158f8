//! Replay / Recovery
//!
//! Rebuilds the key directory by scanning the data file from offset 0.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{DriftError, Result};
use crate::keydir::{KeyDir, KeyDirEntry};
use crate::record::{LogScanner, ValueMode};

use super::DataFile;

/// Result of a replay or verify pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of complete records scanned
    pub records_replayed: u64,

    /// Distinct keys indexed (tombstoned keys included)
    pub live_keys: usize,

    /// End of the last complete record
    pub valid_len: u64,

    /// Physical file length before any repair
    pub file_len: u64,

    /// Whether unreadable bytes follow the last complete record
    pub was_truncated: bool,
}

/// Replay the data file into `keydir`.
///
/// This will:
/// 1. Scan every complete record, indexing the latest location of each key
///    (tombstones and expired records included; they are resolved at read time)
/// 2. Stop silently at a partial header or partial record
/// 3. Point the append cursor at the end of the last complete record
///
/// The file itself is not modified. A torn tail is cut off by the first
/// append (see [`DataFile::append`]). Values are neither read nor
/// checksummed here.
pub fn replay(data_file: &mut DataFile, keydir: &KeyDir) -> Result<RecoveryResult> {
    data_file.sync()?;

    let scanner = LogScanner::new(data_file.reader()?, ValueMode::Skip)?;
    let result = scan_into(scanner, keydir)?;

    if result.was_truncated {
        warn!(
            path = %data_file.path().display(),
            valid_len = result.valid_len,
            file_len = result.file_len,
            "Data file has an unreadable tail, ignoring it until the next write"
        );
    }
    data_file.set_valid_len(result.valid_len);

    debug!(records_replayed = result.records_replayed, keys = keydir.len(), "Replay complete");

    Ok(result)
}

/// Verify a data file without modifying it.
///
/// Reports how much of the file replays cleanly. Keys must be valid UTF-8.
pub fn verify(path: &Path) -> Result<RecoveryResult> {
    let scanner = LogScanner::new(File::open(path)?, ValueMode::Skip)?;
    scan_into(scanner, &KeyDir::new())
}

/// Index every complete record the scanner yields
fn scan_into<R: Read + Seek>(mut scanner: LogScanner<R>, keydir: &KeyDir) -> Result<RecoveryResult> {
    let mut records_replayed = 0u64;

    for item in scanner.by_ref() {
        let record = item?;
        let key = record.key_str()?;
        let size = u32::try_from(record.size()).map_err(|_| {
            DriftError::Corruption(format!(
                "record at offset {} declares {} bytes",
                record.offset,
                record.size()
            ))
        })?;

        keydir.insert(key, KeyDirEntry::new(record.header.timestamp, record.offset, size));
        records_replayed += 1;
    }

    Ok(RecoveryResult {
        records_replayed,
        live_keys: keydir.len(),
        valid_len: scanner.valid_len(),
        file_len: scanner.source_len(),
        was_truncated: scanner.is_truncated(),
    })
}
