//! Compactor
//!
//! Two-pass rewrite of a data file.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{DriftError, Result};
use crate::record::{now_secs, LogScanner, ValueMode};

use super::{output_path, CompactionOutcome, CompactionStats};

/// Compact the data file at `path` using the current time for expiry
pub fn compact(path: impl AsRef<Path>) -> Result<CompactionOutcome> {
    compact_at(path, now_secs())
}

/// Compact the data file at `path`, treating records with `expiry <= now` as expired
pub fn compact_at(path: impl AsRef<Path>, now: u32) -> Result<CompactionOutcome> {
    let source = path.as_ref();
    if !source.exists() {
        debug!(path = %source.display(), "No data file, skipping compaction");
        return Ok(CompactionOutcome::NoFile);
    }

    info!(path = %source.display(), "Starting compaction");

    // Pass 1: find every key that is tombstoned or expired somewhere in the file
    let purge = classify(source, now)?;
    if purge.is_empty() {
        info!(path = %source.display(), "Nothing to reclaim");
        return Ok(CompactionOutcome::NothingToReclaim);
    }

    // Pass 2: copy everything else into the sibling file
    let target = output_path(source);
    let stats = match rewrite(source, &target, &purge) {
        Ok(stats) => stats,
        Err(e) => {
            warn!(path = %source.display(), error = %e, "Aborting compaction");
            discard_output(&target);
            return Err(e);
        }
    };

    // Finalize: swap the new file in. rename() replaces the source atomically.
    install(&target, source)?;

    info!(
        path = %source.display(),
        kept = stats.records_kept,
        dropped = stats.records_dropped,
        bytes_before = stats.bytes_before,
        bytes_after = stats.bytes_after,
        "Compaction finished"
    );

    Ok(CompactionOutcome::Compacted(stats))
}

/// Pass 1: collect keys with a tombstone or an expired record
fn classify(source: &Path, now: u32) -> Result<HashSet<String>> {
    let scanner = LogScanner::new(File::open(source)?, ValueMode::Skip)?;

    let mut purge = HashSet::new();
    for item in scanner {
        let record = item?;
        if record.header.is_tombstone() || record.header.is_expired(now) {
            purge.insert(record.key_str()?.to_string());
        }
    }

    debug!(keys = purge.len(), "Classified keys for purge");
    Ok(purge)
}

/// Pass 2: copy every record whose key is not in `purge` into `target`
fn rewrite(source: &Path, target: &Path, purge: &HashSet<String>) -> Result<CompactionStats> {
    let scanner = LogScanner::new(File::open(source)?, ValueMode::Read)?;

    let out = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(target)?;
    let mut writer = BufWriter::new(out);

    let mut stats = CompactionStats {
        keys_purged: purge.len(),
        bytes_before: scanner.source_len(),
        ..Default::default()
    };

    for item in scanner {
        let record = item?;
        stats.records_scanned += 1;

        if purge.contains(record.key_str()?) {
            stats.records_dropped += 1;
            continue;
        }

        let bytes = record.to_bytes().ok_or_else(|| {
            DriftError::Corruption(format!("record at offset {} has no value", record.offset))
        })?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;

        stats.records_kept += 1;
        stats.bytes_after += bytes.len() as u64;
    }

    writer.flush()?;
    writer.get_ref().sync_all()?;

    Ok(stats)
}

/// Move the finished output over the data file, discarding it if that fails
fn install(target: &Path, source: &Path) -> Result<()> {
    if let Err(e) = fs::rename(target, source) {
        warn!(path = %source.display(), error = %e, "Failed to install compacted file");
        discard_output(target);
        return Err(e.into());
    }
    Ok(())
}

/// Remove a partially written output file
fn discard_output(target: &Path) {
    if !target.is_file() {
        return;
    }
    if let Err(e) = fs::remove_file(target) {
        warn!(path = %target.display(), error = %e, "Failed to remove partial compaction output");
    }
}
