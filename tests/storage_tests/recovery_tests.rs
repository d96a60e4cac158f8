//! Tests for replay / recovery
//!
//! These tests verify:
//! - Replay of a clean data file (offsets, sizes, last write wins)
//! - Tombstones and expired records stay indexed
//! - Torn tails (partial header, key or value) are ignored by replay and only
//!   cut off by the first append
//! - A file whose first record is unreadable is never overwritten
//! - Verify mode reports without modifying the file
//! - Non-UTF-8 keys inside the log are reported as corruption

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use driftkv::keydir::KeyDir;
use driftkv::record::{Record, RecordHeader, HEADER_SIZE};
use driftkv::storage::{replay, verify, DataFile};
use driftkv::DriftError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_file() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store.db");
    (temp_dir, path)
}

/// Write encoded records straight to disk, returning each record's size
fn write_records(path: &Path, records: &[Record]) -> Vec<u64> {
    let mut file = File::create(path).unwrap();
    let mut sizes = Vec::new();
    for record in records {
        let (size, bytes) = record.encode().unwrap();
        file.write_all(&bytes).unwrap();
        sizes.push(size as u64);
    }
    file.sync_all().unwrap();
    sizes
}

fn append_raw(path: &Path, bytes: &[u8]) {
    let mut file = fs::OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(bytes).unwrap();
    file.sync_all().unwrap();
}

fn replay_path(path: &Path) -> (DataFile, KeyDir, driftkv::Result<driftkv::storage::RecoveryResult>) {
    let mut data_file = DataFile::open(path).unwrap();
    let keydir = KeyDir::new();
    let result = replay(&mut data_file, &keydir);
    (data_file, keydir, result)
}

// =============================================================================
// Clean Replay Tests
// =============================================================================

#[test]
fn test_replay_empty_file() {
    let (_temp, path) = setup_temp_file();
    File::create(&path).unwrap();

    let (data_file, keydir, result) = replay_path(&path);
    let result = result.unwrap();

    assert!(keydir.is_empty());
    assert_eq!(result.records_replayed, 0);
    assert_eq!(result.valid_len, 0);
    assert!(!result.was_truncated);
    assert_eq!(data_file.write_offset(), 0);
}

#[test]
fn test_replay_indexes_offsets_and_sizes() {
    let (_temp, path) = setup_temp_file();
    let sizes = write_records(
        &path,
        &[
            Record::new("name", "Alice", 10, 0).unwrap(),
            Record::new("city", "New York", 11, 0).unwrap(),
        ],
    );

    let (data_file, keydir, result) = replay_path(&path);
    let result = result.unwrap();

    let name = keydir.get("name").unwrap();
    assert_eq!(name.offset, 0);
    assert_eq!(name.size as u64, sizes[0]);
    assert_eq!(name.timestamp, 10);

    let city = keydir.get("city").unwrap();
    assert_eq!(city.offset, sizes[0]);
    assert_eq!(city.size as u64, sizes[1]);

    assert_eq!(result.records_replayed, 2);
    assert_eq!(result.live_keys, 2);
    assert_eq!(data_file.write_offset(), sizes[0] + sizes[1]);
}

#[test]
fn test_replay_last_write_wins() {
    let (_temp, path) = setup_temp_file();
    let sizes = write_records(
        &path,
        &[
            Record::new("quick", "brown fox", 1, 0).unwrap(),
            Record::new("quick", "black fox", 2, 0).unwrap(),
        ],
    );

    let (_data_file, keydir, _) = replay_path(&path);

    let entry = keydir.get("quick").unwrap();
    assert_eq!(entry.offset, sizes[0]);
    assert_eq!(entry.timestamp, 2);
    assert_eq!(keydir.len(), 1);
}

#[test]
fn test_replay_keeps_tombstones_and_expired_records() {
    let (_temp, path) = setup_temp_file();
    let sizes = write_records(
        &path,
        &[
            Record::new("gone", "v", 1, 0).unwrap(),
            Record::tombstone("gone", 2).unwrap(),
            Record::new("stale", "v", 1, 2).unwrap(),
        ],
    );

    let (_data_file, keydir, _) = replay_path(&path);

    assert_eq!(keydir.get("gone").unwrap().offset, sizes[0]);
    assert_eq!(keydir.get("stale").unwrap().offset, sizes[0] + sizes[1]);
}

// =============================================================================
// Torn Tail Tests
// =============================================================================

#[test]
fn test_replay_ignores_partial_header() {
    let (_temp, path) = setup_temp_file();
    let sizes = write_records(&path, &[Record::new("k", "v", 1, 0).unwrap()]);
    append_raw(&path, &[0u8; 10]);

    let (data_file, keydir, result) = replay_path(&path);
    let result = result.unwrap();

    assert_eq!(keydir.len(), 1);
    assert!(result.was_truncated);
    assert_eq!(result.valid_len, sizes[0]);
    assert_eq!(result.file_len, sizes[0] + 10);
    assert_eq!(data_file.write_offset(), sizes[0]);
    assert_eq!(data_file.file_len(), sizes[0] + 10);
}

#[test]
fn test_replay_ignores_partial_key() {
    let (_temp, path) = setup_temp_file();
    let sizes = write_records(&path, &[Record::new("k", "v", 1, 0).unwrap()]);
    let (_, torn) = Record::new("longer-key", "v", 2, 0).unwrap().encode().unwrap();
    append_raw(&path, &torn[..HEADER_SIZE + 3]);

    let (data_file, keydir, result) = replay_path(&path);

    assert!(result.unwrap().was_truncated);
    assert!(!keydir.contains_key("longer-key"));
    assert_eq!(data_file.write_offset(), sizes[0]);
}

#[test]
fn test_replay_ignores_partial_value() {
    let (_temp, path) = setup_temp_file();
    write_records(&path, &[Record::new("k", "v", 1, 0).unwrap()]);
    let (_, torn) = Record::new("k", "updated value", 2, 0).unwrap().encode().unwrap();
    append_raw(&path, &torn[..torn.len() - 1]);

    let (_data_file, keydir, result) = replay_path(&path);

    assert!(result.unwrap().was_truncated);
    // The older, complete record still wins
    assert_eq!(keydir.get("k").unwrap().offset, 0);
}

#[test]
fn test_replay_does_not_modify_file() {
    let (_temp, path) = setup_temp_file();
    write_records(
        &path,
        &[
            Record::new("a", "1", 1, 0).unwrap(),
            Record::new("b", "2", 1, 0).unwrap(),
        ],
    );
    let (_, torn) = Record::new("c", "3", 2, 0).unwrap().encode().unwrap();
    append_raw(&path, &torn[..HEADER_SIZE + 1]);
    let before = fs::read(&path).unwrap();

    let (data_file, _keydir, result) = replay_path(&path);
    assert!(result.unwrap().was_truncated);
    drop(data_file);

    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_first_append_cuts_torn_tail() {
    let (_temp, path) = setup_temp_file();
    let sizes = write_records(&path, &[Record::new("k", "v", 1, 0).unwrap()]);
    append_raw(&path, &[0xAB; 7]);

    let (mut data_file, _keydir, _) = replay_path(&path);
    let (_, bytes) = Record::new("next", "value", 2, 0).unwrap().encode().unwrap();
    let offset = data_file.append(&bytes).unwrap();

    assert_eq!(offset, sizes[0]);
    assert_eq!(data_file.file_len(), sizes[0] + bytes.len() as u64);
    assert_eq!(fs::metadata(&path).unwrap().len(), sizes[0] + bytes.len() as u64);
    let read_back = data_file.read_at(offset, bytes.len() as u32).unwrap();
    assert_eq!(read_back, bytes);
}

#[test]
fn test_append_refused_when_first_record_unreadable() {
    let (_temp, path) = setup_temp_file();
    // Declares a value far larger than the file
    let mut bytes = RecordHeader::new(0, 1, 0, 0, 1, 0x7f00_0000).encode().to_vec();
    bytes.extend_from_slice(b"k some bytes that are not a value");
    fs::write(&path, &bytes).unwrap();

    let (mut data_file, keydir, result) = replay_path(&path);
    assert_eq!(result.unwrap().valid_len, 0);
    assert!(keydir.is_empty());

    let (_, record) = Record::new("k", "v", 2, 0).unwrap().encode().unwrap();
    assert!(matches!(data_file.append(&record), Err(DriftError::Corruption(_))));
    assert_eq!(fs::read(&path).unwrap(), bytes);
}

#[test]
fn test_append_repairs_short_partial_first_header() {
    let (_temp, path) = setup_temp_file();
    fs::write(&path, [0u8; HEADER_SIZE - 4]).unwrap();

    let (mut data_file, _keydir, _) = replay_path(&path);
    let (_, record) = Record::new("k", "v", 2, 0).unwrap().encode().unwrap();

    assert_eq!(data_file.append(&record).unwrap(), 0);
    assert_eq!(fs::read(&path).unwrap(), record);
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_replay_rejects_non_utf8_key() {
    let (_temp, path) = setup_temp_file();
    write_records(&path, &[Record::new("k", "v", 1, 0).unwrap()]);
    let header = RecordHeader::new(0, 1, 0, 0, 2, 0);
    let mut bad = header.encode().to_vec();
    bad.extend_from_slice(&[0xC3, 0x28]);
    append_raw(&path, &bad);

    let (_data_file, _keydir, result) = replay_path(&path);

    assert!(matches!(result, Err(DriftError::Corruption(_))));
}

// =============================================================================
// Verify Tests
// =============================================================================

#[test]
fn test_verify_does_not_modify_file() {
    let (_temp, path) = setup_temp_file();
    let sizes = write_records(
        &path,
        &[
            Record::new("a", "1", 1, 0).unwrap(),
            Record::new("b", "2", 1, 0).unwrap(),
            Record::new("a", "3", 2, 0).unwrap(),
        ],
    );
    append_raw(&path, &[1, 2, 3]);
    let before = fs::read(&path).unwrap();

    let result = verify(&path).unwrap();

    assert_eq!(result.records_replayed, 3);
    assert_eq!(result.live_keys, 2);
    assert_eq!(result.valid_len, sizes.iter().sum::<u64>());
    assert!(result.was_truncated);
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_verify_matches_replay() {
    let (_temp, path) = setup_temp_file();
    write_records(
        &path,
        &[
            Record::new("a", "1", 1, 0).unwrap(),
            Record::tombstone("a", 2).unwrap(),
            Record::new("b", "x".repeat(10_000), 3, 0).unwrap(),
        ],
    );
    append_raw(&path, &[9; 5]);

    let verified = verify(&path).unwrap();
    let (_data_file, _keydir, replayed) = replay_path(&path);

    assert_eq!(verified, replayed.unwrap());
}

#[test]
fn test_verify_missing_file_is_io_error() {
    let (_temp, path) = setup_temp_file();

    assert!(matches!(verify(&path), Err(DriftError::Io(_))));
}
