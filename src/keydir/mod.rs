//! Key Directory Module
//!
//! In-memory index from key to the location of its latest record.
//!
//! ## Responsibilities
//! - O(1) lookup of a key's record offset and length
//! - Last write wins: inserting an existing key overwrites its entry
//! - Tombstones stay indexed so `get` can tell "deleted" from "never written"
//!
//! The directory has no persistence of its own. It is rebuilt on every open
//! by replaying the data file.

mod table;

pub use table::KeyDir;

/// Location of a key's most recent record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDirEntry {
    /// Write time of the record (unix seconds)
    pub timestamp: u32,

    /// Byte offset of the record header in the data file
    pub offset: u64,

    /// Encoded record length (header + key + value)
    pub size: u32,
}

impl KeyDirEntry {
    pub fn new(timestamp: u32, offset: u64, size: u32) -> Self {
        Self {
            timestamp,
            offset,
            size,
        }
    }

    /// Offset just past the end of the record
    pub fn end_offset(&self) -> u64 {
        self.offset + self.size as u64
    }
}
