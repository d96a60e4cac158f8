//! Record Module
//!
//! Binary format of the data file and a streaming reader over it.
//!
//! ## Responsibilities
//! - Fixed-size header packing/unpacking
//! - CRC32 checksums over the value payload
//! - Expiry and tombstone evaluation
//! - Sequential scanning with torn-tail tolerance
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ Record 1                                                         │
//! │ ┌─────────┬──────────┬────────┬─────────┬────────┬────────┐      │
//! │ │ CRC (4) │ Time (4) │ TTL(4) │ Del (4) │ KLen(4)│ VLen(4)│ ...  │
//! │ └─────────┴──────────┴────────┴─────────┴────────┴────────┘      │
//! │ ┌─────────────────┬─────────────────────┐                        │
//! │ │ Key (KLen)      │ Value (VLen)        │                        │
//! │ └─────────────────┴─────────────────────┘                        │
//! ├──────────────────────────────────────────────────────────────────┤
//! │ Record 2 ...                                                     │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All header fields are little-endian `u32`. There is no file header,
//! padding or trailer: an empty file is an empty store, and any prefix that
//! ends on a record boundary is a valid store.
//!
//! The checksum covers the value bytes only.

mod codec;
mod header;
mod scanner;

use std::time::{SystemTime, UNIX_EPOCH};

pub use codec::{checksum, RawRecord, Record};
pub use header::RecordHeader;
pub use scanner::{LogScanner, ScannedRecord, ValueMode};

// =============================================================================
// Wire Format Constants
// =============================================================================

/// Header size: Checksum (4) + Timestamp (4) + Expiry (4) + Deleted (4)
/// + KeySize (4) + ValueSize (4) = 24 bytes
pub const HEADER_SIZE: usize = 24;

/// Value written by a delete. The `deleted` flag, not this value, marks a tombstone.
pub const TOMBSTONE_VALUE: &str = "";

/// Current wall-clock time in unix seconds, clamped to the `u32` range
pub fn now_secs() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().min(u32::MAX as u64) as u32)
        .unwrap_or(0)
}
