//! Record encoding and decoding
//!
//! A record is `header ‖ key ‖ value`. Sizes are measured in encoded bytes,
//! so multi-byte UTF-8 keys and values are accounted for correctly.

use crate::error::{DriftError, Result};

use super::{RecordHeader, HEADER_SIZE, TOMBSTONE_VALUE};

/// CRC32 over a value payload
pub fn checksum(value: &[u8]) -> u32 {
    crc32fast::hash(value)
}

fn size_u32(field: &'static str, size: usize) -> Result<u32> {
    u32::try_from(size).map_err(|_| DriftError::RecordTooLarge { field, size })
}

// =============================================================================
// Owned Record
// =============================================================================

/// A complete record with UTF-8 key and value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub header: RecordHeader,
    pub key: String,
    pub value: String,
}

impl Record {
    /// Build a live record. `expiry` is absolute (unix seconds), 0 = never.
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        timestamp: u32,
        expiry: u32,
    ) -> Result<Self> {
        Self::build(key.into(), value.into(), timestamp, expiry, 0)
    }

    /// Build a tombstone for `key`
    pub fn tombstone(key: impl Into<String>, timestamp: u32) -> Result<Self> {
        Self::build(key.into(), TOMBSTONE_VALUE.to_string(), timestamp, 0, 1)
    }

    fn build(key: String, value: String, timestamp: u32, expiry: u32, deleted: u32) -> Result<Self> {
        let key_size = size_u32("key", key.len())?;
        let value_size = size_u32("value", value.len())?;
        size_u32("record", HEADER_SIZE + key.len() + value.len())?;

        let header = RecordHeader::new(
            checksum(value.as_bytes()),
            timestamp,
            expiry,
            deleted,
            key_size,
            value_size,
        );

        Ok(Self { header, key, value })
    }

    pub fn timestamp(&self) -> u32 {
        self.header.timestamp
    }

    /// Encode to bytes, returning `(total_size, bytes)`
    pub fn encode(&self) -> Result<(u32, Vec<u8>)> {
        let total = HEADER_SIZE + self.key.len() + self.value.len();
        let total_size = size_u32("record", total)?;

        let mut bytes = Vec::with_capacity(total);
        bytes.extend_from_slice(&self.header.encode());
        bytes.extend_from_slice(self.key.as_bytes());
        bytes.extend_from_slice(self.value.as_bytes());

        Ok((total_size, bytes))
    }

    /// Decode a record from a buffer holding at least one full record
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let raw = RawRecord::parse(bytes)?;

        let key = std::str::from_utf8(raw.key)
            .map_err(|e| DriftError::Corruption(format!("record key is not valid UTF-8: {}", e)))?;
        let value = std::str::from_utf8(raw.value)
            .map_err(|e| DriftError::Corruption(format!("record value is not valid UTF-8: {}", e)))?;

        Ok(Self {
            header: raw.header,
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

// =============================================================================
// Borrowed Record
// =============================================================================

/// A record sliced out of a byte buffer without UTF-8 validation.
///
/// The read path uses this to verify the checksum on the raw value bytes
/// before anything is interpreted as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord<'a> {
    pub header: RecordHeader,
    pub key: &'a [u8],
    pub value: &'a [u8],
}

impl<'a> RawRecord<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let header = RecordHeader::decode(bytes)?;

        let key_end = HEADER_SIZE + header.key_size as usize;
        let value_end = key_end + header.value_size as usize;
        if bytes.len() < value_end {
            return Err(DriftError::MalformedRecord {
                expected: value_end,
                actual: bytes.len(),
            });
        }

        Ok(Self {
            header,
            key: &bytes[HEADER_SIZE..key_end],
            value: &bytes[key_end..value_end],
        })
    }
}
