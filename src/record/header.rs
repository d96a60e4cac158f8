//! Record Header
//!
//! Fixed 24-byte header preceding every key/value payload.

use bytes::{Buf, BufMut};

use crate::error::{DriftError, Result};

use super::{checksum, HEADER_SIZE};

/// Decoded record header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordHeader {
    /// CRC32 of the value bytes
    pub checksum: u32,
    /// Write time (unix seconds)
    pub timestamp: u32,
    /// Absolute expiry (unix seconds), 0 = never
    pub expiry: u32,
    /// 1 = tombstone
    pub deleted: u32,
    /// Key length in bytes
    pub key_size: u32,
    /// Value length in bytes
    pub value_size: u32,
}

impl RecordHeader {
    pub fn new(
        checksum: u32,
        timestamp: u32,
        expiry: u32,
        deleted: u32,
        key_size: u32,
        value_size: u32,
    ) -> Self {
        Self {
            checksum,
            timestamp,
            expiry,
            deleted,
            key_size,
            value_size,
        }
    }

    /// Pack into the on-disk layout
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        let mut cursor: &mut [u8] = &mut buf;
        cursor.put_u32_le(self.checksum);
        cursor.put_u32_le(self.timestamp);
        cursor.put_u32_le(self.expiry);
        cursor.put_u32_le(self.deleted);
        cursor.put_u32_le(self.key_size);
        cursor.put_u32_le(self.value_size);
        buf
    }

    /// Unpack from the first `HEADER_SIZE` bytes of `bytes`
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(DriftError::MalformedHeader {
                expected: HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        let mut buf = &bytes[..HEADER_SIZE];
        Ok(Self {
            checksum: buf.get_u32_le(),
            timestamp: buf.get_u32_le(),
            expiry: buf.get_u32_le(),
            deleted: buf.get_u32_le(),
            key_size: buf.get_u32_le(),
            value_size: buf.get_u32_le(),
        })
    }

    /// Total encoded size of the record this header describes
    pub fn record_size(&self) -> u64 {
        HEADER_SIZE as u64 + self.key_size as u64 + self.value_size as u64
    }

    /// `expiry == 0` never expires; otherwise expired once `expiry <= now`
    pub fn is_expired(&self, now: u32) -> bool {
        self.expiry != 0 && self.expiry <= now
    }

    pub fn is_tombstone(&self) -> bool {
        self.deleted == 1
    }

    /// Recompute the CRC32 over `value` and compare with the stored checksum
    pub fn is_checksum_valid(&self, value: &[u8]) -> bool {
        self.checksum == checksum(value)
    }
}
