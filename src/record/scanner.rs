//! Log Scanner
//!
//! Sequential iteration over the records of a data file.

use std::io::{BufReader, Read, Seek, SeekFrom};

use crate::error::{DriftError, Result};

use super::{RecordHeader, HEADER_SIZE};

/// Whether the scanner reads value payloads or seeks past them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueMode {
    Skip,
    Read,
}

/// One complete record found by the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedRecord {
    /// Byte offset of the record's header
    pub offset: u64,
    pub header: RecordHeader,
    pub key: Vec<u8>,
    /// `None` when scanning with [`ValueMode::Skip`]
    pub value: Option<Vec<u8>>,
}

impl ScannedRecord {
    /// Total encoded size of this record
    pub fn size(&self) -> u64 {
        self.header.record_size()
    }

    /// The key as UTF-8
    pub fn key_str(&self) -> Result<&str> {
        std::str::from_utf8(&self.key).map_err(|e| {
            DriftError::Corruption(format!(
                "key of record at offset {} is not valid UTF-8: {}",
                self.offset, e
            ))
        })
    }

    /// Re-encode the record verbatim. Returns `None` if the value was skipped.
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        let value = self.value.as_ref()?;
        let mut bytes = Vec::with_capacity(self.size() as usize);
        bytes.extend_from_slice(&self.header.encode());
        bytes.extend_from_slice(&self.key);
        bytes.extend_from_slice(value);
        Some(bytes)
    }
}

/// Streaming reader over a data file.
///
/// The source is buffered internally; skipped values move within the buffer
/// instead of discarding it.
///
/// Stops at the first record that is not completely present in the source:
/// a partial header or a record whose declared end lies past the end of the
/// source. Such a tail is never reported as an error; [`valid_len`] tells the
/// caller where the last complete record ends.
///
/// [`valid_len`]: LogScanner::valid_len
pub struct LogScanner<R> {
    reader: BufReader<R>,
    mode: ValueMode,
    /// Source length, captured when the scanner was created
    source_len: u64,
    /// End of the last complete record
    position: u64,
    done: bool,
}

impl<R: Read + Seek> LogScanner<R> {
    /// Create a scanner positioned at offset 0
    pub fn new(mut source: R, mode: ValueMode) -> Result<Self> {
        let source_len = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(0))?;

        Ok(Self {
            reader: BufReader::new(source),
            mode,
            source_len,
            position: 0,
            done: false,
        })
    }

    /// Offset just past the last complete record read so far
    pub fn valid_len(&self) -> u64 {
        self.position
    }

    /// Length of the source when scanning started
    pub fn source_len(&self) -> u64 {
        self.source_len
    }

    /// True once the scan has ended short of the end of the source
    pub fn is_truncated(&self) -> bool {
        self.done && self.position < self.source_len
    }

    fn read_next(&mut self) -> Result<Option<ScannedRecord>> {
        let remaining = self.source_len - self.position;
        if remaining < HEADER_SIZE as u64 {
            return Ok(None);
        }

        let mut header_bytes = [0u8; HEADER_SIZE];
        self.reader.read_exact(&mut header_bytes)?;
        let header = RecordHeader::decode(&header_bytes)?;

        // Torn write: the record never made it to disk in full
        if header.record_size() > remaining {
            return Ok(None);
        }

        let mut key = vec![0u8; header.key_size as usize];
        self.reader.read_exact(&mut key)?;

        let value = match self.mode {
            ValueMode::Skip => {
                self.reader.seek_relative(header.value_size as i64)?;
                None
            }
            ValueMode::Read => {
                let mut value = vec![0u8; header.value_size as usize];
                self.reader.read_exact(&mut value)?;
                Some(value)
            }
        };

        let offset = self.position;
        self.position += header.record_size();

        Ok(Some(ScannedRecord {
            offset,
            header,
            key,
            value,
        }))
    }
}

impl<R: Read + Seek> Iterator for LogScanner<R> {
    type Item = Result<ScannedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.read_next() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
