//! Data File
//!
//! The single append-only file backing a store.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{DriftError, Result};
use crate::record::HEADER_SIZE;

/// Handle on the data file plus the append cursor.
///
/// Opened in append mode: every write lands at the physical end of the file.
/// When replay stops short of the end, the bytes past the last complete record
/// stay on disk until the first append, which cuts them off before writing.
/// Opening and reading a store never changes the file.
pub struct DataFile {
    path: PathBuf,
    file: File,

    /// Offset the next append will be written at
    write_offset: u64,

    /// Physical length while unreadable bytes sit past `write_offset`
    pending_tail: Option<u64>,
}

impl DataFile {
    /// Open or create the data file, creating its parent directory if needed
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        let write_offset = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            write_offset,
            pending_tail: None,
        })
    }

    /// Record where the last complete record ends.
    ///
    /// Anything past `valid_len` is left in place and only cut off by the
    /// next [`append`](DataFile::append).
    pub fn set_valid_len(&mut self, valid_len: u64) {
        let file_len = self.pending_tail.unwrap_or(self.write_offset);
        if valid_len < file_len {
            self.pending_tail = Some(file_len);
            self.write_offset = valid_len;
        } else {
            self.pending_tail = None;
            self.write_offset = file_len;
        }
    }

    /// Append `bytes`, flush and fsync. Returns the offset the bytes were written at.
    pub fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        self.repair_tail()?;

        let offset = self.write_offset;

        self.file.write_all(bytes)?;
        self.file.flush()?;
        self.file.sync_all()?;

        self.write_offset += bytes.len() as u64;
        Ok(offset)
    }

    /// Read exactly `len` bytes starting at `offset`
    pub fn read_at(&mut self, offset: u64, len: u32) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len as usize];
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Flush and fsync
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Cut the file back to `len` bytes and fsync
    pub fn truncate(&mut self, len: u64) -> Result<()> {
        self.file.set_len(len)?;
        self.file.sync_all()?;
        self.write_offset = len;
        self.pending_tail = None;
        Ok(())
    }

    /// Independent handle on the same file (for sequential scans)
    pub fn reader(&self) -> Result<File> {
        Ok(self.file.try_clone()?)
    }

    /// Offset the next append will be written at
    pub fn write_offset(&self) -> u64 {
        self.write_offset
    }

    /// Physical file length, unreadable tail included
    pub fn file_len(&self) -> u64 {
        self.pending_tail.unwrap_or(self.write_offset)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cut off a pending unreadable tail before the first write lands.
    ///
    /// Refused when not even the first record is readable: the file is then
    /// damaged at its start or is not a data file at all.
    fn repair_tail(&mut self) -> Result<()> {
        let file_len = match self.pending_tail {
            Some(file_len) => file_len,
            None => return Ok(()),
        };

        if self.write_offset == 0 && file_len >= HEADER_SIZE as u64 {
            return Err(DriftError::Corruption(format!(
                "{}: first record is unreadable, refusing to overwrite {} bytes",
                self.path.display(),
                file_len
            )));
        }

        warn!(
            path = %self.path.display(),
            valid_len = self.write_offset,
            file_len,
            "Discarding torn record at end of data file"
        );
        self.truncate(self.write_offset)
    }
}
