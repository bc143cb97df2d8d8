//! Streaming table reader.
//!
//! Reads entries one by one through a bounded buffer so a table of any size
//! can be checked with constant memory.

use super::{
    checksum, read_u32, TableEntry, TableHeader, ENTRY_CRC_SIZE, ENTRY_PREFIX_SIZE, HEADER_SIZE,
};
use crate::error::{CoreError, CoreResult};
use crate::types::Backend;
use std::path::{Path, PathBuf};
use tomedb_storage::{FileBackend, StorageBackend};

/// Read buffer size for streaming iteration.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Outcome of reading one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryRead {
    /// An intact entry.
    Entry {
        /// Offset of the entry within the file.
        offset: u64,
        /// The decoded entry.
        entry: TableEntry,
    },
    /// An entry whose checksum does not match.
    ///
    /// The length prefix was plausible, so reading continues with the next
    /// entry.
    ChecksumMismatch {
        /// Offset of the entry within the file.
        offset: u64,
        /// Key as stored (possibly damaged).
        key: Vec<u8>,
        /// Stored checksum.
        expected: u32,
        /// Checksum of the bytes actually read.
        actual: u32,
    },
}

/// A streaming iterator over table entries.
///
/// Yields `Err` once and then stops if the remaining bytes cannot hold the
/// entry the length prefix announces (truncation or a corrupt prefix).
pub struct TableReader<'a> {
    backend: &'a dyn StorageBackend,
    total_size: u64,
    /// Offset of `buffer[buffer_pos]` within the file.
    current_offset: u64,
    buffer: Vec<u8>,
    buffer_pos: usize,
    buffer_len: usize,
    finished: bool,
}

impl<'a> TableReader<'a> {
    /// Creates a reader over the entries following the header.
    pub fn new(backend: &'a dyn StorageBackend) -> CoreResult<Self> {
        let total_size = backend.size()?;
        Ok(Self {
            backend,
            total_size,
            current_offset: HEADER_SIZE as u64,
            buffer: Vec::new(),
            buffer_pos: 0,
            buffer_len: 0,
            finished: total_size <= HEADER_SIZE as u64,
        })
    }

    /// Ensures `min_bytes` are buffered from the current position.
    ///
    /// Returns `false` if the file ends first.
    fn ensure_buffered(&mut self, min_bytes: usize) -> CoreResult<bool> {
        let available = self.buffer_len - self.buffer_pos;
        if available >= min_bytes {
            return Ok(true);
        }

        let remaining_in_file = self.total_size - self.current_offset - available as u64;
        if remaining_in_file < (min_bytes - available) as u64 {
            return Ok(false);
        }

        if self.buffer_pos > 0 && available > 0 {
            self.buffer.copy_within(self.buffer_pos..self.buffer_len, 0);
        }
        self.buffer_len = available;
        self.buffer_pos = 0;

        let wanted = min_bytes.max(READ_BUFFER_SIZE);
        if wanted > self.buffer.len() {
            self.buffer.resize(wanted.next_power_of_two(), 0);
        }

        let room = (self.buffer.len() - self.buffer_len) as u64;
        let to_read = room.min(remaining_in_file) as usize;
        if to_read > 0 {
            let read_offset = self.current_offset + self.buffer_len as u64;
            let data = self.backend.read_at(read_offset, to_read)?;
            self.buffer[self.buffer_len..self.buffer_len + data.len()].copy_from_slice(&data);
            self.buffer_len += data.len();
        }

        Ok(self.buffer_len - self.buffer_pos >= min_bytes)
    }

    fn read_next(&mut self) -> CoreResult<Option<EntryRead>> {
        if self.finished {
            return Ok(None);
        }

        let offset = self.current_offset;
        if self.buffer_len == self.buffer_pos && offset == self.total_size {
            self.finished = true;
            return Ok(None);
        }

        if !self.ensure_buffered(ENTRY_PREFIX_SIZE)? {
            return Err(CoreError::database_corrupt(format!(
                "truncated entry header at offset {offset}"
            )));
        }

        let prefix = &self.buffer[self.buffer_pos..self.buffer_pos + ENTRY_PREFIX_SIZE];
        let key_len = usize::from(u16::from_le_bytes([prefix[0], prefix[1]]));
        let value_len = read_u32(&prefix[2..6]) as usize;
        let total_len = ENTRY_PREFIX_SIZE + key_len + value_len + ENTRY_CRC_SIZE;

        if !self.ensure_buffered(total_len)? {
            return Err(CoreError::database_corrupt(format!(
                "entry at offset {offset} claims {total_len} bytes but only {} remain",
                self.total_size - offset
            )));
        }

        let start = self.buffer_pos;
        let key_start = start + ENTRY_PREFIX_SIZE;
        let value_start = key_start + key_len;
        let crc_start = value_start + value_len;

        let expected = read_u32(&self.buffer[crc_start..crc_start + ENTRY_CRC_SIZE]);
        let actual = checksum(&self.buffer[start..crc_start]);
        let key = self.buffer[key_start..value_start].to_vec();

        let read = if expected == actual {
            EntryRead::Entry {
                offset,
                entry: TableEntry {
                    key,
                    value: self.buffer[value_start..crc_start].to_vec(),
                },
            }
        } else {
            EntryRead::ChecksumMismatch {
                offset,
                key,
                expected,
                actual,
            }
        };

        self.buffer_pos += total_len;
        self.current_offset += total_len as u64;
        Ok(Some(read))
    }
}

impl Iterator for TableReader<'_> {
    type Item = CoreResult<EntryRead>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_next() {
            Ok(Some(read)) => Some(Ok(read)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// A table file opened for reading.
#[derive(Debug)]
pub struct TableFile {
    path: PathBuf,
    backend: FileBackend,
    header: TableHeader,
}

impl TableFile {
    /// Opens `path` read-only and decodes its header.
    pub fn open(path: &Path, backend: Backend) -> CoreResult<Self> {
        let file = FileBackend::open_read_only(path)?;
        let header = read_header(&file, backend)?;
        Ok(Self {
            path: path.to_path_buf(),
            backend: file,
            header,
        })
    }

    /// Returns the decoded header.
    #[must_use]
    pub fn header(&self) -> &TableHeader {
        &self.header
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the file size in bytes.
    pub fn size(&self) -> CoreResult<u64> {
        Ok(self.backend.size()?)
    }

    /// Streams the entries of the table.
    pub fn entries(&self) -> CoreResult<TableReader<'_>> {
        TableReader::new(&self.backend)
    }

    /// Returns the first entry, failing on any damage.
    pub fn first_entry(&self) -> CoreResult<Option<TableEntry>> {
        match self.entries()?.next() {
            None => Ok(None),
            Some(read) => intact(read?).map(Some),
        }
    }

    /// Reads every entry, failing on any damage.
    pub fn read_all(&self) -> CoreResult<Vec<TableEntry>> {
        self.entries()?.map(|read| intact(read?)).collect()
    }
}

/// Reads and decodes the header of a table held by any backend.
pub fn read_header(backend: &dyn StorageBackend, generation: Backend) -> CoreResult<TableHeader> {
    let size = backend.size()?;
    if size < HEADER_SIZE as u64 {
        return Err(CoreError::database_corrupt(format!(
            "table too short for header: {size} bytes"
        )));
    }
    let bytes = backend.read_at(0, HEADER_SIZE)?;
    TableHeader::decode(&bytes, generation)
}

fn intact(read: EntryRead) -> CoreResult<TableEntry> {
    match read {
        EntryRead::Entry { entry, .. } => Ok(entry),
        EntryRead::ChecksumMismatch {
            expected, actual, ..
        } => Err(CoreError::ChecksumMismatch { expected, actual }),
    }
}
