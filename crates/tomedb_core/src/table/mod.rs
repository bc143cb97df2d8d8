//! Table files.
//!
//! Every table of both backend generations is a single file holding a
//! fixed header followed by key/value entries in strictly ascending key
//! order:
//!
//! ```text
//! header: | magic (4) | version (2) | reserved (2) | revision (8) | entries (8) | crc32 (4) |
//! entry:  | key_len (2) | value_len (4) | key (K) | value (V) | crc32 (4) |
//! ```
//!
//! The magic differs per generation (`CHRT`, `GLAS`) and so does the file
//! suffix (`.DB`, `.glass`). Chert stores 32-bit revisions; the field is
//! widened here so both generations share one layout.
//!
//! Readers stream entries through a bounded buffer ([`TableReader`]); writers
//! collect entries in key order and emit the file in one pass
//! ([`TableBuilder`]).

mod builder;
pub mod content;
mod reader;

pub use builder::TableBuilder;
pub use reader::{read_header, EntryRead, TableFile, TableReader};

use crate::error::{CoreError, CoreResult};
use crate::types::{Backend, Revision};
use std::fmt;

/// Current table format version.
pub const TABLE_VERSION: u16 = 1;

/// Size of the fixed table header.
pub const HEADER_SIZE: usize = 28;

/// Size of the fixed part of an entry preceding key and value.
pub const ENTRY_PREFIX_SIZE: usize = 6;

/// Size of the checksum trailing each entry.
pub const ENTRY_CRC_SIZE: usize = 4;

/// Returns the table magic of a backend generation.
#[must_use]
pub const fn table_magic(backend: Backend) -> [u8; 4] {
    match backend {
        Backend::Chert => *b"CHRT",
        Backend::Glass => *b"GLAS",
    }
}

/// CRC-32 used by every TomeDB file format.
#[must_use]
pub fn checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// The role a table plays in a database.
///
/// Content checks depend on the kind; unknown names fall back to
/// [`TableKind::Other`] and only get structural checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// Chert document data, keyed by docid.
    Record,
    /// Glass document data, keyed by docid.
    DocData,
    /// Terms per document plus the authoritative document length.
    Termlist,
    /// Metainfo, redundant document lengths and postings per term.
    Postlist,
    /// Term positions per document.
    Position,
    /// Spelling correction data.
    Spelling,
    /// Synonym data.
    Synonym,
    /// A table this build has no content checks for.
    Other,
}

impl TableKind {
    /// Maps a (lower-cased) table name to its kind.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "record" => Self::Record,
            "docdata" => Self::DocData,
            "termlist" => Self::Termlist,
            "postlist" => Self::Postlist,
            "position" => Self::Position,
            "spelling" => Self::Spelling,
            "synonym" => Self::Synonym,
            _ => Self::Other,
        }
    }

    /// Returns true if keys start with a docid.
    #[must_use]
    pub const fn is_keyed_by_docid(self) -> bool {
        matches!(
            self,
            Self::Record | Self::DocData | Self::Termlist | Self::Position
        )
    }
}

/// The fixed header at the start of every table file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableHeader {
    /// Generation the table was written by.
    pub backend: Backend,
    /// Format version.
    pub version: u16,
    /// Revision of the commit that wrote the table.
    pub revision: Revision,
    /// Number of entries following the header.
    pub entry_count: u64,
}

impl TableHeader {
    /// Creates a header for the current format version.
    #[must_use]
    pub fn new(backend: Backend, revision: Revision, entry_count: u64) -> Self {
        Self {
            backend,
            version: TABLE_VERSION,
            revision,
            entry_count,
        }
    }

    /// Encodes the header to bytes.
    #[must_use]
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&table_magic(self.backend));
        buf[4..6].copy_from_slice(&self.version.to_le_bytes());
        buf[8..16].copy_from_slice(&self.revision.as_u64().to_le_bytes());
        buf[16..24].copy_from_slice(&self.entry_count.to_le_bytes());
        let crc = checksum(&buf[..24]);
        buf[24..28].copy_from_slice(&crc.to_le_bytes());
        buf
    }

    /// Decodes a header written by `backend`.
    pub fn decode(data: &[u8], backend: Backend) -> CoreResult<Self> {
        if data.len() < HEADER_SIZE {
            return Err(CoreError::database_corrupt(format!(
                "table too short for header: {} bytes",
                data.len()
            )));
        }

        if data[0..4] != table_magic(backend) {
            return Err(CoreError::database_corrupt(format!(
                "bad table magic {:?} (expected {} table)",
                &data[0..4],
                backend
            )));
        }

        let stored_crc = read_u32(&data[24..28]);
        let computed_crc = checksum(&data[..24]);
        if stored_crc != computed_crc {
            return Err(CoreError::ChecksumMismatch {
                expected: stored_crc,
                actual: computed_crc,
            });
        }

        let version = u16::from_le_bytes([data[4], data[5]]);
        if version > TABLE_VERSION {
            return Err(CoreError::DatabaseVersion {
                file: "table".to_string(),
                found: version,
                expected: TABLE_VERSION,
            });
        }

        let revision = Revision::new(read_u64(&data[8..16]));
        if backend == Backend::Chert && revision.as_u64() > u64::from(u32::MAX) {
            return Err(CoreError::database_corrupt(format!(
                "chert revision {revision} does not fit in 32 bits"
            )));
        }

        Ok(Self {
            backend,
            version,
            revision,
            entry_count: read_u64(&data[16..24]),
        })
    }
}

/// A single key/value entry of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    /// Entry key.
    pub key: Vec<u8>,
    /// Entry value.
    pub value: Vec<u8>,
}

impl TableEntry {
    /// Creates a new entry.
    #[must_use]
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Returns the encoded size of this entry.
    #[must_use]
    pub fn encoded_size(&self) -> usize {
        ENTRY_PREFIX_SIZE + self.key.len() + self.value.len() + ENTRY_CRC_SIZE
    }

    /// Encodes the entry to bytes.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        let key_len = u16::try_from(self.key.len())
            .map_err(|_| CoreError::invalid_operation("table key longer than 65535 bytes"))?;
        let value_len = u32::try_from(self.value.len())
            .map_err(|_| CoreError::invalid_operation("table value longer than 4 GiB"))?;

        let mut buf = Vec::with_capacity(self.encoded_size());
        buf.extend_from_slice(&key_len.to_le_bytes());
        buf.extend_from_slice(&value_len.to_le_bytes());
        buf.extend_from_slice(&self.key);
        buf.extend_from_slice(&self.value);
        let crc = checksum(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());
        Ok(buf)
    }
}

/// Formats a key for diagnostics: printable ASCII as-is, other bytes escaped.
pub struct KeyDisplay<'a>(pub &'a [u8]);

impl fmt::Display for KeyDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

pub(crate) fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}

pub(crate) fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(buf)
}
