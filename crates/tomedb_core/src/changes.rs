//! Glass changesets.
//!
//! A commit that moves a glass database from revision `N-1` to `N` may leave
//! a `changes<N>` file describing the modified blocks of each table:
//!
//! ```text
//! | magic "TCHG" (4) | version (2) | start (8) | end (8) |
//! | name_len (1) | name | data_len (4) | data |   repeated per block
//! | 0 (1) | crc32 (4) |
//! ```
//!
//! Changesets are checked on their own; a bad one is counted and the table
//! checks still run.

use crate::dir::changeset_revision;
use crate::error::{CoreError, CoreResult};
use crate::output::Output;
use crate::profile::BackendProfile;
use crate::table::{checksum, read_u32, read_u64};
use crate::types::Revision;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Magic at the start of a changeset.
pub const CHANGES_MAGIC: [u8; 4] = *b"TCHG";

/// Current changeset format version.
pub const CHANGES_VERSION: u16 = 1;

const FIXED_SIZE: usize = 4 + 2 + 8 + 8;

/// Changed data of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBlock {
    /// Table the data belongs to.
    pub table: String,
    /// Opaque block data.
    pub data: Vec<u8>,
}

/// The changes from `start` to `end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changeset {
    /// Revision the changes apply to.
    pub start: Revision,
    /// Revision the changes produce.
    pub end: Revision,
    /// Changed blocks.
    pub blocks: Vec<ChangeBlock>,
}

impl Changeset {
    /// Creates an empty changeset for the commit producing `end`.
    #[must_use]
    pub fn new(end: Revision) -> Self {
        Self {
            start: Revision::new(end.as_u64().saturating_sub(1)),
            end,
            blocks: Vec::new(),
        }
    }

    /// Appends a block.
    pub fn push(&mut self, table: impl Into<String>, data: Vec<u8>) {
        self.blocks.push(ChangeBlock {
            table: table.into(),
            data,
        });
    }

    /// Encodes the changeset.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&CHANGES_MAGIC);
        buf.extend_from_slice(&CHANGES_VERSION.to_le_bytes());
        buf.extend_from_slice(&self.start.as_u64().to_le_bytes());
        buf.extend_from_slice(&self.end.as_u64().to_le_bytes());
        for block in &self.blocks {
            let name_len = u8::try_from(block.table.len())
                .ok()
                .filter(|len| *len > 0)
                .ok_or_else(|| CoreError::invalid_operation("changeset table name must be 1-255 bytes"))?;
            let data_len = u32::try_from(block.data.len())
                .map_err(|_| CoreError::invalid_operation("changeset block larger than 4 GiB"))?;
            buf.push(name_len);
            buf.extend_from_slice(block.table.as_bytes());
            buf.extend_from_slice(&data_len.to_le_bytes());
            buf.extend_from_slice(&block.data);
        }
        buf.push(0);
        let crc = checksum(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());
        Ok(buf)
    }

    /// Writes the changeset to `path`.
    pub fn write(&self, path: &Path) -> CoreResult<()> {
        fs::write(path, self.encode()?)?;
        Ok(())
    }

    /// Decodes a changeset, returning the first problem found.
    pub fn decode(data: &[u8]) -> CoreResult<Self> {
        if data.len() < FIXED_SIZE + 1 + 4 {
            return Err(corrupt(format!("only {} bytes", data.len())));
        }
        if data[0..4] != CHANGES_MAGIC {
            return Err(corrupt("bad magic"));
        }
        let version = u16::from_le_bytes([data[4], data[5]]);
        if version != CHANGES_VERSION {
            return Err(CoreError::DatabaseVersion {
                file: "changeset".to_string(),
                found: version,
                expected: CHANGES_VERSION,
            });
        }

        let body_end = data.len() - 4;
        let stored = read_u32(&data[body_end..]);
        let computed = checksum(&data[..body_end]);
        if stored != computed {
            return Err(CoreError::ChecksumMismatch {
                expected: stored,
                actual: computed,
            });
        }

        let start = Revision::new(read_u64(&data[6..14]));
        let end = Revision::new(read_u64(&data[14..22]));
        let mut blocks = Vec::new();
        let mut pos = FIXED_SIZE;
        loop {
            let Some(&name_len) = data[..body_end].get(pos) else {
                return Err(corrupt("missing terminator"));
            };
            pos += 1;
            if name_len == 0 {
                break;
            }
            let name_end = pos + usize::from(name_len);
            if name_end + 4 > body_end {
                return Err(corrupt(format!("block header truncated at byte {pos}")));
            }
            let table = String::from_utf8(data[pos..name_end].to_vec())
                .map_err(|_| corrupt(format!("block name at byte {pos} is not UTF-8")))?;
            let data_len = read_u32(&data[name_end..name_end + 4]) as usize;
            let data_start = name_end + 4;
            if body_end - data_start < data_len {
                return Err(corrupt(format!("block for {table} truncated")));
            }
            blocks.push(ChangeBlock {
                table,
                data: data[data_start..data_start + data_len].to_vec(),
            });
            pos = data_start + data_len;
        }
        if pos != body_end {
            return Err(corrupt(format!("{} bytes after terminator", body_end - pos)));
        }

        Ok(Self { start, end, blocks })
    }
}

fn corrupt(message: impl std::fmt::Display) -> CoreError {
    CoreError::database_corrupt(format!("changeset: {message}"))
}

/// Checks the changeset at `path`, returning the number of problems found.
///
/// Problems are described on `out`; only a failing sink is an error.
pub fn check_changeset(path: &Path, out: &mut Output<'_>) -> CoreResult<usize> {
    match validate(path) {
        Ok(()) => {
            debug!(path = %path.display(), "changeset ok");
            Ok(0)
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "changeset damaged");
            writeln!(out, "{}: {e}", path.display())?;
            Ok(1)
        }
    }
}

fn validate(path: &Path) -> CoreResult<()> {
    let expected_end = changeset_revision(path)
        .ok_or_else(|| corrupt(format!("unexpected file name {}", path.display())))?;
    let changeset = Changeset::decode(&fs::read(path)?)?;

    if changeset.end != expected_end {
        return Err(corrupt(format!(
            "ends at revision {} but is named for {expected_end}",
            changeset.end
        )));
    }
    if changeset.end.as_u64() != changeset.start.as_u64().wrapping_add(1) {
        return Err(corrupt(format!(
            "spans revisions {} to {}",
            changeset.start, changeset.end
        )));
    }
    if let Some(block) = changeset
        .blocks
        .iter()
        .find(|b| BackendProfile::GLASS.table(&b.table).is_none())
    {
        return Err(corrupt(format!("block for unknown table {:?}", block.table)));
    }
    Ok(())
}
