//! Chert version file and header access.
//!
//! ```text
//! | magic "TOMECHRT" (8) | version (2) | uuid (16) | crc32 (4) |
//! ```
//!
//! The revision of a chert database lives in its table headers, so the
//! version file only identifies the database.

use super::{Repair, VersionManager, VERSION_FILE_FORMAT};
use crate::database::ChertDatabase;
use crate::dir::{write_atomic, CHERT_VERSION_FILE};
use crate::error::{CoreError, CoreResult};
use crate::table::{checksum, read_u32};
use crate::types::{Backend, DocId, Revision};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

/// Magic at the start of `iamchert`.
pub const CHERT_VERSION_MAGIC: [u8; 8] = *b"TOMECHRT";

const FILE_SIZE: usize = 8 + 2 + 16 + 4;

/// The `iamchert` file of one directory.
#[derive(Debug, Clone)]
pub struct ChertVersion {
    dir: PathBuf,
}

impl ChertVersion {
    /// Refers to the version file in `dir`; nothing is read yet.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the path of the version file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(CHERT_VERSION_FILE)
    }

    /// Reads the file and checks it is self-consistent.
    pub fn read_and_check(&self) -> CoreResult<Uuid> {
        let data = fs::read(self.path())?;
        Self::decode(&data)
    }

    /// Writes a fresh version file with a new UUID.
    pub fn create(&self) -> CoreResult<Uuid> {
        let uuid = Uuid::new_v4();
        write_atomic(&self.dir, CHERT_VERSION_FILE, &Self::encode(uuid))?;
        Ok(uuid)
    }

    /// Encodes a version file.
    #[must_use]
    pub fn encode(uuid: Uuid) -> Vec<u8> {
        let mut buf = Vec::with_capacity(FILE_SIZE);
        buf.extend_from_slice(&CHERT_VERSION_MAGIC);
        buf.extend_from_slice(&VERSION_FILE_FORMAT.to_le_bytes());
        buf.extend_from_slice(uuid.as_bytes());
        let crc = checksum(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());
        buf
    }

    /// Decodes a version file, returning the database UUID.
    pub fn decode(data: &[u8]) -> CoreResult<Uuid> {
        if data.len() < 8 || data[0..8] != CHERT_VERSION_MAGIC {
            return Err(CoreError::database_corrupt(
                "iamchert: not a chert version file",
            ));
        }
        if data.len() != FILE_SIZE {
            return Err(CoreError::database_corrupt(format!(
                "iamchert: {} bytes, expected {FILE_SIZE}",
                data.len()
            )));
        }

        let stored = read_u32(&data[26..30]);
        let computed = checksum(&data[..26]);
        if stored != computed {
            return Err(CoreError::ChecksumMismatch {
                expected: stored,
                actual: computed,
            });
        }

        let version = u16::from_le_bytes([data[8], data[9]]);
        if version != VERSION_FILE_FORMAT {
            return Err(CoreError::DatabaseVersion {
                file: CHERT_VERSION_FILE.to_string(),
                found: version,
                expected: VERSION_FILE_FORMAT,
            });
        }

        let mut uuid = [0u8; 16];
        uuid.copy_from_slice(&data[10..26]);
        Ok(Uuid::from_bytes(uuid))
    }
}

/// Header access for a chert directory.
#[derive(Debug)]
pub struct ChertVersionManager {
    dir: PathBuf,
    revision: Option<Revision>,
    last_docid: DocId,
}

impl ChertVersionManager {
    /// Opens the database for reading and takes revision and last docid
    /// from it.
    pub fn open(dir: &Path) -> CoreResult<Self> {
        let db = ChertDatabase::open(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            revision: Some(db.revision()),
            last_docid: db.last_docid(),
        })
    }

    /// Header access for a database that could not be opened.
    ///
    /// The revision is unknown and the last docid is unbounded.
    #[must_use]
    pub fn unopened(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            revision: None,
            last_docid: DocId::MAX,
        }
    }
}

impl VersionManager for ChertVersionManager {
    fn backend(&self) -> Backend {
        Backend::Chert
    }

    fn revision(&self) -> Option<Revision> {
        self.revision
    }

    fn last_docid(&self) -> DocId {
        self.last_docid
    }

    fn recreate(&self) -> CoreResult<Repair> {
        let version = ChertVersion::new(&self.dir);
        match version.read_and_check() {
            Ok(_) => Ok(Repair::AlreadyValid),
            Err(e) => {
                warn!(path = %version.path().display(), error = %e, "invalid version file");
                let uuid = version.create()?;
                info!(path = %version.path().display(), %uuid, "version file recreated");
                Ok(Repair::Recreated)
            }
        }
    }
}
