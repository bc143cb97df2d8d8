//! Glass version file and header access.
//!
//! ```text
//! | magic "TOMEGLAS" (8) | version (2) | revision (8) | last_docid (4) |
//! | doccount (4) | uuid (16) | crc32 (4) |
//! ```

use super::{VersionManager, VERSION_FILE_FORMAT};
use crate::dir::{changeset_path, changeset_revision, write_atomic, GLASS_VERSION_FILE};
use crate::error::{CoreError, CoreResult};
use crate::table::{checksum, read_u32, read_u64};
use crate::types::{Backend, DocId, Revision};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Magic at the start of `iamglass`.
pub const GLASS_VERSION_MAGIC: [u8; 8] = *b"TOMEGLAS";

const FILE_SIZE: usize = 8 + 2 + 8 + 4 + 4 + 16 + 4;

/// Contents of an `iamglass` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlassVersion {
    /// Committed revision.
    pub revision: Revision,
    /// Last assigned docid.
    pub last_docid: DocId,
    /// Number of documents.
    pub doccount: u32,
    /// Database UUID.
    pub uuid: Uuid,
}

impl GlassVersion {
    /// Header of an empty database at revision 0.
    #[must_use]
    pub fn new(uuid: Uuid) -> Self {
        Self {
            revision: Revision::new(0),
            last_docid: DocId::new(0),
            doccount: 0,
            uuid,
        }
    }

    /// Reads `iamglass` from `dir`.
    pub fn read(dir: &Path) -> CoreResult<Self> {
        let data = fs::read(dir.join(GLASS_VERSION_FILE))?;
        Self::decode(&data)
    }

    /// Writes `iamglass` into `dir` atomically.
    pub fn write(&self, dir: &Path) -> CoreResult<()> {
        write_atomic(dir, GLASS_VERSION_FILE, &self.encode())
    }

    /// Encodes the file.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(FILE_SIZE);
        buf.extend_from_slice(&GLASS_VERSION_MAGIC);
        buf.extend_from_slice(&VERSION_FILE_FORMAT.to_le_bytes());
        buf.extend_from_slice(&self.revision.as_u64().to_le_bytes());
        buf.extend_from_slice(&self.last_docid.as_u32().to_le_bytes());
        buf.extend_from_slice(&self.doccount.to_le_bytes());
        buf.extend_from_slice(self.uuid.as_bytes());
        let crc = checksum(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());
        buf
    }

    /// Decodes the file.
    pub fn decode(data: &[u8]) -> CoreResult<Self> {
        if data.len() < 8 || data[0..8] != GLASS_VERSION_MAGIC {
            return Err(CoreError::database_corrupt(
                "iamglass: not a glass version file",
            ));
        }
        if data.len() != FILE_SIZE {
            return Err(CoreError::database_corrupt(format!(
                "iamglass: {} bytes, expected {FILE_SIZE}",
                data.len()
            )));
        }

        let body = FILE_SIZE - 4;
        let stored = read_u32(&data[body..]);
        let computed = checksum(&data[..body]);
        if stored != computed {
            return Err(CoreError::ChecksumMismatch {
                expected: stored,
                actual: computed,
            });
        }

        let version = u16::from_le_bytes([data[8], data[9]]);
        if version != VERSION_FILE_FORMAT {
            return Err(CoreError::DatabaseVersion {
                file: GLASS_VERSION_FILE.to_string(),
                found: version,
                expected: VERSION_FILE_FORMAT,
            });
        }

        let mut uuid = [0u8; 16];
        uuid.copy_from_slice(&data[26..42]);
        Ok(Self {
            revision: Revision::new(read_u64(&data[10..18])),
            last_docid: DocId::new(read_u32(&data[18..22])),
            doccount: read_u32(&data[22..26]),
            uuid: Uuid::from_bytes(uuid),
        })
    }
}

/// Header access for a glass directory.
#[derive(Debug)]
pub struct GlassVersionManager {
    dir: PathBuf,
    version: GlassVersion,
}

impl GlassVersionManager {
    /// Reads the version file of `dir`.
    pub fn open(dir: &Path) -> CoreResult<Self> {
        Ok(Self {
            dir: dir.to_path_buf(),
            version: GlassVersion::read(dir)?,
        })
    }

    /// Returns the decoded version file.
    #[must_use]
    pub fn version(&self) -> &GlassVersion {
        &self.version
    }
}

impl VersionManager for GlassVersionManager {
    fn backend(&self) -> Backend {
        Backend::Glass
    }

    fn revision(&self) -> Option<Revision> {
        Some(self.version.revision)
    }

    fn last_docid(&self) -> DocId {
        self.version.last_docid
    }

    /// Changesets for revisions `1..=revision` that exist on disk.
    ///
    /// Found by listing the directory, so a corrupt revision cannot make
    /// this probe billions of names.
    fn enumerate_changesets(&self) -> CoreResult<Vec<PathBuf>> {
        let current = self.version.revision;
        let mut found: Vec<(Revision, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let Some(r) = changeset_revision(&path) else {
                continue;
            };
            if r.as_u64() >= 1 && r <= current && path == changeset_path(&self.dir, r) {
                found.push((r, path));
            }
        }
        found.sort_unstable_by(|a, b| b.0.cmp(&a.0));
        Ok(found.into_iter().map(|(_, path)| path).collect())
    }
}
