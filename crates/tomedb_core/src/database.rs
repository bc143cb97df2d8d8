//! Read-only database handles.
//!
//! Opening validates the version file and the headers of the tables every
//! reader needs. Table contents are not read beyond the postlist metainfo;
//! that is the checker's job.

use crate::dir::table_path;
use crate::error::{CoreError, CoreResult};
use crate::profile::BackendProfile;
use crate::table::content::PostlistMeta;
use crate::table::TableFile;
use crate::types::{Backend, DocId, Revision};
use crate::version::{ChertVersion, GlassVersion};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Reads the metainfo entry, which sorts first in the postlist.
fn read_meta(postlist: &TableFile) -> CoreResult<PostlistMeta> {
    match postlist.first_entry()? {
        Some(entry) if entry.key.is_empty() => PostlistMeta::decode(&entry.value),
        _ => Err(CoreError::database_corrupt(format!(
            "{}: no metainfo entry",
            postlist.path().display()
        ))),
    }
}

/// An open chert database.
#[derive(Debug)]
pub struct ChertDatabase {
    path: PathBuf,
    uuid: Uuid,
    revision: Revision,
    meta: PostlistMeta,
}

impl ChertDatabase {
    /// Opens the chert database in `path`.
    ///
    /// `record` is written last by a commit and `postlist` holds the
    /// metainfo, so both must exist and agree on the revision.
    pub fn open(path: &Path) -> CoreResult<Self> {
        let uuid = ChertVersion::new(path).read_and_check()?;
        let record = TableFile::open(&table_path(path, "record", Backend::Chert), Backend::Chert)?;
        let postlist = TableFile::open(&table_path(path, "postlist", Backend::Chert), Backend::Chert)?;

        let revision = record.header().revision;
        let postlist_revision = postlist.header().revision;
        if revision != postlist_revision {
            return Err(CoreError::database_corrupt(format!(
                "record table is at revision {revision} but postlist is at {postlist_revision}"
            )));
        }

        let meta = read_meta(&postlist)?;
        debug!(path = %path.display(), %revision, last_docid = %meta.last_docid, "opened chert database");
        Ok(Self {
            path: path.to_path_buf(),
            uuid,
            revision,
            meta,
        })
    }

    /// Returns the database directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the database UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Returns the committed revision.
    #[must_use]
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Returns the last assigned docid.
    #[must_use]
    pub fn last_docid(&self) -> DocId {
        self.meta.last_docid
    }

    /// Returns the sum of all document lengths.
    #[must_use]
    pub fn total_doclen(&self) -> u64 {
        self.meta.total_doclen
    }
}

/// An open glass database.
#[derive(Debug)]
pub struct GlassDatabase {
    path: PathBuf,
    version: GlassVersion,
}

impl GlassDatabase {
    /// Opens the glass database in `path`.
    ///
    /// Every table must exist at the version file's revision and the
    /// postlist metainfo must agree with the version file.
    pub fn open(path: &Path) -> CoreResult<Self> {
        let version = GlassVersion::read(path)?;

        let mut postlist = None;
        for name in BackendProfile::GLASS.table_names() {
            let table = TableFile::open(&table_path(path, name, Backend::Glass), Backend::Glass)?;
            let revision = table.header().revision;
            if revision != version.revision {
                return Err(CoreError::database_corrupt(format!(
                    "{name} table is at revision {revision} but the version file says {}",
                    version.revision
                )));
            }
            if name == "postlist" {
                postlist = Some(table);
            }
        }

        if let Some(postlist) = postlist {
            let meta = read_meta(&postlist)?;
            if meta.last_docid != version.last_docid {
                return Err(CoreError::database_corrupt(format!(
                    "postlist last docid {} differs from version file's {}",
                    meta.last_docid, version.last_docid
                )));
            }
        }

        debug!(path = %path.display(), revision = %version.revision, "opened glass database");
        Ok(Self {
            path: path.to_path_buf(),
            version,
        })
    }

    /// Returns the database directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the version file contents.
    #[must_use]
    pub fn version(&self) -> &GlassVersion {
        &self.version
    }

    /// Returns the committed revision.
    #[must_use]
    pub fn revision(&self) -> Revision {
        self.version.revision
    }

    /// Returns the last assigned docid.
    #[must_use]
    pub fn last_docid(&self) -> DocId {
        self.version.last_docid
    }

    /// Returns the number of documents.
    #[must_use]
    pub fn doccount(&self) -> u32 {
        self.version.doccount
    }
}
