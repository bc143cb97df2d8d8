//! Version files.
//!
//! Each generation keeps a small metadata header in its database directory.
//! [`VersionManager`] is the view of that header the checker works with: the
//! committed revision, the last assigned docid, the changesets to check and,
//! where the generation defines it, regeneration of a damaged header.

mod chert;
mod glass;

pub use chert::{ChertVersion, ChertVersionManager, CHERT_VERSION_MAGIC};
pub use glass::{GlassVersion, GlassVersionManager, GLASS_VERSION_MAGIC};

use crate::error::CoreResult;
use crate::types::{Backend, DocId, Revision};
use std::path::PathBuf;

/// Current format version of both version files.
pub const VERSION_FILE_FORMAT: u16 = 1;

/// Outcome of a header repair request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repair {
    /// The header was invalid and has been written afresh.
    Recreated,
    /// The header was valid; nothing was written.
    AlreadyValid,
    /// The generation has no repair.
    Unsupported,
}

/// Access to a database's version header.
pub trait VersionManager {
    /// Generation of the database.
    fn backend(&self) -> Backend;

    /// Committed revision, if it could be read.
    fn revision(&self) -> Option<Revision>;

    /// Last assigned docid, or [`DocId::MAX`] when unknown.
    fn last_docid(&self) -> DocId;

    /// Existing changeset files, newest first.
    ///
    /// Fails if the directory cannot be listed.
    fn enumerate_changesets(&self) -> CoreResult<Vec<PathBuf>> {
        Ok(Vec::new())
    }

    /// Validates the header and rewrites it if it is invalid.
    fn recreate(&self) -> CoreResult<Repair> {
        Ok(Repair::Unsupported)
    }
}
