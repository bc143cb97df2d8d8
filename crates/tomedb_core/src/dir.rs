//! Database directory layout.
//!
//! ```text
//! <db_path>/
//! ├─ iamchert | iamglass   # Version file naming the generation
//! ├─ <table>.DB            # Chert tables (record, termlist, postlist, ...)
//! ├─ <table>.glass         # Glass tables (docdata, termlist, postlist, ...)
//! ├─ changes<N>            # Glass changeset from revision N-1 to N
//! └─ LOCK                  # Advisory lock held by writers
//! ```
//!
//! The checker never takes the lock; only [`WriteLock`] holders modify a
//! directory.

use crate::error::{CoreError, CoreResult};
use crate::types::{Backend, Revision};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Advisory lock file.
pub const LOCK_FILE: &str = "LOCK";

/// Chert version file.
pub const CHERT_VERSION_FILE: &str = "iamchert";

/// Glass version file.
pub const GLASS_VERSION_FILE: &str = "iamglass";

/// Prefix of glass changeset files.
pub const CHANGES_PREFIX: &str = "changes";

/// Returns the path of table `name` in `dir`.
#[must_use]
pub fn table_path(dir: &Path, name: &str, backend: Backend) -> PathBuf {
    dir.join(format!("{name}{}", backend.table_suffix()))
}

/// Returns the path of the changeset ending at `revision`.
#[must_use]
pub fn changeset_path(dir: &Path, revision: Revision) -> PathBuf {
    dir.join(format!("{CHANGES_PREFIX}{revision}"))
}

/// Parses the end revision out of a changeset file name.
#[must_use]
pub fn changeset_revision(path: &Path) -> Option<Revision> {
    let name = path.file_name()?.to_str()?;
    let digits = name.strip_prefix(CHANGES_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(Revision::new)
}

/// Exclusive write access to a database directory.
///
/// Released when dropped.
#[derive(Debug)]
pub struct WriteLock {
    path: PathBuf,
    _lock_file: File,
}

impl WriteLock {
    /// Locks `path`, creating the directory if needed.
    ///
    /// Fails with [`CoreError::DatabaseLocked`] if another writer holds it.
    pub fn acquire(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        if !path.is_dir() {
            return Err(CoreError::invalid_operation(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;
        if lock_file.try_lock_exclusive().is_err() {
            return Err(CoreError::DatabaseLocked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the locked directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Replaces `dir/name` with `data` so readers see either the old or the new
/// file, never a partial one.
pub fn write_atomic(dir: &Path, name: &str, data: &[u8]) -> CoreResult<()> {
    let target = dir.join(name);
    let temp = dir.join(format!("{name}.tmp"));

    let mut file = File::create(&temp)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp, &target)?;
    sync_directory(dir)
}

/// Makes renames and creations inside `dir` durable.
#[cfg(unix)]
pub fn sync_directory(dir: &Path) -> CoreResult<()> {
    File::open(dir)?.sync_all()?;
    Ok(())
}

/// Directory entries are journaled on this platform.
#[cfg(not(unix))]
pub fn sync_directory(_dir: &Path) -> CoreResult<()> {
    Ok(())
}
