//! File-based storage backend for persistent storage.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A file-based storage backend.
///
/// # Access modes
///
/// - [`FileBackend::open`] opens or creates a file for reading and appending
/// - [`FileBackend::create`] starts a fresh, empty file
/// - [`FileBackend::open_read_only`] never creates or modifies anything; the
///   consistency checker uses this so inspecting a database cannot alter it
///
/// # Example
///
/// ```no_run
/// use tomedb_storage::{StorageBackend, FileBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::create(Path::new("postlist.glass")).unwrap();
/// backend.append(b"table bytes").unwrap();
/// backend.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    file: RwLock<File>,
    size: RwLock<u64>,
    read_only: bool,
}

impl FileBackend {
    /// Opens or creates a file backend at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        Self::from_file(path, file, false)
    }

    /// Creates an empty file at `path`, discarding any previous contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Self::from_file(path, file, false)
    }

    /// Opens an existing file for reading only.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be read.
    pub fn open_read_only(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new().read(true).open(path)?;
        Self::from_file(path, file, true)
    }

    fn from_file(path: &Path, file: File, read_only: bool) -> StorageResult<Self> {
        let size = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file: RwLock::new(file),
            size: RwLock::new(size),
            read_only,
        })
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the backend was opened with [`FileBackend::open_read_only`].
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn ensure_writable(&self) -> StorageResult<()> {
        if self.read_only {
            return Err(StorageError::ReadOnly(self.path.display().to_string()));
        }
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let size = *self.size.read();
        let end = offset.saturating_add(len as u64);

        if offset > size || end > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        if len == 0 {
            return Ok(Vec::new());
        }

        let mut file = self.file.write();
        file.seek(SeekFrom::Start(offset))?;

        let mut buffer = vec![0u8; len];
        file.read_exact(&mut buffer)?;

        Ok(buffer)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        self.ensure_writable()?;

        if data.is_empty() {
            return Ok(*self.size.read());
        }

        let mut file = self.file.write();
        let mut size = self.size.write();

        let offset = *size;
        file.seek(SeekFrom::End(0))?;
        file.write_all(data)?;
        *size += data.len() as u64;

        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        if self.read_only {
            return Ok(());
        }
        let mut file = self.file.write();
        file.flush()?;
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(*self.size.read())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.ensure_writable()?;
        let file = self.file.write();
        file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_create_new() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.bin");

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.size().unwrap(), 0);
        assert!(path.exists());
    }

    #[test]
    fn file_append_and_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.bin");

        let mut backend = FileBackend::open(&path).unwrap();

        let offset1 = backend.append(b"hello").unwrap();
        assert_eq!(offset1, 0);

        let offset2 = backend.append(b" world").unwrap();
        assert_eq!(offset2, 5);

        assert_eq!(backend.size().unwrap(), 11);

        let data = backend.read_at(0, 11).unwrap();
        assert_eq!(&data, b"hello world");
    }

    #[test]
    fn file_read_past_end_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.bin");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.append(b"hello").unwrap();

        let result = backend.read_at(10, 5);
        assert!(matches!(result, Err(StorageError::ReadPastEnd { .. })));
    }

    #[test]
    fn create_discards_previous_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.bin");

        {
            let mut backend = FileBackend::open(&path).unwrap();
            backend.append(b"old contents").unwrap();
            backend.sync().unwrap();
        }

        let backend = FileBackend::create(&path).unwrap();
        assert_eq!(backend.size().unwrap(), 0);
    }

    #[test]
    fn read_only_sees_existing_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.bin");

        {
            let mut backend = FileBackend::create(&path).unwrap();
            backend.append(b"persistent data").unwrap();
            backend.sync().unwrap();
        }

        let backend = FileBackend::open_read_only(&path).unwrap();
        assert!(backend.is_read_only());
        assert_eq!(backend.size().unwrap(), 15);
        assert_eq!(backend.read_at(11, 4).unwrap(), b"data");
    }

    #[test]
    fn read_only_rejects_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.bin");
        FileBackend::create(&path).unwrap();

        let mut backend = FileBackend::open_read_only(&path).unwrap();
        assert!(matches!(
            backend.append(b"x"),
            Err(StorageError::ReadOnly(_))
        ));
        assert!(backend.flush().is_ok());
    }

    #[test]
    fn read_only_does_not_create() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.bin");

        assert!(FileBackend::open_read_only(&path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn file_empty_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.bin");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.append(b"hello").unwrap();

        let data = backend.read_at(2, 0).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn file_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.bin");

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.path(), path);
    }
}
