//! In-memory storage backend.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;

/// A byte store held entirely in memory.
///
/// Table images built in unit tests and by tooling that wants to inspect a
/// table before writing it out live here.
///
/// ```rust
/// use tomedb_storage::{StorageBackend, InMemoryBackend};
///
/// let backend = InMemoryBackend::with_data(b"CHRT".to_vec());
/// assert_eq!(backend.size().unwrap(), 4);
/// assert_eq!(backend.read_at(0, 4).unwrap(), b"CHRT");
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    data: RwLock<Vec<u8>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend holding `data`.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Returns a copy of the stored bytes.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.data.read().clone()
    }

    /// Consumes the backend and returns the stored bytes.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.data.into_inner()
    }
}

impl StorageBackend for InMemoryBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let data = self.data.read();
        let size = data.len() as u64;
        let end = offset.saturating_add(len as u64);

        if offset > size || end > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        let start = offset as usize;
        Ok(data[start..start + len].to_vec())
    }

    fn append(&mut self, bytes: &[u8]) -> StorageResult<u64> {
        let mut data = self.data.write();
        let offset = data.len() as u64;
        data.extend_from_slice(bytes);
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.read().len() as u64)
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }
}
