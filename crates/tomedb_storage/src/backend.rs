//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level storage backend for TomeDB.
///
/// Storage backends are **opaque byte stores**. They provide simple operations
/// for reading, appending, and flushing data. TomeDB owns all file format
/// interpretation - backends do not understand tables, headers or changesets.
///
/// # Invariants
///
/// - `append` returns the offset where data was written
/// - `read_at` returns exactly the bytes previously written at that offset
/// - `flush` ensures all appended data is handed to the OS
/// - Backends must be `Send + Sync`
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The offset is beyond the current size
    /// - The read would extend beyond the current size
    /// - An I/O error occurs
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends data to the end of the storage.
    ///
    /// Returns the offset where the data was written.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs or the backend is read-only.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Flushes all pending writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Returns the current size of the storage in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Syncs all data and metadata to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;
}
