//! Error types for TomeDB core.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in TomeDB core operations.
///
/// The first three variants are the fatal outcomes of a consistency check:
/// they mean the requested check could not be performed at all, so no error
/// count is available. Everything a check can detect in the data itself is
/// counted instead of raised.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Support for a backend was not compiled in, or was removed.
    #[error("feature unavailable: {message}")]
    FeatureUnavailable {
        /// Description of the missing support.
        message: String,
    },

    /// The path holds a database in a retired format.
    #[error("{backend} database support was removed in version {version}")]
    BackendRemoved {
        /// Display name of the retired backend.
        backend: &'static str,
        /// Release in which support was dropped.
        version: &'static str,
    },

    /// The path is neither a database directory nor a table.
    #[error("not a recognizable database or table: {}", path.display())]
    NotADatabase {
        /// The path that was examined.
        path: PathBuf,
    },

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] tomedb_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A file's contents are inconsistent.
    #[error("database corrupt: {message}")]
    DatabaseCorrupt {
        /// Description of the corruption.
        message: String,
    },

    /// A file was written by an unsupported format version.
    #[error("unsupported format version {found} in {file} (expected {expected})")]
    DatabaseVersion {
        /// File the version was read from.
        file: String,
        /// Version found on disk.
        found: u16,
        /// Version this build understands.
        expected: u16,
    },

    /// Checksum mismatch detected.
    #[error("checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Expected checksum.
        expected: u32,
        /// Actual checksum.
        actual: u32,
    },

    /// Another process holds the write lock.
    #[error("database locked: another writer has exclusive access")]
    DatabaseLocked,

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a feature unavailable error.
    pub fn feature_unavailable(message: impl Into<String>) -> Self {
        Self::FeatureUnavailable {
            message: message.into(),
        }
    }

    /// Creates a not-a-database error.
    pub fn not_a_database(path: impl Into<PathBuf>) -> Self {
        Self::NotADatabase { path: path.into() }
    }

    /// Creates a database corrupt error.
    pub fn database_corrupt(message: impl Into<String>) -> Self {
        Self::DatabaseCorrupt {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true for errors that abort a consistency check outright.
    #[must_use]
    pub fn is_fatal_for_check(&self) -> bool {
        matches!(
            self,
            Self::FeatureUnavailable { .. } | Self::BackendRemoved { .. } | Self::NotADatabase { .. }
        )
    }
}
