//! # TomeDB Storage
//!
//! Storage backend trait and implementations for TomeDB.
//!
//! Storage backends are **opaque byte stores**: they know nothing about
//! table files, version headers or changesets. `tomedb_core` owns all format
//! interpretation and reads through [`StorageBackend::read_at`] so that table
//! checks can stream arbitrarily large files with bounded memory.
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral storage
//! - [`FileBackend`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use tomedb_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"hello world").unwrap();
//! let data = backend.read_at(offset, 11).unwrap();
//! assert_eq!(&data, b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
