//! # TomeDB Core
//!
//! Storage formats and consistency checking for TomeDB full-text databases.
//!
//! A database is a directory of key-ordered tables plus a version file. Two
//! on-disk generations are readable:
//!
//! - **chert**: `.DB` tables, some created lazily, version file `iamchert`
//! - **glass**: `.glass` tables, all always present, version file `iamglass`,
//!   plus per-commit changesets
//!
//! The main entry point is [`check`], which walks a database (or a single
//! table) and reports every inconsistency it finds:
//!
//! ```no_run
//! use tomedb_core::{check, CheckOptions};
//!
//! let mut report = Vec::new();
//! let errors = check("/var/lib/search", CheckOptions::SHOW_STATS, Some(&mut report))?;
//! print!("{}", String::from_utf8_lossy(&report));
//! # Ok::<(), tomedb_core::CoreError>(())
//! ```
//!
//! [`DatabaseBuilder`] writes databases of either generation.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod changes;
pub mod check;
pub mod database;
pub mod dir;
pub mod doclens;
mod error;
pub mod layout;
mod options;
mod output;
pub mod profile;
pub mod table;
mod types;
pub mod version;
mod writer;

pub use check::{check, check_table, Checker, RevisionAnchor, TableCheck};
pub use database::{ChertDatabase, GlassDatabase};
pub use doclens::{DocLengths, Recorded, SkipReason, MEMORY_CEILING};
pub use error::{CoreError, CoreResult};
pub use layout::{detect, Detection, TableLocation};
pub use options::CheckOptions;
pub use output::Output;
pub use profile::{BackendProfile, Presence, TableSpec};
pub use table::{TableBuilder, TableFile, TableKind};
pub use types::{Backend, BackendSet, DocId, Revision};
pub use version::{Repair, VersionManager};
pub use writer::{DatabaseBuilder, Document, TermInfo, WrittenDatabase};

/// Version of the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
