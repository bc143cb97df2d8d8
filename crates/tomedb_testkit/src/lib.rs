//! # TomeDB Testkit
//!
//! Test utilities for TomeDB.
//!
//! This crate provides:
//! - Temporary databases of either generation
//! - Targeted corruption of tables and version files
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tomedb_testkit::prelude::*;
//!
//! #[test]
//! fn damaged_postlist_is_found() {
//!     let db = TestDatabase::glass();
//!     set_postlist_doclen(db.path(), Backend::Glass, DocId::new(1), 11).unwrap();
//!     assert_eq!(db.check(CheckOptions::NONE).errors, 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod corrupt;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::corrupt::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use tomedb_core::{Backend, BackendSet, CheckOptions, DocId, Revision};
}

pub use corrupt::*;
pub use fixtures::*;
pub use generators::*;
