//! Core type definitions for TomeDB.

use std::fmt;

/// Identifier of a document within one database.
///
/// Document IDs start at 1. [`DocId::MAX`] doubles as the "unbounded"
/// sentinel used when the real last docid is unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocId(pub u32);

impl DocId {
    /// Largest representable docid, also the "unknown bound" sentinel.
    pub const MAX: Self = Self(u32::MAX);

    /// Creates a new document ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns true if this is the unbounded sentinel.
    #[must_use]
    pub const fn is_unbounded(self) -> bool {
        self.0 == u32::MAX
    }

    /// Encodes the docid as a big-endian key so keys sort in docid order.
    #[must_use]
    pub const fn to_key(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    /// Decodes a docid from the first four bytes of a key.
    #[must_use]
    pub fn from_key(key: &[u8]) -> Option<Self> {
        let bytes: [u8; 4] = key.get(..4)?.try_into().ok()?;
        Some(Self(u32::from_be_bytes(bytes)))
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a committed snapshot of the whole table set.
///
/// Revisions increase monotonically with every commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(pub u64);

impl Revision {
    /// Creates a new revision.
    #[must_use]
    pub const fn new(rev: u64) -> Self {
        Self(rev)
    }

    /// Returns the raw revision value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A supported storage-format generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Generation A: per-table revisions, lazily created tables.
    Chert,
    /// Generation B: single version file and changesets.
    Glass,
}

impl Backend {
    /// Every supported backend, in detection priority order.
    pub const ALL: [Self; 2] = [Self::Chert, Self::Glass];

    /// Name used in messages.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Chert => "Chert",
            Self::Glass => "Glass",
        }
    }

    /// File suffix of this backend's tables, including the dot.
    #[must_use]
    pub const fn table_suffix(self) -> &'static str {
        match self {
            Self::Chert => ".DB",
            Self::Glass => ".glass",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Chert => 0x01,
            Self::Glass => 0x02,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// The set of backends this build can check.
///
/// Built from cargo features by [`BackendSet::compiled`]; asking a checker
/// for a backend outside its set yields
/// [`CoreError::FeatureUnavailable`](crate::CoreError::FeatureUnavailable).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendSet(u8);

impl BackendSet {
    /// No backends.
    pub const EMPTY: Self = Self(0);

    /// Backends enabled through cargo features.
    #[must_use]
    pub fn compiled() -> Self {
        let mut set = Self::EMPTY;
        if cfg!(feature = "chert") {
            set = set.with(Backend::Chert);
        }
        if cfg!(feature = "glass") {
            set = set.with(Backend::Glass);
        }
        set
    }

    /// Returns the set with `backend` added.
    #[must_use]
    pub const fn with(self, backend: Backend) -> Self {
        Self(self.0 | backend.bit())
    }

    /// Returns the set with `backend` removed.
    #[must_use]
    pub const fn without(self, backend: Backend) -> Self {
        Self(self.0 & !backend.bit())
    }

    /// Checks whether `backend` is in the set.
    #[must_use]
    pub const fn contains(self, backend: Backend) -> bool {
        self.0 & backend.bit() != 0
    }
}

impl Default for BackendSet {
    fn default() -> Self {
        Self::compiled()
    }
}
