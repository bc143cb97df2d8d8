//! Table file writer.

use super::{TableEntry, TableHeader};
use crate::error::CoreResult;
use crate::types::{Backend, Revision};
use std::collections::BTreeMap;
use std::path::Path;
use tomedb_storage::{FileBackend, StorageBackend};

/// Collects entries and writes them as a table file in key order.
///
/// The header records the entry count, so the whole entry set is known
/// before anything is written.
#[derive(Debug, Default, Clone)]
pub struct TableBuilder {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl TableBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder holding existing entries.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = TableEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.key, e.value)).collect(),
        }
    }

    /// Inserts or replaces an entry.
    pub fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) -> Option<Vec<u8>> {
        self.entries.insert(key, value)
    }

    /// Removes an entry.
    pub fn remove(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.remove(key)
    }

    /// Returns the value stored for `key`.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&Vec<u8>> {
        self.entries.get(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes header and entries to `backend`.
    pub fn write_to(
        &self,
        backend: &mut dyn StorageBackend,
        generation: Backend,
        revision: Revision,
    ) -> CoreResult<()> {
        let header = TableHeader::new(generation, revision, self.entries.len() as u64);
        backend.append(&header.encode())?;
        for (key, value) in &self.entries {
            let entry = TableEntry::new(key.clone(), value.clone());
            backend.append(&entry.encode()?)?;
        }
        backend.flush()?;
        Ok(())
    }

    /// Writes the table to `path`, replacing any existing file.
    pub fn write_file(&self, path: &Path, generation: Backend, revision: Revision) -> CoreResult<()> {
        let mut file = FileBackend::create(path)?;
        self.write_to(&mut file, generation, revision)?;
        file.sync()?;
        Ok(())
    }
}
