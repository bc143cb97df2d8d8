//! Targeted damage to database files.
//!
//! Byte-level helpers break files the way a bad disk would; [`TableEditor`]
//! rewrites individual entries while keeping the file well formed, for
//! faults only the content checks can see.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tomedb_core::dir::table_path;
use tomedb_core::table::content::{
    decode_doclen, doclen_key, encode_doclen, PostlistMeta, TermlistValue,
};
use tomedb_core::{Backend, CoreError, CoreResult, DocId, Revision, TableBuilder, TableFile};

/// XORs the byte at `offset` with `0xFF`.
pub fn flip_byte(path: &Path, offset: usize) -> io::Result<()> {
    let mut data = fs::read(path)?;
    let byte = data.get_mut(offset).ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "offset past end of file")
    })?;
    *byte ^= 0xFF;
    fs::write(path, data)
}

/// Cuts the file down to `len` bytes.
pub fn truncate(path: &Path, len: u64) -> io::Result<()> {
    fs::OpenOptions::new().write(true).open(path)?.set_len(len)
}

/// Replaces the file with `garbage`.
pub fn overwrite(path: &Path, garbage: &[u8]) -> io::Result<()> {
    fs::write(path, garbage)
}

/// Loads a table, edits entries in memory and writes it back.
///
/// Saved tables keep their revision and get a correct header and checksums.
pub struct TableEditor {
    path: PathBuf,
    backend: Backend,
    revision: Revision,
    entries: TableBuilder,
}

impl TableEditor {
    /// Opens table `name` of the database in `dir`.
    pub fn open(dir: &Path, name: &str, backend: Backend) -> CoreResult<Self> {
        let path = table_path(dir, name, backend);
        let file = TableFile::open(&path, backend)?;
        Ok(Self {
            revision: file.header().revision,
            entries: TableBuilder::from_entries(file.read_all()?),
            path,
            backend,
        })
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &[u8]) -> Option<&Vec<u8>> {
        self.entries.get(key)
    }

    /// Stores `value` under `key`.
    pub fn set(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Removes `key`.
    pub fn remove(&mut self, key: &[u8]) -> &mut Self {
        self.entries.remove(key);
        self
    }

    /// Changes the revision written on save.
    pub fn set_revision(&mut self, revision: Revision) -> &mut Self {
        self.revision = revision;
        self
    }

    /// Writes the table back.
    pub fn save(&self) -> CoreResult<()> {
        self.entries.write_file(&self.path, self.backend, self.revision)
    }
}

fn missing(what: impl Into<String>) -> CoreError {
    CoreError::invalid_operation(what)
}

/// Sets the postlist's length for `did`, keeping the metainfo total in step.
pub fn set_postlist_doclen(dir: &Path, backend: Backend, did: DocId, len: u32) -> CoreResult<()> {
    let mut postlist = TableEditor::open(dir, "postlist", backend)?;
    let old = postlist
        .get(&doclen_key(did))
        .map(|v| decode_doclen(v))
        .transpose()?
        .unwrap_or(0);
    let mut meta = PostlistMeta::decode(postlist.get(&[]).ok_or_else(|| missing("no metainfo"))?)?;
    meta.total_doclen = meta.total_doclen - u64::from(old) + u64::from(len);
    postlist
        .set(doclen_key(did), encode_doclen(len))
        .set(Vec::new(), meta.encode());
    postlist.save()
}

/// Removes the postlist's length for `did`, keeping the metainfo total in step.
pub fn remove_postlist_doclen(dir: &Path, backend: Backend, did: DocId) -> CoreResult<()> {
    let mut postlist = TableEditor::open(dir, "postlist", backend)?;
    let old = postlist
        .get(&doclen_key(did))
        .ok_or_else(|| missing(format!("no doclen for document {did}")))
        .and_then(|v| decode_doclen(v))?;
    let mut meta = PostlistMeta::decode(postlist.get(&[]).ok_or_else(|| missing("no metainfo"))?)?;
    meta.total_doclen -= u64::from(old);
    postlist.remove(&doclen_key(did)).set(Vec::new(), meta.encode());
    postlist.save()
}

/// Replaces the termlist entry of `did` with one term of wdf `len`, so the
/// termlist stays self-consistent at the new length.
pub fn set_termlist_doclen(dir: &Path, backend: Backend, did: DocId, len: u32) -> CoreResult<()> {
    let mut termlist = TableEditor::open(dir, "termlist", backend)?;
    let value = TermlistValue {
        doclen: len,
        terms: vec![(b"padding".to_vec(), len)],
    };
    termlist.set(did.to_key().to_vec(), value.encode()?);
    termlist.save()
}

/// Sets the metainfo's last docid.
pub fn set_last_docid(dir: &Path, backend: Backend, last_docid: DocId) -> CoreResult<()> {
    let mut postlist = TableEditor::open(dir, "postlist", backend)?;
    let mut meta = PostlistMeta::decode(postlist.get(&[]).ok_or_else(|| missing("no metainfo"))?)?;
    meta.last_docid = last_docid;
    postlist.set(Vec::new(), meta.encode());
    postlist.save()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestDatabase;
    use tomedb_core::CheckOptions;

    #[test]
    fn editor_round_trips_a_clean_table() {
        let db = TestDatabase::glass();
        TableEditor::open(db.path(), "termlist", Backend::Glass)
            .unwrap()
            .save()
            .unwrap();
        assert_eq!(db.check(CheckOptions::NONE).errors, 0);
    }

    #[test]
    fn flipped_table_byte_is_found() {
        let db = TestDatabase::chert();
        let len = fs::metadata(db.table("record")).unwrap().len() as usize;
        flip_byte(&db.table("record"), len - 1).unwrap();
        assert!(db.check(CheckOptions::NONE).errors > 0);
    }

    #[test]
    fn flip_past_end_is_refused() {
        let db = TestDatabase::chert();
        assert!(flip_byte(&db.table("record"), usize::MAX).is_err());
    }

    #[test]
    fn postlist_edit_keeps_the_total() {
        let db = TestDatabase::glass();
        set_postlist_doclen(db.path(), Backend::Glass, DocId::new(2), 7).unwrap();
        let run = db.check(CheckOptions::NONE);
        assert_eq!(run.errors, 1, "{}", run.report);
    }
}
