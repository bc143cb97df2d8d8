//! Database creation.
//!
//! [`DatabaseBuilder`] collects documents and writes a complete database of
//! either generation in one commit. Docids are assigned from 1 in insertion
//! order.

use crate::changes::Changeset;
use crate::dir::{changeset_path, sync_directory, table_path, WriteLock};
use crate::error::{CoreError, CoreResult};
use crate::profile::{BackendProfile, Presence};
use crate::table::content::{
    doclen_key, encode_doclen, encode_positions, encode_postings, position_key, postings_key,
    PostlistMeta, TermlistValue,
};
use crate::table::TableBuilder;
use crate::types::{Backend, DocId, Revision};
use crate::version::{ChertVersion, GlassVersion};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// Occurrences of one term in a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermInfo {
    /// Within-document frequency.
    pub wdf: u32,
    /// Positions, ascending.
    pub positions: Vec<u32>,
}

/// A document to be indexed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    data: Vec<u8>,
    terms: BTreeMap<Vec<u8>, TermInfo>,
}

impl Document {
    /// Creates a document with the given stored data.
    #[must_use]
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            terms: BTreeMap::new(),
        }
    }

    /// Adds `wdf` occurrences of `term` without positions.
    pub fn add_term(&mut self, term: impl Into<Vec<u8>>, wdf: u32) -> &mut Self {
        let info = self.terms.entry(term.into()).or_default();
        info.wdf = info.wdf.saturating_add(wdf);
        self
    }

    /// Adds one occurrence of `term` at `position`.
    pub fn add_posting(&mut self, term: impl Into<Vec<u8>>, position: u32) -> &mut Self {
        let info = self.terms.entry(term.into()).or_default();
        info.wdf = info.wdf.saturating_add(1);
        if let Err(at) = info.positions.binary_search(&position) {
            info.positions.insert(at, position);
        }
        self
    }

    /// Indexes whitespace-separated words of `text`, lower-cased, with
    /// positions counted from `start`.
    pub fn index_text(&mut self, text: &str, start: u32) -> &mut Self {
        for (pos, word) in (start..).zip(text.split_whitespace()) {
            self.add_posting(word.to_lowercase(), pos);
        }
        self
    }

    /// Returns the stored data.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the terms of the document.
    #[must_use]
    pub fn terms(&self) -> &BTreeMap<Vec<u8>, TermInfo> {
        &self.terms
    }

    /// Returns the document length: the sum of all wdfs.
    #[must_use]
    pub fn doclen(&self) -> u32 {
        self.terms
            .values()
            .fold(0u32, |sum, info| sum.saturating_add(info.wdf))
    }
}

/// Summary of a written database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrittenDatabase {
    /// Generation written.
    pub backend: Backend,
    /// Committed revision.
    pub revision: Revision,
    /// Last docid recorded in the metadata.
    pub last_docid: DocId,
    /// Number of documents.
    pub doccount: u32,
}

/// Builds a database of either generation.
#[derive(Debug, Clone)]
pub struct DatabaseBuilder {
    backend: Backend,
    documents: Vec<Document>,
    spellings: BTreeMap<Vec<u8>, u32>,
    synonyms: BTreeMap<Vec<u8>, Vec<Vec<u8>>>,
    revision: Revision,
    last_docid: Option<DocId>,
}

impl DatabaseBuilder {
    /// Creates a builder for `backend` committing at revision 1.
    #[must_use]
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            documents: Vec::new(),
            spellings: BTreeMap::new(),
            synonyms: BTreeMap::new(),
            revision: Revision::new(1),
            last_docid: None,
        }
    }

    /// Adds a document, returning the docid it will get.
    pub fn add_document(&mut self, document: Document) -> DocId {
        self.documents.push(document);
        DocId::new(self.documents.len() as u32)
    }

    /// Adds a spelling correction word with its frequency.
    pub fn add_spelling(&mut self, word: impl Into<Vec<u8>>, freq: u32) -> &mut Self {
        *self.spellings.entry(word.into()).or_default() += freq;
        self
    }

    /// Adds a synonym of `term`.
    pub fn add_synonym(&mut self, term: impl Into<Vec<u8>>, synonym: impl Into<Vec<u8>>) -> &mut Self {
        self.synonyms.entry(term.into()).or_default().push(synonym.into());
        self
    }

    /// Sets the revision of the commit.
    #[must_use]
    pub fn revision(mut self, revision: Revision) -> Self {
        self.revision = revision;
        self
    }

    /// Records a last docid higher than the documents need, as left behind
    /// by deleted documents.
    #[must_use]
    pub fn last_docid(mut self, last_docid: DocId) -> Self {
        self.last_docid = Some(last_docid);
        self
    }

    /// Writes the database into `path`, replacing any tables already there.
    pub fn write(&self, path: &Path) -> CoreResult<WrittenDatabase> {
        if self.backend == Backend::Chert && self.revision.as_u64() > u64::from(u32::MAX) {
            return Err(CoreError::invalid_operation("chert revisions are 32-bit"));
        }
        let doccount = u32::try_from(self.documents.len())
            .map_err(|_| CoreError::invalid_operation("too many documents"))?;
        let last_docid = self
            .last_docid
            .map_or(DocId::new(doccount), |d| d.max(DocId::new(doccount)));

        let lock = WriteLock::acquire(path)?;
        let tables = self.build_tables(last_docid)?;
        let profile = BackendProfile::of(self.backend);

        for spec in profile.tables {
            let Some(builder) = tables.get(spec.name) else {
                continue;
            };
            let lazy_and_unused = matches!(spec.presence, Presence::Lazy { .. })
                && builder.is_empty();
            if lazy_and_unused {
                continue;
            }
            builder.write_file(
                &table_path(lock.path(), spec.name, self.backend),
                self.backend,
                self.revision,
            )?;
        }

        match self.backend {
            Backend::Chert => {
                ChertVersion::new(lock.path()).create()?;
            }
            Backend::Glass => {
                for r in 1..=self.revision.as_u64() {
                    self.changeset(Revision::new(r), &tables)
                        .write(&changeset_path(lock.path(), Revision::new(r)))?;
                }
                GlassVersion {
                    revision: self.revision,
                    last_docid,
                    doccount,
                    uuid: Uuid::new_v4(),
                }
                .write(lock.path())?;
            }
        }
        sync_directory(lock.path())?;

        info!(
            path = %path.display(),
            backend = %self.backend,
            revision = %self.revision,
            documents = doccount,
            "database written"
        );
        Ok(WrittenDatabase {
            backend: self.backend,
            revision: self.revision,
            last_docid,
            doccount,
        })
    }

    fn build_tables(&self, last_docid: DocId) -> CoreResult<BTreeMap<&'static str, TableBuilder>> {
        let mut data = TableBuilder::new();
        let mut termlist = TableBuilder::new();
        let mut postlist = TableBuilder::new();
        let mut position = TableBuilder::new();
        let mut postings: BTreeMap<&[u8], Vec<(DocId, u32)>> = BTreeMap::new();
        let mut total_doclen = 0u64;

        for (i, doc) in self.documents.iter().enumerate() {
            let did = DocId::new(i as u32 + 1);
            let doclen = doc.doclen();
            total_doclen += u64::from(doclen);

            data.insert(did.to_key().to_vec(), doc.data.clone());
            let value = TermlistValue {
                doclen,
                terms: doc
                    .terms
                    .iter()
                    .map(|(term, info)| (term.clone(), info.wdf))
                    .collect(),
            };
            termlist.insert(did.to_key().to_vec(), value.encode()?);
            postlist.insert(doclen_key(did), encode_doclen(doclen));

            for (term, info) in &doc.terms {
                postings.entry(term.as_slice()).or_default().push((did, info.wdf));
                if !info.positions.is_empty() {
                    position.insert(position_key(did, term), encode_positions(&info.positions));
                }
            }
        }

        postlist.insert(
            Vec::new(),
            PostlistMeta {
                last_docid,
                total_doclen,
            }
            .encode(),
        );
        for (term, list) in postings {
            postlist.insert(postings_key(term), encode_postings(&list));
        }

        let mut spelling = TableBuilder::new();
        for (word, freq) in &self.spellings {
            spelling.insert(word.clone(), freq.to_le_bytes().to_vec());
        }
        let mut synonym = TableBuilder::new();
        for (term, synonyms) in &self.synonyms {
            let mut value = Vec::new();
            for s in synonyms {
                let len = u8::try_from(s.len())
                    .map_err(|_| CoreError::invalid_operation("synonym longer than 255 bytes"))?;
                value.push(len);
                value.extend_from_slice(s);
            }
            synonym.insert(term.clone(), value);
        }

        let data_name = match self.backend {
            Backend::Chert => "record",
            Backend::Glass => "docdata",
        };
        Ok(BTreeMap::from([
            (data_name, data),
            ("termlist", termlist),
            ("postlist", postlist),
            ("position", position),
            ("spelling", spelling),
            ("synonym", synonym),
        ]))
    }

    /// The changeset of the commit producing `end`.
    ///
    /// The final commit lists every table with its entry count; earlier ones
    /// are empty.
    fn changeset(&self, end: Revision, tables: &BTreeMap<&'static str, TableBuilder>) -> Changeset {
        let mut changes = Changeset::new(end);
        if end == self.revision {
            for (name, builder) in tables {
                changes.push(*name, (builder.len() as u64).to_le_bytes().to_vec());
            }
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::check;
    use crate::options::CheckOptions;
    use crate::table::TableFile;
    use tempfile::TempDir;

    fn sample(backend: Backend) -> DatabaseBuilder {
        let mut builder = DatabaseBuilder::new(backend);
        let mut doc = Document::new("first");
        doc.index_text("the quick brown fox", 1);
        builder.add_document(doc);
        let mut doc = Document::new("second");
        doc.index_text("the lazy dog", 1).add_term("Ztag", 2);
        builder.add_document(doc);
        builder
    }

    #[test]
    fn document_lengths_sum_wdfs() {
        let mut doc = Document::new("");
        doc.index_text("a b a", 0).add_term("x", 4);
        assert_eq!(doc.doclen(), 7);
        assert_eq!(doc.terms()[b"a".as_slice()].positions, vec![0, 2]);
    }

    #[test]
    fn chert_skips_unused_lazy_tables() {
        let dir = TempDir::new().unwrap();
        let mut builder = DatabaseBuilder::new(Backend::Chert);
        builder.add_document(Document::new("no terms"));
        builder.write(dir.path()).unwrap();

        assert!(dir.path().join("record.DB").exists());
        assert!(dir.path().join("postlist.DB").exists());
        assert!(dir.path().join("termlist.DB").exists());
        assert!(!dir.path().join("position.DB").exists());
        assert!(!dir.path().join("spelling.DB").exists());
    }

    #[test]
    fn written_databases_check_clean() {
        for backend in Backend::ALL {
            let dir = TempDir::new().unwrap();
            let written = sample(backend)
                .revision(Revision::new(3))
                .write(dir.path())
                .unwrap();
            assert_eq!(written.last_docid, DocId::new(2));
            let mut buf = Vec::new();
            let errors = check(dir.path(), CheckOptions::NONE, Some(&mut buf)).unwrap();
            assert_eq!(errors, 0, "{backend}: {}", String::from_utf8_lossy(&buf));
        }
    }

    #[test]
    fn glass_writes_one_changeset_per_revision() {
        let dir = TempDir::new().unwrap();
        sample(Backend::Glass)
            .revision(Revision::new(3))
            .write(dir.path())
            .unwrap();
        for r in 1..=3 {
            assert!(dir.path().join(format!("changes{r}")).exists());
        }
        let postlist = TableFile::open(&dir.path().join("postlist.glass"), Backend::Glass).unwrap();
        assert_eq!(postlist.header().revision, Revision::new(3));
    }

    #[test]
    fn chert_rejects_wide_revisions() {
        let dir = TempDir::new().unwrap();
        let result = sample(Backend::Chert)
            .revision(Revision::new(1 << 40))
            .write(dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn write_takes_the_lock() {
        let dir = TempDir::new().unwrap();
        let _held = WriteLock::acquire(dir.path()).unwrap();
        assert!(matches!(
            sample(Backend::Glass).write(dir.path()),
            Err(CoreError::DatabaseLocked)
        ));
    }
}
