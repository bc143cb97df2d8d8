//! Checking a single table.
//!
//! A table is streamed once. Every entry gets the structural checks (entry
//! checksum, key order, the header's entry count); entries of known tables
//! additionally get content checks for their kind. The termlist records
//! document lengths into the shared [`DocLengths`] and the postlist compares
//! its own copies against them.
//!
//! Within-document frequencies stored in postings are not compared with the
//! termlist: that would need an index of every (term, document) pair.

use crate::doclens::{DocLenWalk, DocLengths, Recorded};
use crate::error::CoreResult;
use crate::options::CheckOptions;
use crate::output::Output;
use crate::table::content::{
    decode_doclen, decode_positions, decode_postings, PostlistKey, PostlistMeta, TermlistValue,
};
use crate::table::{EntryRead, KeyDisplay, TableEntry, TableFile, TableKind};
use crate::types::{Backend, DocId, Revision};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// The revision every table of a database must carry.
///
/// Starts from the version header's revision. When that is unknown the first
/// table checked supplies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevisionAnchor {
    revision: Option<Revision>,
}

impl RevisionAnchor {
    /// Creates an anchor from the header revision, if known.
    #[must_use]
    pub fn new(revision: Option<Revision>) -> Self {
        Self { revision }
    }

    /// Returns the anchored revision.
    #[must_use]
    pub fn revision(&self) -> Option<Revision> {
        self.revision
    }

    /// Checks a table's revision, adopting it if none is anchored yet.
    ///
    /// Returns the anchored revision on mismatch.
    pub fn verify(&mut self, table: Revision) -> Result<(), Revision> {
        match self.revision {
            None => {
                self.revision = Some(table);
                Ok(())
            }
            Some(anchored) if anchored == table => Ok(()),
            Some(anchored) => Err(anchored),
        }
    }
}

/// Everything needed to check one table.
#[derive(Debug)]
pub struct TableCheck<'a> {
    /// Lower-cased table name.
    pub name: &'a str,
    /// Role of the table, selecting the content checks.
    pub kind: TableKind,
    /// The table file.
    pub path: &'a Path,
    /// Generation the table belongs to.
    pub backend: Backend,
    /// Header revision to compare against; `None` for a lone table.
    pub anchor: Option<&'a mut RevisionAnchor>,
    /// Reporting options.
    pub options: CheckOptions,
    /// Shared document lengths, for whole-database checks.
    pub doclens: Option<&'a mut DocLengths>,
    /// Last docid of the database, [`DocId::MAX`] if unknown.
    pub last_docid: DocId,
}

/// Checks one table, returning the number of problems found.
///
/// Problems are described on `out`. Only a failing sink is an error.
pub fn check_table(check: TableCheck<'_>, out: &mut Output<'_>) -> CoreResult<usize> {
    let TableCheck {
        name,
        kind,
        path,
        backend,
        anchor,
        options,
        doclens,
        last_docid,
    } = check;
    let mut findings = Findings { out, errors: 0 };

    let table = match TableFile::open(path, backend) {
        Ok(table) => table,
        Err(e) => {
            findings.report(format_args!("Failed to open {}: {e}", path.display()))?;
            return findings.finish(name, 0);
        }
    };
    let header = *table.header();

    if options.contains(CheckOptions::SHOW_STATS) {
        let size = table.size()?;
        findings.note(format_args!(
            "Revision {}, {} entries, {size} bytes",
            header.revision, header.entry_count
        ))?;
    }

    if let Some(anchor) = anchor {
        if let Err(expected) = anchor.verify(header.revision) {
            findings.report(format_args!(
                "Table revision {} doesn't match header revision {expected}",
                header.revision
            ))?;
        }
    }

    let mut content = ContentCheck::new(kind, last_docid, doclens);
    let mut prev_key: Option<Vec<u8>> = None;
    let mut seen = 0u64;
    let mut complete = true;

    for read in table.entries()? {
        let read = match read {
            Ok(read) => read,
            Err(e) => {
                findings.report(format_args!("{e}"))?;
                complete = false;
                break;
            }
        };
        seen += 1;
        match read {
            EntryRead::ChecksumMismatch {
                offset,
                key,
                expected,
                actual,
            } => {
                findings.report(format_args!(
                    "Entry at offset {offset} (key {}) has checksum {actual:08x}, expected {expected:08x}",
                    KeyDisplay(&key)
                ))?;
                content.damaged_entry(&key);
            }
            EntryRead::Entry { offset, entry } => {
                if options.contains(CheckOptions::FULL_TREE) {
                    findings.note(format_args!("  {}", KeyDisplay(&entry.key)))?;
                }
                if prev_key.as_ref().is_some_and(|prev| entry.key <= *prev) {
                    findings.report(format_args!(
                        "Key {} at offset {offset} is out of order",
                        KeyDisplay(&entry.key)
                    ))?;
                }
                content.entry(&entry, &mut findings)?;
                prev_key = Some(entry.key);
            }
        }
    }

    if complete && seen != header.entry_count {
        findings.report(format_args!(
            "Header records {} entries but the table holds {seen}",
            header.entry_count
        ))?;
    }
    content.finish(complete, &mut findings)?;

    if options.contains(CheckOptions::SHORT_TREE) {
        findings.note(format_args!("{seen} entries checked"))?;
    }
    findings.finish(name, seen)
}

/// Problem tally for one table.
struct Findings<'o, 'w> {
    out: &'o mut Output<'w>,
    errors: usize,
}

impl Findings<'_, '_> {
    fn report(&mut self, args: fmt::Arguments<'_>) -> CoreResult<()> {
        self.errors += 1;
        writeln!(self.out, "{args}")?;
        Ok(())
    }

    fn note(&mut self, args: fmt::Arguments<'_>) -> CoreResult<()> {
        writeln!(self.out, "{args}")?;
        Ok(())
    }

    fn finish(self, name: &str, entries: u64) -> CoreResult<usize> {
        match self.errors {
            0 => writeln!(self.out, "No errors found")?,
            1 => writeln!(self.out, "1 error found")?,
            n => writeln!(self.out, "{n} errors found")?,
        }
        writeln!(self.out)?;
        debug!(table = name, entries, errors = self.errors, "table checked");
        Ok(self.errors)
    }
}

/// Kind-specific state carried across the entries of one table.
struct ContentCheck<'a> {
    kind: TableKind,
    last_docid: DocId,
    /// Termlist only: where lengths are recorded.
    record_into: Option<&'a mut DocLengths>,
    /// Postlist only: the termlist lengths being compared against.
    walk: Option<DocLenWalk<'a>>,
    meta: Option<PostlistMeta>,
    doclen_total: u64,
    /// Termlist only: the last docid whose entry was reached.
    last_seen: Option<DocId>,
    /// Some entry could not be read, so totals are unreliable.
    damaged: bool,
}

impl<'a> ContentCheck<'a> {
    fn new(kind: TableKind, last_docid: DocId, doclens: Option<&'a mut DocLengths>) -> Self {
        let mut record_into = None;
        let mut walk = None;
        match kind {
            TableKind::Termlist => record_into = doclens,
            TableKind::Postlist => {
                let doclens: Option<&'a DocLengths> = doclens.map(|d| &*d);
                walk = doclens.and_then(DocLengths::walk);
            }
            _ => {}
        }
        Self {
            kind,
            last_docid,
            record_into,
            walk,
            meta: None,
            doclen_total: 0,
            last_seen: None,
            damaged: false,
        }
    }

    fn check_docid(&self, did: DocId, f: &mut Findings<'_, '_>) -> CoreResult<bool> {
        let in_range =
            did.as_u32() != 0 && (self.last_docid.is_unbounded() || did <= self.last_docid);
        if !in_range {
            f.report(format_args!(
                "Document id {did} is out of range (last docid is {})",
                self.last_docid
            ))?;
        }
        Ok(in_range)
    }

    fn docid_key(&self, key: &[u8], exact: bool, f: &mut Findings<'_, '_>) -> CoreResult<Option<DocId>> {
        let well_formed = if exact { key.len() == 4 } else { key.len() > 4 };
        match DocId::from_key(key).filter(|_| well_formed) {
            Some(did) => Ok(Some(did)),
            None => {
                f.report(format_args!("Key {} is not a valid {} key", KeyDisplay(key), self.table_name()))?;
                Ok(None)
            }
        }
    }

    fn table_name(&self) -> &'static str {
        match self.kind {
            TableKind::Record => "record",
            TableKind::DocData => "docdata",
            TableKind::Termlist => "termlist",
            TableKind::Postlist => "postlist",
            TableKind::Position => "position",
            TableKind::Spelling => "spelling",
            TableKind::Synonym => "synonym",
            TableKind::Other => "table",
        }
    }

    fn entry(&mut self, entry: &TableEntry, f: &mut Findings<'_, '_>) -> CoreResult<()> {
        match self.kind {
            TableKind::Record | TableKind::DocData => {
                if let Some(did) = self.docid_key(&entry.key, true, f)? {
                    self.check_docid(did, f)?;
                }
            }
            TableKind::Termlist => self.termlist_entry(entry, f)?,
            TableKind::Postlist => self.postlist_entry(entry, f)?,
            TableKind::Position => self.position_entry(entry, f)?,
            TableKind::Spelling | TableKind::Synonym | TableKind::Other => {}
        }
        Ok(())
    }

    /// An entry whose checksum failed.
    fn damaged_entry(&mut self, key: &[u8]) {
        self.damaged = true;
        if self.kind != TableKind::Termlist || key.len() != 4 {
            return;
        }
        if let Some(did) = DocId::from_key(key) {
            self.last_seen = Some(did);
            if let Some(doclens) = self.record_into.as_deref_mut() {
                doclens.record_damaged(did);
            }
        }
    }

    fn termlist_entry(&mut self, entry: &TableEntry, f: &mut Findings<'_, '_>) -> CoreResult<()> {
        let Some(did) = self.docid_key(&entry.key, true, f)? else {
            return Ok(());
        };
        self.last_seen = Some(did);
        self.check_docid(did, f)?;

        let value = match TermlistValue::decode(&entry.value) {
            Ok(value) => value,
            Err(e) => {
                self.damaged = true;
                if let Some(doclens) = self.record_into.as_deref_mut() {
                    doclens.record_damaged(did);
                }
                return f.report(format_args!("Termlist of document {did}: {e}"));
            }
        };
        if value.terms.windows(2).any(|w| w[0].0 >= w[1].0) {
            f.report(format_args!("Termlist of document {did}: terms out of order"))?;
        }
        let wdf_sum = value.wdf_sum();
        if wdf_sum != u64::from(value.doclen) {
            f.report(format_args!(
                "Termlist of document {did}: doclen {} but wdfs sum to {wdf_sum}",
                value.doclen
            ))?;
        }
        if let Some(doclens) = self.record_into.as_deref_mut() {
            doclens.record(did, value.doclen);
        }
        Ok(())
    }

    fn postlist_entry(&mut self, entry: &TableEntry, f: &mut Findings<'_, '_>) -> CoreResult<()> {
        match PostlistKey::parse(&entry.key) {
            Some(PostlistKey::Meta) => match PostlistMeta::decode(&entry.value) {
                Ok(meta) => {
                    if !self.last_docid.is_unbounded() && meta.last_docid != self.last_docid {
                        f.report(format_args!(
                            "Metainfo last docid {} differs from header last docid {}",
                            meta.last_docid, self.last_docid
                        ))?;
                    }
                    self.meta = Some(meta);
                }
                Err(e) => {
                    self.damaged = true;
                    f.report(format_args!("Metainfo: {e}"))?;
                }
            },
            Some(PostlistKey::DocLen(did)) => {
                self.check_docid(did, f)?;
                let length = match decode_doclen(&entry.value) {
                    Ok(length) => length,
                    Err(e) => {
                        self.damaged = true;
                        return f.report(format_args!("Doclen of document {did}: {e}"));
                    }
                };
                self.doclen_total += u64::from(length);
                if let Some(walk) = self.walk.as_mut() {
                    let (termlist_only, termlist_length) = walk.step(did);
                    for other in termlist_only {
                        report_missing_doclen(other, f)?;
                    }
                    match termlist_length {
                        Recorded::Length(expected) if expected != length => f.report(format_args!(
                            "Document {did}: doclen {length} in postlist but {expected} in termlist"
                        ))?,
                        Recorded::Length(_) | Recorded::Unknown => {}
                        Recorded::Absent => f.report(format_args!(
                            "Document {did}: doclen {length} in postlist but no termlist entry"
                        ))?,
                    }
                }
            }
            Some(PostlistKey::Postings(term)) => {
                let term = KeyDisplay(term);
                match decode_postings(&entry.value) {
                    Ok(postings) => {
                        if postings.windows(2).any(|w| w[0].0 >= w[1].0) {
                            f.report(format_args!("Postings of {term}: docids out of order"))?;
                        }
                        for (did, wdf) in postings {
                            self.check_docid(did, f)?;
                            if wdf == 0 {
                                f.report(format_args!("Postings of {term}: zero wdf for document {did}"))?;
                            }
                        }
                    }
                    Err(e) => f.report(format_args!("Postings of {term}: {e}"))?,
                }
            }
            None => f.report(format_args!(
                "Unrecognised postlist key {}",
                KeyDisplay(&entry.key)
            ))?,
        }
        Ok(())
    }

    fn position_entry(&mut self, entry: &TableEntry, f: &mut Findings<'_, '_>) -> CoreResult<()> {
        let Some(did) = self.docid_key(&entry.key, false, f)? else {
            return Ok(());
        };
        self.check_docid(did, f)?;
        let term = KeyDisplay(&entry.key[4..]);
        match decode_positions(&entry.value) {
            Ok(positions) => {
                if positions.is_empty() {
                    f.report(format_args!("Positions of {term} in document {did}: empty list"))?;
                }
                if positions.windows(2).any(|w| w[0] >= w[1]) {
                    f.report(format_args!("Positions of {term} in document {did}: out of order"))?;
                }
            }
            Err(e) => f.report(format_args!("Positions of {term} in document {did}: {e}"))?,
        }
        Ok(())
    }

    fn finish(self, complete: bool, f: &mut Findings<'_, '_>) -> CoreResult<()> {
        match self.kind {
            TableKind::Termlist => {
                if let Some(doclens) = self.record_into {
                    if complete {
                        doclens.mark_populated();
                    } else {
                        doclens.mark_populated_through(self.last_seen);
                    }
                }
            }
            TableKind::Postlist if complete => {
                match self.meta {
                    None if !self.damaged => f.report(format_args!("No metainfo entry"))?,
                    Some(meta) if !self.damaged && meta.total_doclen != self.doclen_total => {
                        f.report(format_args!(
                            "Metainfo total doclen {} but document lengths sum to {}",
                            meta.total_doclen, self.doclen_total
                        ))?;
                    }
                    _ => {}
                }
                if let Some(walk) = self.walk {
                    for did in walk.finish() {
                        report_missing_doclen(did, f)?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn report_missing_doclen(did: DocId, f: &mut Findings<'_, '_>) -> CoreResult<()> {
    f.report(format_args!(
        "Document {did}: termlist entry but no doclen in postlist"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::content::{doclen_key, encode_doclen, postings_key, encode_postings};
    use crate::table::TableBuilder;
    use tempfile::TempDir;

    fn termlist_value(doclen: u32) -> Vec<u8> {
        TermlistValue {
            doclen,
            terms: vec![(b"word".to_vec(), doclen)],
        }
        .encode()
        .unwrap()
    }

    fn meta(last: u32, total: u64) -> Vec<u8> {
        PostlistMeta {
            last_docid: DocId(last),
            total_doclen: total,
        }
        .encode()
    }

    struct Run {
        errors: usize,
        text: String,
    }

    fn run(
        dir: &TempDir,
        name: &str,
        builder: &TableBuilder,
        doclens: Option<&mut DocLengths>,
        last_docid: DocId,
        options: CheckOptions,
    ) -> Run {
        let path = dir.path().join(format!("{name}.glass"));
        builder.write_file(&path, Backend::Glass, Revision(1)).unwrap();
        run_file(&path, name, doclens, last_docid, options)
    }

    fn run_file(
        path: &Path,
        name: &str,
        doclens: Option<&mut DocLengths>,
        last_docid: DocId,
        options: CheckOptions,
    ) -> Run {
        let mut buf = Vec::new();
        let errors = {
            let mut out = Output::new(Some(&mut buf));
            check_table(
                TableCheck {
                    name,
                    kind: TableKind::from_name(name),
                    path,
                    backend: Backend::Glass,
                    anchor: None,
                    options,
                    doclens,
                    last_docid,
                },
                &mut out,
            )
            .unwrap()
        };
        Run {
            errors,
            text: String::from_utf8(buf).unwrap(),
        }
    }

    fn termlist(entries: &[(u32, u32)]) -> TableBuilder {
        let mut builder = TableBuilder::new();
        for &(did, len) in entries {
            builder.insert(DocId(did).to_key().to_vec(), termlist_value(len));
        }
        builder
    }

    fn postlist(entries: &[(u32, u32)], last: u32) -> TableBuilder {
        let mut builder = TableBuilder::new();
        let total: u64 = entries.iter().map(|&(_, len)| u64::from(len)).sum();
        builder.insert(Vec::new(), meta(last, total));
        for &(did, len) in entries {
            builder.insert(doclen_key(DocId(did)), encode_doclen(len));
        }
        builder
    }

    #[test]
    fn anchor_adopts_then_enforces() {
        let mut anchor = RevisionAnchor::new(None);
        assert_eq!(anchor.verify(Revision(5)), Ok(()));
        assert_eq!(anchor.verify(Revision(5)), Ok(()));
        assert_eq!(anchor.verify(Revision(4)), Err(Revision(5)));
        assert_eq!(anchor.revision(), Some(Revision(5)));
    }

    #[test]
    fn clean_tables_pass() {
        let dir = TempDir::new().unwrap();
        let mut doclens = DocLengths::try_reserve(DocId(3)).unwrap();
        let entries = [(1, 4), (3, 2)];
        let t = run(&dir, "termlist", &termlist(&entries), Some(&mut doclens), DocId(3), CheckOptions::NONE);
        assert_eq!(t.errors, 0, "{}", t.text);
        assert!(doclens.is_populated());
        let p = run(&dir, "postlist", &postlist(&entries, 3), Some(&mut doclens), DocId(3), CheckOptions::NONE);
        assert_eq!(p.errors, 0, "{}", p.text);
        assert!(p.text.ends_with("No errors found\n\n"));
    }

    #[test]
    fn doclen_mismatch_is_reported_for_the_document() {
        let dir = TempDir::new().unwrap();
        let mut doclens = DocLengths::try_reserve(DocId(9)).unwrap();
        run(&dir, "termlist", &termlist(&[(7, 10)]), Some(&mut doclens), DocId(9), CheckOptions::NONE);
        let p = run(&dir, "postlist", &postlist(&[(7, 11)], 9), Some(&mut doclens), DocId(9), CheckOptions::NONE);
        assert_eq!(p.errors, 1);
        assert!(p.text.contains("Document 7: doclen 11 in postlist but 10 in termlist"));
    }

    #[test]
    fn one_sided_documents_are_reported() {
        let dir = TempDir::new().unwrap();
        let mut doclens = DocLengths::try_reserve(DocId(9)).unwrap();
        run(&dir, "termlist", &termlist(&[(1, 2), (5, 3)]), Some(&mut doclens), DocId(9), CheckOptions::NONE);
        let p = run(&dir, "postlist", &postlist(&[(2, 2), (5, 3)], 9), Some(&mut doclens), DocId(9), CheckOptions::NONE);
        assert_eq!(p.errors, 2, "{}", p.text);
        assert!(p.text.contains("Document 1: termlist entry but no doclen in postlist"));
        assert!(p.text.contains("Document 2: doclen 2 in postlist but no termlist entry"));
    }

    #[test]
    fn postlist_documents_beyond_the_termlist() {
        let dir = TempDir::new().unwrap();
        let mut doclens = DocLengths::try_reserve(DocId(9)).unwrap();
        run(&dir, "termlist", &termlist(&[(1, 4)]), Some(&mut doclens), DocId(9), CheckOptions::NONE);
        let p = run(
            &dir,
            "postlist",
            &postlist(&[(1, 4), (5, 2), (6, 3)], 9),
            Some(&mut doclens),
            DocId(9),
            CheckOptions::NONE,
        );
        assert_eq!(p.errors, 2, "{}", p.text);
        assert!(p.text.contains("Document 5: doclen 2 in postlist but no termlist entry"));
        assert!(p.text.contains("Document 6: doclen 3 in postlist but no termlist entry"));
    }

    #[test]
    fn damaged_termlist_entry_keeps_the_cross_check() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("termlist.glass");
        termlist(&[(1, 10), (2, 1)])
            .write_file(&path, Backend::Glass, Revision(1))
            .unwrap();
        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        std::fs::write(&path, bytes).unwrap();

        let mut doclens = DocLengths::try_reserve(DocId(9)).unwrap();
        let t = run_file(&path, "termlist", Some(&mut doclens), DocId(9), CheckOptions::NONE);
        assert_eq!(t.errors, 1, "{}", t.text);
        assert!(doclens.is_populated());

        let p = run(
            &dir,
            "postlist",
            &postlist(&[(1, 11), (2, 5)], 9),
            Some(&mut doclens),
            DocId(9),
            CheckOptions::NONE,
        );
        // Document 2's termlist entry is unreadable, so only document 1 compares.
        assert_eq!(p.errors, 1, "{}", p.text);
        assert!(p.text.contains("Document 1: doclen 11 in postlist but 10 in termlist"));
    }

    #[test]
    fn without_lengths_no_cross_check() {
        let dir = TempDir::new().unwrap();
        let p = run(&dir, "postlist", &postlist(&[(2, 2)], 9), None, DocId(9), CheckOptions::NONE);
        assert_eq!(p.errors, 0);
    }

    #[test]
    fn termlist_doclen_must_match_wdfs() {
        let dir = TempDir::new().unwrap();
        let mut builder = TableBuilder::new();
        let value = TermlistValue {
            doclen: 9,
            terms: vec![(b"a".to_vec(), 2), (b"b".to_vec(), 3)],
        };
        builder.insert(DocId(1).to_key().to_vec(), value.encode().unwrap());
        let t = run(&dir, "termlist", &builder, None, DocId::MAX, CheckOptions::NONE);
        assert_eq!(t.errors, 1);
        assert!(t.text.contains("doclen 9 but wdfs sum to 5"));
    }

    #[test]
    fn docids_beyond_last_docid_are_flagged() {
        let dir = TempDir::new().unwrap();
        let mut builder = TableBuilder::new();
        builder.insert(DocId(12).to_key().to_vec(), b"data".to_vec());
        assert_eq!(run(&dir, "docdata", &builder, None, DocId(10), CheckOptions::NONE).errors, 1);
        assert_eq!(run(&dir, "docdata", &builder, None, DocId::MAX, CheckOptions::NONE).errors, 0);
    }

    #[test]
    fn postings_checked() {
        let dir = TempDir::new().unwrap();
        let mut builder = postlist(&[], 5);
        builder.insert(postings_key(b"fox"), encode_postings(&[(DocId(3), 1), (DocId(2), 1)]));
        builder.insert(postings_key(b"dog"), encode_postings(&[(DocId(1), 0)]));
        let p = run(&dir, "postlist", &builder, None, DocId(5), CheckOptions::NONE);
        assert_eq!(p.errors, 2, "{}", p.text);
    }

    #[test]
    fn missing_metainfo_and_bad_total() {
        let dir = TempDir::new().unwrap();
        let mut builder = TableBuilder::new();
        builder.insert(doclen_key(DocId(1)), encode_doclen(3));
        assert_eq!(run(&dir, "postlist", &builder, None, DocId::MAX, CheckOptions::NONE).errors, 1);

        builder.insert(Vec::new(), meta(1, 4));
        let p = run(&dir, "postlist", &builder, None, DocId::MAX, CheckOptions::NONE);
        assert_eq!(p.errors, 1);
        assert!(p.text.contains("total doclen 4"));
    }

    #[test]
    fn missing_table_is_one_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("record.DB");
        let mut buf = Vec::new();
        let errors = check_table(
            TableCheck {
                name: "record",
                kind: TableKind::Record,
                path: &path,
                backend: Backend::Chert,
                anchor: None,
                options: CheckOptions::NONE,
                doclens: None,
                last_docid: DocId::MAX,
            },
            &mut Output::new(Some(&mut buf)),
        )
        .unwrap();
        assert_eq!(errors, 1);
    }

    #[test]
    fn reporting_options_add_lines() {
        let dir = TempDir::new().unwrap();
        let builder = termlist(&[(1, 1), (2, 1)]);
        let quiet = run(&dir, "termlist", &builder, None, DocId::MAX, CheckOptions::NONE);
        let loud = run(
            &dir,
            "termlist",
            &builder,
            None,
            DocId::MAX,
            CheckOptions::FULL_TREE | CheckOptions::SHOW_STATS | CheckOptions::SHORT_TREE,
        );
        assert_eq!(quiet.errors, loud.errors);
        assert_eq!(loud.text.lines().count(), quiet.text.lines().count() + 4);
        assert!(loud.text.contains("Revision 1, 2 entries"));
        assert!(loud.text.contains("2 entries checked"));
    }
}
