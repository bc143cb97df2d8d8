//! End-to-end consistency checks against databases on disk.

use proptest::prelude::*;
use std::fs;
use tempfile::TempDir;
use tomedb_core::{Checker, CoreError, DatabaseBuilder, Document};
use tomedb_testkit::prelude::*;

fn ten_word_builder(backend: Backend) -> DatabaseBuilder {
    let mut builder = DatabaseBuilder::new(backend);
    let mut doc = Document::new("ten");
    doc.add_term("alpha", 10);
    builder.add_document(doc);
    builder.add_document(document("a second document"));
    builder
}

#[test]
fn clean_databases_have_no_errors() {
    for db in [TestDatabase::chert(), TestDatabase::glass()] {
        let run = db.check(CheckOptions::SHOW_STATS | CheckOptions::SHORT_TREE);
        assert_eq!(run.errors, 0, "{}", run.report);
        assert!(run.lines().contains(&"postlist:"));
        assert!(run.report.contains("No errors found"));
        assert!(run.report.contains("Revision 1, "));
    }
}

#[test]
fn clean_check_without_sink_agrees() {
    let db = TestDatabase::glass();
    assert_eq!(tomedb_core::check(db.path(), CheckOptions::FULL_TREE, None).unwrap(), 0);
}

#[test]
fn retired_formats_are_refused_silently() {
    for (marker, name) in [("iamflint", "Flint"), ("iambrass", "Brass"), ("record_DB", "Quartz")] {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(marker), b"").unwrap();
        let mut buf = Vec::new();
        let err = tomedb_core::check(dir.path(), CheckOptions::SHOW_STATS, Some(&mut buf)).unwrap_err();
        match err {
            CoreError::BackendRemoved { backend, .. } => assert_eq!(backend, name),
            other => panic!("{marker}: unexpected error {other}"),
        }
        assert!(buf.is_empty(), "{marker} produced output");
    }
}

#[test]
fn retired_messages_name_the_release() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("record_DB"), b"").unwrap();
    let err = tomedb_core::check(dir.path(), CheckOptions::NONE, None).unwrap_err();
    assert_eq!(err.to_string(), "Quartz database support was removed in version 1.1.0");
}

#[test]
fn single_table_beside_retired_marker_is_refused() {
    let db = TestDatabase::chert();
    fs::write(db.path().join("iamflint"), b"").unwrap();
    let err = tomedb_core::check(db.table("postlist"), CheckOptions::NONE, None).unwrap_err();
    assert!(matches!(err, CoreError::BackendRemoved { backend: "Flint", .. }));
}

#[test]
fn disabled_backend_is_unavailable() {
    let db = TestDatabase::glass();
    let checker = Checker::with_backends(BackendSet::compiled().without(Backend::Glass));
    let err = checker.check(db.path(), CheckOptions::NONE, None).unwrap_err();
    assert!(matches!(err, CoreError::FeatureUnavailable { .. }));
    assert!(err.to_string().contains("Glass database support isn't enabled"));
}

#[test]
fn postlist_doclen_larger_than_termlist() {
    for backend in Backend::ALL {
        let db = TestDatabase::with_builder(&ten_word_builder(backend));
        set_postlist_doclen(db.path(), backend, DocId::new(1), 11).unwrap();
        let run = db.check(CheckOptions::NONE);
        assert_eq!(run.errors, 1, "{}", run.report);
        assert!(run
            .report
            .contains("Document 1: doclen 11 in postlist but 10 in termlist"));
    }
}

#[test]
fn termlist_doclen_larger_than_postlist() {
    for backend in Backend::ALL {
        let db = TestDatabase::with_builder(&ten_word_builder(backend));
        set_termlist_doclen(db.path(), backend, DocId::new(1), 11).unwrap();
        let run = db.check(CheckOptions::NONE);
        assert_eq!(run.errors, 1, "{}", run.report);
        assert!(run
            .report
            .contains("Document 1: doclen 10 in postlist but 11 in termlist"));
    }
}

#[test]
fn missing_postlist_doclen_is_reported() {
    let db = TestDatabase::glass();
    remove_postlist_doclen(db.path(), Backend::Glass, DocId::new(2)).unwrap();
    let run = db.check(CheckOptions::NONE);
    assert_eq!(run.errors, 1, "{}", run.report);
    assert!(run
        .report
        .contains("Document 2: termlist entry but no doclen in postlist"));
}

#[test]
fn postlist_documents_missing_from_the_termlist() {
    for backend in Backend::ALL {
        let db = TestDatabase::with_builder(&corpus_builder(backend));
        let mut termlist = TableEditor::open(db.path(), "termlist", backend).unwrap();
        termlist
            .remove(&DocId::new(2).to_key())
            .remove(&DocId::new(3).to_key());
        termlist.save().unwrap();

        let run = db.check(CheckOptions::NONE);
        assert_eq!(run.errors, 2, "{}", run.report);
        assert!(run.report.contains("Document 2: doclen 6 in postlist but no termlist entry"));
        assert!(run.report.contains("Document 3: doclen 5 in postlist but no termlist entry"));
    }
}

#[test]
fn damaged_termlist_entry_does_not_hide_other_mismatches() {
    let db = TestDatabase::glass();
    let termlist = db.table("termlist");
    let len = fs::metadata(&termlist).unwrap().len() as usize;
    flip_byte(&termlist, len - 1).unwrap();
    set_postlist_doclen(db.path(), Backend::Glass, DocId::new(1), 99).unwrap();

    let run = db.check(CheckOptions::NONE);
    assert_eq!(run.errors, 2, "{}", run.report);
    assert!(run
        .report
        .contains("Document 1: doclen 99 in postlist but 9 in termlist"));
}

#[test]
fn huge_last_docid_skips_the_cross_check_once() {
    for backend in Backend::ALL {
        let builder = corpus_builder(backend).last_docid(DocId::new(0x1000_0000));
        let db = TestDatabase::with_builder(&builder);
        let run = db.check(CheckOptions::NONE);
        assert_eq!(run.errors, 0, "{}", run.report);
        let advisories = run
            .lines()
            .iter()
            .filter(|line| line.contains("would use more than 1GB of memory"))
            .count();
        assert_eq!(advisories, 1);

        assert_eq!(tomedb_core::check(db.path(), CheckOptions::NONE, None).unwrap(), 0);
    }
}

#[test]
fn last_docid_just_below_ceiling_is_checked() {
    let builder = corpus_builder(Backend::Chert).last_docid(DocId::new(1000));
    let db = TestDatabase::with_builder(&builder);
    let run = db.check(CheckOptions::NONE);
    assert_eq!(run.errors, 0);
    assert!(!run.report.contains("skipping that check"));
}

#[test]
fn fix_recreates_a_damaged_chert_version_file() {
    let db = TestDatabase::chert();
    let version = db.path().join("iamchert");
    flip_byte(&version, 12).unwrap();

    let before = db.check(CheckOptions::NONE);
    assert_eq!(before.errors, 1, "{}", before.report);
    assert!(before.report.starts_with("Database couldn't be opened for reading: "));
    assert!(!before.report.contains("skipping that check"));

    let fixed = db.check(CheckOptions::FIX);
    assert_eq!(fixed.errors, 1);
    assert!(fixed.report.contains("Recreated the version file"));

    assert_eq!(db.check(CheckOptions::NONE).errors, 0);

    let repaired = fs::read(&version).unwrap();
    let again = db.check(CheckOptions::FIX);
    assert_eq!(again.errors, 0);
    assert!(!again.report.contains("Recreated"));
    assert_eq!(fs::read(&version).unwrap(), repaired);
}

#[test]
fn fix_leaves_other_damage_alone() {
    let db = TestDatabase::chert();
    overwrite(&db.path().join("iamchert"), b"junk").unwrap();
    let record = db.table("record");
    let len = fs::metadata(&record).unwrap().len() as usize;
    flip_byte(&record, len - 1).unwrap();
    let run = db.check(CheckOptions::FIX);
    assert!(run.errors > 1, "{}", run.report);
    assert!(!run.report.contains("Recreated"));
    assert_eq!(fs::read(db.path().join("iamchert")).unwrap(), b"junk");
}

#[test]
fn glass_is_never_repaired() {
    let db = TestDatabase::glass();
    let before = fs::read(db.path().join("iamglass")).unwrap();
    let run = db.check(CheckOptions::FIX);
    assert_eq!(run.errors, 0);
    assert_eq!(fs::read(db.path().join("iamglass")).unwrap(), before);
}

#[test]
fn table_name_spellings_agree() {
    let db = TestDatabase::chert();
    let postlist = db.table("postlist");
    let len = fs::metadata(&postlist).unwrap().len() as usize;
    flip_byte(&postlist, len - 1).unwrap();
    let spellings = ["postlist", "postlist.", "postlist.DB"];
    let runs: Vec<_> = spellings
        .iter()
        .map(|s| run_check(db.path().join(s), CheckOptions::SHOW_STATS).unwrap())
        .collect();
    assert!(runs[0].errors >= 1, "{}", runs[0].report);
    for run in &runs {
        assert_eq!(run.errors, runs[0].errors);
        assert_eq!(run.report, runs[0].report);
        assert!(run.report.starts_with("postlist:\n"));
    }

    let db = TestDatabase::glass();
    let bare = run_check(db.path().join("termlist"), CheckOptions::NONE).unwrap();
    let suffixed = run_check(db.path().join("termlist.glass"), CheckOptions::NONE).unwrap();
    assert_eq!(bare, suffixed);
}

#[test]
fn damaged_single_table_is_counted() {
    let db = TestDatabase::glass();
    let table = db.table("position");
    let len = fs::metadata(&table).unwrap().len() as usize;
    flip_byte(&table, len - 2).unwrap();
    let run = run_check(&table, CheckOptions::NONE).unwrap();
    assert!(run.errors >= 1, "{}", run.report);
}

#[test]
fn absent_lazy_tables_are_not_errors() {
    let db = TestDatabase::chert();
    fs::remove_file(db.table("termlist")).unwrap();
    let run = db.check(CheckOptions::NONE);
    assert_eq!(run.errors, 0, "{}", run.report);
    let lines = run.lines();
    let termlist = lines.iter().position(|l| *l == "termlist:").unwrap();
    assert_eq!(lines[termlist + 1], "Not present.");
    let spelling = lines.iter().position(|l| *l == "spelling:").unwrap();
    assert_eq!(lines[spelling + 1], "Lazily created, and not yet used.");
}

#[test]
fn missing_glass_table_is_an_error() {
    let db = TestDatabase::glass();
    fs::remove_file(db.table("spelling")).unwrap();
    let run = db.check(CheckOptions::NONE);
    // The database no longer opens, and the table itself is missing.
    assert_eq!(run.errors, 2, "{}", run.report);
}

#[test]
fn table_revision_must_match_the_database() {
    let db = TestDatabase::chert();
    TableEditor::open(db.path(), "termlist", Backend::Chert)
        .unwrap()
        .set_revision(Revision::new(7))
        .save()
        .unwrap();
    let run = db.check(CheckOptions::NONE);
    assert_eq!(run.errors, 1, "{}", run.report);
}

#[test]
fn damaged_changeset_is_counted_once() {
    let builder = corpus_builder(Backend::Glass).revision(Revision::new(3));
    let db = TestDatabase::with_builder(&builder);
    truncate(&db.path().join("changes2"), 5).unwrap();
    let run = db.check(CheckOptions::NONE);
    assert_eq!(run.errors, 1, "{}", run.report);
    assert!(run.report.contains("changes2"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn generated_databases_are_consistent(builder in database_strategy()) {
        let dir = TempDir::new().unwrap();
        builder.write(dir.path()).unwrap();
        let run = run_check(dir.path(), CheckOptions::SHORT_TREE).unwrap();
        prop_assert_eq!(run.errors, 0, "{}", run.report);
    }
}
