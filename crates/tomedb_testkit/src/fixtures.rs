//! Test fixtures and database helpers.
//!
//! Provides temporary databases with a small fixed corpus and a helper that
//! runs a check and captures its report.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tomedb_core::{check, Backend, CheckOptions, CoreResult, DatabaseBuilder, Document};

/// Text of the documents in [`TestDatabase::chert`] and [`TestDatabase::glass`].
pub const CORPUS: [&str; 3] = [
    "the quick brown fox jumps over the lazy dog",
    "a lazy afternoon in the sun",
    "quick thinking saves the day",
];

/// Builds a document from text with positional postings.
pub fn document(text: &str) -> Document {
    let mut doc = Document::new(text);
    doc.index_text(text, 1);
    doc
}

/// A builder preloaded with [`CORPUS`].
pub fn corpus_builder(backend: Backend) -> DatabaseBuilder {
    let mut builder = DatabaseBuilder::new(backend);
    for text in CORPUS {
        builder.add_document(document(text));
    }
    builder
}

/// A database in a temporary directory, removed on drop.
pub struct TestDatabase {
    backend: Backend,
    dir: TempDir,
}

impl TestDatabase {
    /// Writes the database `builder` describes into a fresh directory.
    pub fn with_builder(builder: &DatabaseBuilder) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let written = builder.write(dir.path()).expect("Failed to write database");
        Self {
            backend: written.backend,
            dir,
        }
    }

    /// A chert database holding [`CORPUS`].
    pub fn chert() -> Self {
        Self::with_builder(&corpus_builder(Backend::Chert))
    }

    /// A glass database holding [`CORPUS`].
    pub fn glass() -> Self {
        Self::with_builder(&corpus_builder(Backend::Glass))
    }

    /// Generation of the database.
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Database directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of table `name` with the generation's suffix.
    pub fn table(&self, name: &str) -> PathBuf {
        tomedb_core::dir::table_path(self.path(), name, self.backend)
    }

    /// Checks the database, capturing the report.
    pub fn check(&self, options: CheckOptions) -> CheckRun {
        run_check(self.path(), options).expect("Check refused the database")
    }
}

/// Result of a check with its report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRun {
    /// Problems found.
    pub errors: usize,
    /// Everything written to the sink.
    pub report: String,
}

impl CheckRun {
    /// Report lines in order.
    pub fn lines(&self) -> Vec<&str> {
        self.report.lines().collect()
    }
}

/// Checks `path`, capturing the report.
pub fn run_check(path: impl AsRef<Path>, options: CheckOptions) -> CoreResult<CheckRun> {
    let mut buf = Vec::new();
    let errors = check(path, options, Some(&mut buf))?;
    Ok(CheckRun {
        errors,
        report: String::from_utf8_lossy(&buf).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_are_clean() {
        for db in [TestDatabase::chert(), TestDatabase::glass()] {
            let run = db.check(CheckOptions::NONE);
            assert_eq!(run.errors, 0, "{}", run.report);
        }
    }

    #[test]
    fn table_paths_carry_the_suffix() {
        let db = TestDatabase::chert();
        assert!(db.table("postlist").ends_with("postlist.DB"));
        assert!(db.table("postlist").exists());
    }

    #[test]
    fn document_lengths_count_words() {
        assert_eq!(document(CORPUS[0]).doclen(), 9);
    }
}
