//! Consistency checking.
//!
//! [`check`] inspects a database directory or a single table and returns the
//! number of problems found. Conditions that make a check impossible (a
//! retired format, a backend this build cannot read, a path that is not a
//! database) are returned as errors instead; any partial count is discarded.
//!
//! A whole-database check runs in this order:
//!
//! 1. Open the database to learn its revision and last docid. A database
//!    that cannot be opened still gets checked: the failure counts as one
//!    problem and the last docid becomes unbounded.
//! 2. Glass only: check every changeset on disk.
//! 3. Reserve the document length array (skipped with an advisory line if it
//!    would be too large, and silently if the last docid is unknown).
//! 4. Check the tables in profile order.
//! 5. Chert only, with [`CheckOptions::FIX`]: if step 4 found nothing,
//!    regenerate an invalid version file.

mod table;

pub use table::{check_table, RevisionAnchor, TableCheck};

use crate::changes::check_changeset;
use crate::database::GlassDatabase;
use crate::dir::table_path;
use crate::doclens::DocLengths;
use crate::error::{CoreError, CoreResult};
use crate::layout::{detect, Detection, TableLocation};
use crate::options::CheckOptions;
use crate::output::Output;
use crate::profile::{BackendProfile, Presence};
use crate::table::TableKind;
use crate::types::{Backend, BackendSet, DocId};
use crate::version::{ChertVersionManager, GlassVersionManager, Repair, VersionManager};
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Checks the database or table at `path` with every compiled-in backend.
///
/// Returns the number of problems found; zero means consistent. When `sink`
/// is `None` every option except [`CheckOptions::FIX`] is ignored.
pub fn check(
    path: impl AsRef<Path>,
    options: CheckOptions,
    sink: Option<&mut dyn Write>,
) -> CoreResult<usize> {
    Checker::new().check(path.as_ref(), options, sink)
}

/// A consistency checker bound to a set of readable backends.
#[derive(Debug, Clone, Copy, Default)]
pub struct Checker {
    backends: BackendSet,
}

impl Checker {
    /// A checker for every compiled-in backend.
    #[must_use]
    pub fn new() -> Self {
        Self::with_backends(BackendSet::compiled())
    }

    /// A checker for an explicit set of backends.
    #[must_use]
    pub fn with_backends(backends: BackendSet) -> Self {
        Self { backends }
    }

    /// Backends this checker can read.
    #[must_use]
    pub fn backends(&self) -> BackendSet {
        self.backends
    }

    /// Checks the database or table at `path`.
    pub fn check(
        &self,
        path: &Path,
        options: CheckOptions,
        sink: Option<&mut dyn Write>,
    ) -> CoreResult<usize> {
        let options = if sink.is_none() {
            options.without_reporting()
        } else {
            options
        };
        let mut out = Output::new(sink);

        let errors = match detect(path, self.backends)? {
            Detection::Directory { backend, path } => {
                check_directory(BackendProfile::of(backend), &path, options, &mut out)?
            }
            Detection::Table(table) => check_single_table(&table, options, &mut out)?,
        };
        out.flush()?;

        info!(path = %path.display(), errors, %options, "check complete");
        Ok(errors)
    }
}

fn report_unopenable(err: &CoreError, out: &mut Output<'_>) -> CoreResult<()> {
    warn!(error = %err, "database couldn't be opened; continuing check");
    writeln!(out, "Database couldn't be opened for reading: {err}")?;
    writeln!(out, "Continuing check anyway")?;
    Ok(())
}

fn check_directory(
    profile: &BackendProfile,
    dir: &Path,
    options: CheckOptions,
    out: &mut Output<'_>,
) -> CoreResult<usize> {
    let mut errors = 0;

    let manager: Box<dyn VersionManager> = match profile.backend {
        Backend::Chert => match ChertVersionManager::open(dir) {
            Ok(manager) => Box::new(manager),
            Err(e) => {
                report_unopenable(&e, out)?;
                errors += 1;
                Box::new(ChertVersionManager::unopened(dir))
            }
        },
        Backend::Glass => {
            if let Err(e) = GlassDatabase::open(dir) {
                report_unopenable(&e, out)?;
                errors += 1;
            }
            let manager = GlassVersionManager::open(dir)?;
            match manager.enumerate_changesets() {
                Ok(changesets) => {
                    for changeset in changesets {
                        errors += check_changeset(&changeset, out)?;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "couldn't list changesets");
                    writeln!(out, "Couldn't list changesets: {e}")?;
                    errors += 1;
                }
            }
            Box::new(manager)
        }
    };

    let last_docid = manager.last_docid();
    // An unknown last docid gives nothing to size the array from.
    let mut doclens = if profile.cross_check_doclens && !last_docid.is_unbounded() {
        DocLengths::reserve(last_docid, out)?
    } else {
        DocLengths::disabled()
    };
    let mut anchor = RevisionAnchor::new(manager.revision());

    let pre_table_errors = errors;
    for spec in profile.tables {
        writeln!(out, "{}:", spec.name)?;
        let path = table_path(dir, spec.name, profile.backend);
        if let Presence::Lazy { absent_note } = spec.presence {
            if !path.exists() {
                writeln!(out, "{absent_note}")?;
                writeln!(out)?;
                continue;
            }
        }
        errors += check_table(
            TableCheck {
                name: spec.name,
                kind: spec.kind,
                path: &path,
                backend: profile.backend,
                anchor: Some(&mut anchor),
                options,
                doclens: Some(&mut doclens),
                last_docid,
            },
            out,
        )?;
    }

    if options.fix() && profile.header_repair && errors == pre_table_errors {
        match manager.recreate()? {
            Repair::Recreated => writeln!(out, "Recreated the version file")?,
            Repair::AlreadyValid | Repair::Unsupported => {}
        }
    }

    Ok(errors)
}

fn check_single_table(
    table: &TableLocation,
    options: CheckOptions,
    out: &mut Output<'_>,
) -> CoreResult<usize> {
    writeln!(out, "{}:", table.name)?;
    check_table(
        TableCheck {
            name: &table.name,
            kind: TableKind::from_name(&table.name),
            path: &table.file,
            backend: table.backend,
            anchor: None,
            options,
            doclens: None,
            last_docid: DocId::MAX,
        },
        out,
    )
}
