//! Format detection.
//!
//! A database directory announces its format through a marker file. The
//! markers are probed in a fixed order and the first one present decides.
//! Paths without a marker are taken to name a single table.

use crate::error::{CoreError, CoreResult};
use crate::types::{Backend, BackendSet};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tracing::debug;

/// What a directory marker means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerOutcome {
    /// A database in a supported format.
    Supported(Backend),
    /// A database in a format this release no longer reads.
    Retired {
        /// Name of the retired format.
        backend: &'static str,
        /// Release that removed it.
        version: &'static str,
    },
}

impl MarkerOutcome {
    fn into_result(self) -> CoreResult<Backend> {
        match self {
            Self::Supported(backend) => Ok(backend),
            Self::Retired { backend, version } => Err(CoreError::BackendRemoved { backend, version }),
        }
    }
}

/// Directory markers in priority order.
pub const MARKERS: [(&str, MarkerOutcome); 5] = [
    ("iamchert", MarkerOutcome::Supported(Backend::Chert)),
    ("iamglass", MarkerOutcome::Supported(Backend::Glass)),
    ("iamflint", FLINT),
    ("iambrass", BRASS),
    (
        "record_DB",
        MarkerOutcome::Retired {
            backend: "Quartz",
            version: "1.1.0",
        },
    ),
];

const FLINT: MarkerOutcome = MarkerOutcome::Retired {
    backend: "Flint",
    version: "1.3.0",
};

const BRASS: MarkerOutcome = MarkerOutcome::Retired {
    backend: "Brass",
    version: "1.3.2",
};

/// Retired formats that also used the chert table suffix.
const CHERT_SUFFIX_SHARERS: [(&str, MarkerOutcome); 2] = [("iamflint", FLINT), ("iambrass", BRASS)];

/// A single table resolved from a user-supplied path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLocation {
    /// Generation the table belongs to.
    pub backend: Backend,
    /// Directory containing the table.
    pub dir: PathBuf,
    /// Lower-cased table name, e.g. `postlist`.
    pub name: String,
    /// The table file itself, suffix included.
    pub file: PathBuf,
}

/// The result of format detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// A whole database directory.
    Directory {
        /// Generation named by the marker.
        backend: Backend,
        /// The database directory.
        path: PathBuf,
    },
    /// A single table file.
    Table(TableLocation),
}

impl Detection {
    /// Generation of the detected database or table.
    #[must_use]
    pub fn backend(&self) -> Backend {
        match self {
            Self::Directory { backend, .. } => *backend,
            Self::Table(table) => table.backend,
        }
    }
}

/// Returns the outcome of the first marker present in `dir`.
#[must_use]
pub fn probe_markers(dir: &Path) -> Option<MarkerOutcome> {
    MARKERS
        .iter()
        .find(|(marker, _)| dir.join(marker).exists())
        .map(|(_, outcome)| *outcome)
}

/// Decides how `path` should be checked.
///
/// Fails with [`CoreError::BackendRemoved`] for retired formats,
/// [`CoreError::NotADatabase`] when no backend can be inferred and
/// [`CoreError::FeatureUnavailable`] when the backend is not in `backends`.
pub fn detect(path: &Path, backends: BackendSet) -> CoreResult<Detection> {
    if let Some(outcome) = probe_markers(path) {
        let backend = outcome.into_result()?;
        require(backends, backend)?;
        debug!(path = %path.display(), %backend, "detected database directory");
        return Ok(Detection::Directory {
            backend,
            path: path.to_path_buf(),
        });
    }

    let table = resolve_table(path)?;
    if table.backend == Backend::Chert {
        for (marker, outcome) in CHERT_SUFFIX_SHARERS {
            if table.dir.join(marker).exists() {
                outcome.into_result()?;
            }
        }
    }
    require(backends, table.backend)?;
    debug!(
        file = %table.file.display(),
        table = %table.name,
        backend = %table.backend,
        "detected single table"
    );
    Ok(Detection::Table(table))
}

fn require(backends: BackendSet, backend: Backend) -> CoreResult<()> {
    if backends.contains(backend) {
        Ok(())
    } else {
        Err(CoreError::feature_unavailable(format!(
            "{backend} database support isn't enabled"
        )))
    }
}

/// Normalizes a single-table path.
///
/// `name`, `name.`, `name.DB` and `name.glass` all resolve to the same
/// directory and table name. Without a suffix the backend is inferred by
/// probing `name.DB`, then `name.glass`.
pub fn resolve_table(path: &Path) -> CoreResult<TableLocation> {
    let file_name = path
        .file_name()
        .ok_or_else(|| CoreError::not_a_database(path))?;
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

    let (base, suffix) = split_suffix(file_name);
    let backend = match suffix {
        Some(backend) => backend,
        None => Backend::ALL
            .into_iter()
            .find(|b| dir.join(with_suffix(&base, *b)).exists())
            .ok_or_else(|| CoreError::not_a_database(path))?,
    };

    Ok(TableLocation {
        backend,
        name: base.to_string_lossy().to_ascii_lowercase(),
        file: dir.join(with_suffix(&base, backend)),
        dir,
    })
}

/// Strips a trailing `.`, `.DB` or `.glass`, returning the base name and the
/// backend the suffix implies.
fn split_suffix(file_name: &OsStr) -> (OsString, Option<Backend>) {
    let name = Path::new(file_name);
    match (name.file_stem(), name.extension()) {
        (Some(stem), Some(ext)) if ext.is_empty() => (stem.to_owned(), None),
        (Some(stem), Some(ext)) if ext == "DB" => (stem.to_owned(), Some(Backend::Chert)),
        (Some(stem), Some(ext)) if ext == "glass" => (stem.to_owned(), Some(Backend::Glass)),
        _ => (file_name.to_owned(), None),
    }
}

fn with_suffix(base: &OsStr, backend: Backend) -> OsString {
    let mut name = base.to_owned();
    name.push(backend.table_suffix());
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn supported_markers_select_directory_mode() {
        for (marker, backend) in [("iamchert", Backend::Chert), ("iamglass", Backend::Glass)] {
            let dir = TempDir::new().unwrap();
            touch(&dir.path().join(marker));
            let detection = detect(dir.path(), BackendSet::compiled()).unwrap();
            assert_eq!(
                detection,
                Detection::Directory {
                    backend,
                    path: dir.path().to_path_buf()
                }
            );
        }
    }

    #[test]
    fn retired_markers_are_fatal() {
        for (marker, version) in [("iamflint", "1.3.0"), ("iambrass", "1.3.2"), ("record_DB", "1.1.0")] {
            let dir = TempDir::new().unwrap();
            touch(&dir.path().join(marker));
            let err = detect(dir.path(), BackendSet::compiled()).unwrap_err();
            assert!(err.to_string().ends_with(version), "{marker}: {err}");
        }
    }

    #[test]
    fn first_marker_wins() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("iamflint"));
        touch(&dir.path().join("iamglass"));
        assert_eq!(
            probe_markers(dir.path()),
            Some(MarkerOutcome::Supported(Backend::Glass))
        );
    }

    #[test]
    fn missing_support_is_feature_unavailable() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("iamglass"));
        let only_chert = BackendSet::EMPTY.with(Backend::Chert);
        let err = detect(dir.path(), only_chert).unwrap_err();
        assert!(matches!(err, CoreError::FeatureUnavailable { .. }));
        assert!(err.to_string().contains("Glass database support isn't enabled"));
    }

    #[test]
    fn unknown_path_is_not_a_database() {
        let dir = TempDir::new().unwrap();
        let err = detect(&dir.path().join("nothing"), BackendSet::compiled()).unwrap_err();
        assert!(matches!(err, CoreError::NotADatabase { .. }));
    }

    #[test]
    fn chert_table_probe_prefers_db_suffix() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("postlist.DB"));
        touch(&dir.path().join("postlist.glass"));
        let table = resolve_table(&dir.path().join("postlist")).unwrap();
        assert_eq!(table.backend, Backend::Chert);
        assert_eq!(table.file, dir.path().join("postlist.DB"));
    }

    #[test]
    fn table_name_is_lower_cased() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("TermList.glass"));
        let table = resolve_table(&dir.path().join("TermList.glass")).unwrap();
        assert_eq!(table.name, "termlist");
        assert_eq!(table.file, dir.path().join("TermList.glass"));
    }

    #[test]
    fn chert_table_inside_flint_directory_is_rejected() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("iamflint"));
        touch(&dir.path().join("record.DB"));
        let err = detect(&dir.path().join("record.DB"), BackendSet::compiled()).unwrap_err();
        assert!(matches!(err, CoreError::BackendRemoved { backend: "Flint", .. }));
    }

    #[test]
    fn glass_table_ignores_retired_markers() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("iambrass"));
        touch(&dir.path().join("docdata.glass"));
        let detection = detect(&dir.path().join("docdata.glass"), BackendSet::compiled()).unwrap();
        assert_eq!(detection.backend(), Backend::Glass);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn spellings_of_a_table_agree(name in "[a-z][a-z0-9_]{0,11}", glass in any::<bool>()) {
            let dir = TempDir::new().unwrap();
            let suffix = if glass { ".glass" } else { ".DB" };
            touch(&dir.path().join(format!("{name}{suffix}")));

            let bare = resolve_table(&dir.path().join(&name)).unwrap();
            let dotted = resolve_table(&dir.path().join(format!("{name}."))).unwrap();
            let full = resolve_table(&dir.path().join(format!("{name}{suffix}"))).unwrap();

            prop_assert_eq!(&bare, &dotted);
            prop_assert_eq!(&bare, &full);
            prop_assert_eq!(bare.name, name);
            prop_assert_eq!(bare.dir, dir.path().to_path_buf());
        }
    }
}
