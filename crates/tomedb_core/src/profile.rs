//! Per-generation check configuration.
//!
//! One checker loop serves both generations; everything that differs between
//! them is data in a [`BackendProfile`].

use crate::table::TableKind;
use crate::types::Backend;

/// Whether a table must exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Absence is an error.
    Required,
    /// Created on first use; absence is reported with `absent_note` and is
    /// not an error.
    Lazy {
        /// Line written when the table does not exist.
        absent_note: &'static str,
    },
}

/// One table of a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    /// Table name without suffix.
    pub name: &'static str,
    /// Role of the table.
    pub kind: TableKind,
    /// Whether the table must exist.
    pub presence: Presence,
}

impl TableSpec {
    const fn required(name: &'static str, kind: TableKind) -> Self {
        Self {
            name,
            kind,
            presence: Presence::Required,
        }
    }

    const fn lazy(name: &'static str, kind: TableKind, absent_note: &'static str) -> Self {
        Self {
            name,
            kind,
            presence: Presence::Lazy { absent_note },
        }
    }
}

const NOT_PRESENT: &str = "Not present.";
const NOT_YET_USED: &str = "Lazily created, and not yet used.";

/// Everything the checker needs to know about a generation.
///
/// Tables are listed in check order: the termlist, which records document
/// lengths, comes before the postlist, which is compared against them; the
/// first table carries the most reliable revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendProfile {
    /// Generation described.
    pub backend: Backend,
    /// Tables in check order.
    pub tables: &'static [TableSpec],
    /// Whether postlist lengths are compared against the termlist.
    pub cross_check_doclens: bool,
    /// Whether an invalid version file may be regenerated.
    pub header_repair: bool,
}

const CHERT_TABLES: [TableSpec; 6] = [
    TableSpec::required("record", TableKind::Record),
    TableSpec::lazy("termlist", TableKind::Termlist, NOT_PRESENT),
    TableSpec::required("postlist", TableKind::Postlist),
    TableSpec::lazy("position", TableKind::Position, NOT_YET_USED),
    TableSpec::lazy("spelling", TableKind::Spelling, NOT_YET_USED),
    TableSpec::lazy("synonym", TableKind::Synonym, NOT_YET_USED),
];

const GLASS_TABLES: [TableSpec; 6] = [
    TableSpec::required("docdata", TableKind::DocData),
    TableSpec::required("termlist", TableKind::Termlist),
    TableSpec::required("postlist", TableKind::Postlist),
    TableSpec::required("position", TableKind::Position),
    TableSpec::required("spelling", TableKind::Spelling),
    TableSpec::required("synonym", TableKind::Synonym),
];

impl BackendProfile {
    /// Chert: lazily created tables, repairable version file.
    pub const CHERT: Self = Self {
        backend: Backend::Chert,
        tables: &CHERT_TABLES,
        cross_check_doclens: true,
        header_repair: true,
    };

    /// Glass: every table always exists, no repair.
    pub const GLASS: Self = Self {
        backend: Backend::Glass,
        tables: &GLASS_TABLES,
        cross_check_doclens: true,
        header_repair: false,
    };

    /// Returns the profile of `backend`.
    #[must_use]
    pub const fn of(backend: Backend) -> &'static Self {
        match backend {
            Backend::Chert => &Self::CHERT,
            Backend::Glass => &Self::GLASS,
        }
    }

    /// Looks up a table by name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&'static TableSpec> {
        self.tables.iter().find(|spec| spec.name == name)
    }

    /// Names of the tables, in check order.
    pub fn table_names(&self) -> impl Iterator<Item = &'static str> {
        self.tables.iter().map(|spec| spec.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn termlist_checked_before_postlist() {
        for profile in [BackendProfile::CHERT, BackendProfile::GLASS] {
            let names: Vec<_> = profile.table_names().collect();
            let termlist = names.iter().position(|n| *n == "termlist").unwrap();
            let postlist = names.iter().position(|n| *n == "postlist").unwrap();
            assert!(termlist < postlist);
        }
    }

    #[test]
    fn chert_requires_record_and_postlist_only() {
        let required: Vec<_> = BackendProfile::CHERT
            .tables
            .iter()
            .filter(|t| t.presence == Presence::Required)
            .map(|t| t.name)
            .collect();
        assert_eq!(required, vec!["record", "postlist"]);
        assert_eq!(
            BackendProfile::CHERT.table("termlist").unwrap().presence,
            Presence::Lazy {
                absent_note: "Not present."
            }
        );
    }

    #[test]
    fn glass_tables_all_required() {
        assert!(BackendProfile::GLASS
            .tables
            .iter()
            .all(|t| t.presence == Presence::Required));
        assert!(!BackendProfile::GLASS.header_repair);
        assert_eq!(BackendProfile::of(Backend::Glass).tables[0].name, "docdata");
    }
}
