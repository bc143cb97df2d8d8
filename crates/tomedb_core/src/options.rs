//! Consistency check options.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bitmask controlling what a consistency check reports and whether it
/// attempts the header repair.
///
/// Only [`CheckOptions::FIX`] changes behaviour; every other bit only affects
/// what is written to the output sink and is cleared when there is no sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CheckOptions(u32);

impl CheckOptions {
    /// No options.
    pub const NONE: Self = Self(0);
    /// Print a one-line summary for every table.
    pub const SHORT_TREE: Self = Self(0x01);
    /// Print every key of every table.
    pub const FULL_TREE: Self = Self(0x02);
    /// Print revision, entry and byte statistics per table.
    pub const SHOW_STATS: Self = Self(0x08);
    /// Regenerate an invalid version header after a clean pass.
    pub const FIX: Self = Self(0x10);

    /// Creates options from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Checks whether every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Checks whether header repair was requested.
    #[must_use]
    pub const fn fix(self) -> bool {
        self.contains(Self::FIX)
    }

    /// Clears every bit that only affects output.
    #[must_use]
    pub const fn without_reporting(self) -> Self {
        Self(self.0 & Self::FIX.0)
    }
}

impl BitOr for CheckOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for CheckOptions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for CheckOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::SHORT_TREE, "short-tree"),
            (Self::FULL_TREE, "full-tree"),
            (Self::SHOW_STATS, "stats"),
            (Self::FIX, "fix"),
        ];
        let set: Vec<_> = names
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect();
        if set.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&set.join("|"))
        }
    }
}
