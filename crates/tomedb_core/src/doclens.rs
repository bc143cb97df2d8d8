//! Document lengths shared between the termlist and postlist checks.
//!
//! Both tables store the length of every document. The termlist check records
//! the lengths it sees; the postlist check then compares its own copies
//! against them. The array is sized from the last docid read from disk, so the
//! reservation is bounded and allowed to fail without aborting the check.

use crate::error::CoreResult;
use crate::output::Output;
use crate::types::DocId;
use std::mem::size_of;
use tracing::warn;

/// Largest allocation the length array may use.
pub const MEMORY_CEILING: u64 = 1 << 30;

/// Why the length array was not reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The array would need at least [`MEMORY_CEILING`] bytes.
    OverCeiling,
    /// More elements than a `Vec` can address.
    TooManyElements,
    /// The allocator refused the reservation.
    OutOfMemory,
}

impl SkipReason {
    /// Advisory line written to the output sink.
    #[must_use]
    pub const fn advisory(self) -> &'static str {
        match self {
            Self::OverCeiling => {
                "Cross-checking document lengths between the postlist and termlist tables \
                 would use more than 1GB of memory, so skipping that check"
            }
            Self::TooManyElements => {
                "Couldn't allocate enough elements for cross-checking document lengths \
                 between the postlist and termlist tables, so skipping that check"
            }
            Self::OutOfMemory => {
                "Couldn't allocate enough memory for cross-checking document lengths \
                 between the postlist and termlist tables, so skipping that check"
            }
        }
    }
}

/// What the termlist said about one docid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    /// The termlist stores this length.
    Length(u32),
    /// The termlist has no entry for the docid.
    Absent,
    /// The termlist entry could not be read, so nothing can be compared.
    Unknown,
}

/// A bit per docid.
#[derive(Debug, Default)]
struct DocBits(Vec<u64>);

impl DocBits {
    fn get(&self, idx: usize) -> bool {
        self.0
            .get(idx / 64)
            .is_some_and(|word| word & (1u64 << (idx % 64)) != 0)
    }

    fn set(&mut self, idx: usize, value: bool) {
        let word = idx / 64;
        if word >= self.0.len() {
            self.0.resize(word + 1, 0);
        }
        if value {
            self.0[word] |= 1u64 << (idx % 64);
        } else {
            self.0[word] &= !(1u64 << (idx % 64));
        }
    }
}

/// Per-document lengths indexed by docid.
///
/// Disabled arrays accept and return nothing, which turns the postlist
/// cross-check off while every other check runs as usual.
#[derive(Debug, Default)]
pub struct DocLengths {
    lengths: Vec<u32>,
    /// Docids with a termlist entry.
    present: DocBits,
    /// Docids whose termlist entry could not be read.
    damaged: DocBits,
    /// One past the largest docid that may be recorded.
    limit: usize,
    /// One past the largest docid the termlist was read up to; larger
    /// docids are [`Recorded::Unknown`].
    horizon: usize,
    enabled: bool,
    populated: bool,
}

impl DocLengths {
    /// An array that never records anything.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Reserves room for docids `0..=last_docid`.
    ///
    /// Returns the skip reason instead when the reservation is refused. No
    /// output is produced.
    pub fn try_reserve(last_docid: DocId) -> Result<Self, SkipReason> {
        let last = u64::from(last_docid.as_u32());
        if last >= MEMORY_CEILING / size_of::<u32>() as u64 {
            return Err(SkipReason::OverCeiling);
        }

        let count = usize::try_from(last + 1).map_err(|_| SkipReason::TooManyElements)?;
        if count
            .checked_mul(size_of::<u32>())
            .map_or(true, |bytes| bytes > isize::MAX as usize)
        {
            return Err(SkipReason::TooManyElements);
        }

        let mut lengths = Vec::new();
        lengths
            .try_reserve_exact(count)
            .map_err(|_| SkipReason::OutOfMemory)?;
        Ok(Self {
            lengths,
            present: DocBits::default(),
            damaged: DocBits::default(),
            limit: count,
            horizon: count,
            enabled: true,
            populated: false,
        })
    }

    /// Reserves room for docids `0..=last_docid`, degrading to a disabled
    /// array with one advisory line on `out` when that is not possible.
    ///
    /// Only a failing sink is an error.
    pub fn reserve(last_docid: DocId, out: &mut Output<'_>) -> CoreResult<Self> {
        match Self::try_reserve(last_docid) {
            Ok(lengths) => Ok(lengths),
            Err(reason) => {
                warn!(last_docid = %last_docid, ?reason, "skipping document length cross-check");
                writeln!(out, "{}", reason.advisory())?;
                Ok(Self::disabled())
            }
        }
    }

    /// Returns true if lengths can be recorded.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns true once the termlist check has filled the array.
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// Records the termlist length of `did`. Any `u32` is a valid length.
    ///
    /// Returns false if the array is disabled, already populated, or `did` is
    /// beyond the reserved range; such docids are reported by the range
    /// check instead.
    pub fn record(&mut self, did: DocId, length: u32) -> bool {
        let Some(idx) = self.writable(did) else {
            return false;
        };
        self.lengths[idx] = length;
        self.present.set(idx, true);
        self.damaged.set(idx, false);
        true
    }

    /// Records that the termlist entry of `did` exists but is unreadable.
    ///
    /// The postlist length of `did` is then not compared.
    pub fn record_damaged(&mut self, did: DocId) -> bool {
        let Some(idx) = self.writable(did) else {
            return false;
        };
        self.present.set(idx, false);
        self.damaged.set(idx, true);
        true
    }

    fn writable(&mut self, did: DocId) -> Option<usize> {
        if !self.enabled || self.populated {
            return None;
        }
        let idx = did.as_u32() as usize;
        if idx >= self.limit {
            return None;
        }
        if idx >= self.lengths.len() {
            self.lengths.resize(idx + 1, 0);
        }
        Some(idx)
    }

    /// Freezes the array for the consuming check after a complete read of
    /// the termlist.
    pub fn mark_populated(&mut self) {
        if self.enabled {
            self.populated = true;
        }
    }

    /// Freezes the array after the termlist read stopped early.
    ///
    /// Only docids up to `last_read` are compared; `None` means nothing was
    /// read.
    pub fn mark_populated_through(&mut self, last_read: Option<DocId>) {
        let horizon = last_read.map_or(0, |did| (did.as_u32() as usize).saturating_add(1));
        self.horizon = self.horizon.min(horizon);
        self.lengths.truncate(self.horizon);
        self.mark_populated();
    }

    /// Returns what the termlist recorded for `did`.
    #[must_use]
    pub fn lookup(&self, did: DocId) -> Recorded {
        self.lookup_index(did.as_u32() as usize)
    }

    fn lookup_index(&self, idx: usize) -> Recorded {
        if idx >= self.horizon || self.damaged.get(idx) {
            Recorded::Unknown
        } else if self.present.get(idx) {
            Recorded::Length(self.lengths[idx])
        } else {
            Recorded::Absent
        }
    }

    /// Returns the recorded length of `did`.
    #[must_use]
    pub fn get(&self, did: DocId) -> Option<u32> {
        match self.lookup(did) {
            Recorded::Length(len) => Some(len),
            Recorded::Absent | Recorded::Unknown => None,
        }
    }

    /// Returns the number of documents with a recorded length.
    #[must_use]
    pub fn recorded(&self) -> usize {
        (0..self.lengths.len())
            .filter(|&idx| matches!(self.lookup_index(idx), Recorded::Length(_)))
            .count()
    }

    /// Starts an ascending walk for the cross-check, if the array is
    /// populated.
    #[must_use]
    pub fn walk(&self) -> Option<DocLenWalk<'_>> {
        self.populated.then(|| DocLenWalk {
            doclens: self,
            next: 0,
        })
    }

    fn present_in(&self, start: usize, end: usize) -> impl Iterator<Item = DocId> + '_ {
        let end = end.min(self.lengths.len());
        (start..end.max(start))
            .filter(|&idx| matches!(self.lookup_index(idx), Recorded::Length(_)))
            .map(|idx| DocId::new(idx as u32))
    }
}

/// Ascending walk over the recorded lengths, kept in step with the postlist's
/// doclen entries.
#[derive(Debug)]
pub struct DocLenWalk<'a> {
    doclens: &'a DocLengths,
    next: usize,
}

impl DocLenWalk<'_> {
    /// Moves the walk to `did`.
    ///
    /// Returns the termlist-only docids passed over on the way and what the
    /// termlist recorded for `did` itself.
    pub fn step(&mut self, did: DocId) -> (Vec<DocId>, Recorded) {
        let target = did.as_u32() as usize;
        let mut skipped = Vec::new();
        if target >= self.next {
            skipped = self.doclens.present_in(self.next, target).collect();
            self.next = target.saturating_add(1);
        }
        (skipped, self.doclens.lookup_index(target))
    }

    /// Ends the walk, returning every termlist-only docid not yet passed.
    #[must_use]
    pub fn finish(self) -> Vec<DocId> {
        self.doclens
            .present_in(self.next, self.doclens.lengths.len())
            .collect()
    }
}
