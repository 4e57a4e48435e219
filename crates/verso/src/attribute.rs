//! Named, versioned slots.
//!
//! An [`Attribute`] is one mutable binding in a field's namespace. Its
//! history of value revisions is append-only and never truncated, so sibling
//! branches can still reach revisions made before the branch point, and
//! structural diffing across commits reduces to a length-and-elementwise
//! comparison. The access counter tells "this branch actually read the
//! attribute" apart from "the attribute merely exists".

use ahash::AHashMap;

use crate::{
    arena::{Arena, RawId},
    intern::{CommitId, NameId},
    value::{ValueCell, ValueId},
};

/// Unique handle for an attribute in the registry's attribute arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttrId(pub(crate) RawId);

impl AttrId {
    /// Returns the raw slot index, for display and debugging only.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0.index()
    }
}

/// Per-commit capture of an attribute's state.
#[derive(Debug, Clone)]
struct AttrSnapshot {
    history: Vec<ValueId>,
    access_count: u64,
}

/// A named, versioned slot holding an ordered history of value revisions.
#[derive(Debug)]
pub struct Attribute {
    name: NameId,
    /// Revisions, oldest first. Appended by `revise`, never overwritten.
    history: Vec<ValueId>,
    /// Incremented on every `get_value` (unless the caller opts out).
    access_count: u64,
    snapshots: AHashMap<CommitId, AttrSnapshot>,
}

impl Attribute {
    pub(crate) fn new(name: NameId) -> Self {
        Self {
            name,
            history: Vec::new(),
            access_count: 0,
            snapshots: AHashMap::new(),
        }
    }

    /// The interned name this attribute was created under.
    #[must_use]
    pub fn name(&self) -> NameId {
        self.name
    }

    /// True once at least one revision exists.
    ///
    /// Callers must check this before `get_value`; an empty-history fetch is
    /// a contract violation.
    #[must_use]
    pub fn has_value(&self) -> bool {
        !self.history.is_empty()
    }

    /// Revisions recorded so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[ValueId] {
        &self.history
    }

    /// Reads recorded on the current branch.
    #[must_use]
    pub fn access_count(&self) -> u64 {
        self.access_count
    }

    pub(crate) fn push_revision(&mut self, value: ValueId) {
        self.history.push(value);
    }

    /// Most recent revision, counting the read when `increment_access`.
    pub(crate) fn latest(&mut self, increment_access: bool) -> Option<ValueId> {
        let value = self.history.last().copied()?;
        if increment_access {
            self.access_count += 1;
        }
        Some(value)
    }

    /// Captures `(history copy, access counter)` under the commit id.
    pub(crate) fn commit(&mut self, commit: CommitId) {
        self.snapshots.insert(
            commit,
            AttrSnapshot {
                history: self.history.clone(),
                access_count: self.access_count,
            },
        );
    }

    /// Restores the state captured under the commit id.
    ///
    /// `None` or an id with no snapshot resets to empty history and zero
    /// access: an unexplored branch is modeled as "this attribute never
    /// existed on this path", which is what downstream merge insertion
    /// relies on.
    pub(crate) fn checkout(&mut self, commit: Option<CommitId>) {
        if let Some(snapshot) = commit.and_then(|id| self.snapshots.get(&id)) {
            self.history = snapshot.history.clone();
            self.access_count = snapshot.access_count;
        } else {
            self.history.clear();
            self.access_count = 0;
        }
    }

    /// Whether the histories recorded at the two commits observably differ.
    ///
    /// False only when both ids are unknown, or when both histories have
    /// equal length and every positional entry is the same value in the same
    /// state. Any asymmetry in known-ness counts as a diff. Symmetric.
    ///
    /// Positional entries are compared by cell identity first; when both
    /// positions name the same cell, that cell's own per-commit change-ids
    /// decide whether it was mutated in place between the two commits. (The
    /// value arena is consulted for that second step; a released cell cannot
    /// testify and counts as unchanged.)
    #[must_use]
    pub(crate) fn has_diff(
        &self,
        commit1: Option<CommitId>,
        commit2: Option<CommitId>,
        values: &Arena<ValueCell>,
    ) -> bool {
        let first = commit1.and_then(|id| self.snapshots.get(&id));
        let second = commit2.and_then(|id| self.snapshots.get(&id));
        let (a, b) = match (first, second) {
            (None, None) => return false,
            (Some(a), Some(b)) => (a, b),
            _ => return true,
        };
        if a.history.len() != b.history.len() {
            return true;
        }
        a.history.iter().zip(&b.history).any(|(&left, &right)| {
            if left != right {
                return true;
            }
            values
                .get_if_live(left.0)
                .is_some_and(|cell| cell.has_diff(commit1, commit2))
        })
    }

    /// Whether the read pattern recorded at the two commits differs.
    ///
    /// True when the access counters differ, or when exactly one of the ids
    /// was ever committed. Used to detect branches whose reads diverge even
    /// though no value did. Symmetric.
    #[must_use]
    pub(crate) fn has_accessed(&self, commit1: Option<CommitId>, commit2: Option<CommitId>) -> bool {
        let first = commit1.and_then(|id| self.snapshots.get(&id));
        let second = commit2.and_then(|id| self.snapshots.get(&id));
        match (first, second) {
            (None, None) => false,
            (Some(a), Some(b)) => a.access_count != b.access_count,
            _ => true,
        }
    }
}
