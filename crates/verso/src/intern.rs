//! Interning for attribute names and commit ids.
//!
//! Attribute names are used as map keys on every resolution and every
//! snapshot copy; commit ids key every per-entity snapshot map. Both are
//! interned to `u32` indices so the hot paths compare and hash integers and
//! snapshot copies never clone strings. Lookups back to `&str` are needed
//! only for diagnostics and error messages.

use ahash::AHashMap;

/// Index into the interner's name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameId(u32);

impl NameId {
    /// Returns the raw index value.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index into the interner's commit-id table.
///
/// One `CommitId` is issued per distinct branch id string; every per-entity
/// snapshot map keys on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommitId(u32);

impl CommitId {
    /// Returns the raw index value.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// String interner for names and commit ids, scoped to one trace.
#[derive(Debug, Default)]
pub(crate) struct Interner {
    names: Vec<String>,
    name_ids: AHashMap<String, NameId>,
    commits: Vec<String>,
    commit_ids: AHashMap<String, CommitId>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a name, returning the existing id when already seen.
    pub fn intern_name(&mut self, name: &str) -> NameId {
        if let Some(&id) = self.name_ids.get(name) {
            return id;
        }
        let id = NameId(u32::try_from(self.names.len()).expect("name table out of u32 range"));
        self.names.push(name.to_owned());
        self.name_ids.insert(name.to_owned(), id);
        id
    }

    /// Returns the string for a name id.
    pub fn name(&self, id: NameId) -> &str {
        &self.names[id.index()]
    }

    /// Looks up a name without interning.
    ///
    /// `None` means the name was never observed, so no field can have a
    /// local binding for it.
    pub fn lookup_name(&self, name: &str) -> Option<NameId> {
        self.name_ids.get(name).copied()
    }

    /// Interns a commit id, returning the existing id when already seen.
    pub fn intern_commit(&mut self, commit: &str) -> CommitId {
        if let Some(&id) = self.commit_ids.get(commit) {
            return id;
        }
        let id = CommitId(u32::try_from(self.commits.len()).expect("commit table out of u32 range"));
        self.commits.push(commit.to_owned());
        self.commit_ids.insert(commit.to_owned(), id);
        id
    }

    /// Looks up a commit id without interning.
    ///
    /// `None` means the branch id string was never recorded by any commit,
    /// which the diff and checkout operations treat as "never committed".
    pub fn lookup_commit(&self, commit: &str) -> Option<CommitId> {
        self.commit_ids.get(commit).copied()
    }

    /// Number of interned names.
    pub fn name_count(&self) -> usize {
        self.names.len()
    }

    /// Number of distinct commit ids recorded by commits.
    pub fn commit_count(&self) -> usize {
        self.commits.len()
    }

    /// Forgets all interned state for the next trace.
    pub fn clear(&mut self) {
        self.names.clear();
        self.name_ids.clear();
        self.commits.clear();
        self.commit_ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut interner = Interner::new();
        let a = interner.intern_name("w");
        let b = interner.intern_name("w");
        let c = interner.intern_name("x");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.name(a), "w");
        assert_eq!(interner.name_count(), 2);
    }

    #[test]
    fn commit_lookup_does_not_intern() {
        let mut interner = Interner::new();
        assert!(interner.lookup_commit("before").is_none());
        let id = interner.intern_commit("before");
        assert_eq!(interner.lookup_commit("before"), Some(id));
        assert_eq!(interner.commit_count(), 1);
    }
}
