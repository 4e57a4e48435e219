//! Lexical/object-scoped namespaces.
//!
//! A [`Field`] maps names to attributes for one scope. Resolution order is
//! local map, then the parent chain (enclosing scopes, recursively), then the
//! module root, and finally materialize-on-read: a miss everywhere creates a
//! fresh empty local attribute, because downstream merge logic needs every
//! observed name to have a live attribute even when it was never assigned.
//!
//! Attributes resolved through the parent chain are cached locally so that
//! commits also capture which *external* bindings this scope saw; the cache
//! is snapshotted and restored alongside the local map.

use ahash::AHashMap;
use indexmap::IndexMap;

use crate::{
    arena::RawId,
    attribute::AttrId,
    intern::{CommitId, NameId},
};

/// Unique handle for a field in the registry's field arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId(pub(crate) RawId);

impl FieldId {
    /// Returns the raw slot index, for display and debugging only.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0.index()
    }
}

/// Per-commit capture of a field's state.
#[derive(Debug, Clone)]
struct FieldSnapshot {
    attributes: IndexMap<NameId, AttrId>,
    from_parent: Vec<AttrId>,
}

/// One scope's namespace: local bindings plus links for fallback resolution.
#[derive(Debug)]
pub struct Field {
    /// Local bindings, insertion-ordered so sweeps and dumps are
    /// deterministic.
    attributes: IndexMap<NameId, AttrId>,
    /// Attributes this scope resolved through its parent chain.
    from_parent: Vec<AttrId>,
    /// Enclosing scope, if any.
    parent: Option<FieldId>,
    /// Global scope, if any.
    module: Option<FieldId>,
    snapshots: AHashMap<CommitId, FieldSnapshot>,
}

impl Field {
    pub(crate) fn new(parent: Option<FieldId>, module: Option<FieldId>) -> Self {
        Self {
            attributes: IndexMap::new(),
            from_parent: Vec::new(),
            parent,
            module,
            snapshots: AHashMap::new(),
        }
    }

    /// Enclosing scope link.
    #[must_use]
    pub fn parent(&self) -> Option<FieldId> {
        self.parent
    }

    /// Global scope link.
    #[must_use]
    pub fn module(&self) -> Option<FieldId> {
        self.module
    }

    /// Local-map membership only; deliberately does not walk the parent
    /// chain. "Does this scope directly define the name" and "can this scope
    /// eventually resolve it" are different questions the tracer asks
    /// separately.
    #[must_use]
    pub fn has_local(&self, name: NameId) -> bool {
        self.attributes.contains_key(&name)
    }

    /// Local binding for a name, if present.
    #[must_use]
    pub fn local(&self, name: NameId) -> Option<AttrId> {
        self.attributes.get(&name).copied()
    }

    /// Locally bound attributes in insertion order.
    pub fn locals(&self) -> impl Iterator<Item = (NameId, AttrId)> + '_ {
        self.attributes.iter().map(|(&name, &attr)| (name, attr))
    }

    /// Attributes this scope resolved through its parent chain.
    #[must_use]
    pub fn parent_resolved(&self) -> &[AttrId] {
        &self.from_parent
    }

    pub(crate) fn bind_local(&mut self, name: NameId, attr: AttrId) {
        self.attributes.insert(name, attr);
    }

    /// Records a parent-chain hit in the inherited cache (idempotent).
    pub(crate) fn cache_parent_hit(&mut self, attr: AttrId) {
        if !self.from_parent.contains(&attr) {
            self.from_parent.push(attr);
        }
    }

    /// Captures whole copies of the local map and the inherited cache.
    pub(crate) fn commit(&mut self, commit: CommitId) {
        self.snapshots.insert(
            commit,
            FieldSnapshot {
                attributes: self.attributes.clone(),
                from_parent: self.from_parent.clone(),
            },
        );
    }

    /// Restores the state captured under the commit id.
    ///
    /// `None` or an id with no snapshot resets the scope to completely empty
    /// (no attributes, no inherited cache): it was never executed on this
    /// path.
    pub(crate) fn checkout(&mut self, commit: Option<CommitId>) {
        if let Some(snapshot) = commit.and_then(|id| self.snapshots.get(&id)) {
            self.attributes = snapshot.attributes.clone();
            self.from_parent = snapshot.from_parent.clone();
        } else {
            self.attributes.clear();
            self.from_parent.clear();
        }
    }
}
