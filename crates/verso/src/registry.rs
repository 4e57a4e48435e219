//! The per-trace registry owning every field, attribute and value.
//!
//! The registry is the single writer for one trace: the external tracer
//! creates entities through it, reads and writes through it, and asks it to
//! commit or checkout the whole live set at branch boundaries. Entities live
//! in generational arenas; a released slot is skipped by the sweeps and
//! detectably stale on direct access.
//!
//! One registry per trace, never shared: concurrent tracing of sibling
//! branches requires duplicating the whole registry, not sharing this one.
//! Cancellation is just dropping it; commits are copy-based, so there is no
//! partial state to roll back.

use std::rc::Rc;

use crate::{
    adapt::HostObject,
    arena::Arena,
    attribute::{AttrId, Attribute},
    error::StoreError,
    field::{Field, FieldId},
    intern::{Interner, NameId},
    tracer::{NoopTracer, StoreTracer, SweepCounts},
    value::{Callable, Function, Instance, Modifier, Value, ValueCell, ValueId},
};

/// Versioned attribute/value store for one trace.
///
/// Generic over a [`StoreTracer`]; the default [`NoopTracer`] monomorphizes
/// every observation hook away.
#[derive(Debug)]
pub struct Registry<Tr: StoreTracer = NoopTracer> {
    fields: Arena<Field>,
    attributes: Arena<Attribute>,
    values: Arena<ValueCell>,
    interner: Interner,
    tracer: Tr,
}

impl Registry<NoopTracer> {
    /// Creates an empty registry with the zero-cost default tracer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tracer(NoopTracer)
    }
}

impl Default for Registry<NoopTracer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Tr: StoreTracer> Registry<Tr> {
    /// Creates an empty registry observing through the given tracer.
    #[must_use]
    pub fn with_tracer(tracer: Tr) -> Self {
        Self {
            fields: Arena::new("field"),
            attributes: Arena::new("attribute"),
            values: Arena::new("value"),
            interner: Interner::new(),
            tracer,
        }
    }

    /// The tracer, for inspecting collected data.
    #[must_use]
    pub fn tracer(&self) -> &Tr {
        &self.tracer
    }

    /// Consumes the registry, returning the tracer.
    #[must_use]
    pub fn into_tracer(self) -> Tr {
        self.tracer
    }

    pub(crate) fn tracer_mut(&mut self) -> &mut Tr {
        &mut self.tracer
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Creates a new scope with optional enclosing-scope and global links.
    pub fn new_field(&mut self, parent: Option<FieldId>, module: Option<FieldId>) -> FieldId {
        FieldId(self.fields.insert(Field::new(parent, module)))
    }

    /// Registers a value, returning its handle.
    pub fn new_value(&mut self, data: Value) -> ValueId {
        ValueId(self.values.insert(ValueCell::new(data)))
    }

    /// Creates a list value with a freshly constructed private field and the
    /// bound `append` operation revised into it.
    ///
    /// Every list gets its own backing field; nothing is shared between
    /// lists.
    pub fn new_list(&mut self) -> ValueId {
        let field = self.new_field(None, None);
        let list = self.new_value(Value::List { field });
        let append = self.new_value(Value::Function(Function {
            callable: Callable::ListAppend,
            receiver: Some(list),
        }));
        let attr = self.get_attribute(field, "append");
        self.revise(attr, append);
        list
    }

    /// Creates a dict/record value with a freshly constructed private field.
    pub fn new_dict(&mut self) -> ValueId {
        let field = self.new_field(None, None);
        self.new_value(Value::Dict { field })
    }

    /// Wraps a host object for lazy attribute pull-through.
    ///
    /// `module` becomes the global-scope link of the instance's private
    /// field, so attribute resolution inside the instance can still reach
    /// module-level names.
    pub fn new_instance(&mut self, module: Option<FieldId>, object: Rc<dyn HostObject>) -> ValueId {
        let field = self.new_field(None, module);
        self.new_value(Value::Instance(Instance { field, object }))
    }

    /// Creates a named type value.
    pub fn new_type(&mut self, name: &str) -> ValueId {
        let name = self.interner.intern_name(name);
        let id = self.new_value(Value::Type);
        self.values.get_mut(id.0).name_once(name);
        id
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Returns a field by handle.
    ///
    /// # Panics
    /// Panics if the handle is stale (released or reused slot).
    #[must_use]
    pub fn field(&self, id: FieldId) -> &Field {
        self.fields.get(id.0)
    }

    /// Returns an attribute by handle.
    ///
    /// # Panics
    /// Panics if the handle is stale (released or reused slot).
    #[must_use]
    pub fn attribute(&self, id: AttrId) -> &Attribute {
        self.attributes.get(id.0)
    }

    /// Returns a value cell by handle.
    ///
    /// # Panics
    /// Panics if the handle is stale (released or reused slot).
    #[must_use]
    pub fn value(&self, id: ValueId) -> &ValueCell {
        self.values.get(id.0)
    }

    /// Resolves an interned name back to its string.
    #[must_use]
    pub fn name(&self, id: NameId) -> &str {
        self.interner.name(id)
    }

    /// The name an attribute was created under.
    #[must_use]
    pub fn attribute_name(&self, id: AttrId) -> &str {
        self.interner.name(self.attributes.get(id.0).name())
    }

    /// The private field of a container value, `None` for scalars.
    ///
    /// Containers and fields share a uniform "resolve" contract; this is the
    /// value side of it.
    #[must_use]
    pub fn get_field(&self, id: ValueId) -> Option<FieldId> {
        self.values.get(id.0).field_id()
    }

    // ------------------------------------------------------------------
    // Read/write surface
    // ------------------------------------------------------------------

    /// Local-map membership test only; does not walk the parent chain.
    #[must_use]
    pub fn has_attribute(&self, field: FieldId, key: &str) -> bool {
        self.interner
            .lookup_name(key)
            .is_some_and(|name| self.fields.get(field.0).has_local(name))
    }

    /// Resolves an attribute: local map, then the parent chain, then the
    /// module root, then materialize-on-read.
    ///
    /// Parent-chain hits are cached in the field's inherited cache so later
    /// commits capture the binding. A miss everywhere creates a brand-new
    /// empty local attribute under `key` and returns it — querying a
    /// nonexistent attribute materializes it, so downstream merge logic can
    /// express "never assigned on this branch" as empty history rather than
    /// absence.
    pub fn get_attribute(&mut self, field: FieldId, key: &str) -> AttrId {
        let name = self.interner.intern_name(key);
        if let Some(attr) = self.fields.get(field.0).local(name) {
            return attr;
        }

        if let Some(parent) = self.fields.get(field.0).parent()
            && let Some(attr) = self.resolve_in_chain(parent, name)
        {
            self.fields.get_mut(field.0).cache_parent_hit(attr);
            return attr;
        }

        if let Some(module) = self.fields.get(field.0).module()
            && let Some(attr) = self.resolve_in_chain(module, name)
        {
            return attr;
        }

        let attr = AttrId(self.attributes.insert(Attribute::new(name)));
        self.fields.get_mut(field.0).bind_local(name, attr);
        self.tracer.on_attribute_created(key);
        attr
    }

    /// Recursive scope-chain search: local map first, then the parent link.
    ///
    /// Kept as an explicit function so resolution order is testable on its
    /// own.
    fn resolve_in_chain(&self, field: FieldId, name: NameId) -> Option<AttrId> {
        let field = self.fields.get(field.0);
        if let Some(attr) = field.local(name) {
            return Some(attr);
        }
        field.parent().and_then(|parent| self.resolve_in_chain(parent, name))
    }

    /// Appends a revision to an attribute's history.
    ///
    /// First-writer-names: if the value has no display name yet, it takes
    /// this attribute's name, once.
    pub fn revise(&mut self, attr: AttrId, value: ValueId) {
        let attribute = self.attributes.get_mut(attr.0);
        let name = attribute.name();
        attribute.push_revision(value);
        let history_len = attribute.history().len();
        self.values.get_mut(value.0).name_once(name);
        self.tracer.on_revise(self.interner.name(name), history_len);
    }

    /// True once the attribute has at least one revision.
    #[must_use]
    pub fn has_value(&self, attr: AttrId) -> bool {
        self.attributes.get(attr.0).has_value()
    }

    /// Most recent revision, counting the read.
    ///
    /// The access counter is how the tracer learns "this branch actually
    /// read the attribute" versus "the attribute merely exists". Reading an
    /// attribute with no revisions is a precondition violation.
    pub fn get_value(&mut self, attr: AttrId) -> Result<ValueId, StoreError> {
        let attribute = self.attributes.get_mut(attr.0);
        let name = attribute.name();
        match attribute.latest(true) {
            Some(value) => {
                let access_count = attribute.access_count();
                self.tracer.on_access(self.interner.name(name), access_count);
                Ok(value)
            }
            None => Err(StoreError::EmptyRead {
                attribute: self.interner.name(name).to_owned(),
            }),
        }
    }

    /// Most recent revision without counting the read.
    pub fn peek_value(&self, attr: AttrId) -> Result<ValueId, StoreError> {
        let attribute = self.attributes.get(attr.0);
        attribute
            .history()
            .last()
            .copied()
            .ok_or_else(|| StoreError::EmptyRead {
                attribute: self.interner.name(attribute.name()).to_owned(),
            })
    }

    /// Records an in-place mutation of a value.
    ///
    /// Must be called for any mutation that does not go through [`revise`];
    /// skipping it silently breaks diffing downstream.
    ///
    /// [`revise`]: Registry::revise
    pub fn modify(&mut self, value: ValueId, modifier: Modifier, new_data: Value) {
        self.values.get_mut(value.0).modify(modifier, new_data);
    }

    // ------------------------------------------------------------------
    // Commit / checkout / diff
    // ------------------------------------------------------------------

    /// Snapshots every live field, attribute and value under the branch id.
    pub fn commit(&mut self, id: &str) {
        let commit = self.interner.intern_commit(id);
        for field in self.fields.iter_live_mut() {
            field.commit(commit);
        }
        for attribute in self.attributes.iter_live_mut() {
            attribute.commit(commit);
        }
        for cell in self.values.iter_live_mut() {
            cell.commit(commit);
        }
        let swept = self.sweep_counts();
        self.tracer.on_commit(id, swept);
    }

    /// Restores every live field, attribute and value to the state recorded
    /// under the branch id.
    ///
    /// Entities with no snapshot under the id reset to their empty/default
    /// state; that is the defined behavior for a branch that never ran, not
    /// an error. Checkouts never mint commit ids; an id is recorded only by
    /// a commit.
    pub fn checkout(&mut self, id: &str) {
        let commit = self.interner.lookup_commit(id);
        for field in self.fields.iter_live_mut() {
            field.checkout(commit);
        }
        for attribute in self.attributes.iter_live_mut() {
            attribute.checkout(commit);
        }
        for cell in self.values.iter_live_mut() {
            cell.checkout(commit);
        }
        let swept = self.sweep_counts();
        self.tracer.on_checkout(id, swept);
    }

    fn sweep_counts(&self) -> SweepCounts {
        SweepCounts {
            fields: self.fields.live_count(),
            attributes: self.attributes.live_count(),
            values: self.values.live_count(),
        }
    }

    /// Snapshots a single field under the branch id.
    pub fn commit_field(&mut self, field: FieldId, id: &str) {
        let commit = self.interner.intern_commit(id);
        self.fields.get_mut(field.0).commit(commit);
    }

    /// Restores a single field; unknown ids reset it to empty.
    pub fn checkout_field(&mut self, field: FieldId, id: &str) {
        let commit = self.interner.lookup_commit(id);
        self.fields.get_mut(field.0).checkout(commit);
    }

    /// Snapshots a single attribute under the branch id.
    pub fn commit_attribute(&mut self, attr: AttrId, id: &str) {
        let commit = self.interner.intern_commit(id);
        self.attributes.get_mut(attr.0).commit(commit);
    }

    /// Restores a single attribute; unknown ids reset it to empty history
    /// and zero access.
    pub fn checkout_attribute(&mut self, attr: AttrId, id: &str) {
        let commit = self.interner.lookup_commit(id);
        self.attributes.get_mut(attr.0).checkout(commit);
    }

    /// Snapshots a single value under the branch id.
    pub fn commit_value(&mut self, value: ValueId, id: &str) {
        let commit = self.interner.intern_commit(id);
        self.values.get_mut(value.0).commit(commit);
    }

    /// Restores a single value; unknown ids reset it to `Unresolved`.
    pub fn checkout_value(&mut self, value: ValueId, id: &str) {
        let commit = self.interner.lookup_commit(id);
        self.values.get_mut(value.0).checkout(commit);
    }

    /// Whether an attribute's recorded histories differ between two commits.
    ///
    /// Symmetric; branch ids never seen by any commit count as "never
    /// committed".
    #[must_use]
    pub fn attribute_has_diff(&self, attr: AttrId, id1: &str, id2: &str) -> bool {
        let commit1 = self.interner.lookup_commit(id1);
        let commit2 = self.interner.lookup_commit(id2);
        self.attributes.get(attr.0).has_diff(commit1, commit2, &self.values)
    }

    /// Whether an attribute's recorded read pattern differs between two
    /// commits. Symmetric.
    #[must_use]
    pub fn attribute_has_accessed(&self, attr: AttrId, id1: &str, id2: &str) -> bool {
        let commit1 = self.interner.lookup_commit(id1);
        let commit2 = self.interner.lookup_commit(id2);
        self.attributes.get(attr.0).has_accessed(commit1, commit2)
    }

    /// Whether a value's recorded state differs between two commits.
    /// Symmetric.
    #[must_use]
    pub fn value_has_diff(&self, value: ValueId, id1: &str, id2: &str) -> bool {
        let commit1 = self.interner.lookup_commit(id1);
        let commit2 = self.interner.lookup_commit(id2);
        self.values.get(value.0).has_diff(commit1, commit2)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Discards a field. Its slot is skipped by later sweeps.
    pub fn release_field(&mut self, field: FieldId) {
        self.fields.release(field.0);
    }

    /// Discards an attribute. Its slot is skipped by later sweeps.
    pub fn release_attribute(&mut self, attr: AttrId) {
        self.attributes.release(attr.0);
    }

    /// Discards a value. Its slot is skipped by later sweeps; attribute
    /// histories that still name it simply stop testifying about it in
    /// diffs.
    pub fn release_value(&mut self, value: ValueId) {
        self.values.release(value.0);
    }

    /// Clears everything for the next independent trace.
    ///
    /// All outstanding handles become stale.
    pub fn reset(&mut self) {
        self.fields.clear();
        self.attributes.clear();
        self.values.clear();
        self.interner.clear();
    }

    pub(crate) fn arena_counts(&self) -> (&Arena<Field>, &Arena<Attribute>, &Arena<ValueCell>) {
        (&self.fields, &self.attributes, &self.values)
    }

    pub(crate) fn interner(&self) -> &Interner {
        &self.interner
    }
}
