//! Observed values and their per-commit version bookkeeping.
//!
//! A [`Value`] is a closed sum over every kind of datum the tracer can
//! observe or derive. Each one lives in the registry's value arena wrapped in
//! a [`ValueCell`], which carries the identity bookkeeping the diff protocol
//! needs: a lazily assigned display name, a change-id regenerated on every
//! in-place mutation, the append-only modifier log, and per-commit snapshots
//! of `(representation, change-id)`.

use std::{fmt, rc::Rc};

use ahash::AHashMap;
use smallvec::SmallVec;
use uuid::Uuid;

use crate::{
    adapt::{HostFunction, HostObject},
    arena::RawId,
    field::FieldId,
    intern::{CommitId, NameId},
};

/// Unique handle for a value cell in the registry's value arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueId(pub(crate) RawId);

impl ValueId {
    /// Returns the raw slot index, for display and debugging only.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0.index()
    }
}

/// Numeric payload.
///
/// Host integers and floats both classify as `Number`; the split is kept so
/// the graph builder downstream can pick element types without re-inspecting
/// host data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
    Int(i64),
    Float(f64),
}

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

/// A tensor observed symbolically: shape plus optionally materialized data.
///
/// Shape dimensions may be unknown; an unknown dimension is recorded as `-1`,
/// which keeps "unknown but present" distinct from "absent".
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    pub shape: SmallVec<[i64; 4]>,
    pub data: Option<Vec<f64>>,
}

impl Tensor {
    /// A tensor with the given shape and no materialized data.
    #[must_use]
    pub fn with_shape(shape: impl IntoIterator<Item = i64>) -> Self {
        Self {
            shape: shape.into_iter().collect(),
            data: None,
        }
    }
}

/// What a [`Value::Function`] dispatches to when the tracer calls it.
#[derive(Debug, Clone)]
pub enum Callable {
    /// The bound `append` operation every list carries.
    ListAppend,
    /// A host-defined callable observed through the adapter.
    Host(HostFunction),
}

/// A callable bound to an optional receiver.
#[derive(Debug, Clone)]
pub struct Function {
    pub callable: Callable,
    /// The value the callable is bound to (`self`), when it is a method.
    pub receiver: Option<ValueId>,
}

/// A wrapped host object whose attributes are pulled through lazily.
#[derive(Debug, Clone)]
pub struct Instance {
    /// Private namespace caching adapted attributes.
    pub field: FieldId,
    /// Handle to the externally-owned object, consulted on first access of
    /// each attribute.
    pub object: Rc<dyn HostObject>,
}

/// One observed or derived datum.
///
/// Closed tagged union over every variant the store supports; each operation
/// site (commit, checkout, diff, adapt) matches exhaustively. Container
/// variants own a private [`FieldId`] for their element/attribute namespace.
#[derive(Debug, Clone, strum::IntoStaticStr)]
pub enum Value {
    /// Placeholder before any revision exists, and the state a value resets
    /// to when checked out under a commit id it never recorded.
    Unresolved,
    None,
    Number(Num),
    Str(String),
    Bool(bool),
    Range,
    Tuple(SmallVec<[ValueId; 4]>),
    Function(Function),
    /// Ordered container; the field holds one index-named attribute per
    /// element plus the bound `append` operation.
    List { field: FieldId },
    Dict { field: FieldId },
    Tensor(Tensor),
    Type,
    Instance(Instance),
}

impl Value {
    /// Integer shorthand used throughout tests and adapters.
    #[must_use]
    pub fn int(v: i64) -> Self {
        Self::Number(Num::Int(v))
    }

    /// Float shorthand.
    #[must_use]
    pub fn float(v: f64) -> Self {
        Self::Number(Num::Float(v))
    }

    /// String shorthand.
    #[must_use]
    pub fn str(v: impl Into<String>) -> Self {
        Self::Str(v.into())
    }

    /// Static variant name, used by store statistics and diagnostics.
    #[must_use]
    pub fn variant_name(&self) -> &'static str {
        self.into()
    }

    /// The private field of a container variant, `None` for scalar variants.
    #[must_use]
    pub fn field_id(&self) -> Option<FieldId> {
        match self {
            Self::List { field } | Self::Dict { field } => Some(*field),
            Self::Instance(instance) => Some(instance.field),
            Self::Unresolved
            | Self::None
            | Self::Number(_)
            | Self::Str(_)
            | Self::Bool(_)
            | Self::Range
            | Self::Tuple(_)
            | Self::Function(_)
            | Self::Tensor(_)
            | Self::Type => None,
        }
    }
}

impl fmt::Display for Value {
    /// Short tagged form used in trace logs: `N.3`, `S.abc`, `B.true`,
    /// `T.[2, -1]`, `L`, `D`, `F`, ...
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolved => write!(f, "?"),
            Self::None => write!(f, "None"),
            Self::Number(n) => write!(f, "N.{n}"),
            Self::Str(s) => write!(f, "S.{s}"),
            Self::Bool(b) => write!(f, "B.{b}"),
            Self::Range => write!(f, "R"),
            Self::Tuple(elements) => write!(f, "Tup[{}]", elements.len()),
            Self::Function(_) => write!(f, "F"),
            Self::List { .. } => write!(f, "L"),
            Self::Dict { .. } => write!(f, "D"),
            Self::Tensor(t) => write!(f, "T.{:?}", t.shape.as_slice()),
            Self::Type => write!(f, "Type"),
            Self::Instance(_) => write!(f, "I"),
        }
    }
}

/// One entry in a value's in-place mutation log.
///
/// The tracer appends one of these for every mutation that does not go
/// through `Attribute::revise` (a list element write, for example); the log
/// is how the graph builder later reconstructs what happened to a value that
/// was never rebound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modifier {
    op: String,
}

impl Modifier {
    #[must_use]
    pub fn new(op: impl Into<String>) -> Self {
        Self { op: op.into() }
    }

    /// The operation label recorded by the tracer.
    #[must_use]
    pub fn op(&self) -> &str {
        &self.op
    }
}

/// Per-commit capture of a value's state.
#[derive(Debug, Clone)]
struct ValueSnapshot {
    data: Value,
    change_id: Uuid,
}

/// Arena entry wrapping a [`Value`] with identity and version bookkeeping.
#[derive(Debug)]
pub struct ValueCell {
    /// Display name, assigned once by the first attribute that revises this
    /// value in.
    name: Option<NameId>,
    /// Opaque token regenerated on every in-place mutation. Two observations
    /// with equal change-ids are guaranteed interchangeable without deep
    /// comparison.
    change_id: Uuid,
    /// Append-only log of in-place mutations.
    modifiers: Vec<Modifier>,
    data: Value,
    snapshots: AHashMap<CommitId, ValueSnapshot>,
}

impl ValueCell {
    pub(crate) fn new(data: Value) -> Self {
        Self {
            name: None,
            change_id: Uuid::new_v4(),
            modifiers: Vec::new(),
            data,
            snapshots: AHashMap::new(),
        }
    }

    /// The current representation.
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Display name, if any attribute has named this value yet.
    #[must_use]
    pub fn name(&self) -> Option<NameId> {
        self.name
    }

    /// First-writer-names: only the first assignment sticks.
    pub(crate) fn name_once(&mut self, name: NameId) {
        if self.name.is_none() {
            self.name = Some(name);
        }
    }

    /// Current change-id.
    #[must_use]
    pub fn change_id(&self) -> Uuid {
        self.change_id
    }

    /// The in-place mutation log, oldest first.
    #[must_use]
    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    /// False only for the [`Value::Unresolved`] placeholder.
    #[must_use]
    pub fn has_value(&self) -> bool {
        !matches!(self.data, Value::Unresolved)
    }

    /// The container's private field, if this value owns one.
    #[must_use]
    pub fn field_id(&self) -> Option<FieldId> {
        self.data.field_id()
    }

    /// Records an in-place mutation: logs the modifier, installs the new
    /// representation and regenerates the change-id.
    ///
    /// Every mutation that does not go through `Attribute::revise` must pass
    /// through here, otherwise diffing downstream silently under-reports.
    pub(crate) fn modify(&mut self, modifier: Modifier, new_data: Value) {
        self.modifiers.push(modifier);
        self.data = new_data;
        self.change_id = Uuid::new_v4();
    }

    /// Captures `(representation, change-id)` under the commit id.
    pub(crate) fn commit(&mut self, commit: CommitId) {
        self.snapshots.insert(
            commit,
            ValueSnapshot {
                data: self.data.clone(),
                change_id: self.change_id,
            },
        );
    }

    /// Restores the state captured under the commit id.
    ///
    /// `None` or an id with no snapshot is not an error: it means this value
    /// was never live on that branch, so the cell resets to
    /// [`Value::Unresolved`] with a fresh change-id.
    pub(crate) fn checkout(&mut self, commit: Option<CommitId>) {
        if let Some(snapshot) = commit.and_then(|id| self.snapshots.get(&id)) {
            self.data = snapshot.data.clone();
            self.change_id = snapshot.change_id;
        } else {
            self.data = Value::Unresolved;
            self.change_id = Uuid::new_v4();
        }
    }

    /// Whether the states recorded at the two commits observably differ.
    ///
    /// Both unknown: no diff. Exactly one known: diff. Both known: the
    /// change-ids decide; equal change-ids guarantee interchangeable state.
    /// Symmetric in its arguments. `None` means the branch id string was
    /// never committed at all.
    #[must_use]
    pub(crate) fn has_diff(&self, commit1: Option<CommitId>, commit2: Option<CommitId>) -> bool {
        let first = commit1.and_then(|id| self.snapshots.get(&id));
        let second = commit2.and_then(|id| self.snapshots.get(&id));
        match (first, second) {
            (None, None) => false,
            (Some(a), Some(b)) => a.change_id != b.change_id,
            _ => true,
        }
    }
}
