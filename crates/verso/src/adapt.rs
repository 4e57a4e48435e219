//! Host-object adapter: the boundary where opaque foreign values become
//! value trees.
//!
//! The external tracer hands the store a [`HostValue`] the first time it
//! observes a foreign datum; [`Registry::adapt`] converts it, memoizing
//! nested structure through fields. The conversion is deliberately lossy at
//! the edges: anything the store cannot represent degrades to `None` plus a
//! tracer diagnostic, so tracing of partially-unsupported programs
//! continues.
//!
//! Wrapped objects come in behind the [`HostObject`] trait and are pulled
//! through lazily: an instance attribute is adapted on its first access and
//! cached in the instance's private field, so repeated access is idempotent
//! and identity-stable.

use std::rc::Rc;

use crate::{
    field::FieldId,
    registry::Registry,
    tracer::StoreTracer,
    value::{Callable, Function, Tensor, Value, ValueId},
};

/// One dimension of a host shape descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostDim {
    /// A concrete extent.
    Known(i64),
    /// Present but unknown, recorded as `-1` in the adapted tensor shape —
    /// distinct from the dimension being absent.
    Undefined,
}

/// Handle to a host-defined callable.
///
/// The store never calls it; the external tracer interprets the handle when
/// it symbolically executes a call. The receiver binding lives on the
/// adapted [`Value::Function`], not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFunction {
    name: String,
}

impl HostFunction {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The callable's name on the host side.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A wrapped host object observed by the tracer.
///
/// Implementations expose attributes on demand; the store queries them only
/// on the first access of each attribute name (see
/// [`Registry::try_get_and_store_value`]).
pub trait HostObject: std::fmt::Debug {
    /// Returns the host-side attribute under `name`, or `None` when the
    /// object has no such attribute.
    fn attr(&self, name: &str) -> Option<HostValue>;
}

/// An opaque host value as presented to the adapter.
#[derive(Debug, Clone)]
pub enum HostValue {
    /// Checked before the numeric variants: booleans are numeric-compatible
    /// in the host language and must not classify as numbers.
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// An ordered collection; adapts to a list with one index-named
    /// attribute per element.
    Seq(Vec<HostValue>),
    /// A shape descriptor; adapts to a tensor with no materialized data.
    Shape(Vec<HostDim>),
    /// An array-like with concrete data.
    Array { shape: Vec<i64>, data: Vec<f64> },
    /// A bound method or callable.
    Method(HostFunction),
    /// The host's null.
    None,
    /// An absent/empty sentinel (an unbound parameter default, for
    /// example). Adapts the same as `None`.
    Absent,
    /// A supported wrapped object with lazy attribute pull-through.
    Object(Rc<dyn HostObject>),
    /// Anything the adapter does not recognize; carries a description for
    /// the diagnostic.
    Unsupported(String),
}

impl<Tr: StoreTracer> Registry<Tr> {
    /// Adapts a host value into the store, creating nested fields and
    /// attributes as needed.
    ///
    /// `module` is threaded through to wrapped objects so their private
    /// fields can still resolve module-level names; `name` only labels
    /// diagnostics. Unsupported values degrade to `None` plus a tracer
    /// diagnostic; adaptation itself never fails.
    pub fn adapt(&mut self, module: Option<FieldId>, name: &str, host: HostValue) -> ValueId {
        self.adapt_bound(module, name, host, None)
    }

    /// [`adapt`](Registry::adapt) with a receiver to bind host callables to.
    pub fn adapt_bound(
        &mut self,
        module: Option<FieldId>,
        name: &str,
        host: HostValue,
        receiver: Option<ValueId>,
    ) -> ValueId {
        match host {
            HostValue::Bool(v) => self.new_value(Value::Bool(v)),
            HostValue::Int(v) => self.new_value(Value::int(v)),
            HostValue::Float(v) => self.new_value(Value::float(v)),
            HostValue::Str(v) => self.new_value(Value::Str(v)),
            HostValue::Seq(elements) => {
                let list = self.new_list();
                let field = self.get_field(list).expect("list owns a field");
                for (index, element) in elements.into_iter().enumerate() {
                    let element = self.adapt(module, "", element);
                    let attr = self.get_attribute(field, &index.to_string());
                    self.revise(attr, element);
                }
                list
            }
            HostValue::Shape(dims) => {
                let shape = dims.into_iter().map(|dim| match dim {
                    HostDim::Known(extent) => extent,
                    HostDim::Undefined => -1,
                });
                self.new_value(Value::Tensor(Tensor::with_shape(shape)))
            }
            HostValue::Array { shape, data } => self.new_value(Value::Tensor(Tensor {
                shape: shape.into_iter().collect(),
                data: Some(data),
            })),
            HostValue::Method(callable) => self.new_value(Value::Function(Function {
                callable: Callable::Host(callable),
                receiver,
            })),
            HostValue::None | HostValue::Absent => self.new_value(Value::None),
            HostValue::Object(object) => self.new_instance(module, object),
            HostValue::Unsupported(description) => {
                self.tracer_mut().on_unsupported(name, &description);
                self.new_value(Value::None)
            }
        }
    }

    /// Lazy instance attribute pull-through.
    ///
    /// For a wrapped host object: consult the instance's private field
    /// first; on a miss, ask the host object, adapt the result (bound to the
    /// instance), revise it into the field, and return it. Returns `None`
    /// when the value is not an instance or the host object lacks the
    /// attribute. Repeated calls return the same stored value.
    pub fn try_get_and_store_value(&mut self, instance: ValueId, name: &str) -> Option<ValueId> {
        let (field, object) = match self.value(instance).data() {
            Value::Instance(inst) => (inst.field, Rc::clone(&inst.object)),
            _ => return None,
        };
        let attr = self.get_attribute(field, name);
        if self.has_value(attr) {
            return Some(self.get_value(attr).expect("attribute has a value"));
        }
        let host = object.attr(name)?;
        let module = self.field(field).module();
        let adapted = self.adapt_bound(module, name, host, Some(instance));
        self.revise(attr, adapted);
        Some(adapted)
    }
}
