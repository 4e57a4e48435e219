//! Host-value adaptation and lazy instance attribute pull-through.

use std::{cell::RefCell, rc::Rc};

use pretty_assertions::assert_eq;
use verso::{
    Callable, HostDim, HostFunction, HostObject, HostValue, Num, RecordingTracer, Registry, TraceEvent, Value,
};

// =============================================================================
// 1. Scalar Classification
// =============================================================================

/// Booleans classify as Bool, never as Number, even though the host language
/// treats them as numeric-compatible.
#[test]
fn bool_is_not_a_number() {
    let mut reg = Registry::new();
    let v = reg.adapt(None, "flag", HostValue::Bool(true));
    assert!(matches!(reg.value(v).data(), Value::Bool(true)));
}

/// Integers and floats both classify as Number; strings as Str.
#[test]
fn numbers_and_strings() {
    let mut reg = Registry::new();
    let i = reg.adapt(None, "n", HostValue::Int(3));
    let f = reg.adapt(None, "r", HostValue::Float(0.5));
    let s = reg.adapt(None, "s", HostValue::Str("hi".to_owned()));
    assert!(matches!(reg.value(i).data(), Value::Number(Num::Int(3))));
    assert!(matches!(reg.value(f).data(), Value::Number(Num::Float(_))));
    assert!(matches!(reg.value(s).data(), Value::Str(text) if text == "hi"));
}

/// The host's null and the absent-sentinel both adapt to None.
#[test]
fn none_and_absent_sentinels() {
    let mut reg = Registry::new();
    let n = reg.adapt(None, "n", HostValue::None);
    let a = reg.adapt(None, "a", HostValue::Absent);
    assert!(matches!(reg.value(n).data(), Value::None));
    assert!(matches!(reg.value(a).data(), Value::None));
}

// =============================================================================
// 2. Sequence Adaptation
// =============================================================================

/// Adapting `[1, "a", true]` produces a list whose field has attributes
/// "0", "1", "2", each with exactly one revision of the right variant.
#[test]
fn sequence_adapts_to_indexed_attributes() {
    let mut reg = Registry::new();
    let list = reg.adapt(
        None,
        "xs",
        HostValue::Seq(vec![
            HostValue::Int(1),
            HostValue::Str("a".to_owned()),
            HostValue::Bool(true),
        ]),
    );
    assert!(matches!(reg.value(list).data(), Value::List { .. }));
    let field = reg.get_field(list).expect("list owns a field");

    for (index, check) in [
        ("0", Value::int(1)),
        ("1", Value::str("a")),
        ("2", Value::Bool(true)),
    ] {
        assert!(reg.has_attribute(field, index));
        let attr = reg.get_attribute(field, index);
        assert_eq!(reg.attribute(attr).history().len(), 1);
        let element = reg.peek_value(attr).unwrap();
        assert_eq!(
            reg.value(element).data().variant_name(),
            check.variant_name(),
            "element {index} has the wrong variant"
        );
    }
}

/// Elements are named by the index attribute that first revised them.
#[test]
fn elements_take_index_names() {
    let mut reg = Registry::new();
    let list = reg.adapt(None, "xs", HostValue::Seq(vec![HostValue::Int(7)]));
    let field = reg.get_field(list).unwrap();
    let attr = reg.get_attribute(field, "0");
    let element = reg.peek_value(attr).unwrap();
    let name = reg.value(element).name().expect("revised value is named");
    assert_eq!(reg.name(name), "0");
}

/// Every list carries its bound append operation, and distinct lists own
/// distinct backing fields.
#[test]
fn lists_have_bound_append_and_private_fields() {
    let mut reg = Registry::new();
    let a = reg.adapt(None, "a", HostValue::Seq(vec![]));
    let b = reg.adapt(None, "b", HostValue::Seq(vec![]));
    assert_ne!(reg.get_field(a), reg.get_field(b));

    let field = reg.get_field(a).unwrap();
    assert!(reg.has_attribute(field, "append"));
    let append = reg.get_attribute(field, "append");
    let func = reg.peek_value(append).unwrap();
    match reg.value(func).data() {
        Value::Function(f) => {
            assert!(matches!(f.callable, Callable::ListAppend));
            assert_eq!(f.receiver, Some(a));
        }
        other => panic!("expected a bound function, got {other}"),
    }
}

// =============================================================================
// 3. Tensor Adaptation
// =============================================================================

/// An undefined dimension in a shape descriptor becomes -1, in position,
/// with the concrete dimensions preserved.
#[test]
fn undefined_dimension_becomes_minus_one() {
    let mut reg = Registry::new();
    let t = reg.adapt(
        None,
        "x",
        HostValue::Shape(vec![HostDim::Known(2), HostDim::Undefined, HostDim::Known(3)]),
    );
    match reg.value(t).data() {
        Value::Tensor(tensor) => {
            assert_eq!(tensor.shape.as_slice(), &[2, -1, 3]);
            assert!(tensor.data.is_none());
        }
        other => panic!("expected a tensor, got {other}"),
    }
}

/// An array-like with concrete data captures both shape and data.
#[test]
fn array_captures_shape_and_data() {
    let mut reg = Registry::new();
    let t = reg.adapt(
        None,
        "x",
        HostValue::Array {
            shape: vec![2, 2],
            data: vec![1.0, 2.0, 3.0, 4.0],
        },
    );
    match reg.value(t).data() {
        Value::Tensor(tensor) => {
            assert_eq!(tensor.shape.as_slice(), &[2, 2]);
            assert_eq!(tensor.data.as_deref(), Some(&[1.0, 2.0, 3.0, 4.0][..]));
        }
        other => panic!("expected a tensor, got {other}"),
    }
}

// =============================================================================
// 4. Lossy Fallback
// =============================================================================

/// Unsupported host values degrade to None and emit a diagnostic through the
/// tracer; the trace continues.
#[test]
fn unsupported_degrades_to_none_with_diagnostic() {
    let mut reg = Registry::with_tracer(RecordingTracer::new());
    let v = reg.adapt(None, "sock", HostValue::Unsupported("socket handle".to_owned()));
    assert!(matches!(reg.value(v).data(), Value::None));

    let events = reg.into_tracer().into_events();
    assert!(events.contains(&TraceEvent::Unsupported {
        name: "sock".to_owned(),
        description: "socket handle".to_owned(),
    }));
}

// =============================================================================
// 5. Instances and Lazy Pull-Through
// =============================================================================

/// Host object whose attribute reads are counted, so tests can assert the
/// store queries it exactly once per name.
#[derive(Debug)]
struct CountingObject {
    hits: RefCell<usize>,
}

impl CountingObject {
    fn new() -> Rc<Self> {
        Rc::new(Self { hits: RefCell::new(0) })
    }
}

impl HostObject for CountingObject {
    fn attr(&self, name: &str) -> Option<HostValue> {
        *self.hits.borrow_mut() += 1;
        match name {
            "w" => Some(HostValue::Int(3)),
            "forward" => Some(HostValue::Method(HostFunction::new("forward"))),
            _ => None,
        }
    }
}

/// First access pulls the attribute through the host object and caches it;
/// repeated access returns the identical value without asking the host
/// again.
#[test]
fn instance_pull_through_is_lazy_and_idempotent() {
    let mut reg = Registry::new();
    let object = CountingObject::new();
    let inst = reg.new_instance(None, object.clone());
    assert_eq!(*object.hits.borrow(), 0, "wrapping must not touch the host object");

    let first = reg.try_get_and_store_value(inst, "w").expect("host has 'w'");
    let second = reg.try_get_and_store_value(inst, "w").expect("cached 'w'");
    assert_eq!(first, second);
    assert_eq!(*object.hits.borrow(), 1, "host queried exactly once");
    assert!(matches!(reg.value(first).data(), Value::Number(Num::Int(3))));
}

/// Pulled-through methods are bound to the instance they came from.
#[test]
fn pulled_methods_bind_the_instance() {
    let mut reg = Registry::new();
    let inst = reg.new_instance(None, CountingObject::new());
    let method = reg.try_get_and_store_value(inst, "forward").expect("host has 'forward'");
    match reg.value(method).data() {
        Value::Function(f) => {
            assert!(matches!(&f.callable, Callable::Host(h) if h.name() == "forward"));
            assert_eq!(f.receiver, Some(inst));
        }
        other => panic!("expected a bound method, got {other}"),
    }
}

/// Attributes the host object lacks, and pull-through on non-instances,
/// both answer None rather than erroring.
#[test]
fn pull_through_misses_are_none() {
    let mut reg = Registry::new();
    let inst = reg.new_instance(None, CountingObject::new());
    assert!(reg.try_get_and_store_value(inst, "missing").is_none());

    let scalar = reg.new_value(Value::int(1));
    assert!(reg.try_get_and_store_value(scalar, "w").is_none());
}
