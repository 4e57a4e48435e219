#![doc = include_str!("../../../README.md")]

mod adapt;
mod arena;
mod attribute;
mod error;
mod field;
mod intern;
mod registry;
mod stats;
pub mod tracer;
mod value;

pub use crate::{
    adapt::{HostDim, HostFunction, HostObject, HostValue},
    attribute::{AttrId, Attribute},
    error::StoreError,
    field::{Field, FieldId},
    intern::NameId,
    registry::Registry,
    stats::{StoreDiff, StoreStats},
    tracer::{NoopTracer, RecordingTracer, StderrTracer, StoreTracer, SweepCounts, TraceEvent},
    value::{Callable, Function, Instance, Modifier, Num, Tensor, Value, ValueCell, ValueId},
};
