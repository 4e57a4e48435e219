//! Store observation hooks.
//!
//! The registry is parameterized over a [`StoreTracer`] with no-op default
//! hooks, so observation is a zero-cost abstraction: with [`NoopTracer`]
//! every hook monomorphizes away entirely. Implementations collect different
//! kinds of data:
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | Zero-cost no-op (production default) |
//! | [`StderrTracer`] | Human-readable store log to stderr |
//! | [`RecordingTracer`] | Full event capture for assertions and post-mortem |
//!
//! The unsupported-host-value diagnostic required by the adapter flows
//! through [`StoreTracer::on_unsupported`]; with the default tracer it is
//! intentionally silent.

/// How many entities a registry-wide commit or checkout touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepCounts {
    /// Live fields swept.
    pub fields: usize,
    /// Live attributes swept.
    pub attributes: usize,
    /// Live values swept.
    pub values: usize,
}

/// Store event emitted during a trace.
///
/// Used by [`RecordingTracer`] to capture everything the store did for
/// post-mortem analysis or test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// A registry-wide commit swept the live set.
    Commit { id: String, swept: SweepCounts },
    /// A registry-wide checkout swept the live set.
    Checkout { id: String, swept: SweepCounts },
    /// A field lookup materialized a fresh empty attribute.
    AttributeCreated { name: String },
    /// An attribute received a new revision.
    Revise { attribute: String, history_len: usize },
    /// An attribute was read with access counting.
    Access { attribute: String, access_count: u64 },
    /// The adapter met a host value it cannot represent and degraded it to
    /// `None`.
    Unsupported { name: String, description: String },
}

/// Trait for observing store activity.
///
/// All methods have default no-op implementations, so [`NoopTracer`] requires
/// zero lines of code and compiles to zero instructions. Implementations only
/// override the hooks they care about.
pub trait StoreTracer: std::fmt::Debug {
    /// Called after a registry-wide commit.
    #[inline(always)]
    fn on_commit(&mut self, _id: &str, _swept: SweepCounts) {}

    /// Called after a registry-wide checkout.
    #[inline(always)]
    fn on_checkout(&mut self, _id: &str, _swept: SweepCounts) {}

    /// Called when a lookup materializes a fresh empty attribute.
    #[inline(always)]
    fn on_attribute_created(&mut self, _name: &str) {}

    /// Called when an attribute receives a new revision.
    ///
    /// `history_len` is the history length after the append.
    #[inline(always)]
    fn on_revise(&mut self, _attribute: &str, _history_len: usize) {}

    /// Called when an attribute is read with access counting.
    #[inline(always)]
    fn on_access(&mut self, _attribute: &str, _access_count: u64) {}

    /// Called when the adapter degrades an unsupported host value to `None`.
    ///
    /// Non-fatal: tracing of partially-unsupported programs continues.
    #[inline(always)]
    fn on_unsupported(&mut self, _name: &str, _description: &str) {}
}

// ============================================================================
// NoopTracer — zero-cost production default
// ============================================================================

/// A tracer that does nothing.
///
/// All trait methods use the default no-op implementations; the registry
/// monomorphizes them away entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl StoreTracer for NoopTracer {}

// ============================================================================
// StderrTracer — human-readable store log
// ============================================================================

/// Tracer that prints a human-readable store log to stderr.
///
/// Output format:
/// ```text
///   +++ ATTR w
///   ... REVISE w          history=1
///   <<< READ w            accesses=1
/// === COMMIT before       fields=1 attrs=1 values=1
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrTracer;

impl StderrTracer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl StoreTracer for StderrTracer {
    fn on_commit(&mut self, id: &str, swept: SweepCounts) {
        eprintln!(
            "=== COMMIT {id:<16} fields={} attrs={} values={}",
            swept.fields, swept.attributes, swept.values
        );
    }

    fn on_checkout(&mut self, id: &str, swept: SweepCounts) {
        eprintln!(
            "=== CHECKOUT {id:<14} fields={} attrs={} values={}",
            swept.fields, swept.attributes, swept.values
        );
    }

    fn on_attribute_created(&mut self, name: &str) {
        eprintln!("  +++ ATTR {name}");
    }

    fn on_revise(&mut self, attribute: &str, history_len: usize) {
        eprintln!("  ... REVISE {attribute:<12} history={history_len}");
    }

    fn on_access(&mut self, attribute: &str, access_count: u64) {
        eprintln!("  <<< READ {attribute:<14} accesses={access_count}");
    }

    fn on_unsupported(&mut self, name: &str, description: &str) {
        eprintln!("  !!! UNSUPPORTED {name}: {description}");
    }
}

// ============================================================================
// RecordingTracer — full event capture
// ============================================================================

/// Tracer that records every event for assertions or post-mortem analysis.
///
/// The most expensive tracer (allocates per event); intended for tests and
/// for debugging short traces.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: Vec<TraceEvent>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded events in chronological order.
    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Consumes the tracer and returns the recorded events.
    #[must_use]
    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }

    /// Number of events recorded.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

impl StoreTracer for RecordingTracer {
    fn on_commit(&mut self, id: &str, swept: SweepCounts) {
        self.events.push(TraceEvent::Commit {
            id: id.to_owned(),
            swept,
        });
    }

    fn on_checkout(&mut self, id: &str, swept: SweepCounts) {
        self.events.push(TraceEvent::Checkout {
            id: id.to_owned(),
            swept,
        });
    }

    fn on_attribute_created(&mut self, name: &str) {
        self.events.push(TraceEvent::AttributeCreated { name: name.to_owned() });
    }

    fn on_revise(&mut self, attribute: &str, history_len: usize) {
        self.events.push(TraceEvent::Revise {
            attribute: attribute.to_owned(),
            history_len,
        });
    }

    fn on_access(&mut self, attribute: &str, access_count: u64) {
        self.events.push(TraceEvent::Access {
            attribute: attribute.to_owned(),
            access_count,
        });
    }

    fn on_unsupported(&mut self, name: &str, description: &str) {
        self.events.push(TraceEvent::Unsupported {
            name: name.to_owned(),
            description: description.to_owned(),
        });
    }
}
