//! Errors crossing the store boundary.
//!
//! Almost every irregularity in the store is encoded as data — empty
//! history, `Value::Unresolved`, boolean diff verdicts — so the tracer can
//! make policy decisions. The one exception is the empty read below, which is
//! a tracer bug and fatal to the current trace step.

use std::fmt;

/// Error returned across the store boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// `get_value` was called on an attribute with no revisions. The tracer
    /// must check `has_value` first; this is a precondition violation, not a
    /// recoverable condition.
    EmptyRead {
        /// Name of the attribute that was read.
        attribute: String,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRead { attribute } => {
                write!(f, "attribute '{attribute}' read before any revision")
            }
        }
    }
}

impl std::error::Error for StoreError {}
