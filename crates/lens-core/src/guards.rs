//! Cycle guard - identity-based tracking of source nodes entered during one
//! normalization call
//!
//! A tracker marks every source node the normalizer enters and never unmarks
//! it. A node met again anywhere later in the same call is reported as
//! visited, whether it closes a real cycle or is merely shared between two
//! branches (`[shared, shared]`). Callers treat "revisited" and "cyclic" as
//! the same signal. Every node can be entered at most once per call, so
//! traversal terminates on any finite graph even without a depth ceiling.
//!
//! Trackers are created fresh per top-level call and are not `Clone`: a
//! tracker carried over from another call would report nodes it never saw
//! in this one.

use std::collections::HashSet;

use crate::normalized::{NormalizedValue, CYCLE_KIND};
use crate::scval::{Payload, ScValId};

/// Set of source nodes entered during the current call
#[derive(Debug, Default)]
pub struct VisitedTracker {
    visited: HashSet<ScValId>,
}

impl VisitedTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff `value` is a source node already marked on this tracker
    ///
    /// Scalars, records and lists are never tracked and always return false.
    pub fn has_visited(&self, value: &Payload) -> bool {
        match value {
            Payload::Node(id) => self.visited.contains(id),
            _ => false,
        }
    }

    /// Mark a source node as entered; no effect on anything else
    pub fn mark_visited(&mut self, value: &Payload) {
        if let Payload::Node(id) = value {
            self.visited.insert(*id);
        }
    }

    /// Number of nodes marked so far
    pub fn depth(&self) -> usize {
        self.visited.len()
    }

    pub fn create_cycle_marker(depth: usize) -> NormalizedValue {
        NormalizedValue::cycle(depth)
    }

    /// Structural check on the wire form: an object whose `kind` is the
    /// cycle discriminant
    pub fn is_cycle_marker(value: &serde_json::Value) -> bool {
        value
            .as_object()
            .and_then(|obj| obj.get("kind"))
            .and_then(serde_json::Value::as_str)
            == Some(CYCLE_KIND)
    }
}
