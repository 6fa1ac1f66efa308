use super::value::{Value, ValueKind};
use crate::core::types::SignalRef;

/// Direction of a signal edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Rising,
    Falling,
}

/// What a waiting process expects from a committed change.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Edge(Edge),
    /// Any committed change.
    Changed,
    /// A committed change to exactly this value.
    Equals(Value),
}

impl Condition {
    /// Evaluate against one committed transition `previous -> current`.
    ///
    /// Only called for signals that actually changed, so a condition can
    /// never fire twice while the value holds still.
    pub fn satisfied(&self, previous: &Value, current: &Value) -> bool {
        match self {
            Condition::Changed => previous != current,
            Condition::Equals(target) => previous != current && current == target,
            Condition::Edge(edge) => match (previous.truthy(), current.truthy()) {
                (Some(before), Some(after)) => match edge {
                    Edge::Rising => !before && after,
                    Edge::Falling => before && !after,
                },
                _ => false,
            },
        }
    }

    /// Check the condition can be evaluated on a signal of `kind`.
    ///
    /// Returns a description of the expected kind on failure.
    pub fn check_kind(&self, kind: ValueKind) -> Result<(), String> {
        match self {
            Condition::Changed => Ok(()),
            Condition::Edge(_) if kind.supports_edges() => Ok(()),
            Condition::Edge(_) => Err("an edge capable kind (bit, int or vector)".to_string()),
            Condition::Equals(target) if target.kind() == kind => Ok(()),
            Condition::Equals(target) => Err(target.kind().to_string()),
        }
    }
}

/// A signal together with the condition a process waits for on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub signal: SignalRef,
    pub condition: Condition,
}

impl Trigger {
    pub fn new(signal: SignalRef, condition: Condition) -> Self {
        Self { signal, condition }
    }
}
