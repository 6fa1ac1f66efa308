use crate::core::time::SimTime;
use crate::core::types::{ModuleId, ProcessId};
use crate::core::values::{Condition, Value, ValueKind};

/// A process parked on a signal.
#[derive(Debug, Clone)]
pub(crate) struct Waiter {
    pub process: ProcessId,
    pub condition: Condition,
    /// Suspension this registration belongs to; stale once the process
    /// has been woken by something else.
    pub token: u64,
    /// Global registration order, used to wake in FIFO order.
    pub seq: u64,
}

/// A committed transition of one signal.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Change {
    pub previous: Value,
}

/// Runtime state of a signal.
///
/// Reads see `current`. Deferred writes stage into `pending` and only
/// reach `current` when the kernel commits the delta. `committed` holds the
/// value as of the last commit and is what change detection compares
/// against, so an immediate write is also reported once per delta.
#[derive(Debug, Clone)]
pub struct SignalState {
    pub(crate) path: String,
    pub(crate) kind: ValueKind,
    pub(crate) owner: ModuleId,
    pub(crate) current: Value,
    pub(crate) pending: Option<Value>,
    pub(crate) committed: Value,
    pub(crate) last_value: Value,
    pub(crate) last_change: SimTime,
    pub(crate) waiters: Vec<Waiter>,
    /// Bumped by every assignment so that a delayed update issued earlier
    /// can tell it has been superseded.
    pub(crate) generation: u64,
}

impl SignalState {
    pub(crate) fn new(path: String, owner: ModuleId, initial: Value) -> Self {
        Self {
            path,
            kind: initial.kind(),
            owner,
            current: initial.clone(),
            pending: None,
            committed: initial.clone(),
            last_value: initial,
            last_change: SimTime::ZERO,
            waiters: Vec::new(),
            generation: 0,
        }
    }

    /// Hierarchical name, e.g. `tb.i_cnt.cnt`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Module that declared the signal.
    pub fn owner(&self) -> ModuleId {
        self.owner
    }

    pub fn value(&self) -> &Value {
        &self.current
    }

    pub fn pending(&self) -> Option<&Value> {
        self.pending.as_ref()
    }

    /// Processes currently parked on this signal.
    pub fn waiter_count(&self) -> usize {
        self.waiters.len()
    }

    /// Blocking write: visible to reads right away. Overrides any deferred
    /// write staged earlier in the same delta.
    pub(crate) fn assign_immediate(&mut self, value: Value) {
        self.generation += 1;
        self.pending = None;
        self.current = value;
    }

    /// Non-blocking write: staged until commit, last write wins.
    pub(crate) fn assign_deferred(&mut self, value: Value) {
        self.generation += 1;
        self.pending = Some(value);
    }

    /// Start a delayed write. Cancels anything staged so far and returns the
    /// generation the update must still match when it comes due.
    pub(crate) fn schedule_delayed(&mut self) -> u64 {
        self.generation += 1;
        self.pending = None;
        self.generation
    }

    /// Stage a delayed update that has come due, unless a newer assignment
    /// superseded it.
    pub(crate) fn apply_scheduled(&mut self, value: Value, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.pending = Some(value);
        true
    }

    /// Move the pending value into `current` and report whether the value
    /// differs from the previous commit.
    pub(crate) fn commit(&mut self, now: SimTime) -> Option<Change> {
        if let Some(next) = self.pending.take() {
            self.current = next;
        }
        if self.current == self.committed {
            return None;
        }
        let previous = std::mem::replace(&mut self.committed, self.current.clone());
        self.last_value = previous.clone();
        self.last_change = now;
        Some(Change { previous })
    }
}
