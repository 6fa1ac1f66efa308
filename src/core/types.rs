use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::values::{Condition, Edge, Trigger, Value, ValueKind};

/// Identity of one elaborated design. Handles carry it so that a signal
/// from one design never resolves inside another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DesignId(pub(crate) u64);

impl DesignId {
    pub(crate) fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        DesignId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Index of a signal in declaration order.
///
/// Declaration order doubles as the order in which loggers see changes
/// committed in the same delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalId(pub(crate) usize);

impl SignalId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for SignalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sig#{}", self.0)
    }
}

/// Index of a process in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(pub(crate) usize);

impl ProcessId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "proc#{}", self.0)
    }
}

/// Index of a module instance in the design hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub(crate) usize);

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mod#{}", self.0)
    }
}

/// Non-owning handle to a declared signal.
///
/// Handles are cheap to copy; the signal itself lives in the simulation
/// arena for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignalRef {
    pub(crate) design: DesignId,
    pub(crate) id: SignalId,
    pub(crate) kind: ValueKind,
}

impl SignalRef {
    pub fn id(&self) -> SignalId {
        self.id
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Design the signal was declared in.
    pub fn design(&self) -> DesignId {
        self.design
    }
}

/// Anything that resolves to a signal: the signal handle itself or a port
/// aliasing it.
pub trait AsSignal {
    fn signal_ref(&self) -> SignalRef;

    /// Wait for a 0 -> 1 transition.
    fn rising(&self) -> Trigger {
        Trigger::new(self.signal_ref(), Condition::Edge(Edge::Rising))
    }

    /// Wait for a 1 -> 0 transition.
    fn falling(&self) -> Trigger {
        Trigger::new(self.signal_ref(), Condition::Edge(Edge::Falling))
    }

    /// Wait for any committed change.
    fn changed(&self) -> Trigger {
        Trigger::new(self.signal_ref(), Condition::Changed)
    }

    /// Wait for a committed change to `value`.
    fn becomes(&self, value: impl Into<Value>) -> Trigger {
        Trigger::new(self.signal_ref(), Condition::Equals(value.into()))
    }
}

impl AsSignal for SignalRef {
    fn signal_ref(&self) -> SignalRef {
        *self
    }
}

impl<T: AsSignal + ?Sized> AsSignal for &T {
    fn signal_ref(&self) -> SignalRef {
        (**self).signal_ref()
    }
}
