use crate::core::types::{AsSignal, SignalRef};
use crate::core::values::ValueKind;

/// Port direction enumeration for module interfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    /// Read-only view of a signal driven elsewhere
    Input,
    /// Signal driven by the module
    Output,
    /// Signal both read and driven by the module
    Inout,
}

impl PortDirection {
    /// Whether processes of the module may drive the bound signal.
    pub fn can_drive(&self) -> bool {
        matches!(self, PortDirection::Output | PortDirection::Inout)
    }
}

/// A module port: a named alias of a signal owned further up the hierarchy.
///
/// The binding is fixed when the port is declared.
#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub(crate) path: String,
    pub(crate) direction: PortDirection,
    pub(crate) signal: SignalRef,
}

impl Port {
    /// Hierarchical name of the port, e.g. `tb.cnt.clk_i`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    pub fn kind(&self) -> ValueKind {
        self.signal.kind
    }
}

impl AsSignal for Port {
    fn signal_ref(&self) -> SignalRef {
        self.signal
    }
}
