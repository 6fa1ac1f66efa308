//! Discrete-event simulation kernel with delta-cycle semantics.
//!
//! Designs are built from [`Module`]s that declare signals, bind ports and
//! register cooperative [`Process`]es. The [`Simulator`] runs them: time
//! advances from event to event, and every instant settles through delta
//! cycles in which deferred writes are committed and waiting processes are
//! woken.

pub mod core;

// Re-export commonly used types
pub use crate::core::components::{Design, Module, Port, PortDirection, Process, ProcessState, Scope, Suspend};
pub use crate::core::error::{SimError, SimResult};
pub use crate::core::execution::{ProcessContext, SimulationConfig, Simulator};
pub use crate::core::logging::{ChangeRecord, LogLogger, Logger, SignalInfo, TraceLogger, VcdLogger};
pub use crate::core::time::{SimTime, Timescale};
pub use crate::core::types::{AsSignal, DesignId, ProcessId, SignalId, SignalRef};
pub use crate::core::values::{Condition, Edge, Trigger, Value, ValueKind};
