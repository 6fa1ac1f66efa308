//! Signal-change loggers.
//!
//! The kernel reports every committed change through the [`Logger`]
//! capability and makes no assumption about what the logger does with it.

pub mod log_sink;
pub mod trace;
pub mod vcd;

pub use log_sink::LogLogger;
pub use trace::{ChangeRecord, TraceLogger};
pub use vcd::VcdLogger;

use crate::core::error::SimResult;
use crate::core::time::{SimTime, Timescale};
use crate::core::types::SignalId;
use crate::core::values::{Value, ValueKind};

/// Static description of a signal handed to loggers.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalInfo {
    pub id: SignalId,
    /// Hierarchical name, e.g. `tb.i_cnt.cnt`
    pub path: String,
    /// Path of the declaring module, e.g. `tb.i_cnt`
    pub scope: String,
    pub name: String,
    pub kind: ValueKind,
    pub initial: Value,
}

/// Receiver of ordered signal-change notifications.
pub trait Logger {
    /// Called once at initialize with every signal in declaration order.
    fn register(&mut self, _signals: &[SignalInfo], _timescale: Timescale) -> SimResult<()> {
        Ok(())
    }

    /// Called once per committed change per delta cycle, in signal
    /// declaration order.
    fn on_signal_change(&mut self, signal: &SignalInfo, time: SimTime, value: &Value);

    /// Persist everything recorded up to `time`.
    fn flush(&mut self, _time: SimTime) -> SimResult<()> {
        Ok(())
    }
}
