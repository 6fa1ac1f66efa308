//! Structured error type for the simulation kernel.
//!
//! Construction-time errors (binding, naming, kinds) surface before the
//! simulation starts. Scheduling errors raised while running are fatal: the
//! simulator refuses further runs until it is reset.

use crate::core::time::SimTime;
use crate::core::types::{ProcessId, SignalId};
use crate::core::values::ValueKind;

/// Crate-wide result alias.
pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// A value, equality target or edge wait does not fit the signal's kind.
    TypeMismatch {
        signal: String,
        expected: String,
        found: ValueKind,
    },
    /// A port was bound to a signal of a different kind.
    PortBinding {
        port: String,
        expected: ValueKind,
        found: ValueKind,
    },
    /// A handle that does not belong to the running design.
    UnknownSignal(SignalId),
    UnknownProcess(ProcessId),
    /// Two items of the same module share a name.
    DuplicateName { scope: String, name: String },
    /// An event was scheduled before the current instant.
    SchedulingInvariantViolation { requested: SimTime, now: SimTime },
    /// An instant did not reach quiescence within the configured delta budget.
    DeltaLimitExceeded { time: SimTime, limit: u32 },
    /// A process wrote a signal its module neither owns nor drives.
    IllegalWrite { process: String, signal: String },
    /// `run` was called before `initialize`.
    NotInitialized,
    /// `initialize` was called twice without a reset.
    AlreadyInitialized,
    /// A previous run aborted on a fatal error.
    KernelFaulted,
    /// Timescales must be positive and finite.
    InvalidTimescale(f64),
    /// A logger failed to persist its output.
    Logger(String),
    /// A process body reported a failure of its own.
    Process { process: String, message: String },
}

impl SimError {
    /// Whether the error leaves the kernel in a state that cannot continue.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SimError::SchedulingInvariantViolation { .. }
                | SimError::DeltaLimitExceeded { .. }
                | SimError::IllegalWrite { .. }
                | SimError::TypeMismatch { .. }
                | SimError::UnknownSignal(_)
                | SimError::Process { .. }
        )
    }
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::TypeMismatch { signal, expected, found } => write!(
                f,
                "type mismatch on signal '{}': expected {}, found {}",
                signal, expected, found
            ),
            SimError::PortBinding { port, expected, found } => write!(
                f,
                "cannot bind port '{}' of kind {} to a signal of kind {}",
                port, expected, found
            ),
            SimError::UnknownSignal(id) => write!(f, "{} is not part of this design", id),
            SimError::UnknownProcess(id) => write!(f, "{} is not part of this design", id),
            SimError::DuplicateName { scope, name } => {
                write!(f, "name '{}' is already declared in '{}'", name, scope)
            }
            SimError::SchedulingInvariantViolation { requested, now } => write!(
                f,
                "cannot schedule an event at {} when the current time is {}",
                requested, now
            ),
            SimError::DeltaLimitExceeded { time, limit } => write!(
                f,
                "no quiescence at {} after {} delta cycles",
                time, limit
            ),
            SimError::IllegalWrite { process, signal } => write!(
                f,
                "process '{}' is not allowed to drive signal '{}'",
                process, signal
            ),
            SimError::NotInitialized => write!(f, "simulator has not been initialized"),
            SimError::AlreadyInitialized => write!(f, "simulator is already initialized"),
            SimError::KernelFaulted => {
                write!(f, "simulator aborted on a fatal error and must be reset")
            }
            SimError::InvalidTimescale(seconds) => {
                write!(f, "invalid timescale of {} seconds per tick", seconds)
            }
            SimError::Logger(msg) => write!(f, "logger error: {}", msg),
            SimError::Process { process, message } => {
                write!(f, "process '{}' failed: {}", process, message)
            }
        }
    }
}

impl std::error::Error for SimError {}

impl From<std::io::Error> for SimError {
    fn from(err: std::io::Error) -> Self {
        SimError::Logger(err.to_string())
    }
}
