use crate::core::error::SimResult;
use crate::core::execution::context::ProcessContext;
use crate::core::time::SimTime;
use crate::core::values::Trigger;

/// Suspension request returned by a process when it yields to the kernel.
///
/// These are the only points at which a process gives up control.
#[derive(Debug, Clone, PartialEq)]
pub enum Suspend {
    /// Resume after the given number of ticks; zero resumes in the next
    /// delta cycle of the current instant.
    Delay(u64),
    /// Resume at an absolute time, which must not lie in the past.
    Until(SimTime),
    /// Resume when the trigger's condition holds for a committed change.
    Wait(Trigger),
    /// Resume once, on the first of several triggers to fire.
    WaitAny(Vec<Trigger>),
    /// The process body is complete.
    Terminate,
}

/// Lifecycle of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessState {
    Runnable,
    Suspended,
    Terminated,
}

/// A cooperative process body.
///
/// The kernel calls `resume` whenever the previous suspension request is
/// satisfied; the body runs until it hands back its next request. Local
/// progress lives in the implementing type, typically as a state enum.
pub trait Process {
    fn resume(&mut self, ctx: &mut ProcessContext<'_>) -> SimResult<Suspend>;
}

impl<F> Process for F
where
    F: FnMut(&mut ProcessContext<'_>) -> SimResult<Suspend>,
{
    fn resume(&mut self, ctx: &mut ProcessContext<'_>) -> SimResult<Suspend> {
        self(ctx)
    }
}
