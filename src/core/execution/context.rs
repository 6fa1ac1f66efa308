use crate::core::components::process::{Process, Suspend};
use crate::core::error::SimResult;
use crate::core::execution::kernel::{Assignment, Kernel};
use crate::core::time::{SimTime, Timescale};
use crate::core::types::{AsSignal, ProcessId};
use crate::core::values::Value;

/// Everything a process may do while it holds control.
///
/// Handed to [`Process::resume`] by the kernel for the duration of one
/// resumption.
pub struct ProcessContext<'k> {
    kernel: &'k mut Kernel,
    process: ProcessId,
}

impl<'k> ProcessContext<'k> {
    pub(crate) fn new(kernel: &'k mut Kernel, process: ProcessId) -> Self {
        Self { kernel, process }
    }

    /// Current simulated time.
    pub fn now(&self) -> SimTime {
        self.kernel.now()
    }

    /// Delta cycle within the current instant.
    pub fn delta(&self) -> u32 {
        self.kernel.delta()
    }

    pub fn timescale(&self) -> Timescale {
        self.kernel.timescale()
    }

    pub fn now_seconds(&self) -> f64 {
        self.kernel.timescale().seconds(self.kernel.now())
    }

    /// Convert seconds into ticks of the running timescale.
    pub fn ticks(&self, seconds: f64) -> u64 {
        self.kernel.timescale().ticks(seconds)
    }

    /// Suspension for a duration given in seconds.
    pub fn wait_for(&self, seconds: f64) -> Suspend {
        Suspend::Delay(self.ticks(seconds))
    }

    pub fn process_id(&self) -> ProcessId {
        self.process
    }

    /// Hierarchical name of the running process.
    pub fn process_name(&self) -> &str {
        self.kernel.process_path(self.process)
    }

    /// Current value of a signal, including immediate writes made earlier
    /// in this delta.
    pub fn read(&self, signal: impl AsSignal) -> SimResult<&Value> {
        Ok(self.kernel.signal_state(signal.signal_ref())?.value())
    }

    /// Read a bit signal; any other kind reads as its truthiness.
    pub fn read_bit(&self, signal: impl AsSignal) -> SimResult<bool> {
        Ok(self.read(signal)?.truthy().unwrap_or(false))
    }

    /// Read an integer signal; bit vectors read as their unsigned bits.
    pub fn read_int(&self, signal: impl AsSignal) -> SimResult<i64> {
        let value = self.read(signal)?;
        Ok(match value {
            Value::Int(v) => *v,
            Value::Bit(bit) => i64::from(*bit),
            Value::Vector { bits, .. } => *bits as i64,
            Value::Real(v) => *v as i64,
            Value::Str(_) => 0,
        })
    }

    /// Value the signal held before its most recent change.
    pub fn last_value(&self, signal: impl AsSignal) -> SimResult<&Value> {
        Ok(&self.kernel.signal_state(signal.signal_ref())?.last_value)
    }

    /// Ticks elapsed since the signal last changed.
    pub fn last_event(&self, signal: impl AsSignal) -> SimResult<u64> {
        let state = self.kernel.signal_state(signal.signal_ref())?;
        Ok(self.now().duration_since(state.last_change).unwrap_or(0))
    }

    /// Whether the signal has not changed for more than `interval` ticks.
    pub fn stable(&self, signal: impl AsSignal, interval: u64) -> SimResult<bool> {
        Ok(self.last_event(signal)? > interval)
    }

    /// Deferred assignment, committed at the end of the current delta.
    pub fn assign(&mut self, signal: impl AsSignal, value: impl Into<Value>) -> SimResult<()> {
        self.kernel
            .write(self.process, signal.signal_ref(), value.into(), Assignment::Deferred)
    }

    /// Immediate assignment, visible to reads right away.
    pub fn assign_immediate(&mut self, signal: impl AsSignal, value: impl Into<Value>) -> SimResult<()> {
        self.kernel
            .write(self.process, signal.signal_ref(), value.into(), Assignment::Immediate)
    }

    /// Deferred assignment taking effect `delay` ticks from now.
    ///
    /// A later assignment to the same signal cancels it if it has not been
    /// applied yet.
    pub fn assign_after(
        &mut self,
        signal: impl AsSignal,
        value: impl Into<Value>,
        delay: u64,
    ) -> SimResult<()> {
        self.kernel
            .write(self.process, signal.signal_ref(), value.into(), Assignment::After(delay))
    }

    /// Start a new process owned by the same module; it first runs in the
    /// next delta cycle.
    pub fn spawn<P: Process + 'static>(&mut self, name: &str, body: P) -> SimResult<ProcessId> {
        self.kernel.spawn(self.process, name, Box::new(body))
    }

    /// Start a closure as a new process of the same module.
    pub fn spawn_fn<F>(&mut self, name: &str, body: F) -> SimResult<ProcessId>
    where
        F: FnMut(&mut ProcessContext<'_>) -> SimResult<Suspend> + 'static,
    {
        self.spawn(name, body)
    }
}
