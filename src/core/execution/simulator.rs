use log::{error, info};

use crate::core::components::module::Design;
use crate::core::components::process::ProcessState;
use crate::core::error::{SimError, SimResult};
use crate::core::execution::config::SimulationConfig;
use crate::core::execution::kernel::Kernel;
use crate::core::logging::Logger;
use crate::core::time::{SimTime, Timescale};
use crate::core::types::{AsSignal, ProcessId};
use crate::core::values::Value;

/// Entry point for running a design.
///
/// Owns at most one kernel at a time. Independent simulators share nothing
/// and may coexist.
pub struct Simulator {
    config: SimulationConfig,
    kernel: Option<Kernel>,
    faulted: bool,
}

impl Simulator {
    pub fn new() -> Self {
        Self::with_config(SimulationConfig::default())
    }

    pub fn with_config(config: SimulationConfig) -> Self {
        Self {
            config,
            kernel: None,
            faulted: false,
        }
    }

    /// Hand an elaborated design to a fresh kernel. Every process becomes
    /// runnable at time zero.
    pub fn initialize(
        &mut self,
        design: Design,
        timescale: Timescale,
        logger: Option<Box<dyn Logger>>,
    ) -> SimResult<()> {
        if self.kernel.is_some() {
            return Err(SimError::AlreadyInitialized);
        }
        info!("Initializing simulation of '{}'", design.name());
        self.kernel = Some(Kernel::new(design, timescale, self.config.clone(), logger)?);
        self.faulted = false;
        Ok(())
    }

    /// Advance simulated time by `duration` ticks; returns the new time.
    pub fn run(&mut self, duration: u64) -> SimResult<SimTime> {
        if self.faulted {
            return Err(SimError::KernelFaulted);
        }
        let kernel = self.kernel.as_mut().ok_or(SimError::NotInitialized)?;
        match kernel.run(duration) {
            Ok(time) => Ok(time),
            Err(err) => {
                if err.is_fatal() {
                    error!("Simulation aborted at {}: {}", kernel.now(), err);
                    self.faulted = true;
                }
                Err(err)
            }
        }
    }

    /// Advance simulated time by a duration given in seconds.
    pub fn run_for(&mut self, seconds: f64) -> SimResult<SimTime> {
        let kernel = self.kernel.as_ref().ok_or(SimError::NotInitialized)?;
        let ticks = kernel.timescale().ticks(seconds);
        self.run(ticks)
    }

    /// Flush the logger without advancing time.
    pub fn flush(&mut self) -> SimResult<()> {
        self.kernel.as_mut().ok_or(SimError::NotInitialized)?.flush()
    }

    /// Drop the kernel with everything still suspended in it.
    pub fn reset(&mut self) {
        if self.kernel.take().is_some() {
            info!("Simulation reset");
        }
        self.faulted = false;
    }

    pub fn is_initialized(&self) -> bool {
        self.kernel.is_some()
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn kernel(&self) -> Option<&Kernel> {
        self.kernel.as_ref()
    }

    /// Current simulated time; zero before initialization.
    pub fn now(&self) -> SimTime {
        self.kernel.as_ref().map_or(SimTime::ZERO, Kernel::now)
    }

    pub fn total_deltas(&self) -> u64 {
        self.kernel.as_ref().map_or(0, Kernel::total_deltas)
    }

    /// Current value of a signal.
    pub fn value(&self, signal: impl AsSignal) -> SimResult<&Value> {
        let kernel = self.kernel.as_ref().ok_or(SimError::NotInitialized)?;
        let signal = signal.signal_ref();
        kernel
            .signal(signal)
            .map(|state| state.value())
            .ok_or(SimError::UnknownSignal(signal.id()))
    }

    pub fn process_state(&self, process: ProcessId) -> SimResult<ProcessState> {
        let kernel = self.kernel.as_ref().ok_or(SimError::NotInitialized)?;
        kernel
            .process_state(process)
            .ok_or(SimError::UnknownProcess(process))
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}
