//! Configuration for simulation execution
//!
//! Controls how the kernel guards against runaway instants and how it
//! drives the attached logger.

use serde::{Deserialize, Serialize};

/// Configuration for simulation execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Delta cycles allowed at one simulated instant before the run is
    /// aborted as non-converging
    pub max_deltas: u32,
    /// Whether the logger is flushed at the end of every `run` call
    pub flush_after_run: bool,
}

impl SimulationConfig {
    /// Create a new simulation configuration with default values
    ///
    /// Default configuration allows 10 000 delta cycles per instant and
    /// flushes the logger after every run
    pub fn new() -> Self {
        Self {
            max_deltas: 10_000,
            flush_after_run: true,
        }
    }

    /// Set the delta-cycle budget per instant
    ///
    /// # Arguments
    /// * `max_deltas` - Number of delta cycles allowed at one instant
    pub fn with_max_deltas(mut self, max_deltas: u32) -> Self {
        self.max_deltas = max_deltas;
        self
    }

    /// Choose whether the logger is flushed after each run
    pub fn with_flush_after_run(mut self, flush: bool) -> Self {
        self.flush_after_run = flush;
        self
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}
