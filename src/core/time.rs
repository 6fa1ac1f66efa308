use crate::core::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};

/// Simulated time in ticks of the configured timescale.
///
/// Time only advances when the kernel pops an event scheduled later than
/// the current instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SimTime(u64);

impl SimTime {
    /// The zero-point of simulation time.
    pub const ZERO: SimTime = SimTime(0);

    /// Create a time from a raw tick value.
    #[inline]
    pub fn new(ticks: u64) -> Self {
        SimTime(ticks)
    }

    /// Return the raw tick value.
    #[inline]
    pub fn ticks(self) -> u64 {
        self.0
    }

    /// Time `delay` ticks after `self`, `None` on overflow.
    #[inline]
    pub fn checked_add(self, delay: u64) -> Option<SimTime> {
        self.0.checked_add(delay).map(SimTime)
    }

    /// Ticks elapsed since `earlier`, `None` if `earlier` lies after `self`.
    #[inline]
    pub fn duration_since(self, earlier: SimTime) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }
}

impl std::fmt::Display for SimTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T={}", self.0)
    }
}

/// Seconds represented by one simulation tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timescale(f64);

impl Timescale {
    pub const NANOSECOND: Timescale = Timescale(1e-9);
    pub const PICOSECOND: Timescale = Timescale(1e-12);

    /// Create a timescale of `seconds` per tick.
    pub fn new(seconds: f64) -> SimResult<Self> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(SimError::InvalidTimescale(seconds));
        }
        Ok(Timescale(seconds))
    }

    pub fn seconds_per_tick(&self) -> f64 {
        self.0
    }

    /// Convert a duration in seconds into ticks.
    ///
    /// Rounds to the nearest tick. A positive duration never collapses to
    /// zero ticks; it waits at least one.
    pub fn ticks(&self, seconds: f64) -> u64 {
        if !seconds.is_finite() || seconds <= 0.0 {
            return 0;
        }
        let ticks = (seconds / self.0).round();
        if ticks < 1.0 {
            1
        } else if ticks >= u64::MAX as f64 {
            u64::MAX
        } else {
            ticks as u64
        }
    }

    /// Convert a tick count back into seconds.
    pub fn seconds(&self, time: SimTime) -> f64 {
        time.ticks() as f64 * self.0
    }

    /// Render the timescale the way value change dumps declare it, e.g. `1 ns`.
    pub fn unit_string(&self) -> SimResult<String> {
        const UNITS: [&str; 6] = ["s", "ms", "us", "ns", "ps", "fs"];
        let mut scaled = self.0;
        for unit in UNITS {
            // Tolerate the representation error of decimal fractions.
            let rounded = scaled.round();
            if rounded >= 1.0 && (scaled - rounded).abs() < 1e-6 * rounded {
                return Ok(format!("{} {}", rounded as u64, unit));
            }
            if scaled >= 1.0 {
                return Ok(format!("{} {}", scaled.trunc() as u64, unit));
            }
            scaled *= 1000.0;
        }
        Err(SimError::InvalidTimescale(self.0))
    }
}

impl Default for Timescale {
    fn default() -> Self {
        Timescale::NANOSECOND
    }
}
