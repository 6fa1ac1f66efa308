use log::info;

use super::{Logger, SignalInfo};
use crate::core::time::SimTime;
use crate::core::values::Value;

/// Forwards every committed change to the `log` facade.
#[derive(Debug, Clone, Default)]
pub struct LogLogger;

impl Logger for LogLogger {
    fn on_signal_change(&mut self, signal: &SignalInfo, time: SimTime, value: &Value) {
        info!(target: "sigsim::trace", "{} {} = {}", time, signal.path, value);
    }
}
