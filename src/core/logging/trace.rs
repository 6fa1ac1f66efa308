use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::{Logger, SignalInfo};
use crate::core::time::SimTime;
use crate::core::values::Value;

/// One committed change as seen by a logger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub time: SimTime,
    pub signal: String,
    pub value: Value,
}

/// In-memory logger.
///
/// Clones share the same record buffer, so a handle kept by the caller
/// observes what the copy owned by the simulator recorded.
#[derive(Debug, Clone, Default)]
pub struct TraceLogger {
    records: Rc<RefCell<Vec<ChangeRecord>>>,
}

impl TraceLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records so far.
    pub fn records(&self) -> Vec<ChangeRecord> {
        self.records.borrow().clone()
    }

    /// Records of one signal, by hierarchical name.
    pub fn changes_of(&self, signal: &str) -> Vec<(SimTime, Value)> {
        self.records
            .borrow()
            .iter()
            .filter(|r| r.signal == signal)
            .map(|r| (r.time, r.value.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.records.borrow_mut().clear();
    }
}

impl Logger for TraceLogger {
    fn on_signal_change(&mut self, signal: &SignalInfo, time: SimTime, value: &Value) {
        self.records.borrow_mut().push(ChangeRecord {
            time,
            signal: signal.path.clone(),
            value: value.clone(),
        });
    }
}
