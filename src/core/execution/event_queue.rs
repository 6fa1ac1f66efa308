use crate::core::time::SimTime;
use crate::core::types::{ProcessId, SignalId};
use crate::core::values::Value;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// What a scheduled event does when dispatched.
#[derive(Debug, Clone, PartialEq)]
pub enum EventTarget {
    /// Resume a process, provided it is still in the suspension `token`
    /// names.
    Resume { process: ProcessId, token: u64 },
    /// Stage a delayed assignment, provided no newer assignment to the
    /// signal superseded it.
    Update { signal: SignalId, value: Value, generation: u64 },
}

#[derive(Debug)]
pub struct ScheduledEvent {
    pub time: SimTime,
    pub delta: u32,
    pub sequence_num: u64,
    pub target: EventTarget,
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.delta == other.delta && self.sequence_num == other.sequence_num
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.delta.cmp(&self.delta))
            .then_with(|| other.sequence_num.cmp(&self.sequence_num))
    }
}

/// Time-ordered queue of pending events.
///
/// Events leave in `(time, delta, insertion)` order, so identical programs
/// always dispatch identically.
#[derive(Debug, Default)]
pub struct EventQueue {
    event_queue: BinaryHeap<ScheduledEvent>,
    sequence_counter: u64,
}

impl EventQueue {
    /// Create a new EventQueue
    pub fn new() -> Self {
        Self {
            event_queue: BinaryHeap::new(),
            sequence_counter: 0,
        }
    }

    /// Insert an event; returns its sequence number.
    ///
    /// The queue does not know the current time. Rejecting events in the
    /// past is the kernel's job.
    pub fn schedule(&mut self, time: SimTime, delta: u32, target: EventTarget) -> u64 {
        let sequence_num = self.sequence_counter;
        self.event_queue.push(ScheduledEvent {
            time,
            delta,
            sequence_num,
            target,
        });
        self.sequence_counter += 1;
        sequence_num
    }

    /// Remove and return the earliest event.
    pub fn pop_earliest(&mut self) -> Option<ScheduledEvent> {
        self.event_queue.pop()
    }

    /// `(time, delta)` of the earliest event without removing it.
    pub fn peek_earliest(&self) -> Option<(SimTime, u32)> {
        self.event_queue.peek().map(|event| (event.time, event.delta))
    }

    /// Remove every event scheduled for exactly `(time, delta)`, in
    /// insertion order.
    pub fn pop_due(&mut self, time: SimTime, delta: u32) -> Vec<ScheduledEvent> {
        let mut events = Vec::new();
        while let Some(next) = self.event_queue.peek() {
            if next.time != time || next.delta != delta {
                break;
            }
            if let Some(event) = self.event_queue.pop() {
                events.push(event);
            }
        }
        events
    }

    pub fn is_empty(&self) -> bool {
        self.event_queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.event_queue.len()
    }
}
