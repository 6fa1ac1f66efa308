//! The delta-cycle scheduler.
//!
//! Each instant is processed in delta cycles: a run phase resumes every
//! process due in the current delta, then a commit phase moves pending
//! values into place, reports changes to the logger and wakes satisfied
//! waiters into the next delta. Time advances only once an instant is
//! quiescent.

use std::collections::{BTreeSet, HashSet};

use log::{debug, info, trace, warn};

use crate::core::components::module::Design;
use crate::core::components::process::{Process, ProcessState, Suspend};
use crate::core::components::signal::{SignalState, Waiter};
use crate::core::error::{SimError, SimResult};
use crate::core::execution::config::SimulationConfig;
use crate::core::execution::context::ProcessContext;
use crate::core::execution::event_queue::{EventQueue, EventTarget};
use crate::core::logging::{Logger, SignalInfo};
use crate::core::time::{SimTime, Timescale};
use crate::core::types::{DesignId, ModuleId, ProcessId, SignalId, SignalRef};
use crate::core::values::{Trigger, Value};

/// How a write reaches the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Assignment {
    Immediate,
    Deferred,
    After(u64),
}

struct ProcessSlot {
    path: String,
    module: ModuleId,
    /// Taken out while the process runs.
    body: Option<Box<dyn Process>>,
    state: ProcessState,
    /// Bumped on every suspension; events and waiters carrying an older
    /// token are stale.
    token: u64,
    /// Signals holding a waiter for the current suspension.
    watching: Vec<SignalId>,
}

pub struct Kernel {
    design: DesignId,
    now: SimTime,
    delta: u32,
    timescale: Timescale,
    config: SimulationConfig,
    queue: EventQueue,
    signals: Vec<SignalState>,
    infos: Vec<SignalInfo>,
    processes: Vec<ProcessSlot>,
    /// Per module: signals its processes may drive.
    drivable: Vec<HashSet<SignalId>>,
    module_paths: Vec<String>,
    /// Signals written since the last commit, in declaration order.
    dirty: BTreeSet<SignalId>,
    logger: Option<Box<dyn Logger>>,
    waiter_seq: u64,
    total_deltas: u64,
}

impl Kernel {
    /// Take ownership of an elaborated design and make every process
    /// runnable at time zero, in registration order.
    pub fn new(
        design: Design,
        timescale: Timescale,
        config: SimulationConfig,
        mut logger: Option<Box<dyn Logger>>,
    ) -> SimResult<Self> {
        let design_id = design.id;
        let drivable = (0..design.modules.len())
            .map(|index| design.drivable_signals(ModuleId(index)))
            .collect();
        let module_paths = design.modules.iter().map(|m| m.path.clone()).collect();

        let mut signals = Vec::with_capacity(design.signals.len());
        let mut infos = Vec::with_capacity(design.signals.len());
        for (index, decl) in design.signals.into_iter().enumerate() {
            infos.push(SignalInfo {
                id: SignalId(index),
                path: decl.path.clone(),
                scope: decl.scope,
                name: decl.name,
                kind: decl.initial.kind(),
                initial: decl.initial.clone(),
            });
            signals.push(SignalState::new(decl.path, decl.owner, decl.initial));
        }

        if let Some(logger) = logger.as_mut() {
            logger.register(&infos, timescale)?;
        }

        let mut queue = EventQueue::new();
        let processes: Vec<ProcessSlot> = design
            .processes
            .into_iter()
            .enumerate()
            .map(|(index, decl)| {
                queue.schedule(
                    SimTime::ZERO,
                    0,
                    EventTarget::Resume { process: ProcessId(index), token: 0 },
                );
                ProcessSlot {
                    path: decl.path,
                    module: decl.module,
                    body: Some(decl.body),
                    state: ProcessState::Runnable,
                    token: 0,
                    watching: Vec::new(),
                }
            })
            .collect();

        info!(
            "Kernel initialized: {} signals, {} processes, timescale {} s/tick",
            signals.len(),
            processes.len(),
            timescale.seconds_per_tick()
        );

        Ok(Self {
            design: design_id,
            now: SimTime::ZERO,
            delta: 0,
            timescale,
            config,
            queue,
            signals,
            infos,
            processes,
            drivable,
            module_paths,
            dirty: BTreeSet::new(),
            logger,
            waiter_seq: 0,
            total_deltas: 0,
        })
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn delta(&self) -> u32 {
        self.delta
    }

    pub fn timescale(&self) -> Timescale {
        self.timescale
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Delta cycles executed since initialization.
    pub fn total_deltas(&self) -> u64 {
        self.total_deltas
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn signal(&self, signal: SignalRef) -> Option<&SignalState> {
        self.signal_state(signal).ok()
    }

    pub fn signals(&self) -> &[SignalInfo] {
        &self.infos
    }

    pub fn process_state(&self, process: ProcessId) -> Option<ProcessState> {
        self.processes.get(process.index()).map(|slot| slot.state)
    }

    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    /// Resolve a handle, rejecting handles declared in another design.
    pub(crate) fn signal_state(&self, signal: SignalRef) -> SimResult<&SignalState> {
        if signal.design() != self.design {
            return Err(SimError::UnknownSignal(signal.id()));
        }
        self.signals
            .get(signal.id().index())
            .ok_or(SimError::UnknownSignal(signal.id()))
    }

    pub(crate) fn process_path(&self, process: ProcessId) -> &str {
        self.processes
            .get(process.index())
            .map(|slot| slot.path.as_str())
            .unwrap_or("")
    }

    /// Advance simulated time by `duration` ticks.
    ///
    /// Every event up to and including the end instant is processed, then
    /// `now` is set to the end of the run.
    pub fn run(&mut self, duration: u64) -> SimResult<SimTime> {
        let end = self.now.checked_add(duration).unwrap_or(SimTime::new(u64::MAX));
        debug!("Running from {} to {}", self.now, end);

        while let Some((time, delta)) = self.queue.peek_earliest() {
            if time > end {
                break;
            }
            if time < self.now {
                return Err(SimError::SchedulingInvariantViolation { requested: time, now: self.now });
            }
            if time > self.now {
                self.now = time;
                debug!("=== Simulation Time {} ===", self.now);
            }
            if delta >= self.config.max_deltas {
                return Err(SimError::DeltaLimitExceeded { time, limit: self.config.max_deltas });
            }
            self.delta = delta;
            self.run_delta()?;
        }

        self.now = end;
        self.delta = 0;
        if self.config.flush_after_run {
            self.flush()?;
        }
        Ok(self.now)
    }

    pub fn flush(&mut self) -> SimResult<()> {
        match self.logger.as_mut() {
            Some(logger) => logger.flush(self.now),
            None => Ok(()),
        }
    }

    /// One delta cycle: run phase, then commit phase.
    fn run_delta(&mut self) -> SimResult<()> {
        let due = self.queue.pop_due(self.now, self.delta);
        trace!("{} delta {}: {} events", self.now, self.delta, due.len());
        self.total_deltas += 1;

        for event in due {
            match event.target {
                EventTarget::Resume { process, token } => self.resume_process(process, token)?,
                EventTarget::Update { signal, value, generation } => {
                    let state = self.signal_mut(signal)?;
                    if state.apply_scheduled(value, generation) {
                        self.dirty.insert(signal);
                    } else {
                        trace!("Delayed update of {} superseded", self.infos[signal.index()].path);
                    }
                }
            }
        }

        self.commit()
    }

    fn resume_process(&mut self, process: ProcessId, token: u64) -> SimResult<()> {
        let slot = self
            .processes
            .get_mut(process.index())
            .ok_or(SimError::UnknownProcess(process))?;
        if slot.token != token || slot.state == ProcessState::Terminated {
            return Ok(());
        }
        let Some(mut body) = slot.body.take() else {
            return Ok(());
        };
        slot.state = ProcessState::Runnable;
        trace!("Resuming {} at {} delta {}", slot.path, self.now, self.delta);

        let result = {
            let mut ctx = ProcessContext::new(self, process);
            body.resume(&mut ctx)
        };
        self.processes[process.index()].body = Some(body);

        let request = result?;
        self.suspend(process, request)
    }

    fn suspend(&mut self, process: ProcessId, request: Suspend) -> SimResult<()> {
        self.drop_waiters(process);
        let now = self.now;
        let next_delta = self.delta + 1;
        let slot = &mut self.processes[process.index()];
        slot.token += 1;
        let token = slot.token;
        let resume = EventTarget::Resume { process, token };

        match request {
            Suspend::Terminate => {
                slot.state = ProcessState::Terminated;
                slot.body = None;
                debug!("Process {} terminated at {}", slot.path, now);
                Ok(())
            }
            Suspend::Delay(0) => {
                slot.state = ProcessState::Suspended;
                self.schedule(now, next_delta, resume)
            }
            Suspend::Delay(ticks) => {
                slot.state = ProcessState::Suspended;
                match now.checked_add(ticks) {
                    Some(time) => self.schedule(time, 0, resume),
                    None => {
                        warn!("Process {} waits past the end of time and will not resume", slot.path);
                        Ok(())
                    }
                }
            }
            Suspend::Until(time) if time < now => {
                Err(SimError::SchedulingInvariantViolation { requested: time, now })
            }
            Suspend::Until(time) => {
                slot.state = ProcessState::Suspended;
                if time == now {
                    self.schedule(now, next_delta, resume)
                } else {
                    self.schedule(time, 0, resume)
                }
            }
            Suspend::Wait(trigger) => {
                slot.state = ProcessState::Suspended;
                self.register_waiters(process, token, vec![trigger])
            }
            Suspend::WaitAny(triggers) => {
                slot.state = ProcessState::Suspended;
                if triggers.is_empty() {
                    warn!("Process {} waits on no signal and will not resume", slot.path);
                }
                self.register_waiters(process, token, triggers)
            }
        }
    }

    /// Remove every waiter left behind by the process's previous suspension.
    fn drop_waiters(&mut self, process: ProcessId) {
        let watching = std::mem::take(&mut self.processes[process.index()].watching);
        for id in watching {
            self.signals[id.index()].waiters.retain(|waiter| waiter.process != process);
        }
    }

    fn register_waiters(&mut self, process: ProcessId, token: u64, triggers: Vec<Trigger>) -> SimResult<()> {
        for trigger in &triggers {
            let state = self.signal_state(trigger.signal)?;
            if let Err(expected) = trigger.condition.check_kind(state.kind) {
                return Err(SimError::TypeMismatch {
                    signal: state.path.clone(),
                    expected,
                    found: state.kind,
                });
            }
        }
        for trigger in triggers {
            let id = trigger.signal.id();
            let seq = self.waiter_seq;
            self.waiter_seq += 1;
            self.signals[id.index()].waiters.push(Waiter {
                process,
                condition: trigger.condition,
                token,
                seq,
            });
            let watching = &mut self.processes[process.index()].watching;
            if !watching.contains(&id) {
                watching.push(id);
            }
        }
        Ok(())
    }

    /// Insert an event, rejecting anything before the current instant.
    fn schedule(&mut self, time: SimTime, delta: u32, target: EventTarget) -> SimResult<()> {
        if time < self.now {
            return Err(SimError::SchedulingInvariantViolation { requested: time, now: self.now });
        }
        self.queue.schedule(time, delta, target);
        Ok(())
    }

    fn signal_mut(&mut self, id: SignalId) -> SimResult<&mut SignalState> {
        self.signals.get_mut(id.index()).ok_or(SimError::UnknownSignal(id))
    }

    /// Commit phase: apply pending values, notify the logger in
    /// declaration order and wake satisfied waiters into the next delta.
    fn commit(&mut self) -> SimResult<()> {
        let dirty = std::mem::take(&mut self.dirty);
        let mut woken: Vec<Waiter> = Vec::new();
        let mut changes = 0usize;

        for id in dirty {
            let state = &mut self.signals[id.index()];
            let Some(change) = state.commit(self.now) else {
                continue;
            };
            changes += 1;
            trace!("{} {} -> {}", state.path, change.previous, state.current);
            if let Some(logger) = self.logger.as_mut() {
                logger.on_signal_change(&self.infos[id.index()], self.now, &state.current);
            }

            let waiters = std::mem::take(&mut state.waiters);
            for waiter in waiters {
                let slot = &self.processes[waiter.process.index()];
                if slot.token != waiter.token || slot.state != ProcessState::Suspended {
                    continue;
                }
                if waiter.condition.satisfied(&change.previous, &state.current) {
                    woken.push(waiter);
                } else {
                    state.waiters.push(waiter);
                }
            }
        }

        woken.sort_by_key(|waiter| waiter.seq);
        let next_delta = self.delta + 1;
        for waiter in woken {
            let slot = &mut self.processes[waiter.process.index()];
            // Already woken through another trigger of the same WaitAny.
            if slot.state != ProcessState::Suspended {
                continue;
            }
            slot.state = ProcessState::Runnable;
            self.queue.schedule(
                self.now,
                next_delta,
                EventTarget::Resume { process: waiter.process, token: waiter.token },
            );
        }

        if changes > 0 {
            trace!("{} delta {}: committed {} changes", self.now, self.delta, changes);
        }
        Ok(())
    }

    pub(crate) fn write(
        &mut self,
        process: ProcessId,
        signal: SignalRef,
        value: Value,
        assignment: Assignment,
    ) -> SimResult<()> {
        let id = signal.id();
        let state = self.signal_state(signal)?;
        if value.kind() != state.kind {
            return Err(SimError::TypeMismatch {
                signal: state.path.clone(),
                expected: state.kind.to_string(),
                found: value.kind(),
            });
        }
        let slot = self
            .processes
            .get(process.index())
            .ok_or(SimError::UnknownProcess(process))?;
        if !self.drivable[slot.module.0].contains(&id) {
            return Err(SimError::IllegalWrite {
                process: slot.path.clone(),
                signal: state.path.clone(),
            });
        }

        let now = self.now;
        let state = &mut self.signals[id.index()];
        match assignment {
            Assignment::Immediate => {
                state.assign_immediate(value);
                self.dirty.insert(id);
            }
            Assignment::Deferred | Assignment::After(0) => {
                state.assign_deferred(value);
                self.dirty.insert(id);
            }
            Assignment::After(delay) => {
                let generation = state.schedule_delayed();
                match now.checked_add(delay) {
                    Some(time) => {
                        self.queue.schedule(time, 0, EventTarget::Update { signal: id, value, generation });
                    }
                    None => warn!("Assignment to {} lies past the end of time and is dropped", state.path),
                }
            }
        }
        Ok(())
    }

    pub(crate) fn spawn(&mut self, parent: ProcessId, name: &str, body: Box<dyn Process>) -> SimResult<ProcessId> {
        let module = self
            .processes
            .get(parent.index())
            .map(|slot| slot.module)
            .ok_or(SimError::UnknownProcess(parent))?;
        let scope = &self.module_paths[module.0];
        let path = format!("{}.{}", scope, name);
        if self.processes.iter().any(|slot| slot.path == path) {
            return Err(SimError::DuplicateName { scope: scope.clone(), name: name.to_string() });
        }

        let id = ProcessId(self.processes.len());
        debug!("Spawned process {} at {}", path, self.now);
        self.processes.push(ProcessSlot {
            path,
            module,
            body: Some(body),
            state: ProcessState::Runnable,
            token: 0,
            watching: Vec::new(),
        });
        self.queue.schedule(self.now, self.delta + 1, EventTarget::Resume { process: id, token: 0 });
        Ok(id)
    }
}
