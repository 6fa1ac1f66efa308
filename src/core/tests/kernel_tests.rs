// Tests for delta-cycle scheduling, assignment semantics and kernel errors

use super::{journal, start, start_with, Journal};
use crate::core::components::module::{Design, Module, Scope};
use crate::core::components::port::Port;
use crate::core::components::process::{ProcessState, Suspend};
use crate::core::error::{SimError, SimResult};
use crate::core::execution::config::SimulationConfig;
use crate::core::execution::simulator::Simulator;
use crate::core::logging::{ChangeRecord, Logger, SignalInfo, TraceLogger};
use crate::core::time::{SimTime, Timescale};
use crate::core::types::{AsSignal, ProcessId, SignalRef};
use crate::core::values::{Value, ValueKind};

#[test]
fn test_last_deferred_write_wins_with_one_notification() {
    let trace = TraceLogger::new();
    let seen: Journal<(u64, i64)> = journal();
    let mut design = Design::new("tb");
    let data = {
        let mut root = design.root();
        let data = root.signal("data", ValueKind::Int).unwrap();
        root.process_fn("first", move |ctx| {
            ctx.assign(data, 1)?;
            Ok(Suspend::Terminate)
        })
        .unwrap();

        let observed = seen.clone();
        root.process_fn("second", move |ctx| {
            ctx.assign(data, 2)?;
            // Still the old value inside the run phase.
            observed.borrow_mut().push((ctx.now().ticks(), ctx.read_int(data)?));
            Ok(Suspend::Terminate)
        })
        .unwrap();

        let observed = seen.clone();
        let mut armed = false;
        root.process_fn("reader", move |ctx| {
            if armed {
                observed.borrow_mut().push((ctx.now().ticks(), ctx.read_int(data)?));
                return Ok(Suspend::Terminate);
            }
            armed = true;
            Ok(Suspend::Wait(data.changed()))
        })
        .unwrap();
        data
    };

    let mut sim = start(design, Some(Box::new(trace.clone())));
    sim.run(0).unwrap();

    assert_eq!(sim.value(data).unwrap(), &Value::Int(2));
    assert_eq!(*seen.borrow(), vec![(0, 0), (0, 2)]);
    assert_eq!(
        trace.records(),
        vec![ChangeRecord {
            time: SimTime::ZERO,
            signal: "tb.data".to_string(),
            value: Value::Int(2),
        }]
    );
}

#[test]
fn test_waiters_resume_in_registration_order() {
    let order: Journal<&'static str> = journal();
    let mut design = Design::new("tb");
    {
        let mut root = design.root();
        let go = root.signal("go", ValueKind::Bit).unwrap();

        // Declared first, but registers its wait one tick after the others.
        let log = order.clone();
        let mut step = 0;
        root.process_fn("late", move |_ctx| {
            step += 1;
            match step {
                1 => Ok(Suspend::Delay(1)),
                2 => Ok(Suspend::Wait(go.rising())),
                _ => {
                    log.borrow_mut().push("late");
                    Ok(Suspend::Terminate)
                }
            }
        })
        .unwrap();

        for name in ["a", "b", "c"] {
            let log = order.clone();
            let mut armed = false;
            root.process_fn(name, move |_ctx| {
                if armed {
                    log.borrow_mut().push(name);
                    return Ok(Suspend::Terminate);
                }
                armed = true;
                Ok(Suspend::Wait(go.rising()))
            })
            .unwrap();
        }

        let mut step = 0;
        root.process_fn("driver", move |ctx| {
            step += 1;
            if step == 1 {
                return Ok(Suspend::Delay(5));
            }
            ctx.assign(go, true)?;
            Ok(Suspend::Terminate)
        })
        .unwrap();
    }

    let mut sim = start(design, None);
    sim.run(10).unwrap();
    assert_eq!(*order.borrow(), vec!["a", "b", "c", "late"]);
}

#[test]
fn test_time_wait_round_trip() {
    let times: Journal<u64> = journal();
    let mut design = Design::new("tb");
    {
        let mut root = design.root();
        let log = times.clone();
        let mut step = 0;
        root.process_fn("sleeper", move |ctx| {
            step += 1;
            if step == 1 {
                return Ok(Suspend::Delay(30));
            }
            log.borrow_mut().push(ctx.now().ticks());
            Ok(Suspend::Terminate)
        })
        .unwrap();
    }

    let mut sim = start(design, None);
    assert_eq!(sim.run(40), Ok(SimTime::new(40)));
    assert_eq!(*times.borrow(), vec![30]);
    assert_eq!(sim.now(), SimTime::new(40));
}

#[test]
fn test_run_end_is_inclusive() {
    let times: Journal<u64> = journal();
    let mut design = Design::new("tb");
    let sleeper = {
        let mut root = design.root();
        let log = times.clone();
        let mut step = 0;
        root.process_fn("sleeper", move |ctx| {
            step += 1;
            if step == 1 {
                return Ok(Suspend::Delay(100));
            }
            log.borrow_mut().push(ctx.now().ticks());
            Ok(Suspend::Terminate)
        })
        .unwrap()
    };

    let mut sim = start(design, None);
    sim.run(99).unwrap();
    assert!(times.borrow().is_empty());
    assert_eq!(sim.process_state(sleeper), Ok(ProcessState::Suspended));

    sim.run(1).unwrap();
    assert_eq!(*times.borrow(), vec![100]);
    assert_eq!(sim.process_state(sleeper), Ok(ProcessState::Terminated));
}

#[test]
fn test_commit_without_changes_is_silent() {
    let trace = TraceLogger::new();
    let mut design = Design::new("tb");
    {
        let mut root = design.root();
        let data = root.signal_init("data", 7i64).unwrap();
        let mut step = 0;
        root.process_fn("rewriter", move |ctx| {
            step += 1;
            match step {
                1 => ctx.assign(data, 7)?,
                2 => ctx.assign_immediate(data, 7)?,
                _ => return Ok(Suspend::Terminate),
            }
            Ok(Suspend::Delay(0))
        })
        .unwrap();
    }

    let mut sim = start(design, Some(Box::new(trace.clone())));
    sim.run(0).unwrap();
    assert!(trace.is_empty());
    assert_eq!(sim.now(), SimTime::ZERO);
    assert_eq!(sim.total_deltas(), 3);
}

#[test]
fn test_rising_edge_fires_once_per_transition() {
    let rises: Journal<u64> = journal();
    let mut design = Design::new("tb");
    {
        let mut root = design.root();
        let clk = root.signal("clk", ValueKind::Bit).unwrap();

        let mut step = 0;
        root.process_fn("driver", move |ctx| {
            step += 1;
            if step > 2 {
                return Ok(Suspend::Terminate);
            }
            // Writing 1 twice: only the first write is a transition.
            ctx.assign(clk, true)?;
            Ok(Suspend::Delay(0))
        })
        .unwrap();

        let log = rises.clone();
        let mut armed = false;
        root.process_fn("watcher", move |ctx| {
            if armed {
                log.borrow_mut().push(ctx.now().ticks());
            }
            armed = true;
            Ok(Suspend::Wait(clk.rising()))
        })
        .unwrap();
    }

    let mut sim = start(design, None);
    sim.run(50).unwrap();
    assert_eq!(*rises.borrow(), vec![0]);
}

#[test]
fn test_immediate_write_is_visible_in_the_same_delta() {
    let seen: Journal<i64> = journal();
    let trace = TraceLogger::new();
    let mut design = Design::new("tb");
    let x = {
        let mut root = design.root();
        let x = root.signal("x", ValueKind::Int).unwrap();
        let log = seen.clone();
        root.process_fn("writer", move |ctx| {
            ctx.assign(x, 5)?;
            ctx.assign_immediate(x, 9)?;
            log.borrow_mut().push(ctx.read_int(x)?);
            Ok(Suspend::Terminate)
        })
        .unwrap();
        let log = seen.clone();
        root.process_fn("reader", move |ctx| {
            log.borrow_mut().push(ctx.read_int(x)?);
            Ok(Suspend::Terminate)
        })
        .unwrap();
        x
    };

    let mut sim = start(design, Some(Box::new(trace.clone())));
    sim.run(0).unwrap();
    assert_eq!(*seen.borrow(), vec![9, 9]);
    assert_eq!(sim.value(x).unwrap(), &Value::Int(9));
    assert_eq!(trace.changes_of("tb.x"), vec![(SimTime::ZERO, Value::Int(9))]);
}

#[test]
fn test_delayed_assignments_are_inertial() {
    let trace = TraceLogger::new();
    let mut design = Design::new("tb");
    {
        let mut root = design.root();
        let plain = root.signal("plain", ValueKind::Int).unwrap();
        let rescheduled = root.signal("rescheduled", ValueKind::Int).unwrap();
        let overridden = root.signal("overridden", ValueKind::Int).unwrap();

        root.process_fn("plain_drv", move |ctx| {
            ctx.assign_after(plain, 4, 15)?;
            Ok(Suspend::Terminate)
        })
        .unwrap();

        let mut step = 0;
        root.process_fn("resched_drv", move |ctx| {
            step += 1;
            match step {
                1 => {
                    ctx.assign_after(rescheduled, 1, 50)?;
                    Ok(Suspend::Delay(10))
                }
                _ => {
                    ctx.assign_after(rescheduled, 2, 50)?;
                    Ok(Suspend::Terminate)
                }
            }
        })
        .unwrap();

        let mut step = 0;
        root.process_fn("override_drv", move |ctx| {
            step += 1;
            match step {
                1 => {
                    ctx.assign_after(overridden, 7, 20)?;
                    Ok(Suspend::Delay(5))
                }
                _ => {
                    ctx.assign(overridden, 3)?;
                    Ok(Suspend::Terminate)
                }
            }
        })
        .unwrap();
    }

    let mut sim = start(design, Some(Box::new(trace.clone())));
    sim.run(200).unwrap();
    assert_eq!(trace.changes_of("tb.plain"), vec![(SimTime::new(15), Value::Int(4))]);
    assert_eq!(trace.changes_of("tb.rescheduled"), vec![(SimTime::new(60), Value::Int(2))]);
    assert_eq!(trace.changes_of("tb.overridden"), vec![(SimTime::new(5), Value::Int(3))]);
}

#[test]
fn test_wait_any_resumes_once_and_drops_stale_waiters() {
    let wakes: Journal<u64> = journal();
    let mut design = Design::new("tb");
    {
        let mut root = design.root();
        let a = root.signal("a", ValueKind::Bit).unwrap();
        let b = root.signal("b", ValueKind::Bit).unwrap();

        let mut step = 0;
        root.process_fn("driver", move |ctx| {
            step += 1;
            match step {
                1 => Ok(Suspend::Delay(5)),
                2 => {
                    ctx.assign(b, true)?;
                    Ok(Suspend::Delay(5))
                }
                _ => {
                    ctx.assign(a, true)?;
                    Ok(Suspend::Terminate)
                }
            }
        })
        .unwrap();

        let log = wakes.clone();
        let mut step = 0;
        root.process_fn("watcher", move |ctx| {
            step += 1;
            match step {
                1 => Ok(Suspend::WaitAny(vec![a.rising(), b.rising()])),
                2 => {
                    log.borrow_mut().push(ctx.now().ticks());
                    Ok(Suspend::Delay(100))
                }
                _ => Ok(Suspend::Terminate),
            }
        })
        .unwrap();
    }

    let mut sim = start(design, None);
    sim.run(50).unwrap();
    assert_eq!(*wakes.borrow(), vec![5]);
}

#[test]
fn test_wait_for_value() {
    let hits: Journal<u64> = journal();
    let mut design = Design::new("tb");
    {
        let mut root = design.root();
        let cnt = root.signal("cnt", ValueKind::Int).unwrap();
        root.process_fn("incr", move |ctx| {
            let next = ctx.read_int(cnt)? + 1;
            ctx.assign(cnt, next)?;
            Ok(Suspend::Delay(10))
        })
        .unwrap();

        let log = hits.clone();
        let mut armed = false;
        root.process_fn("watch", move |ctx| {
            if armed {
                log.borrow_mut().push(ctx.now().ticks());
                return Ok(Suspend::Terminate);
            }
            armed = true;
            Ok(Suspend::Wait(cnt.becomes(3)))
        })
        .unwrap();
    }

    let mut sim = start(design, None);
    sim.run(100).unwrap();
    assert_eq!(*hits.borrow(), vec![20]);
}

#[test]
fn test_signal_history_queries() {
    let seen: Journal<(Value, u64, bool, bool)> = journal();
    let mut design = Design::new("tb");
    {
        let mut root = design.root();
        let sig = root.signal("sig", ValueKind::Int).unwrap();
        let mut step = 0;
        root.process_fn("driver", move |ctx| {
            step += 1;
            if step == 1 {
                return Ok(Suspend::Delay(10));
            }
            ctx.assign(sig, 1)?;
            Ok(Suspend::Terminate)
        })
        .unwrap();

        let log = seen.clone();
        let mut step = 0;
        root.process_fn("checker", move |ctx| {
            step += 1;
            if step == 1 {
                return Ok(Suspend::Until(SimTime::new(25)));
            }
            log.borrow_mut().push((
                ctx.last_value(sig)?.clone(),
                ctx.last_event(sig)?,
                ctx.stable(sig, 10)?,
                ctx.stable(sig, 20)?,
            ));
            Ok(Suspend::Terminate)
        })
        .unwrap();
    }

    let mut sim = start(design, None);
    sim.run(30).unwrap();
    assert_eq!(*seen.borrow(), vec![(Value::Int(0), 15, true, false)]);
}

#[test]
fn test_spawned_process_runs_next_delta() {
    let seen: Journal<(String, u64, u32)> = journal();
    let spawned: Journal<ProcessId> = journal();
    let duplicates: Journal<bool> = journal();
    let mut design = Design::new("tb");
    {
        let mut root = design.root();
        let log = seen.clone();
        let ids = spawned.clone();
        let dup = duplicates.clone();
        root.process_fn("parent", move |ctx| {
            let log = log.clone();
            let id = ctx.spawn_fn("worker", move |ctx| {
                log.borrow_mut().push((ctx.process_name().to_string(), ctx.now().ticks(), ctx.delta()));
                Ok(Suspend::Terminate)
            })?;
            ids.borrow_mut().push(id);
            let again = ctx.spawn_fn("worker", |_ctx| Ok(Suspend::Terminate));
            dup.borrow_mut().push(matches!(again, Err(SimError::DuplicateName { .. })));
            Ok(Suspend::Terminate)
        })
        .unwrap();
    }

    let mut sim = start(design, None);
    sim.run(0).unwrap();
    assert_eq!(*seen.borrow(), vec![("tb.worker".to_string(), 0, 1)]);
    assert_eq!(*duplicates.borrow(), vec![true]);
    let id = spawned.borrow()[0];
    assert_eq!(sim.process_state(id), Ok(ProcessState::Terminated));
}

#[test]
fn test_time_in_seconds() {
    let seen: Journal<f64> = journal();
    let mut design = Design::new("tb");
    {
        let mut root = design.root();
        let log = seen.clone();
        let mut step = 0;
        root.process_fn("timer", move |ctx| {
            step += 1;
            if step == 1 {
                return Ok(ctx.wait_for(25e-9));
            }
            log.borrow_mut().push(ctx.now_seconds());
            Ok(Suspend::Terminate)
        })
        .unwrap();
    }

    let mut sim = start(design, None);
    assert_eq!(sim.run_for(100e-9), Ok(SimTime::new(100)));
    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert!((seen[0] - 25e-9).abs() < 1e-15);
}

struct Sink {
    data: Port,
}

impl Module for Sink {
    type Ports = SignalRef;

    fn build(scope: &mut Scope<'_>, data: SignalRef) -> SimResult<Self> {
        let data = scope.input("data_i", ValueKind::Int, data)?;
        let port = data.clone();
        scope.process_fn("poke", move |ctx| {
            ctx.assign(&port, 1)?;
            Ok(Suspend::Terminate)
        })?;
        Ok(Sink { data })
    }
}

#[test]
fn test_write_through_input_port_is_illegal() {
    let mut design = Design::new("tb");
    let sink = {
        let mut root = design.root();
        let data = root.signal("data", ValueKind::Int).unwrap();
        root.instantiate::<Sink>("u_sink", data).unwrap()
    };
    assert_eq!(sink.data.path(), "tb.u_sink.data_i");

    let mut sim = start(design, None);
    assert_eq!(
        sim.run(10),
        Err(SimError::IllegalWrite {
            process: "tb.u_sink.poke".to_string(),
            signal: "tb.data".to_string(),
        })
    );
    assert!(sim.is_faulted());
    assert_eq!(sim.run(10), Err(SimError::KernelFaulted));

    sim.reset();
    assert!(!sim.is_initialized());
    assert_eq!(sim.run(10), Err(SimError::NotInitialized));
}

#[test]
fn test_edge_wait_on_real_is_a_type_mismatch() {
    let mut design = Design::new("tb");
    {
        let mut root = design.root();
        let level = root.signal("level", ValueKind::Real).unwrap();
        root.process_fn("edge", move |_ctx| Ok(Suspend::Wait(level.rising()))).unwrap();
    }

    let mut sim = start(design, None);
    match sim.run(0) {
        Err(SimError::TypeMismatch { signal, found, .. }) => {
            assert_eq!(signal, "tb.level");
            assert_eq!(found, ValueKind::Real);
        }
        other => panic!("expected a type mismatch, got {:?}", other),
    }
}

#[test]
fn test_assigning_the_wrong_kind_is_a_type_mismatch() {
    let mut design = Design::new("tb");
    {
        let mut root = design.root();
        let n = root.signal("n", ValueKind::Int).unwrap();
        root.process_fn("bad", move |ctx| {
            ctx.assign(n, true)?;
            Ok(Suspend::Terminate)
        })
        .unwrap();
    }

    let mut sim = start(design, None);
    assert_eq!(
        sim.run(0),
        Err(SimError::TypeMismatch {
            signal: "tb.n".to_string(),
            expected: "int".to_string(),
            found: ValueKind::Bit,
        })
    );
}

#[test]
fn test_oscillation_hits_the_delta_limit() {
    let mut design = Design::new("tb");
    {
        let mut root = design.root();
        let x = root.signal("x", ValueKind::Bit).unwrap();
        root.process_fn("loop", move |ctx| {
            let v = ctx.read_bit(x)?;
            ctx.assign(x, !v)?;
            Ok(Suspend::Wait(x.changed()))
        })
        .unwrap();
    }

    let mut sim = start_with(design, None, SimulationConfig::new().with_max_deltas(50));
    assert_eq!(
        sim.run(10),
        Err(SimError::DeltaLimitExceeded { time: SimTime::ZERO, limit: 50 })
    );
    assert!(sim.is_faulted());
}

#[test]
fn test_wait_until_the_past_is_rejected() {
    let mut design = Design::new("tb");
    {
        let mut root = design.root();
        let mut step = 0;
        root.process_fn("rewind", move |_ctx| {
            step += 1;
            if step == 1 {
                return Ok(Suspend::Delay(10));
            }
            Ok(Suspend::Until(SimTime::new(5)))
        })
        .unwrap();
    }

    let mut sim = start(design, None);
    assert_eq!(
        sim.run(20),
        Err(SimError::SchedulingInvariantViolation {
            requested: SimTime::new(5),
            now: SimTime::new(10),
        })
    );
}

#[test]
fn test_process_failure_aborts_the_run() {
    let mut design = Design::new("tb");
    {
        let mut root = design.root();
        root.process_fn("broken", |ctx| {
            Err(SimError::Process {
                process: ctx.process_name().to_string(),
                message: "bad state".to_string(),
            })
        })
        .unwrap();
    }

    let mut sim = start(design, None);
    assert_eq!(
        sim.run(1),
        Err(SimError::Process {
            process: "tb.broken".to_string(),
            message: "bad state".to_string(),
        })
    );
    assert!(sim.is_faulted());
}

#[test]
fn test_initialize_lifecycle() {
    let mut sim = Simulator::new();
    assert_eq!(sim.run(10), Err(SimError::NotInitialized));
    assert_eq!(sim.now(), SimTime::ZERO);

    sim.initialize(Design::new("tb"), Timescale::NANOSECOND, None).unwrap();
    assert_eq!(
        sim.initialize(Design::new("tb"), Timescale::NANOSECOND, None),
        Err(SimError::AlreadyInitialized)
    );

    sim.run(10).unwrap();
    sim.reset();
    sim.initialize(Design::new("tb"), Timescale::NANOSECOND, None).unwrap();
    assert_eq!(sim.now(), SimTime::ZERO);
}

struct FailingFlush;

impl Logger for FailingFlush {
    fn on_signal_change(&mut self, _signal: &SignalInfo, _time: SimTime, _value: &Value) {}

    fn flush(&mut self, _time: SimTime) -> SimResult<()> {
        Err(SimError::Logger("disk full".to_string()))
    }
}

#[test]
fn test_logger_failure_is_not_fatal() {
    let mut sim = start(Design::new("tb"), Some(Box::new(FailingFlush)));
    assert_eq!(sim.run(10), Err(SimError::Logger("disk full".to_string())));
    assert!(!sim.is_faulted());
    assert!(sim.run(10).is_err());
    assert_eq!(sim.now(), SimTime::new(20));
}

#[test]
fn test_wait_any_keeps_waiter_lists_bounded() {
    let wakes: Journal<u64> = journal();
    let mut design = Design::new("tb");
    let (clk, rst) = {
        let mut root = design.root();
        let clk = root.signal("clk", ValueKind::Bit).unwrap();
        let rst = root.signal("rst", ValueKind::Bit).unwrap();
        root.process_fn("clk_gen", move |ctx| {
            let level = ctx.read_bit(clk)?;
            ctx.assign(clk, !level)?;
            Ok(Suspend::Delay(1))
        })
        .unwrap();

        let log = wakes.clone();
        let mut armed = false;
        root.process_fn("flop", move |ctx| {
            if armed {
                log.borrow_mut().push(ctx.now().ticks());
            }
            armed = true;
            Ok(Suspend::WaitAny(vec![clk.rising(), rst.rising()]))
        })
        .unwrap();
        (clk, rst)
    };

    let mut sim = start(design, None);
    sim.run(20_000).unwrap();
    // Rising edges at 0, 2, ..., 20000.
    assert_eq!(wakes.borrow().len(), 10_001);

    let kernel = sim.kernel().unwrap();
    assert_eq!(kernel.signal(rst).unwrap().waiter_count(), 1);
    assert_eq!(kernel.signal(clk).unwrap().waiter_count(), 1);
}

#[test]
fn test_rewriting_nan_is_not_reported() {
    let wakes: Journal<u64> = journal();
    let mut design = Design::new("tb");
    {
        let mut root = design.root();
        let r = root.signal_init("r", f64::NAN).unwrap();
        let mut writes = 0;
        root.process_fn("writer", move |ctx| {
            writes += 1;
            ctx.assign(r, f64::NAN)?;
            if writes == 3 {
                Ok(Suspend::Terminate)
            } else {
                Ok(Suspend::Delay(1))
            }
        })
        .unwrap();

        let log = wakes.clone();
        root.process_fn("watcher", move |ctx| {
            log.borrow_mut().push(ctx.now().ticks());
            ctx.assign(r, f64::NAN)?;
            Ok(Suspend::Wait(r.changed()))
        })
        .unwrap();
    }

    let trace = TraceLogger::new();
    let mut sim = start_with(
        design,
        Some(Box::new(trace.clone())),
        SimulationConfig::new().with_max_deltas(50),
    );
    sim.run(10).unwrap();
    assert!(trace.is_empty());
    assert_eq!(*wakes.borrow(), vec![0]);
}

#[test]
fn test_handle_from_another_design_is_rejected() {
    let mut other = Design::new("other");
    let foreign = other.root().signal("x", ValueKind::Int).unwrap();

    let mut design = Design::new("tb");
    {
        let mut root = design.root();
        root.signal("y", ValueKind::Int).unwrap();
        assert_eq!(
            root.input("x_i", ValueKind::Int, foreign).err(),
            Some(SimError::UnknownSignal(foreign.id()))
        );
        root.process_fn("reader", move |ctx| {
            ctx.read_int(foreign)?;
            Ok(Suspend::Terminate)
        })
        .unwrap();
    }

    let mut sim = start(design, None);
    assert_eq!(sim.value(foreign), Err(SimError::UnknownSignal(foreign.id())));
    assert_eq!(sim.run(10), Err(SimError::UnknownSignal(foreign.id())));
    assert!(sim.is_faulted());
}
