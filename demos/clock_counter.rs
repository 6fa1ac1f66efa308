use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sigsim::{
    AsSignal, Design, Module, Port, Process, ProcessContext, Scope, SignalRef, SimResult,
    SimulationConfig, Simulator, Suspend, Timescale, Value, ValueKind, VcdLogger,
};

/// Configuration for the clock/counter testbench
#[derive(Debug, Clone)]
pub struct TestbenchConfig {
    // Timing (ticks of 1 ns)
    pub clock_half_period: u64,
    pub run_length: u64,

    // Stimulus
    pub max_stimulus_gap: u64,
    pub random_seed: u64,

    pub vcd_path: String,
}

impl Default for TestbenchConfig {
    fn default() -> Self {
        Self {
            clock_half_period: 10,
            run_length: 500,
            max_stimulus_gap: 35,
            random_seed: 42,
            vcd_path: "clock_counter.vcd".to_string(),
        }
    }
}

struct Clock;

impl Module for Clock {
    type Ports = (SignalRef, u64);

    fn build(scope: &mut Scope<'_>, (clk, half_period): (SignalRef, u64)) -> SimResult<Self> {
        let clk = scope.output("clk_o", ValueKind::Bit, clk)?;
        let mut started = false;
        scope.process_fn("gen", move |ctx| {
            if started {
                let level = ctx.read_bit(&clk)?;
                ctx.assign(&clk, !level)?;
            }
            started = true;
            Ok(Suspend::Delay(half_period))
        })?;
        Ok(Clock)
    }
}

enum CounterState {
    Idle,
    Counting,
}

/// Counts rising clock edges while `enable_i` is high; clears on `clear_i`.
struct CounterProcess {
    clk: Port,
    enable: Port,
    clear: Port,
    cnt: Port,
    state: CounterState,
}

impl Process for CounterProcess {
    fn resume(&mut self, ctx: &mut ProcessContext<'_>) -> SimResult<Suspend> {
        if let CounterState::Counting = self.state {
            if ctx.read_bit(&self.clear)? {
                ctx.assign(&self.cnt, 0)?;
            } else if ctx.read_bit(&self.enable)? {
                let next = ctx.read_int(&self.cnt)? + 1;
                ctx.assign(&self.cnt, next)?;
            }
        }
        self.state = CounterState::Counting;
        Ok(Suspend::Wait(self.clk.rising()))
    }
}

struct CounterPorts {
    clk: SignalRef,
    enable: SignalRef,
    clear: SignalRef,
    cnt: SignalRef,
}

struct Counter;

impl Module for Counter {
    type Ports = CounterPorts;

    fn build(scope: &mut Scope<'_>, ports: CounterPorts) -> SimResult<Self> {
        let process = CounterProcess {
            clk: scope.input("clk_i", ValueKind::Bit, ports.clk)?,
            enable: scope.input("enable_i", ValueKind::Bit, ports.enable)?,
            clear: scope.input("clear_i", ValueKind::Bit, ports.clear)?,
            cnt: scope.output("cnt_o", ValueKind::Int, ports.cnt)?,
            state: CounterState::Idle,
        };
        scope.process("count", process)?;
        Ok(Counter)
    }
}

/// Latches the low byte of the counter into an 8-bit register on every
/// rising edge.
struct ByteRegister;

impl Module for ByteRegister {
    type Ports = (SignalRef, SignalRef, SignalRef);

    fn build(scope: &mut Scope<'_>, (clk, d, q): (SignalRef, SignalRef, SignalRef)) -> SimResult<Self> {
        let clk = scope.input("clk_i", ValueKind::Bit, clk)?;
        let d = scope.input("d_i", ValueKind::Int, d)?;
        let q = scope.output("q_o", ValueKind::Vector(8), q)?;
        let mut armed = false;
        scope.process_fn("latch", move |ctx| {
            if armed {
                let byte = ctx.read_int(&d)? as u64;
                ctx.assign(&q, Value::vector(8, byte))?;
            }
            armed = true;
            Ok(Suspend::Wait(clk.rising()))
        })?;
        Ok(ByteRegister)
    }
}

struct Testbench {
    cnt: SignalRef,
    byte: SignalRef,
}

impl Module for Testbench {
    type Ports = TestbenchConfig;

    fn build(scope: &mut Scope<'_>, config: TestbenchConfig) -> SimResult<Self> {
        let clk = scope.signal("clk", ValueKind::Bit)?;
        let enable = scope.signal_init("enable", true)?;
        let clear = scope.signal("clear", ValueKind::Bit)?;
        let cnt = scope.signal("cnt", ValueKind::Int)?;
        let byte = scope.signal("byte", ValueKind::Vector(8))?;

        scope.instantiate::<Clock>("i_clk", (clk, config.clock_half_period))?;
        scope.instantiate::<Counter>("i_cnt", CounterPorts { clk, enable, clear, cnt })?;
        scope.instantiate::<ByteRegister>("i_reg", (clk, cnt, byte))?;

        // Random enable/clear pulses, reproducible through the seed.
        let mut rng = StdRng::seed_from_u64(config.random_seed);
        let max_gap = config.max_stimulus_gap.max(1);
        scope.process_fn("stimulus", move |ctx| {
            let roll: u8 = rng.gen_range(0..10);
            ctx.assign(enable, roll < 8)?;
            ctx.assign(clear, roll == 0)?;
            Ok(Suspend::Delay(rng.gen_range(1..=max_gap)))
        })?;

        Ok(Testbench { cnt, byte })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .init();

    let config = TestbenchConfig::default();
    println!("Starting clock/counter simulation");
    println!("  Clock half period: {} ns", config.clock_half_period);
    println!("  Run length: {} ns", config.run_length);
    println!("  Random seed: {}", config.random_seed);
    println!();

    let vcd_path = config.vcd_path.clone();
    let run_length = config.run_length;
    let (design, tb) = Design::elaborate::<Testbench>("tb", config)?;
    println!(
        "Elaborated {} modules, {} signals, {} processes",
        design.module_count(),
        design.signal_count(),
        design.process_count()
    );

    let mut sim = Simulator::with_config(SimulationConfig::new().with_max_deltas(1_000));
    sim.initialize(
        design,
        Timescale::NANOSECOND,
        Some(Box::new(VcdLogger::create(&vcd_path)?)),
    )?;
    let end = sim.run(run_length)?;

    println!();
    println!("Simulation finished at {} after {} delta cycles", end, sim.total_deltas());
    println!("  cnt  = {}", sim.value(tb.cnt)?);
    println!("  byte = {}", sim.value(tb.byte)?);
    println!("Waveform written to {}", vcd_path);
    Ok(())
}
