// Kernel scenario tests
mod kernel_tests;

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::components::module::Design;
use crate::core::execution::config::SimulationConfig;
use crate::core::execution::simulator::Simulator;
use crate::core::logging::Logger;
use crate::core::time::Timescale;

/// Shared log of observations made by process bodies.
pub(crate) type Journal<T> = Rc<RefCell<Vec<T>>>;

pub(crate) fn journal<T>() -> Journal<T> {
    Rc::new(RefCell::new(Vec::new()))
}

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn start(design: Design, logger: Option<Box<dyn Logger>>) -> Simulator {
    start_with(design, logger, SimulationConfig::default())
}

pub(crate) fn start_with(
    design: Design,
    logger: Option<Box<dyn Logger>>,
    config: SimulationConfig,
) -> Simulator {
    init_logging();
    let mut sim = Simulator::with_config(config);
    sim.initialize(design, Timescale::NANOSECOND, logger).unwrap();
    sim
}
