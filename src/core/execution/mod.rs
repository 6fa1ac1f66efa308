pub mod config;
pub mod context;
pub mod event_queue;
pub mod kernel;
pub mod simulator;

// Re-export commonly used types
pub use config::SimulationConfig;
pub use context::ProcessContext;
pub use event_queue::{EventQueue, EventTarget, ScheduledEvent};
pub use kernel::Kernel;
pub use simulator::Simulator;
