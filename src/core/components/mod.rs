pub mod module;
pub mod port;
pub mod process;
pub mod signal;

// Re-export commonly used types
pub use module::{Design, Module, Scope};
pub use port::{Port, PortDirection};
pub use process::{Process, ProcessState, Suspend};
pub use signal::SignalState;
