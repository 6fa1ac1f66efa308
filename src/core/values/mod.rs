pub mod condition;
pub mod value;

// Re-export all public types
pub use condition::{Condition, Edge, Trigger};
pub use value::{Value, ValueKind};
