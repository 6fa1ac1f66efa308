pub mod components;
pub mod error;
pub mod execution;
pub mod logging;
pub mod time;
pub mod types;
pub mod values;

#[cfg(test)]
mod tests;
