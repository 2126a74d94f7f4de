//! The engine that runs a state graph.
//!
//! A [`Machine`] owns the live configuration: one instance per active
//! state, arranged as a tree of regions. Events are processed to
//! completion one at a time; events raised meanwhile wait in a FIFO queue.

mod config;
mod error;
mod executor;
mod instance;
mod machine;
mod queue;
mod resolver;
mod scope;

pub use config::{MachineConfig, NotRunningPolicy};
pub use error::{MachineError, Phase};
pub use machine::{CatchHandler, Machine, MachineStatus};
pub use scope::Scope;

#[cfg(test)]
pub(crate) use scope::testing;
