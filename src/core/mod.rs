//! Immutable description of a state machine.
//!
//! This module holds everything the engine consumes but never mutates:
//! - Events and the matchers rows use to accept them
//! - Guards and actions supplied by the embedder
//! - State descriptors, behavior templates and transition tables
//! - The state graph arena tying them together
//! - The transition history record type

mod action;
mod descriptor;
mod event;
mod graph;
mod guard;
mod history;
mod table;

pub use action::{action, Action, ActionError};
pub use descriptor::{Behavior, Binding, ContextFactory, StateDescriptor, StateId};
pub use event::{Event, EventMatcher};
pub use graph::StateGraph;
pub use guard::Guard;
pub use history::{StateHistory, TransitionRecord};
pub use table::{Row, Source, Target, TransitionTable};
