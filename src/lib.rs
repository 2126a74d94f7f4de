//! hfsm: a hierarchical state machine engine
//!
//! A machine is described once, as data, and then driven by events. The
//! description is a graph of states; each region of the machine (the root
//! regions and the regions of every composite state) is a transition table
//! of rows `source --event [guard] / action--> target`.
//!
//! # Core Concepts
//!
//! - **Events**: values implementing `Event`, matched by their kind tag
//! - **States**: descriptors with entry, exit and internal bindings, an
//!   optional local context and optional child regions
//! - **Rows**: ordinary, wildcard (`AllStates`), internal, eventless and
//!   catch transitions
//! - **Machine**: run-to-completion processing with an event queue,
//!   orthogonal regions and failure recovery
//!
//! # Example
//!
//! ```rust
//! use hfsm::{event_enum, Machine, Row, StateDescriptor, StateGraph, TransitionTable};
//!
//! event_enum! {
//!     pub enum Button: ButtonKind {
//!         Press,
//!     }
//! }
//!
//! let mut graph: StateGraph<Button, u32> = StateGraph::new();
//! let off = graph.add_state(StateDescriptor::new("off"));
//! let on = graph.add_state(StateDescriptor::<Button, u32>::new("on").on_entry(|scope| {
//!     *scope.context_mut() += 1;
//!     Ok(())
//! }));
//! graph.add_root_region(
//!     TransitionTable::new("power")
//!         .row(Row::initial(off))
//!         .row(Row::new(off, on).on(ButtonKind::Press))
//!         .row(Row::new(on, off).on(ButtonKind::Press)),
//! );
//!
//! let mut machine = Machine::new(graph, 0).unwrap();
//! machine.process_event(Button::Press).unwrap();
//! machine.process_event(Button::Press).unwrap();
//! machine.process_event(Button::Press).unwrap();
//!
//! assert!(machine.is(on));
//! assert_eq!(*machine.context(), 2);
//! ```

pub mod builder;
pub mod core;
pub mod runtime;

// Re-export commonly used types
pub use builder::{ConfigError, MachineBuilder};
pub use core::{
    ActionError, Behavior, Event, EventMatcher, Guard, Row, Source, StateDescriptor, StateGraph,
    StateHistory, StateId, Target, TransitionRecord, TransitionTable,
};
pub use runtime::{Machine, MachineConfig, MachineError, MachineStatus, NotRunningPolicy, Scope};
