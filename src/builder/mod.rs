//! Builder API for ergonomic machine construction.
//!
//! This module provides graph validation, the machine builder, row
//! shorthands and the `event_enum!` macro.

pub mod error;
pub mod machine;
pub mod macros;
pub mod validate;

pub use error::ConfigError;
pub use machine::MachineBuilder;
pub use validate::{check_graph, validate};

use crate::core::{Event, Row, StateId};
use crate::runtime::Scope;

/// Row from `from` to `to` on one event kind.
///
/// # Example
///
/// ```
/// use hfsm::builder::transition;
/// use hfsm::core::{Row, StateDescriptor, StateGraph, TransitionTable};
/// use hfsm::event_enum;
///
/// event_enum! {
///     enum Door: DoorKind {
///         Open,
///     }
/// }
///
/// let mut graph = StateGraph::<Door, ()>::new();
/// let closed = graph.add_state(StateDescriptor::new("closed"));
/// let open = graph.add_state(StateDescriptor::new("open"));
/// graph.add_root_region(
///     TransitionTable::new("door")
///         .row(Row::initial(closed))
///         .row(transition(closed, DoorKind::Open, open)),
/// );
/// ```
pub fn transition<E: Event, C>(from: StateId, kind: E::Kind, to: StateId) -> Row<E, C> {
    Row::new(from, to).on(kind)
}

/// Row from `from` to `to` on one event kind, taken only when `guard`
/// holds.
pub fn guarded_transition<E, C, F>(from: StateId, kind: E::Kind, to: StateId, guard: F) -> Row<E, C>
where
    E: Event,
    F: Fn(&Scope<'_, E, C>) -> bool + Send + Sync + 'static,
{
    Row::new(from, to).on(kind).when(guard)
}

/// Eventless row, taken as soon as `from` is active (and complete, for a
/// composite).
pub fn completion<E: Event, C>(from: StateId, to: StateId) -> Row<E, C> {
    Row::new(from, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EventMatcher, Source, StateDescriptor, StateGraph, Target};

    crate::event_enum! {
        enum Step: StepKind {
            Next,
        }
    }

    #[test]
    fn transition_binds_one_kind() {
        let mut graph = StateGraph::<Step, ()>::new();
        let a = graph.add_state(StateDescriptor::new("a"));
        let b = graph.add_state(StateDescriptor::new("b"));

        let row: Row<Step, ()> = transition(a, StepKind::Next, b);

        assert_eq!(row.source(), Source::State(a));
        assert_eq!(row.target(), Target::State(b));
        assert_eq!(row.matcher(), &EventMatcher::Kind(StepKind::Next));
        assert!(!row.has_guard());
    }

    #[test]
    fn guarded_transition_carries_guard() {
        let mut graph = StateGraph::<Step, u8>::new();
        let a = graph.add_state(StateDescriptor::new("a"));
        let b = graph.add_state(StateDescriptor::new("b"));

        let row = guarded_transition::<Step, u8, _>(a, StepKind::Next, b, |scope| *scope.context() > 1);

        assert!(row.has_guard());
    }

    #[test]
    fn completion_rows_are_eventless() {
        let mut graph = StateGraph::<Step, ()>::new();
        let a = graph.add_state(StateDescriptor::new("a"));
        let b = graph.add_state(StateDescriptor::new("b"));

        let row: Row<Step, ()> = completion(a, b);

        assert!(row.matcher().is_null());
    }
}
