//! Transition rows and the tables that describe regions.

use crate::core::action::{Action, ActionError};
use crate::core::descriptor::StateId;
use crate::core::event::{Event, EventMatcher};
use crate::core::guard::Guard;
use crate::runtime::Scope;
use std::fmt;
use std::sync::Arc;

/// Where a row starts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// The region's initial pseudostate.
    Init,
    /// A concrete state.
    State(StateId),
    /// Every state of the region, below explicit rows in precedence.
    AllStates,
    /// Recovery row, consulted only after a failure.
    Catch,
}

impl From<StateId> for Source {
    fn from(id: StateId) -> Self {
        Self::State(id)
    }
}

/// Where a row leads.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Target {
    State(StateId),
    /// Leave the region with no active state.
    Stopped,
    /// Same sentinel as `Stopped`, marks regular completion.
    Final,
}

impl Target {
    pub fn state(self) -> Option<StateId> {
        match self {
            Self::State(id) => Some(id),
            Self::Stopped | Self::Final => None,
        }
    }
}

impl From<StateId> for Target {
    fn from(id: StateId) -> Self {
        Self::State(id)
    }
}

/// One row of a transition table.
///
/// A fresh row is eventless; call [`Row::on`] or [`Row::on_any_of`] to
/// bind it to events.
///
/// # Example
///
/// ```rust
/// use hfsm::core::{Row, StateDescriptor, StateGraph, TransitionTable};
/// use hfsm::event_enum;
///
/// event_enum! {
///     enum Button: ButtonKind {
///         Press,
///     }
/// }
///
/// let mut graph: StateGraph<Button, ()> = StateGraph::new();
/// let off = graph.add_state(StateDescriptor::new("off"));
/// let on = graph.add_state(StateDescriptor::new("on"));
///
/// let table: TransitionTable<Button, ()> = TransitionTable::new("power")
///     .row(Row::initial(off))
///     .row(Row::new(off, on).on(ButtonKind::Press))
///     .row(Row::new(on, off).on(ButtonKind::Press));
///
/// assert_eq!(table.rows().len(), 3);
/// ```
pub struct Row<E: Event, C> {
    pub(crate) source: Source,
    pub(crate) matcher: EventMatcher<E::Kind>,
    pub(crate) target: Target,
    pub(crate) guard: Option<Guard<E, C>>,
    pub(crate) action: Option<Action<E, C>>,
    pub(crate) internal: bool,
}

impl<E: Event, C> Row<E, C> {
    /// External transition from `source` to `target`.
    pub fn new(source: impl Into<Source>, target: impl Into<Target>) -> Self {
        Self {
            source: source.into(),
            matcher: EventMatcher::Null,
            target: target.into(),
            guard: None,
            action: None,
            internal: false,
        }
    }

    /// The region's initial row.
    pub fn initial(target: impl Into<Target>) -> Self {
        Self::new(Source::Init, target)
    }

    /// Wildcard row applying to every state of the region.
    pub fn any_state(target: impl Into<Target>) -> Self {
        Self::new(Source::AllStates, target)
    }

    /// Recovery row. Accepts any triggering event until narrowed with `on`.
    pub fn catch(target: impl Into<Target>) -> Self {
        Self {
            matcher: EventMatcher::Any,
            ..Self::new(Source::Catch, target)
        }
    }

    /// Handle an event in `state` without exiting it.
    pub fn internal(state: StateId) -> Self {
        Self {
            internal: true,
            ..Self::new(state, state)
        }
    }

    pub fn on(mut self, kind: E::Kind) -> Self {
        self.matcher = EventMatcher::Kind(kind);
        self
    }

    pub fn on_any_of(mut self, kinds: impl IntoIterator<Item = E::Kind>) -> Self {
        self.matcher = EventMatcher::AnyOf(kinds.into_iter().collect());
        self
    }

    pub fn on_any_event(mut self) -> Self {
        self.matcher = EventMatcher::Any;
        self
    }

    pub fn matching(mut self, matcher: EventMatcher<E::Kind>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn guard(mut self, guard: Guard<E, C>) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Scope<'_, E, C>) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::new(predicate));
        self
    }

    pub fn action<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Scope<'_, E, C>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(f));
        self
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn matcher(&self) -> &EventMatcher<E::Kind> {
        &self.matcher
    }

    pub fn is_internal(&self) -> bool {
        self.internal
    }

    pub fn has_guard(&self) -> bool {
        self.guard.is_some()
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }
}

impl<E: Event, C> Clone for Row<E, C> {
    fn clone(&self) -> Self {
        Self {
            source: self.source,
            matcher: self.matcher.clone(),
            target: self.target,
            guard: self.guard.clone(),
            action: self.action.clone(),
            internal: self.internal,
        }
    }
}

impl<E: Event, C> fmt::Debug for Row<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("source", &self.source)
            .field("matcher", &self.matcher)
            .field("target", &self.target)
            .field("guarded", &self.guard.is_some())
            .field("internal", &self.internal)
            .finish()
    }
}

/// Ordered rows describing one region. Declaration order is significant:
/// among equally specific rows the first declared wins.
pub struct TransitionTable<E: Event, C> {
    pub(crate) name: String,
    pub(crate) rows: Vec<Row<E, C>>,
}

impl<E: Event, C> TransitionTable<E, C> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, row: Row<E, C>) -> Self {
        self.rows.push(row);
        self
    }

    pub fn push(&mut self, row: Row<E, C>) {
        self.rows.push(row);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[Row<E, C>] {
        &self.rows
    }

    pub fn initial_row(&self) -> Option<&Row<E, C>> {
        self.rows.iter().find(|r| r.source == Source::Init)
    }
}

impl<E: Event, C> Clone for TransitionTable<E, C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            rows: self.rows.clone(),
        }
    }
}

impl<E: Event, C> fmt::Debug for TransitionTable<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionTable")
            .field("name", &self.name)
            .field("rows", &self.rows)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    struct Tick;

    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    struct TickKind;

    impl Event for Tick {
        type Kind = TickKind;

        fn kind(&self) -> TickKind {
            TickKind
        }

        fn name(&self) -> &str {
            "Tick"
        }
    }

    #[test]
    fn new_row_is_eventless() {
        let row: Row<Tick, ()> = Row::new(StateId(0), StateId(1));
        assert!(row.matcher().is_null());
        assert_eq!(row.source(), Source::State(StateId(0)));
        assert_eq!(row.target(), Target::State(StateId(1)));
    }

    #[test]
    fn internal_row_targets_its_source() {
        let row: Row<Tick, ()> = Row::internal(StateId(4)).on(TickKind);
        assert!(row.is_internal());
        assert_eq!(row.target().state(), Some(StateId(4)));
    }

    #[test]
    fn catch_row_accepts_any_event_by_default() {
        let row: Row<Tick, ()> = Row::catch(Target::Stopped);
        assert_eq!(row.source(), Source::Catch);
        assert_eq!(row.matcher(), &EventMatcher::Any);
    }

    #[test]
    fn table_finds_initial_row() {
        let table: TransitionTable<Tick, ()> = TransitionTable::new("main")
            .row(Row::new(StateId(0), StateId(1)).on(TickKind))
            .row(Row::initial(StateId(0)));

        let initial = table.initial_row().unwrap();
        assert_eq!(initial.target(), Target::State(StateId(0)));
    }

    #[test]
    fn builder_methods_attach_guard_and_action() {
        let row: Row<Tick, ()> = Row::any_state(Target::Final)
            .on(TickKind)
            .when(|_| true)
            .action(|_| Ok(()));

        assert!(row.has_guard());
        assert!(row.has_action());
        assert_eq!(row.source(), Source::AllStates);
    }
}
