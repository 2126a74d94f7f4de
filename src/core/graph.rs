//! Arena of state descriptors plus the root regions of a machine.
//!
//! States refer to each other by [`StateId`], so a child region may
//! re-enter an ancestor: cycles are fine in the descriptor graph even though
//! live state instances always form a tree.

use crate::builder::ConfigError;
use crate::core::descriptor::{Behavior, Binding, StateDescriptor, StateId};
use crate::core::event::Event;
use crate::core::table::TransitionTable;
use std::collections::HashMap;
use std::fmt;

pub struct StateGraph<E: Event, C> {
    pub(crate) states: Vec<StateDescriptor<E, C>>,
    pub(crate) roots: Vec<TransitionTable<E, C>>,
    pub(crate) behaviors: HashMap<String, Behavior<E, C>>,
}

impl<E: Event, C> StateGraph<E, C> {
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            roots: Vec::new(),
            behaviors: HashMap::new(),
        }
    }

    pub fn add_state(&mut self, descriptor: StateDescriptor<E, C>) -> StateId {
        self.states.push(descriptor);
        StateId(self.states.len() - 1)
    }

    /// Add a top-level region. Several root regions run orthogonally.
    pub fn add_root_region(&mut self, table: TransitionTable<E, C>) -> &mut Self {
        self.roots.push(table);
        self
    }

    /// Add a region to an existing state, making it composite.
    pub fn add_child_region(
        &mut self,
        parent: StateId,
        table: TransitionTable<E, C>,
    ) -> Result<&mut Self, ConfigError> {
        let descriptor = self
            .states
            .get_mut(parent.0)
            .ok_or_else(|| ConfigError::UnknownState {
                region: table.name.clone(),
                state: parent,
            })?;
        descriptor.regions.push(table);
        Ok(self)
    }

    /// Register a behavior template that states can delegate to.
    pub fn add_behavior(&mut self, name: impl Into<String>, behavior: Behavior<E, C>) -> &mut Self {
        self.behaviors.insert(name.into(), behavior);
        self
    }

    pub fn state(&self, id: StateId) -> Option<&StateDescriptor<E, C>> {
        self.states.get(id.0)
    }

    /// Look a state up by name. Names are not required to be unique; the
    /// first match wins.
    pub fn find(&self, name: &str) -> Option<StateId> {
        self.states
            .iter()
            .position(|s| s.name == name)
            .map(StateId)
    }

    pub fn state_name(&self, id: StateId) -> &str {
        self.state(id).map_or("<unknown>", |s| s.name())
    }

    pub fn roots(&self) -> &[TransitionTable<E, C>] {
        &self.roots
    }

    pub fn states(&self) -> impl Iterator<Item = (StateId, &StateDescriptor<E, C>)> {
        self.states.iter().enumerate().map(|(i, s)| (StateId(i), s))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn has_behavior(&self, name: &str) -> bool {
        self.behaviors.contains_key(name)
    }

    pub(crate) fn entry_bindings(&self, id: StateId) -> Vec<&Binding<E, C>> {
        self.collect_bindings(id, |b| &b.entry)
    }

    pub(crate) fn exit_bindings(&self, id: StateId) -> Vec<&Binding<E, C>> {
        self.collect_bindings(id, |b| &b.exit)
    }

    pub(crate) fn internal_bindings(&self, id: StateId) -> Vec<&Binding<E, C>> {
        self.collect_bindings(id, |b| &b.internal)
    }

    fn collect_bindings<'g>(
        &'g self,
        id: StateId,
        pick: impl Fn(&'g Behavior<E, C>) -> &'g Vec<Binding<E, C>>,
    ) -> Vec<&'g Binding<E, C>> {
        let Some(state) = self.state(id) else {
            return Vec::new();
        };
        let template = state
            .template
            .as_deref()
            .and_then(|name| self.behaviors.get(name));

        template
            .into_iter()
            .flat_map(|b| pick(b).iter())
            .chain(pick(&state.behavior).iter())
            .collect()
    }
}

impl<E: Event, C> Default for StateGraph<E, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event, C> fmt::Debug for StateGraph<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateGraph")
            .field("states", &self.states)
            .field("roots", &self.roots)
            .field("behaviors", &self.behaviors.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::table::Row;

    #[derive(Clone, Debug)]
    struct Nudge;

    impl Event for Nudge {
        type Kind = ();

        fn kind(&self) {}

        fn name(&self) -> &str {
            "Nudge"
        }
    }

    #[test]
    fn states_are_addressed_by_insertion_order() {
        let mut graph: StateGraph<Nudge, ()> = StateGraph::new();
        let a = graph.add_state(StateDescriptor::new("a"));
        let b = graph.add_state(StateDescriptor::new("b"));

        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(graph.find("b"), Some(b));
        assert_eq!(graph.state_name(a), "a");
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn child_region_can_reference_its_ancestor() {
        let mut graph: StateGraph<Nudge, ()> = StateGraph::new();
        let outer = graph.add_state(StateDescriptor::new("outer"));
        let inner = graph.add_state(StateDescriptor::new("inner"));

        graph
            .add_child_region(
                outer,
                TransitionTable::new("nested")
                    .row(Row::initial(inner))
                    .row(Row::new(inner, outer).on(())),
            )
            .unwrap();

        assert!(graph.state(outer).unwrap().is_composite());
    }

    #[test]
    fn child_region_on_unknown_state_fails() {
        let mut graph: StateGraph<Nudge, ()> = StateGraph::new();
        let result = graph.add_child_region(StateId(9), TransitionTable::new("lost"));

        assert!(matches!(result, Err(ConfigError::UnknownState { .. })));
    }

    #[test]
    fn template_bindings_come_before_own_bindings() {
        let mut graph: StateGraph<Nudge, ()> = StateGraph::new();
        graph.add_behavior(
            "base",
            Behavior::new().on_entry(|_| Ok(())).on_exit(|_| Ok(())),
        );
        let s = graph.add_state(
            StateDescriptor::new("s")
                .delegate_to("base")
                .on_entry(|_| Ok(())),
        );

        assert_eq!(graph.entry_bindings(s).len(), 2);
        assert_eq!(graph.exit_bindings(s).len(), 1);
        assert!(graph.internal_bindings(s).is_empty());
    }
}
