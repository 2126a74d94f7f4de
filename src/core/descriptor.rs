//! State descriptors and the behavior templates they can delegate to.

use crate::core::action::{Action, ActionError};
use crate::core::event::{Event, EventMatcher};
use crate::core::table::TransitionTable;
use crate::runtime::Scope;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Stable handle of a state descriptor inside a [`StateGraph`](crate::core::StateGraph).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(pub(crate) usize);

impl StateId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Builds the context object of a state when it is entered.
///
/// The factory runs before the state's entry bindings. Its scope has no
/// local context yet; outer contexts and the machine context are reachable.
pub type ContextFactory<E, C> =
    Arc<dyn Fn(&mut Scope<'_, E, C>) -> Box<dyn Any + Send> + Send + Sync>;

/// An action bound to a state, optionally restricted to some events.
pub struct Binding<E: Event, C> {
    pub(crate) matcher: Option<EventMatcher<E::Kind>>,
    pub(crate) action: Action<E, C>,
}

impl<E: Event, C> Binding<E, C> {
    /// Unrestricted bindings apply to every event and to the anonymous scan.
    pub fn applies(&self, kind: Option<E::Kind>) -> bool {
        self.matcher.as_ref().map_or(true, |m| m.accepts(kind))
    }
}

impl<E: Event, C> Clone for Binding<E, C> {
    fn clone(&self) -> Self {
        Self {
            matcher: self.matcher.clone(),
            action: Arc::clone(&self.action),
        }
    }
}

/// Entry, exit and internal bindings.
///
/// A state owns one `Behavior`; a named `Behavior` registered on the graph
/// acts as a template that states delegate to.
pub struct Behavior<E: Event, C> {
    pub(crate) entry: Vec<Binding<E, C>>,
    pub(crate) exit: Vec<Binding<E, C>>,
    pub(crate) internal: Vec<Binding<E, C>>,
}

impl<E: Event, C> Behavior<E, C> {
    pub fn new() -> Self {
        Self {
            entry: Vec::new(),
            exit: Vec::new(),
            internal: Vec::new(),
        }
    }

    /// Run on every entry.
    pub fn on_entry<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Scope<'_, E, C>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.entry.push(Binding {
            matcher: None,
            action: Arc::new(f),
        });
        self
    }

    /// Run on entries caused by a matching event.
    pub fn on_entry_for<F>(mut self, matcher: impl Into<EventMatcher<E::Kind>>, f: F) -> Self
    where
        F: Fn(&mut Scope<'_, E, C>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.entry.push(Binding {
            matcher: Some(matcher.into()),
            action: Arc::new(f),
        });
        self
    }

    /// Run on every exit.
    pub fn on_exit<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Scope<'_, E, C>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.exit.push(Binding {
            matcher: None,
            action: Arc::new(f),
        });
        self
    }

    /// Run on exits caused by a matching event.
    pub fn on_exit_for<F>(mut self, matcher: impl Into<EventMatcher<E::Kind>>, f: F) -> Self
    where
        F: Fn(&mut Scope<'_, E, C>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.exit.push(Binding {
            matcher: Some(matcher.into()),
            action: Arc::new(f),
        });
        self
    }

    /// Handle a matching event without leaving the state.
    pub fn on_event<F>(mut self, matcher: impl Into<EventMatcher<E::Kind>>, f: F) -> Self
    where
        F: Fn(&mut Scope<'_, E, C>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.internal.push(Binding {
            matcher: Some(matcher.into()),
            action: Arc::new(f),
        });
        self
    }
}

impl<E: Event, C> Default for Behavior<E, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event, C> Clone for Behavior<E, C> {
    fn clone(&self) -> Self {
        Self {
            entry: self.entry.clone(),
            exit: self.exit.clone(),
            internal: self.internal.clone(),
        }
    }
}

/// Immutable description of one state.
///
/// A descriptor without regions is a leaf; with one or more regions it is
/// composite, and entering it initialises every region through its `init`
/// row.
///
/// # Example
///
/// ```rust
/// use hfsm::core::{StateDescriptor, StateGraph};
/// use hfsm::event_enum;
///
/// event_enum! {
///     enum Switch: SwitchKind {
///         Toggle,
///     }
/// }
///
/// #[derive(Default)]
/// struct Lamp {
///     lit: u32,
/// }
///
/// let mut graph: StateGraph<Switch, Lamp> = StateGraph::new();
/// let on = graph.add_state(
///     StateDescriptor::<Switch, Lamp>::new("on")
///         .with_context(|_| 0u8)
///         .on_entry(|scope| {
///             scope.context_mut().lit += 1;
///             Ok(())
///         }),
/// );
///
/// assert_eq!(graph.state(on).unwrap().name(), "on");
/// ```
pub struct StateDescriptor<E: Event, C> {
    pub(crate) name: String,
    pub(crate) context: Option<ContextFactory<E, C>>,
    pub(crate) behavior: Behavior<E, C>,
    pub(crate) template: Option<String>,
    pub(crate) regions: Vec<TransitionTable<E, C>>,
}

impl<E: Event, C> StateDescriptor<E, C> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            context: None,
            behavior: Behavior::new(),
            template: None,
            regions: Vec::new(),
        }
    }

    /// Give the state its own context object, built on every entry and
    /// dropped on exit.
    pub fn with_context<T, F>(mut self, factory: F) -> Self
    where
        T: Any + Send,
        F: Fn(&mut Scope<'_, E, C>) -> T + Send + Sync + 'static,
    {
        let build: ContextFactory<E, C> = Arc::new(move |scope| Box::new(factory(scope)));
        self.context = Some(build);
        self
    }

    pub fn on_entry<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Scope<'_, E, C>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.behavior = self.behavior.on_entry(f);
        self
    }

    pub fn on_entry_for<F>(mut self, matcher: impl Into<EventMatcher<E::Kind>>, f: F) -> Self
    where
        F: Fn(&mut Scope<'_, E, C>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.behavior = self.behavior.on_entry_for(matcher, f);
        self
    }

    pub fn on_exit<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Scope<'_, E, C>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.behavior = self.behavior.on_exit(f);
        self
    }

    pub fn on_exit_for<F>(mut self, matcher: impl Into<EventMatcher<E::Kind>>, f: F) -> Self
    where
        F: Fn(&mut Scope<'_, E, C>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.behavior = self.behavior.on_exit_for(matcher, f);
        self
    }

    /// Internal reaction: handle the event without exiting the state.
    pub fn on_event<F>(mut self, matcher: impl Into<EventMatcher<E::Kind>>, f: F) -> Self
    where
        F: Fn(&mut Scope<'_, E, C>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.behavior = self.behavior.on_event(matcher, f);
        self
    }

    /// Inherit the bindings of a behavior template registered on the graph.
    /// Template bindings run before the state's own.
    pub fn delegate_to(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Attach a child region. Child states must already exist in the graph;
    /// use [`StateGraph::add_child_region`](crate::core::StateGraph::add_child_region)
    /// when the region refers back to this state.
    pub fn region(mut self, table: TransitionTable<E, C>) -> Self {
        self.regions.push(table);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_composite(&self) -> bool {
        !self.regions.is_empty()
    }

    pub fn regions(&self) -> &[TransitionTable<E, C>] {
        &self.regions
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }
}

impl<E: Event, C> fmt::Debug for StateDescriptor<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateDescriptor")
            .field("name", &self.name)
            .field("regions", &self.regions.len())
            .field("template", &self.template)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    enum Ev {
        Go,
        Halt,
    }

    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    enum EvKind {
        Go,
        Halt,
    }

    impl Event for Ev {
        type Kind = EvKind;

        fn kind(&self) -> EvKind {
            match self {
                Self::Go => EvKind::Go,
                Self::Halt => EvKind::Halt,
            }
        }

        fn name(&self) -> &str {
            match self {
                Self::Go => "Go",
                Self::Halt => "Halt",
            }
        }
    }

    #[test]
    fn leaf_has_no_regions() {
        let state: StateDescriptor<Ev, ()> = StateDescriptor::new("idle");
        assert!(!state.is_composite());
        assert_eq!(state.name(), "idle");
    }

    #[test]
    fn region_makes_state_composite() {
        let state: StateDescriptor<Ev, ()> =
            StateDescriptor::new("busy").region(TransitionTable::new("inner"));
        assert!(state.is_composite());
        assert_eq!(state.regions().len(), 1);
    }

    #[test]
    fn unrestricted_binding_applies_everywhere() {
        let behavior: Behavior<Ev, ()> = Behavior::new().on_entry(|_| Ok(()));
        let binding = &behavior.entry[0];

        assert!(binding.applies(Some(EvKind::Go)));
        assert!(binding.applies(None));
    }

    #[test]
    fn keyed_binding_applies_to_its_event_only() {
        let behavior: Behavior<Ev, ()> = Behavior::new().on_exit_for(EvKind::Halt, |_| Ok(()));
        let binding = &behavior.exit[0];

        assert!(binding.applies(Some(Ev::Halt.kind())));
        assert!(!binding.applies(Some(Ev::Go.kind())));
        assert!(!binding.applies(None));
    }

    #[test]
    fn delegation_is_recorded() {
        let state: StateDescriptor<Ev, ()> = StateDescriptor::new("a").delegate_to("blinking");
        assert_eq!(state.template(), Some("blinking"));
    }
}
