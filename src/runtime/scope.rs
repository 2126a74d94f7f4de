//! The view of a machine handed to guards, actions and context factories.

use crate::core::{Event, StateId};
use crate::runtime::error::MachineError;
use crate::runtime::instance::{InstanceKey, Instances};
use crate::runtime::queue::EventQueue;
use std::any::Any;

/// Access to the machine from inside a callback.
///
/// `local` is the context of the state the callback belongs to: the state
/// being entered or exited, the state reacting internally, or the source
/// state while a guard is evaluated. Transition actions run between exit
/// and entry and have no local context. `outer` walks the ancestors,
/// innermost first, and returns the first context of the requested type.
///
/// Events raised through [`Scope::process_event`] are queued and processed
/// after the current event has run to completion.
pub struct Scope<'a, E: Event, C> {
    pub(crate) event: Option<&'a E>,
    pub(crate) context: &'a mut C,
    pub(crate) instances: &'a mut Instances,
    pub(crate) queue: &'a mut EventQueue<E>,
    pub(crate) local: Option<InstanceKey>,
    pub(crate) parent: Option<InstanceKey>,
    pub(crate) failure: Option<&'a MachineError>,
}

impl<'a, E: Event, C> Scope<'a, E, C> {
    /// The event being processed; `None` during start and anonymous
    /// transitions.
    pub fn event(&self) -> Option<&E> {
        self.event
    }

    /// The machine's own context.
    pub fn context(&self) -> &C {
        &*self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut *self.context
    }

    /// State the callback belongs to, if any.
    pub fn state(&self) -> Option<StateId> {
        self.local
            .and_then(|key| self.instances.get(key))
            .map(|instance| instance.state)
    }

    pub fn local<T: Any>(&self) -> Option<&T> {
        self.local
            .and_then(|key| self.instances.get(key))
            .and_then(|instance| instance.context.as_deref())
            .and_then(|context| context.downcast_ref::<T>())
    }

    pub fn local_mut<T: Any>(&mut self) -> Option<&mut T> {
        let key = self.local?;
        self.instances
            .get_mut(key)
            .and_then(|instance| instance.context.as_deref_mut())
            .and_then(|context| context.downcast_mut::<T>())
    }

    /// Nearest enclosing state context of type `T`.
    pub fn outer<T: Any>(&self) -> Option<&T> {
        let key = self.find_outer::<T>()?;
        self.instances
            .get(key)
            .and_then(|instance| instance.context.as_deref())
            .and_then(|context| context.downcast_ref::<T>())
    }

    pub fn outer_mut<T: Any>(&mut self) -> Option<&mut T> {
        let key = self.find_outer::<T>()?;
        self.instances
            .get_mut(key)
            .and_then(|instance| instance.context.as_deref_mut())
            .and_then(|context| context.downcast_mut::<T>())
    }

    /// Queue an event. It runs after the current event and everything
    /// queued before it.
    pub fn process_event(&mut self, event: E) {
        self.queue.push(event);
    }

    /// The failure being recovered from, inside catch row guards.
    pub fn failure(&self) -> Option<&MachineError> {
        self.failure
    }

    fn find_outer<T: Any>(&self) -> Option<InstanceKey> {
        let mut cursor = self.parent;
        while let Some(key) = cursor {
            let instance = self.instances.get(key)?;
            if instance
                .context
                .as_deref()
                .is_some_and(|context| context.is::<T>())
            {
                return Some(key);
            }
            cursor = instance.parent;
        }
        None
    }
}
