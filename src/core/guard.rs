//! Guard predicates for controlling transitions.
//!
//! A guard sees the machine through a read-only [`Scope`]: the event, the
//! machine context and the contexts of the active state and its ancestors.
//! Returning `Ok(false)` lets the resolver fall through to the next
//! candidate row; returning an error aborts the event as a guard failure.

use crate::core::action::ActionError;
use crate::core::event::Event;
use crate::runtime::Scope;
use std::fmt;
use std::sync::Arc;

type Predicate<E, C> = dyn Fn(&Scope<'_, E, C>) -> Result<bool, ActionError> + Send + Sync;

/// Predicate that determines if a row can fire.
///
/// # Example
///
/// ```rust
/// use hfsm::core::Guard;
/// use hfsm::event_enum;
///
/// event_enum! {
///     enum Door: DoorKind {
///         Open,
///         Close,
///     }
/// }
///
/// struct Lock {
///     engaged: bool,
/// }
///
/// let unlocked: Guard<Door, Lock> = Guard::new(|scope: &hfsm::Scope<'_, Door, Lock>| !scope.context().engaged);
/// ```
pub struct Guard<E: Event, C> {
    predicate: Arc<Predicate<E, C>>,
}

impl<E: Event, C> Guard<E, C> {
    /// Create a guard from an infallible predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Scope<'_, E, C>) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(move |scope| Ok(predicate(scope))),
        }
    }

    /// Create a guard that may fail instead of answering.
    pub fn fallible<F>(predicate: F) -> Self
    where
        F: Fn(&Scope<'_, E, C>) -> Result<bool, ActionError> + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Evaluate the guard.
    pub fn check(&self, scope: &Scope<'_, E, C>) -> Result<bool, ActionError> {
        (self.predicate)(scope)
    }
}

impl<E: Event, C> Clone for Guard<E, C> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<E: Event, C> fmt::Debug for Guard<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::testing::ScopeFixture;

    #[derive(Clone, Debug)]
    struct Ping;

    impl Event for Ping {
        type Kind = ();

        fn kind(&self) {}

        fn name(&self) -> &str {
            "Ping"
        }
    }

    #[test]
    fn guard_reads_the_machine_context() {
        let guard: Guard<Ping, u32> = Guard::new(|scope| *scope.context() > 10);
        let mut low = ScopeFixture::new(3u32);
        let mut high = ScopeFixture::new(30u32);

        let rejected = guard.check(&low.scope(Some(&Ping))).unwrap();
        let accepted = guard.check(&high.scope(Some(&Ping))).unwrap();
        assert!(!rejected);
        assert!(accepted);
    }

    #[test]
    fn guard_sees_the_event() {
        let guard: Guard<Ping, ()> = Guard::new(|scope| scope.event().is_some());
        let mut fixture = ScopeFixture::new(());

        let with_event = guard.check(&fixture.scope(Some(&Ping))).unwrap();
        let anonymous = guard.check(&fixture.scope(None)).unwrap();
        assert!(with_event);
        assert!(!anonymous);
    }

    #[test]
    fn fallible_guard_reports_errors() {
        let guard: Guard<Ping, ()> = Guard::fallible(|_| Err(ActionError::new("sensor offline")));
        let mut fixture = ScopeFixture::new(());

        let err = guard.check(&fixture.scope(None)).unwrap_err();
        assert_eq!(err.message(), "sensor offline");
    }

    #[test]
    fn cloned_guard_shares_the_predicate() {
        let guard: Guard<Ping, u8> = Guard::new(|scope| *scope.context() == 1);
        let cloned = guard.clone();
        let mut fixture = ScopeFixture::new(1u8);

        let original = guard.check(&fixture.scope(None)).unwrap();
        let shared = cloned.check(&fixture.scope(None)).unwrap();
        assert!(original);
        assert_eq!(original, shared);
    }
}
