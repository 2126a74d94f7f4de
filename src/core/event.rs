//! Events and the matchers rows use to accept them.
//!
//! Rows never inspect an event's payload to decide whether they apply. They
//! compare the event's [`Event::Kind`] tag, which keeps dispatch a plain
//! equality check instead of a type-indexed registry.

use std::fmt::Debug;

/// Trait for events fed to a machine.
///
/// # Example
///
/// ```rust
/// use hfsm::core::Event;
///
/// #[derive(Clone, Debug)]
/// enum Player {
///     Play,
///     Seek(u32),
/// }
///
/// #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
/// enum PlayerKind {
///     Play,
///     Seek,
/// }
///
/// impl Event for Player {
///     type Kind = PlayerKind;
///
///     fn kind(&self) -> PlayerKind {
///         match self {
///             Self::Play => PlayerKind::Play,
///             Self::Seek(_) => PlayerKind::Seek,
///         }
///     }
///
///     fn name(&self) -> &str {
///         match self {
///             Self::Play => "Play",
///             Self::Seek(_) => "Seek",
///         }
///     }
/// }
///
/// assert_eq!(Player::Seek(3).kind(), PlayerKind::Seek);
/// ```
pub trait Event: Debug + Send + 'static {
    /// Tag identifying the event's type without its payload.
    type Kind: Copy + Eq + Debug + Send + Sync + 'static;

    /// The tag rows match against.
    fn kind(&self) -> Self::Kind;

    /// Event name for logging and history.
    fn name(&self) -> &str;
}

/// Decides whether a row or binding accepts an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventMatcher<K> {
    /// Exactly one event kind.
    Kind(K),

    /// Any kind in the set.
    AnyOf(Vec<K>),

    /// Every real event.
    Any,

    /// No real event at all; only the anonymous scan matches it.
    Null,
}

impl<K: Copy + Eq> EventMatcher<K> {
    /// Check a runtime event kind. `None` stands for the anonymous scan.
    pub fn accepts(&self, kind: Option<K>) -> bool {
        match (self, kind) {
            (Self::Null, None) => true,
            (Self::Null, Some(_)) | (_, None) => false,
            (Self::Any, Some(_)) => true,
            (Self::Kind(expected), Some(kind)) => *expected == kind,
            (Self::AnyOf(kinds), Some(kind)) => kinds.contains(&kind),
        }
    }

    /// True for the eventless matcher.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl<K> From<K> for EventMatcher<K> {
    fn from(kind: K) -> Self {
        Self::Kind(kind)
    }
}
