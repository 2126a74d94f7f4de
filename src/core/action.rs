//! Actions run by transitions, entry/exit bindings and internal reactions.

use crate::core::event::Event;
use crate::runtime::Scope;
use std::sync::Arc;
use thiserror::Error;

/// Callback executed with mutable access to the machine through a [`Scope`].
pub type Action<E, C> =
    Arc<dyn Fn(&mut Scope<'_, E, C>) -> Result<(), ActionError> + Send + Sync>;

/// Wrap a closure as an [`Action`].
pub fn action<E, C, F>(f: F) -> Action<E, C>
where
    E: Event,
    F: Fn(&mut Scope<'_, E, C>) -> Result<(), ActionError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Failure reported by user code: a guard, action, entry or exit callback.
///
/// The engine treats every `ActionError` the same way: the event being
/// processed is aborted and the catch policy takes over.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ActionError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Keep the underlying error as the source.
    pub fn with_source<S>(message: impl Into<String>, source: S) -> Self
    where
        S: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for ActionError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ActionError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn message_is_displayed() {
        let err = ActionError::new("motor stalled");
        assert_eq!(err.to_string(), "motor stalled");
        assert!(err.source().is_none());
    }

    #[test]
    fn source_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = ActionError::with_source("could not save", io);

        assert_eq!(err.message(), "could not save");
        assert_eq!(err.source().unwrap().to_string(), "disk gone");
    }

    #[test]
    fn strings_convert_into_errors() {
        let err: ActionError = "bad input".into();
        assert_eq!(err.message(), "bad input");
    }
}
