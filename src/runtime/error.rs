//! Runtime errors surfaced by a machine.

use crate::builder::ConfigError;
use crate::core::ActionError;
use std::fmt;
use thiserror::Error;

/// Which kind of callback failed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Entry,
    Exit,
    Transition,
    Reaction,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Entry => "entry",
            Self::Exit => "exit",
            Self::Transition => "transition",
            Self::Reaction => "reaction",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while a machine runs.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Guard in region '{region}' failed: {source}")]
    GuardFailure {
        region: String,
        #[source]
        source: ActionError,
    },

    #[error("{phase} action in region '{region}'{} failed: {source}", state_suffix(.state))]
    ActionFailure {
        region: String,
        state: Option<String>,
        phase: Phase,
        #[source]
        source: ActionError,
    },

    #[error("Machine is not running, event '{event}' rejected")]
    NotRunning { event: String },

    #[error("Anonymous transitions did not settle within {limit} steps")]
    CascadeLimit { limit: usize },
}

impl MachineError {
    /// The user error behind a guard or action failure.
    pub fn action_error(&self) -> Option<&ActionError> {
        match self {
            Self::GuardFailure { source, .. } | Self::ActionFailure { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::ActionFailure { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    pub fn is_guard_failure(&self) -> bool {
        matches!(self, Self::GuardFailure { .. })
    }
}

fn state_suffix(state: &Option<String>) -> String {
    state
        .as_deref()
        .map(|s| format!(" of state '{s}'"))
        .unwrap_or_default()
}
