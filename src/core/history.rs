//! Bounded record of the transitions a machine has taken.
//!
//! History is diagnostic only. It is never used to restore a machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// One executed transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Name of the region's transition table.
    pub region: String,

    /// State left, `None` for an initial row.
    pub from: Option<String>,

    /// State entered, or the pseudostate name (`stopped`, `final`).
    pub to: String,

    /// Triggering event, `None` for anonymous and initial transitions.
    pub event: Option<String>,

    pub timestamp: DateTime<Utc>,
}

/// History of transitions, oldest first, capped at `limit` entries.
///
/// # Example
///
/// ```rust
/// use hfsm::core::{StateHistory, TransitionRecord};
/// use chrono::Utc;
///
/// let mut history = StateHistory::with_limit(2);
/// for to in ["a", "b", "c"] {
///     history.record(TransitionRecord {
///         region: "main".to_string(),
///         from: None,
///         to: to.to_string(),
///         event: None,
///         timestamp: Utc::now(),
///     });
/// }
///
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.get_path(), vec!["b", "c"]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateHistory {
    limit: usize,
    transitions: VecDeque<TransitionRecord>,
}

impl StateHistory {
    /// A history that keeps nothing.
    pub fn disabled() -> Self {
        Self::with_limit(0)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            transitions: VecDeque::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.limit > 0
    }

    /// Append a record, dropping the oldest one when full.
    pub fn record(&mut self, transition: TransitionRecord) {
        if self.limit == 0 {
            return;
        }
        while self.transitions.len() >= self.limit {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Names of the states entered, in order.
    pub fn get_path(&self) -> Vec<&str> {
        self.transitions.iter().map(|t| t.to.as_str()).collect()
    }

    /// Time between the oldest and newest retained record.
    pub fn duration(&self) -> Option<Duration> {
        let first = self.transitions.front()?;
        let last = self.transitions.back()?;
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn transitions(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.transitions.iter()
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.transitions.back()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn clear(&mut self) {
        self.transitions.clear();
    }
}

impl Default for StateHistory {
    fn default() -> Self {
        Self::disabled()
    }
}
