//! Machine configuration.

use serde::{Deserialize, Serialize};

/// What `process_event` does when the machine is not running.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotRunningPolicy {
    /// Drop the event and return `Ok(())`.
    Ignore,
    /// Keep the event; it is processed after the next `start`.
    Queue,
    /// Return `MachineError::NotRunning`.
    Reject,
}

/// Runtime knobs of a machine.
///
/// # Example
///
/// ```rust
/// use hfsm::runtime::{MachineConfig, NotRunningPolicy};
///
/// let config = MachineConfig::from_json(r#"{ "auto_start": false, "when_not_running": "queue" }"#)
///     .unwrap();
///
/// assert!(!config.auto_start);
/// assert_eq!(config.when_not_running, NotRunningPolicy::Queue);
/// assert_eq!(config.anonymous_cascade_limit, MachineConfig::default().anonymous_cascade_limit);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Run the initial transitions as part of construction.
    pub auto_start: bool,

    pub when_not_running: NotRunningPolicy,

    /// Upper bound on consecutive anonymous transitions after one event.
    pub anonymous_cascade_limit: usize,

    /// Number of transition records kept; 0 disables history.
    pub history_limit: usize,
}

impl MachineConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    pub fn when_not_running(mut self, policy: NotRunningPolicy) -> Self {
        self.when_not_running = policy;
        self
    }

    pub fn anonymous_cascade_limit(mut self, limit: usize) -> Self {
        self.anonymous_cascade_limit = limit;
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            auto_start: true,
            when_not_running: NotRunningPolicy::Ignore,
            anonymous_cascade_limit: 1024,
            history_limit: 64,
        }
    }
}
