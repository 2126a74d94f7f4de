//! Configuration errors detected before a machine runs.

use crate::core::StateId;
use thiserror::Error;

/// Problems with a state graph. Fatal: the machine is never constructed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("State graph has no root region. Call .add_root_region(table)")]
    NoRootRegion,

    #[error("Region '{region}' has no initial row. Add Row::initial(state)")]
    MissingInitialRow { region: String },

    #[error("Region '{region}' declares {count} initial rows, expected exactly one")]
    DuplicateInitialRow { region: String, count: usize },

    #[error("Region '{region}' references unknown state {state}")]
    UnknownState { region: String, state: StateId },

    #[error("State '{state}' delegates to unknown behavior '{behavior}'")]
    UnknownBehavior { state: String, behavior: String },

    #[error("Initial row of region '{region}' must target a state")]
    InitialTargetNotState { region: String },

    #[error("Initial row of region '{region}' cannot carry a guard")]
    GuardedInitialRow { region: String },

    #[error("Internal row in region '{region}' must start and end in the same state and name an event")]
    InvalidInternalRow { region: String },

    #[error("Catch row in region '{region}' cannot carry an action")]
    CatchRowWithAction { region: String },

    #[error("Initial row of region '{region}' re-enters '{state}' before reaching a leaf state")]
    InitialCycle { region: String, state: String },

    #[error("{} configuration errors: {}", .0.len(), join(.0))]
    Invalid(Vec<ConfigError>),
}

impl ConfigError {
    /// Flatten into the individual problems.
    pub fn problems(&self) -> Vec<&ConfigError> {
        match self {
            Self::Invalid(errors) => errors.iter().flat_map(|e| e.problems()).collect(),
            other => vec![other],
        }
    }
}

fn join(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_lists_every_problem() {
        let err = ConfigError::Invalid(vec![
            ConfigError::NoRootRegion,
            ConfigError::MissingInitialRow {
                region: "inner".to_string(),
            },
        ]);

        let message = err.to_string();
        assert!(message.starts_with("2 configuration errors"));
        assert!(message.contains("'inner'"));
        assert_eq!(err.problems().len(), 2);
    }

    #[test]
    fn single_error_is_its_own_problem() {
        let err = ConfigError::NoRootRegion;
        assert_eq!(err.problems(), vec![&ConfigError::NoRootRegion]);
    }
}
