//! Validation of a state graph before it is run.
//!
//! Every check runs and ALL problems are reported together, using
//! Stillwater's `Validation` instead of stopping at the first error.

use crate::builder::error::ConfigError;
use crate::core::{Event, Source, StateGraph, StateId, Target, TransitionTable};
use std::collections::HashSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<ConfigError>>;

/// Validate a graph, accumulating every configuration problem.
pub fn validate<E: Event, C>(graph: &StateGraph<E, C>) -> Check {
    let mut checks: Vec<Check> = Vec::new();

    if graph.roots().is_empty() {
        checks.push(Validation::fail(ConfigError::NoRootRegion));
    }

    for table in graph.roots() {
        checks.extend(check_table(graph, table));
    }

    for (_, state) in graph.states() {
        for table in state.regions() {
            checks.extend(check_table(graph, table));
        }
        if let Some(behavior) = state.template() {
            if !graph.has_behavior(behavior) {
                checks.push(Validation::fail(ConfigError::UnknownBehavior {
                    state: state.name().to_string(),
                    behavior: behavior.to_string(),
                }));
            }
        }
    }

    checks.extend(check_initial_cycles(graph));

    Validation::all_vec(checks).map(|_| ())
}

/// Run [`validate`] and fold the outcome into a `Result`.
pub fn check_graph<E: Event, C>(graph: &StateGraph<E, C>) -> Result<(), ConfigError> {
    match validate(graph) {
        Validation::Success(()) => Ok(()),
        Validation::Failure(errors) => {
            let mut errors: Vec<ConfigError> = errors.iter().cloned().collect();
            if errors.len() == 1 {
                Err(errors.remove(0))
            } else {
                Err(ConfigError::Invalid(errors))
            }
        }
    }
}

fn check_table<E: Event, C>(graph: &StateGraph<E, C>, table: &TransitionTable<E, C>) -> Vec<Check> {
    let region = || table.name().to_string();
    let mut checks = Vec::new();

    let initial_count = table
        .rows()
        .iter()
        .filter(|r| r.source() == Source::Init)
        .count();
    match initial_count {
        0 => checks.push(Validation::fail(ConfigError::MissingInitialRow {
            region: region(),
        })),
        1 => {}
        count => checks.push(Validation::fail(ConfigError::DuplicateInitialRow {
            region: region(),
            count,
        })),
    }

    let known = |id: StateId| graph.state(id).is_some();

    for row in table.rows() {
        let referenced = [
            match row.source() {
                Source::State(id) => Some(id),
                _ => None,
            },
            row.target().state(),
        ];
        for id in referenced.into_iter().flatten() {
            if !known(id) {
                checks.push(Validation::fail(ConfigError::UnknownState {
                    region: region(),
                    state: id,
                }));
            }
        }

        match row.source() {
            Source::Init => {
                if !matches!(row.target(), Target::State(_)) {
                    checks.push(Validation::fail(ConfigError::InitialTargetNotState {
                        region: region(),
                    }));
                }
                if row.has_guard() {
                    checks.push(Validation::fail(ConfigError::GuardedInitialRow {
                        region: region(),
                    }));
                }
            }
            Source::Catch if row.has_action() => {
                checks.push(Validation::fail(ConfigError::CatchRowWithAction {
                    region: region(),
                }));
            }
            _ => {}
        }

        if row.is_internal() {
            let same_state = matches!(
                (row.source(), row.target()),
                (Source::State(a), Target::State(b)) if a == b
            );
            if !same_state || row.matcher().is_null() {
                checks.push(Validation::fail(ConfigError::InvalidInternalRow {
                    region: region(),
                }));
            }
        }
    }

    checks
}

/// Entering a state follows the initial rows of its regions. A chain that
/// comes back to a state already being entered never reaches a leaf.
fn check_initial_cycles<E: Event, C>(graph: &StateGraph<E, C>) -> Vec<Check> {
    let mut finished = HashSet::new();
    let mut path = Vec::new();
    let mut checks = Vec::new();
    for (id, _) in graph.states() {
        follow_initial_rows(graph, id, &mut path, &mut finished, &mut checks);
    }
    checks
}

fn follow_initial_rows<E: Event, C>(
    graph: &StateGraph<E, C>,
    state: StateId,
    path: &mut Vec<StateId>,
    finished: &mut HashSet<StateId>,
    checks: &mut Vec<Check>,
) {
    if finished.contains(&state) {
        return;
    }
    let Some(descriptor) = graph.state(state) else {
        return;
    };

    path.push(state);
    for table in descriptor.regions() {
        let Some(target) = table.initial_row().and_then(|row| row.target().state()) else {
            continue;
        };
        if path.contains(&target) {
            checks.push(Validation::fail(ConfigError::InitialCycle {
                region: table.name().to_string(),
                state: graph.state_name(target).to_string(),
            }));
        } else {
            follow_initial_rows(graph, target, path, finished, checks);
        }
    }
    path.pop();
    finished.insert(state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Behavior, Row, StateDescriptor};

    #[derive(Clone, Debug)]
    enum Ev {
        Go,
    }

    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    enum EvKind {
        Go,
    }

    impl Event for Ev {
        type Kind = EvKind;

        fn kind(&self) -> EvKind {
            EvKind::Go
        }

        fn name(&self) -> &str {
            match self {
                Self::Go => "Go",
            }
        }
    }

    fn two_states() -> (StateGraph<Ev, ()>, StateId, StateId) {
        let mut graph = StateGraph::new();
        let a = graph.add_state(StateDescriptor::new("a"));
        let b = graph.add_state(StateDescriptor::new("b"));
        (graph, a, b)
    }

    #[test]
    fn well_formed_graph_passes() {
        let (mut graph, a, b) = two_states();
        graph.add_root_region(
            TransitionTable::new("main")
                .row(Row::initial(a))
                .row(Row::new(a, b).on(EvKind::Go))
                .row(Row::internal(b).on(EvKind::Go))
                .row(Row::catch(a)),
        );

        assert!(validate(&graph).is_success());
        assert!(check_graph(&graph).is_ok());
    }

    #[test]
    fn empty_graph_has_no_root_region() {
        let graph: StateGraph<Ev, ()> = StateGraph::new();
        assert_eq!(check_graph(&graph), Err(ConfigError::NoRootRegion));
    }

    #[test]
    fn missing_initial_row_in_nested_region_is_reported() {
        let (mut graph, a, b) = two_states();
        graph
            .add_child_region(a, TransitionTable::new("inner").row(Row::new(b, b)))
            .unwrap();
        graph.add_root_region(TransitionTable::new("main").row(Row::initial(a)));

        let err = check_graph(&graph).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingInitialRow {
                region: "inner".to_string()
            }
        );
    }

    #[test]
    fn all_problems_are_accumulated() {
        let (mut graph, a, b) = two_states();
        graph.add_root_region(
            TransitionTable::new("main")
                .row(Row::initial(a))
                .row(Row::initial(b))
                .row(Row::new(a, StateId(42)).on(EvKind::Go))
                .row(Row::catch(b).action(|_| Ok(()))),
        );

        match validate(&graph) {
            Validation::Failure(errors) => {
                assert_eq!(errors.len(), 3);
                assert!(errors
                    .iter()
                    .any(|e| matches!(e, ConfigError::DuplicateInitialRow { count: 2, .. })));
                assert!(errors
                    .iter()
                    .any(|e| matches!(e, ConfigError::UnknownState { .. })));
                assert!(errors
                    .iter()
                    .any(|e| matches!(e, ConfigError::CatchRowWithAction { .. })));
            }
            Validation::Success(_) => panic!("Expected failures, got success"),
        }

        assert!(matches!(check_graph(&graph), Err(ConfigError::Invalid(errors)) if errors.len() == 3));
    }

    #[test]
    fn initial_row_rules_are_enforced() {
        let (mut graph, a, _) = two_states();
        graph.add_root_region(
            TransitionTable::new("main").row(Row::initial(Target::Stopped).when(|_| true)),
        );
        graph.add_root_region(TransitionTable::new("other").row(Row::initial(a)));

        let err = check_graph(&graph).unwrap_err();
        let problems = err.problems();
        assert!(problems
            .iter()
            .any(|e| matches!(e, ConfigError::InitialTargetNotState { .. })));
        assert!(problems
            .iter()
            .any(|e| matches!(e, ConfigError::GuardedInitialRow { .. })));
    }

    #[test]
    fn anonymous_internal_row_is_rejected() {
        let (mut graph, a, _) = two_states();
        graph.add_root_region(
            TransitionTable::new("main")
                .row(Row::initial(a))
                .row(Row::internal(a)),
        );

        assert!(matches!(
            check_graph(&graph),
            Err(ConfigError::InvalidInternalRow { .. })
        ));
    }

    #[test]
    fn unknown_behavior_template_is_rejected() {
        let mut graph: StateGraph<Ev, ()> = StateGraph::new();
        graph.add_behavior("known", Behavior::new());
        let a = graph.add_state(StateDescriptor::new("a").delegate_to("missing"));
        graph.add_root_region(TransitionTable::new("main").row(Row::initial(a)));

        assert_eq!(
            check_graph(&graph),
            Err(ConfigError::UnknownBehavior {
                state: "a".to_string(),
                behavior: "missing".to_string(),
            })
        );
    }

    #[test]
    fn initial_rows_that_reenter_an_ancestor_are_rejected() {
        let (mut graph, a, b) = two_states();
        graph
            .add_child_region(a, TransitionTable::new("outer").row(Row::initial(b)))
            .unwrap();
        graph
            .add_child_region(b, TransitionTable::new("inner").row(Row::initial(a)))
            .unwrap();
        graph.add_root_region(TransitionTable::new("main").row(Row::initial(a)));

        assert_eq!(
            check_graph(&graph),
            Err(ConfigError::InitialCycle {
                region: "inner".to_string(),
                state: "a".to_string(),
            })
        );
    }

    #[test]
    fn state_targeting_itself_initially_is_rejected() {
        let (mut graph, a, _) = two_states();
        graph
            .add_child_region(a, TransitionTable::new("self").row(Row::initial(a)))
            .unwrap();
        graph.add_root_region(TransitionTable::new("main").row(Row::initial(a)));

        assert!(matches!(
            check_graph(&graph),
            Err(ConfigError::InitialCycle { state, .. }) if state == "a"
        ));
    }

    #[test]
    fn shared_initial_target_is_not_a_cycle() {
        let (mut graph, a, b) = two_states();
        let c = graph.add_state(StateDescriptor::new("c"));
        graph
            .add_child_region(a, TransitionTable::new("left").row(Row::initial(c)))
            .unwrap();
        graph
            .add_child_region(b, TransitionTable::new("right").row(Row::initial(c)))
            .unwrap();
        graph.add_root_region(TransitionTable::new("one").row(Row::initial(a)));
        graph.add_root_region(TransitionTable::new("two").row(Row::initial(b)));

        assert!(check_graph(&graph).is_ok());
    }
}
