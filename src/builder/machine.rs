//! Builder for constructing machines from a state graph.

use crate::builder::validate::check_graph;
use crate::core::{Event, StateGraph};
use crate::runtime::{CatchHandler, Machine, MachineConfig, MachineError};
use std::sync::Arc;

/// Builder for constructing state machines with a fluent API.
///
/// The graph is validated in [`MachineBuilder::build`]; an invalid graph
/// never produces a machine.
pub struct MachineBuilder<E: Event, C> {
    graph: StateGraph<E, C>,
    context: C,
    config: MachineConfig,
    catch_handler: Option<CatchHandler<E, C>>,
}

impl<E: Event, C> MachineBuilder<E, C> {
    pub fn new(graph: StateGraph<E, C>, context: C) -> Self {
        Self {
            graph,
            context,
            config: MachineConfig::default(),
            catch_handler: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn auto_start(mut self, auto_start: bool) -> Self {
        self.config.auto_start = auto_start;
        self
    }

    /// Install the failure handler consulted when no catch row applies.
    pub fn catch<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&mut Machine<E, C>, &MachineError) + Send + 'static,
    {
        self.catch_handler = Some(Box::new(handler));
        self
    }

    /// Validate the graph and build the machine, starting it when
    /// `auto_start` is set.
    pub fn build(self) -> Result<Machine<E, C>, MachineError> {
        check_graph(&self.graph)?;

        let auto_start = self.config.auto_start;
        let mut machine = Machine::assemble(
            Arc::new(self.graph),
            self.context,
            self.config,
            self.catch_handler,
        );
        if auto_start {
            machine.start()?;
        }
        Ok(machine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ConfigError;
    use crate::core::{Row, StateDescriptor, TransitionTable};
    use crate::runtime::MachineStatus;

    crate::event_enum! {
        enum Signal: SignalKind {
            Go,
        }
    }

    fn graph() -> StateGraph<Signal, u32> {
        let mut graph = StateGraph::new();
        let idle = graph.add_state(StateDescriptor::<Signal, u32>::new("idle").on_entry(|scope| {
            *scope.context_mut() += 1;
            Ok(())
        }));
        let busy = graph.add_state(StateDescriptor::new("busy"));
        graph.add_root_region(
            TransitionTable::new("main")
                .row(Row::initial(idle))
                .row(Row::new(idle, busy).on(SignalKind::Go)),
        );
        graph
    }

    #[test]
    fn builder_starts_machine_by_default() {
        let machine = MachineBuilder::new(graph(), 0).build().unwrap();

        assert!(machine.running());
        assert!(machine.is_named("idle"));
        assert_eq!(*machine.context(), 1);
    }

    #[test]
    fn builder_can_defer_start() {
        let mut machine = MachineBuilder::new(graph(), 0)
            .auto_start(false)
            .build()
            .unwrap();

        assert_eq!(machine.status(), MachineStatus::NotStarted);
        assert_eq!(*machine.context(), 0);

        machine.start().unwrap();
        assert!(machine.is_named("idle"));
    }

    #[test]
    fn builder_rejects_invalid_graph() {
        let result = MachineBuilder::new(StateGraph::<Signal, ()>::new(), ()).build();

        assert!(matches!(
            result,
            Err(MachineError::Config(ConfigError::NoRootRegion))
        ));
    }

    #[test]
    fn builder_applies_configuration() {
        let config = MachineConfig::default().history_limit(0);
        let machine = MachineBuilder::new(graph(), 0)
            .config(config.clone())
            .build()
            .unwrap();

        assert_eq!(machine.config(), &config);
        assert!(machine.history().is_empty());
    }
}
