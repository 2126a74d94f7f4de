//! Executing resolved transitions: exit, action, entry, region start-up,
//! teardown and catch recovery.

use crate::builder::ConfigError;
use crate::core::{Action, Event, StateId, Target, TransitionRecord, TransitionTable};
use crate::runtime::error::{MachineError, Phase};
use crate::runtime::instance::{InstanceKey, Region, RegionAddr, StateInstance};
use crate::runtime::machine::{table_of, Failure, Machine};
use crate::runtime::resolver::Candidate;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Where a callback runs, for scoping and error attribution.
#[derive(Copy, Clone)]
struct Call<'t> {
    addr: RegionAddr,
    region: &'t str,
    local: Option<InstanceKey>,
    state: Option<StateId>,
    phase: Phase,
}

impl<E: Event, C> Machine<E, C> {
    pub(crate) fn execute(
        &mut self,
        addr: RegionAddr,
        candidate: Candidate,
        event: Option<&E>,
    ) -> Result<(), Failure> {
        let graph = Arc::clone(&self.graph);
        let Some(table) = table_of(&graph, &self.instances, addr) else {
            return Ok(());
        };
        let active = self.region(addr).active();
        let source = active
            .and_then(|key| self.instances.get(key))
            .map(|instance| instance.state);

        let index = match candidate {
            Candidate::Row(index) => index,
            Candidate::Reaction(index) => {
                let Some(state) = source else {
                    return Ok(());
                };
                if let Some(binding) = graph.internal_bindings(state).get(index) {
                    let call = Call {
                        addr,
                        region: table.name(),
                        local: active,
                        state: source,
                        phase: Phase::Reaction,
                    };
                    self.invoke(&binding.action, call, event)?;
                }
                return Ok(());
            }
        };
        let Some(row) = table.rows.get(index) else {
            return Ok(());
        };

        if row.internal {
            if let Some(action) = &row.action {
                let call = Call {
                    addr,
                    region: table.name(),
                    local: active,
                    state: source,
                    phase: Phase::Transition,
                };
                self.invoke(action, call, event)?;
            }
            debug!(
                machine = %self.id,
                region = table.name(),
                state = ?source.map(|s| graph.state_name(s)),
                "internal transition"
            );
            return Ok(());
        }

        if let Some(key) = active {
            self.exit_instance(addr, key, event)?;
        }
        if let Some(action) = &row.action {
            let call = Call {
                addr,
                region: table.name(),
                local: None,
                state: None,
                phase: Phase::Transition,
            };
            self.invoke(action, call, event)?;
        }
        self.record(table, source, row.target, event);
        self.enter_target(addr, row.target, event)
    }

    /// Run the initial row of a region and enter its target.
    pub(crate) fn init_region(&mut self, addr: RegionAddr, event: Option<&E>) -> Result<(), Failure> {
        let graph = Arc::clone(&self.graph);
        let Some(table) = table_of(&graph, &self.instances, addr) else {
            return Ok(());
        };
        let Some(row) = table.initial_row() else {
            return Err(Failure {
                region: Some(addr),
                error: ConfigError::MissingInitialRow {
                    region: table.name().to_string(),
                }
                .into(),
            });
        };

        if let Some(action) = &row.action {
            let call = Call {
                addr,
                region: table.name(),
                local: None,
                state: None,
                phase: Phase::Transition,
            };
            self.invoke(action, call, event)?;
        }
        self.record(table, None, row.target, event);
        self.enter_target(addr, row.target, event)
    }

    fn enter_target(&mut self, addr: RegionAddr, target: Target, event: Option<&E>) -> Result<(), Failure> {
        match target {
            Target::State(state) => self.enter_state(addr, state, event),
            Target::Stopped | Target::Final => {
                self.set_region(addr, Region::Stopped);
                Ok(())
            }
        }
    }

    /// Create the instance, build its context, run entry bindings, then
    /// start each of its regions.
    fn enter_state(&mut self, addr: RegionAddr, state: StateId, event: Option<&E>) -> Result<(), Failure> {
        let graph = Arc::clone(&self.graph);
        let Some(descriptor) = graph.state(state) else {
            return Ok(());
        };
        let region = table_of(&graph, &self.instances, addr).map_or("", |t| t.name());
        let parent = addr.owner();

        let key = self
            .instances
            .insert(StateInstance::new(state, parent, descriptor.regions().len()));
        self.set_region(addr, Region::Active(key));

        if let Some(factory) = &descriptor.context {
            let context = {
                let mut scope = self.scope(event, None, parent, None);
                factory(&mut scope)
            };
            if let Some(instance) = self.instances.get_mut(key) {
                instance.context = Some(context);
            }
        }

        let kind = event.map(|e| e.kind());
        for binding in graph.entry_bindings(state) {
            if binding.applies(kind) {
                let call = Call {
                    addr,
                    region,
                    local: Some(key),
                    state: Some(state),
                    phase: Phase::Entry,
                };
                self.invoke(&binding.action, call, event)?;
            }
        }

        for index in 0..descriptor.regions().len() {
            self.init_region(RegionAddr::Child(key, index), event)?;
        }
        Ok(())
    }

    /// Exit the instance active in `addr`, innermost regions first, and
    /// destroy it.
    fn exit_instance(&mut self, addr: RegionAddr, key: InstanceKey, event: Option<&E>) -> Result<(), Failure> {
        let graph = Arc::clone(&self.graph);
        let (state, child_count) = match self.instances.get(key) {
            Some(instance) => (instance.state, instance.regions.len()),
            None => {
                self.set_region(addr, Region::Uninitialized);
                return Ok(());
            }
        };

        for index in 0..child_count {
            let child = RegionAddr::Child(key, index);
            if let Some(child_key) = self.region(child).active() {
                self.exit_instance(child, child_key, event)?;
            }
        }

        let region = table_of(&graph, &self.instances, addr).map_or("", |t| t.name());
        let kind = event.map(|e| e.kind());
        for binding in graph.exit_bindings(state) {
            if binding.applies(kind) {
                let call = Call {
                    addr,
                    region,
                    local: Some(key),
                    state: Some(state),
                    phase: Phase::Exit,
                };
                self.invoke(&binding.action, call, event)?;
            }
        }

        self.instances.remove(key);
        self.set_region(addr, Region::Uninitialized);
        Ok(())
    }

    /// Tear a region down for `stop`: exit bindings run, failures are
    /// logged, and the region ends up stopped.
    pub(crate) fn halt_region(&mut self, addr: RegionAddr) {
        if let Some(key) = self.region(addr).active() {
            self.halt_instance(addr, key);
        }
        self.set_region(addr, Region::Stopped);
    }

    fn halt_instance(&mut self, addr: RegionAddr, key: InstanceKey) {
        let graph = Arc::clone(&self.graph);
        let (state, child_count) = match self.instances.get(key) {
            Some(instance) => (instance.state, instance.regions.len()),
            None => return,
        };

        for index in 0..child_count {
            self.halt_region(RegionAddr::Child(key, index));
        }

        let region = table_of(&graph, &self.instances, addr).map_or("", |t| t.name());
        for binding in graph.exit_bindings(state) {
            if !binding.applies(None) {
                continue;
            }
            let call = Call {
                addr,
                region,
                local: Some(key),
                state: Some(state),
                phase: Phase::Exit,
            };
            if let Err(failure) = self.invoke(&binding.action, call, None) {
                warn!(machine = %self.id, error = %failure.error, "exit action failed during stop");
            }
        }
        self.instances.remove(key);
    }

    /// Drop a region's subtree without running any callbacks.
    fn discard_region(&mut self, addr: RegionAddr) {
        if let Some(key) = self.region(addr).active() {
            self.discard_instance(key);
        }
        self.set_region(addr, Region::Uninitialized);
    }

    fn discard_instance(&mut self, key: InstanceKey) {
        if let Some(instance) = self.instances.remove(key) {
            for region in instance.regions {
                if let Some(child) = region.active() {
                    self.discard_instance(child);
                }
            }
        }
    }

    /// Recover through a catch row: discard the region, enter the row's
    /// target, then settle anonymous transitions.
    pub(crate) fn run_catch_row(
        &mut self,
        addr: RegionAddr,
        index: usize,
        event: Option<&E>,
    ) -> Result<(), Failure> {
        let graph = Arc::clone(&self.graph);
        let Some(table) = table_of(&graph, &self.instances, addr) else {
            return Ok(());
        };
        let Some(row) = table.rows.get(index) else {
            return Ok(());
        };
        let source = self
            .region(addr)
            .active()
            .and_then(|key| self.instances.get(key))
            .map(|instance| instance.state);

        warn!(machine = %self.id, region = table.name(), "recovering through catch row");
        self.discard_region(addr);
        self.record(table, source, row.target, event);
        self.enter_target(addr, row.target, event)?;
        self.settle()
    }

    fn invoke(&mut self, action: &Action<E, C>, call: Call<'_>, event: Option<&E>) -> Result<(), Failure> {
        let result = {
            let mut scope = self.scope(event, call.local, call.addr.owner(), None);
            action(&mut scope)
        };
        result.map_err(|source| Failure {
            region: Some(call.addr),
            error: MachineError::ActionFailure {
                region: call.region.to_string(),
                state: call.state.map(|s| self.graph.state_name(s).to_string()),
                phase: call.phase,
                source,
            },
        })
    }

    fn record(
        &mut self,
        table: &TransitionTable<E, C>,
        from: Option<StateId>,
        to: Target,
        event: Option<&E>,
    ) {
        let from = from.map(|s| self.graph.state_name(s).to_string());
        let to = match to {
            Target::State(s) => self.graph.state_name(s).to_string(),
            Target::Stopped => "stopped".to_string(),
            Target::Final => "final".to_string(),
        };
        let event = event.map(|e| e.name().to_string());
        debug!(
            machine = %self.id,
            region = table.name(),
            from = ?from,
            to = %to,
            event = ?event,
            "transition"
        );

        if self.history.is_enabled() {
            self.history.record(TransitionRecord {
                region: table.name().to_string(),
                from,
                to,
                event,
                timestamp: Utc::now(),
            });
        }
    }
}
