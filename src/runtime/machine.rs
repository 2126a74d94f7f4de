//! The machine driver: lifecycle, run-to-completion loop and catch policy.

use crate::builder::MachineBuilder;
use crate::core::{Event, StateGraph, StateHistory, StateId, Target, TransitionTable};
use crate::runtime::config::{MachineConfig, NotRunningPolicy};
use crate::runtime::error::MachineError;
use crate::runtime::instance::{InstanceKey, Instances, Region, RegionAddr};
use crate::runtime::queue::EventQueue;
use crate::runtime::scope::Scope;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, debug_span, info, warn};
use uuid::Uuid;

/// Failure recovery callback.
///
/// Runs while the machine is still processing, so `process_event` from
/// inside the handler only queues. Use
/// [`Machine::process_event_no_catch`] to force a recovery transition
/// immediately.
pub type CatchHandler<E, C> = Box<dyn FnMut(&mut Machine<E, C>, &MachineError) + Send>;

/// Lifecycle of the driver itself.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineStatus {
    NotStarted,
    Running,
    Stopped,
}

/// A failed step, with the region whose callback failed.
pub(crate) struct Failure {
    pub(crate) region: Option<RegionAddr>,
    pub(crate) error: MachineError,
}

enum Work<E> {
    Start,
    Dispatch(E),
}

/// Hierarchical state machine.
///
/// The machine is not internally synchronised: wrap it in a lock to share
/// it between threads.
///
/// # Example
///
/// ```rust
/// use hfsm::core::{Row, StateDescriptor, StateGraph, TransitionTable};
/// use hfsm::event_enum;
/// use hfsm::runtime::Machine;
///
/// event_enum! {
///     enum Button: ButtonKind {
///         Press,
///     }
/// }
///
/// let mut graph: StateGraph<Button, ()> = StateGraph::new();
/// let off = graph.add_state(StateDescriptor::new("off"));
/// let on = graph.add_state(StateDescriptor::new("on"));
/// graph.add_root_region(
///     TransitionTable::new("power")
///         .row(Row::initial(off))
///         .row(Row::new(off, on).on(ButtonKind::Press))
///         .row(Row::new(on, off).on(ButtonKind::Press)),
/// );
///
/// let mut machine = Machine::new(graph, ()).unwrap();
/// assert!(machine.is(off));
///
/// machine.process_event(Button::Press).unwrap();
/// assert!(machine.is(on));
///
/// machine.process_event(Button::Press).unwrap();
/// assert!(machine.is(off));
/// ```
pub struct Machine<E: Event, C> {
    pub(crate) id: Uuid,
    pub(crate) graph: Arc<StateGraph<E, C>>,
    pub(crate) config: MachineConfig,
    pub(crate) context: C,
    pub(crate) instances: Instances,
    pub(crate) roots: Vec<Region>,
    pub(crate) queue: EventQueue<E>,
    pub(crate) processing: bool,
    pub(crate) status: MachineStatus,
    pub(crate) catch_handler: Option<CatchHandler<E, C>>,
    pub(crate) history: StateHistory,
}

impl<E: Event, C> Machine<E, C> {
    /// Validate the graph and build a machine with the default
    /// configuration, which starts it immediately.
    pub fn new(graph: StateGraph<E, C>, context: C) -> Result<Self, MachineError> {
        MachineBuilder::new(graph, context).build()
    }

    /// Assemble a machine from an already validated graph.
    pub(crate) fn assemble(
        graph: Arc<StateGraph<E, C>>,
        context: C,
        config: MachineConfig,
        catch_handler: Option<CatchHandler<E, C>>,
    ) -> Self {
        let roots = vec![Region::Uninitialized; graph.roots().len()];
        Self {
            id: Uuid::new_v4(),
            history: StateHistory::with_limit(config.history_limit),
            graph,
            config,
            context,
            instances: Instances::new(),
            roots,
            queue: EventQueue::new(),
            processing: false,
            status: MachineStatus::NotStarted,
            catch_handler,
        }
    }

    /// Run the initial transition of every root region.
    ///
    /// Starting a running machine is a no-op. A stopped machine starts
    /// again from its initial states.
    pub fn start(&mut self) -> Result<(), MachineError> {
        if self.status == MachineStatus::Running {
            return Ok(());
        }
        info!(machine = %self.id, regions = self.roots.len(), "starting state machine");
        self.status = MachineStatus::Running;

        if self.processing {
            return self.boot().map_err(|failure| failure.error);
        }
        self.run(Work::Start, true)
    }

    /// Exit every active state and leave all root regions stopped.
    ///
    /// Exit bindings restricted to an event do not run. Exit failures are
    /// logged and do not interrupt the teardown. Pending events are
    /// dropped. Stopping a machine that is not running does nothing.
    pub fn stop(&mut self) {
        if self.status != MachineStatus::Running {
            return;
        }
        for index in 0..self.roots.len() {
            self.halt_region(RegionAddr::Root(index));
        }
        self.queue.clear();
        self.status = MachineStatus::Stopped;
        info!(machine = %self.id, "state machine stopped");
    }

    /// Process an event to completion, including everything it queues.
    ///
    /// Failures go to catch rows first, then to the catch handler; without
    /// either they are returned and the machine is left as the aborted
    /// transition left it.
    pub fn process_event(&mut self, event: E) -> Result<(), MachineError> {
        if self.processing {
            debug!(machine = %self.id, event = event.name(), "queueing re-entrant event");
            self.queue.push(event);
            return Ok(());
        }
        if self.status != MachineStatus::Running {
            return self.refuse(event);
        }
        self.run(Work::Dispatch(event), true)
    }

    /// Like [`Machine::process_event`] without catch rows or handler.
    ///
    /// Called while the machine is processing (from a catch handler), the
    /// event is executed immediately instead of being queued.
    pub fn process_event_no_catch(&mut self, event: E) -> Result<(), MachineError> {
        if self.processing {
            debug!(machine = %self.id, event = event.name(), "executing event inside catch handler");
            return self.handle(Some(&event)).map_err(|failure| failure.error);
        }
        if self.status != MachineStatus::Running {
            return self.refuse(event);
        }
        self.run(Work::Dispatch(event), false)
    }

    /// True iff the state is active in at least one region, or, for
    /// `Target::Stopped`/`Target::Final`, iff at least one live region is
    /// stopped.
    pub fn is(&self, target: impl Into<Target>) -> bool {
        match target.into() {
            Target::State(state) => self.instances.iter().any(|i| i.state == state),
            Target::Stopped | Target::Final => {
                self.roots.contains(&Region::Stopped)
                    || self
                        .instances
                        .iter()
                        .any(|i| i.regions.contains(&Region::Stopped))
            }
        }
    }

    /// True iff a state with this name is active.
    pub fn is_named(&self, name: &str) -> bool {
        self.instances
            .iter()
            .any(|i| self.graph.state_name(i.state) == name)
    }

    pub fn running(&self) -> bool {
        self.status == MachineStatus::Running
    }

    pub fn status(&self) -> MachineStatus {
        self.status
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Active states, depth-first: each state is followed by the states of
    /// its regions.
    pub fn active_states(&self) -> Vec<StateId> {
        let mut states = Vec::new();
        for region in &self.roots {
            self.collect_active(*region, &mut states);
        }
        states
    }

    pub fn active_state_names(&self) -> Vec<&str> {
        self.active_states()
            .into_iter()
            .map(|s| self.graph.state_name(s))
            .collect()
    }

    pub fn state_name(&self, state: StateId) -> &str {
        self.graph.state_name(state)
    }

    pub fn graph(&self) -> &StateGraph<E, C> {
        &self.graph
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Events waiting in the queue.
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn set_catch_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&mut Machine<E, C>, &MachineError) + Send + 'static,
    {
        self.catch_handler = Some(Box::new(handler));
    }

    pub fn clear_catch_handler(&mut self) {
        self.catch_handler = None;
    }

    fn refuse(&mut self, event: E) -> Result<(), MachineError> {
        match self.config.when_not_running {
            NotRunningPolicy::Ignore => {
                debug!(machine = %self.id, event = event.name(), "machine not running, event ignored");
                Ok(())
            }
            NotRunningPolicy::Queue => {
                debug!(machine = %self.id, event = event.name(), "machine not running, event kept");
                self.queue.push(event);
                Ok(())
            }
            NotRunningPolicy::Reject => Err(MachineError::NotRunning {
                event: event.name().to_string(),
            }),
        }
    }

    /// Run-to-completion loop: the first piece of work, then every queued
    /// event in FIFO order. Events left queued by an earlier failure run
    /// before a newly dispatched one.
    fn run(&mut self, first: Work<E>, catch: bool) -> Result<(), MachineError> {
        self.processing = true;
        let mut next = match first {
            Work::Dispatch(event) if !self.queue.is_empty() => {
                self.queue.push(event);
                self.queue.pop().map(Work::Dispatch)
            }
            work => Some(work),
        };
        let mut outcome = Ok(());

        while let Some(work) = next.take() {
            if let Err(error) = self.step(work, catch) {
                outcome = Err(error);
                break;
            }
            next = self.queue.pop().map(Work::Dispatch);
        }

        self.processing = false;
        self.refresh_status();
        outcome
    }

    fn step(&mut self, work: Work<E>, catch: bool) -> Result<(), MachineError> {
        let event = match &work {
            Work::Start => None,
            Work::Dispatch(event) => Some(event),
        };
        let _span = debug_span!(
            "step",
            machine = %self.id,
            event = ?event.map(|e| e.name()),
        )
        .entered();

        let result = match event {
            None => self.boot(),
            Some(event) => self.handle(Some(event)),
        };
        match result {
            Ok(()) => Ok(()),
            Err(failure) if catch => self.recover(failure, event),
            Err(failure) => Err(failure.error),
        }
    }

    fn boot(&mut self) -> Result<(), Failure> {
        for index in 0..self.roots.len() {
            self.init_region(RegionAddr::Root(index), None)?;
        }
        self.settle()
    }

    /// One event: dispatch, then the anonymous cascade.
    fn handle(&mut self, event: Option<&E>) -> Result<(), Failure> {
        self.dispatch(event)?;
        self.settle()
    }

    /// Offer an event (or the anonymous scan, for `None`) to every root
    /// region. Returns whether any region handled it.
    pub(crate) fn dispatch(&mut self, event: Option<&E>) -> Result<bool, Failure> {
        let mut handled = false;
        for index in 0..self.roots.len() {
            handled |= self.dispatch_region(RegionAddr::Root(index), event)?;
        }
        if let (false, Some(event)) = (handled, event) {
            debug!(machine = %self.id, event = event.name(), "event not handled, dropped");
        }
        Ok(handled)
    }

    /// Child regions see the event first; the region itself resolves only
    /// when none of them handled it.
    fn dispatch_region(&mut self, addr: RegionAddr, event: Option<&E>) -> Result<bool, Failure> {
        let Some(active) = self.region(addr).active() else {
            return Ok(false);
        };
        let child_count = self.instances.get(active).map_or(0, |i| i.regions.len());

        let mut handled = false;
        for index in 0..child_count {
            handled |= self.dispatch_region(RegionAddr::Child(active, index), event)?;
        }
        if handled {
            return Ok(true);
        }

        match self.resolve(addr, event)? {
            Some(candidate) => {
                self.execute(addr, candidate, event)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Fire anonymous transitions until none is enabled. At most `limit`
    /// of them fire; one more still enabled after that is an error.
    pub(crate) fn settle(&mut self) -> Result<(), Failure> {
        let limit = self.config.anonymous_cascade_limit;
        for _ in 0..limit {
            if !self.dispatch(None)? {
                return Ok(());
            }
        }
        if self.anonymous_enabled()? {
            return Err(Failure {
                region: None,
                error: MachineError::CascadeLimit { limit },
            });
        }
        Ok(())
    }

    /// Whether any active region has an anonymous transition ready to fire.
    /// Guards run; nothing is executed.
    fn anonymous_enabled(&mut self) -> Result<bool, Failure> {
        for index in 0..self.roots.len() {
            if self.anonymous_enabled_in(RegionAddr::Root(index))? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn anonymous_enabled_in(&mut self, addr: RegionAddr) -> Result<bool, Failure> {
        let Some(active) = self.region(addr).active() else {
            return Ok(false);
        };
        let child_count = self.instances.get(active).map_or(0, |i| i.regions.len());
        for index in 0..child_count {
            if self.anonymous_enabled_in(RegionAddr::Child(active, index))? {
                return Ok(true);
            }
        }
        Ok(self.resolve(addr, None)?.is_some())
    }

    fn recover(&mut self, failure: Failure, event: Option<&E>) -> Result<(), MachineError> {
        warn!(machine = %self.id, error = %failure.error, "event processing failed");

        if let Some((addr, row)) = self.find_catch_row(failure.region, event, &failure.error)? {
            return self
                .run_catch_row(addr, row, event)
                .map_err(|failure| failure.error);
        }

        if let Some(mut handler) = self.catch_handler.take() {
            debug!(machine = %self.id, "invoking catch handler");
            handler(self, &failure.error);
            if self.catch_handler.is_none() {
                self.catch_handler = Some(handler);
            }
            return Ok(());
        }

        Err(failure.error)
    }

    fn refresh_status(&mut self) {
        if self.status == MachineStatus::Running
            && !self.roots.is_empty()
            && self.roots.iter().all(|r| *r == Region::Stopped)
        {
            self.status = MachineStatus::Stopped;
            info!(machine = %self.id, "all root regions stopped");
        }
    }

    fn collect_active(&self, region: Region, states: &mut Vec<StateId>) {
        let Some(instance) = region.active().and_then(|key| self.instances.get(key)) else {
            return;
        };
        states.push(instance.state);
        for child in &instance.regions {
            self.collect_active(*child, states);
        }
    }

    pub(crate) fn region(&self, addr: RegionAddr) -> Region {
        let region = match addr {
            RegionAddr::Root(index) => self.roots.get(index).copied(),
            RegionAddr::Child(key, index) => self
                .instances
                .get(key)
                .and_then(|i| i.regions.get(index).copied()),
        };
        region.unwrap_or(Region::Stopped)
    }

    pub(crate) fn set_region(&mut self, addr: RegionAddr, region: Region) {
        let slot = match addr {
            RegionAddr::Root(index) => self.roots.get_mut(index),
            RegionAddr::Child(key, index) => self
                .instances
                .get_mut(key)
                .and_then(|i| i.regions.get_mut(index)),
        };
        if let Some(slot) = slot {
            *slot = region;
        }
    }

    /// The region whose active instance is `key`.
    pub(crate) fn region_of(&self, key: InstanceKey) -> Option<RegionAddr> {
        let active = Region::Active(key);
        match self.instances.get(key)?.parent {
            None => self
                .roots
                .iter()
                .position(|r| *r == active)
                .map(RegionAddr::Root),
            Some(parent) => self
                .instances
                .get(parent)?
                .regions
                .iter()
                .position(|r| *r == active)
                .map(|index| RegionAddr::Child(parent, index)),
        }
    }

    pub(crate) fn scope<'s>(
        &'s mut self,
        event: Option<&'s E>,
        local: Option<InstanceKey>,
        parent: Option<InstanceKey>,
        failure: Option<&'s MachineError>,
    ) -> Scope<'s, E, C> {
        Scope {
            event,
            context: &mut self.context,
            instances: &mut self.instances,
            queue: &mut self.queue,
            local,
            parent,
            failure,
        }
    }
}

/// Transition table describing the region at `addr`.
pub(crate) fn table_of<'g, E: Event, C>(
    graph: &'g StateGraph<E, C>,
    instances: &Instances,
    addr: RegionAddr,
) -> Option<&'g TransitionTable<E, C>> {
    match addr {
        RegionAddr::Root(index) => graph.roots().get(index),
        RegionAddr::Child(key, index) => instances
            .get(key)
            .and_then(|i| graph.state(i.state))
            .and_then(|s| s.regions().get(index)),
    }
}

impl<E: Event, C> fmt::Debug for Machine<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("active", &self.active_state_names())
            .field("instances", &self.instances.len())
            .field("pending_events", &self.queue.len())
            .finish()
    }
}
