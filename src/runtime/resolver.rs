//! Picking the row that handles an event in one region.
//!
//! Candidates are tried in precedence order and the first one whose guard
//! passes wins:
//! 1. Rows whose source is the active state
//! 2. Internal bindings of the active state, template bindings first
//! 3. `AllStates` rows
//!
//! Within a group, earlier rows win. A guard returning an error aborts the
//! search.

use crate::core::{Event, EventMatcher, Source};
use crate::runtime::error::MachineError;
use crate::runtime::instance::RegionAddr;
use crate::runtime::machine::{table_of, Failure, Machine};
use std::sync::Arc;
use tracing::trace;

/// A resolved handler: a row index in the region's table, or an index into
/// the active state's internal bindings.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Candidate {
    Row(usize),
    Reaction(usize),
}

impl<E: Event, C> Machine<E, C> {
    /// Resolve `event` (or the anonymous scan, for `None`) in one region.
    pub(crate) fn resolve(
        &mut self,
        addr: RegionAddr,
        event: Option<&E>,
    ) -> Result<Option<Candidate>, Failure> {
        let graph = Arc::clone(&self.graph);
        let Some(active) = self.region(addr).active() else {
            return Ok(None);
        };
        let Some(table) = table_of(&graph, &self.instances, addr) else {
            return Ok(None);
        };
        let (state, complete) = match self.instances.get(active) {
            Some(instance) => (instance.state, instance.is_complete()),
            None => return Ok(None),
        };

        let kind = event.map(|e| e.kind());
        // A composite only completes once all of its regions have stopped.
        if kind.is_none() && !complete {
            return Ok(None);
        }

        let explicit = table
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.source == Source::State(state) && row.matcher.accepts(kind))
            .map(|(index, _)| Candidate::Row(index));
        let reactions = graph
            .internal_bindings(state)
            .into_iter()
            .enumerate()
            .filter(|(_, binding)| kind.is_some() && binding.applies(kind))
            .map(|(index, _)| Candidate::Reaction(index));
        let wildcard = table
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.source == Source::AllStates && row.matcher.accepts(kind))
            .map(|(index, _)| Candidate::Row(index));
        let candidates: Vec<Candidate> = explicit.chain(reactions).chain(wildcard).collect();

        for candidate in candidates {
            let guard = match candidate {
                Candidate::Row(index) => table.rows.get(index).and_then(|row| row.guard.as_ref()),
                Candidate::Reaction(_) => None,
            };
            let Some(guard) = guard else {
                return Ok(Some(candidate));
            };

            let verdict = {
                let scope = self.scope(event, Some(active), addr.owner(), None);
                guard.check(&scope)
            };
            match verdict {
                Ok(true) => return Ok(Some(candidate)),
                Ok(false) => trace!(
                    machine = %self.id,
                    region = table.name(),
                    state = graph.state_name(state),
                    "guard rejected row"
                ),
                Err(source) => {
                    return Err(Failure {
                        region: Some(addr),
                        error: MachineError::GuardFailure {
                            region: table.name().to_string(),
                            source,
                        },
                    })
                }
            }
        }
        Ok(None)
    }

    /// Find the catch row for a failure, searching from the failing region
    /// outward through its ancestors.
    pub(crate) fn find_catch_row(
        &mut self,
        start: Option<RegionAddr>,
        event: Option<&E>,
        failure: &MachineError,
    ) -> Result<Option<(RegionAddr, usize)>, MachineError> {
        let graph = Arc::clone(&self.graph);
        let kind = event.map(|e| e.kind());

        let mut cursor = start;
        while let Some(addr) = cursor {
            if let Some(table) = table_of(&graph, &self.instances, addr) {
                let active = self.region(addr).active();
                for (index, row) in table.rows.iter().enumerate() {
                    let matches = row.source == Source::Catch
                        && (row.matcher == EventMatcher::Any || row.matcher.accepts(kind));
                    if !matches {
                        continue;
                    }
                    let accepted = match &row.guard {
                        None => true,
                        Some(guard) => {
                            let scope = self.scope(event, active, addr.owner(), Some(failure));
                            guard
                                .check(&scope)
                                .map_err(|source| MachineError::GuardFailure {
                                    region: table.name().to_string(),
                                    source,
                                })?
                        }
                    };
                    if accepted {
                        return Ok(Some((addr, index)));
                    }
                }
            }
            cursor = addr.owner().and_then(|owner| self.region_of(owner));
        }
        Ok(None)
    }
}
