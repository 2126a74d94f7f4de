//! Live state instances and the regions holding them.
//!
//! Instances live in an arena addressed by [`InstanceKey`]. A region points
//! at its active instance, and an instance points back at its parent, so the
//! live configuration is a tree without owning references in both
//! directions.

use crate::core::StateId;
use std::any::Any;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct InstanceKey(usize);

/// One slot of state. Always exactly one of the three.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Region {
    Uninitialized,
    Active(InstanceKey),
    Stopped,
}

impl Region {
    pub(crate) fn active(self) -> Option<InstanceKey> {
        match self {
            Self::Active(key) => Some(key),
            Self::Uninitialized | Self::Stopped => None,
        }
    }
}

/// Location of a region: one of the machine's roots, or the `index`-th
/// region of a live composite instance.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum RegionAddr {
    Root(usize),
    Child(InstanceKey, usize),
}

impl RegionAddr {
    /// Instance owning the region; `None` for root regions.
    pub(crate) fn owner(self) -> Option<InstanceKey> {
        match self {
            Self::Root(_) => None,
            Self::Child(key, _) => Some(key),
        }
    }
}

pub(crate) struct StateInstance {
    pub(crate) state: StateId,
    pub(crate) parent: Option<InstanceKey>,
    pub(crate) context: Option<Box<dyn Any + Send>>,
    pub(crate) regions: Vec<Region>,
}

impl StateInstance {
    pub(crate) fn new(state: StateId, parent: Option<InstanceKey>, region_count: usize) -> Self {
        Self {
            state,
            parent,
            context: None,
            regions: vec![Region::Uninitialized; region_count],
        }
    }

    /// True once every child region has reached the stopped sentinel.
    /// Leaves are trivially complete.
    pub(crate) fn is_complete(&self) -> bool {
        self.regions.iter().all(|r| *r == Region::Stopped)
    }
}

/// Arena of live instances. Only instances that are currently entered are
/// stored; destroying an instance frees its slot for reuse.
pub(crate) struct Instances {
    slots: Vec<Option<StateInstance>>,
    free: Vec<usize>,
}

impl Instances {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, instance: StateInstance) -> InstanceKey {
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(instance);
                InstanceKey(index)
            }
            None => {
                self.slots.push(Some(instance));
                InstanceKey(self.slots.len() - 1)
            }
        }
    }

    pub(crate) fn get(&self, key: InstanceKey) -> Option<&StateInstance> {
        self.slots.get(key.0).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, key: InstanceKey) -> Option<&mut StateInstance> {
        self.slots.get_mut(key.0).and_then(Option::as_mut)
    }

    /// Drop an instance and with it its context object.
    pub(crate) fn remove(&mut self, key: InstanceKey) -> Option<StateInstance> {
        let removed = self.slots.get_mut(key.0).and_then(Option::take);
        if removed.is_some() {
            self.free.push(key.0);
        }
        removed
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &StateInstance> {
        self.slots.iter().flatten()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_slots_are_reused() {
        let mut instances = Instances::new();
        let a = instances.insert(StateInstance::new(StateId(0), None, 0));
        let b = instances.insert(StateInstance::new(StateId(1), Some(a), 0));

        assert_eq!(instances.len(), 2);
        assert!(instances.remove(a).is_some());
        assert!(instances.get(a).is_none());
        assert_eq!(instances.len(), 1);

        let c = instances.insert(StateInstance::new(StateId(2), None, 0));
        assert_eq!(c, a);
        assert_eq!(instances.get(b).unwrap().parent, Some(a));
        assert_eq!(instances.len(), 2);
    }

    #[test]
    fn double_remove_is_harmless() {
        let mut instances = Instances::new();
        let a = instances.insert(StateInstance::new(StateId(0), None, 0));

        assert!(instances.remove(a).is_some());
        assert!(instances.remove(a).is_none());
        assert_eq!(instances.len(), 0);
    }

    #[test]
    fn composite_is_complete_when_all_regions_stopped() {
        let mut instance = StateInstance::new(StateId(0), None, 2);
        assert!(!instance.is_complete());

        instance.regions[0] = Region::Stopped;
        instance.regions[1] = Region::Stopped;
        assert!(instance.is_complete());
        assert!(StateInstance::new(StateId(1), None, 0).is_complete());
    }

    #[test]
    fn region_addresses_know_their_owner() {
        let key = InstanceKey(3);
        assert_eq!(RegionAddr::Root(0).owner(), None);
        assert_eq!(RegionAddr::Child(key, 1).owner(), Some(key));
        assert_eq!(Region::Active(key).active(), Some(key));
        assert_eq!(Region::Stopped.active(), None);
    }
}
