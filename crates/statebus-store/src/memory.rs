//! Single-slot in-memory implementation of the StateStore trait.

use statebus_core::{merge_into, StateMap};

use crate::traits::{ApplyOutcome, StateStore};

/// In-memory state holder.
///
/// Holds at most one snapshot; all data is lost when the holder is dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Option<StateMap>,
}

impl MemoryStore {
    /// Create an empty holder.
    pub fn new() -> Self {
        Self { state: None }
    }

    /// Create a holder seeded with `initial`, if provided.
    pub fn with_state(initial: Option<StateMap>) -> Self {
        Self { state: initial }
    }
}

impl StateStore for MemoryStore {
    fn snapshot(&self) -> Option<&StateMap> {
        self.state.as_ref()
    }

    fn sync(&mut self, values: StateMap, forced: bool) -> ApplyOutcome {
        if forced || self.state.is_none() {
            self.state = Some(values.clone());
            ApplyOutcome::Applied(values)
        } else {
            ApplyOutcome::Unchanged
        }
    }

    fn update(&mut self, updates: &StateMap) -> ApplyOutcome {
        match self.state.as_mut() {
            Some(state) => {
                merge_into(state, updates);
                ApplyOutcome::Applied(state.clone())
            }
            None => ApplyOutcome::Unchanged,
        }
    }
}
