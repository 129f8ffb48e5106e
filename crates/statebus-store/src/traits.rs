//! StateStore trait: the abstract interface of the state holder.

use statebus_core::StateMap;

/// Result of applying a sync or update to the holder.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// The holder changed; carries the resulting full snapshot.
    Applied(StateMap),
    /// The holder was left untouched (gated sync, or update before first
    /// sync). Not an error.
    Unchanged,
}

impl ApplyOutcome {
    /// Whether the holder changed.
    pub fn is_applied(&self) -> bool {
        matches!(self, ApplyOutcome::Applied(_))
    }

    /// The resulting snapshot, if the holder changed.
    pub fn into_state(self) -> Option<StateMap> {
        match self {
            ApplyOutcome::Applied(state) => Some(state),
            ApplyOutcome::Unchanged => None,
        }
    }
}

/// The state holder trait.
///
/// Accepts any JSON object record; field types are not validated. A single
/// overwrite discards prior values irrecoverably.
pub trait StateStore: Send {
    /// The current snapshot, if any value has been accepted yet.
    fn snapshot(&self) -> Option<&StateMap>;

    /// Replace the snapshot with `values` when the holder is empty or when
    /// `forced`. The caller supplies the complete record; nothing is merged.
    fn sync(&mut self, values: StateMap, forced: bool) -> ApplyOutcome;

    /// Shallow-merge `updates` onto a non-empty snapshot. A holder that has
    /// never synced reports [`ApplyOutcome::Unchanged`].
    fn update(&mut self, updates: &StateMap) -> ApplyOutcome;
}
