//! Protocol event types.
//!
//! Events are a tagged union keyed by [`EventKind`]. The discriminant travels
//! outside the JSON payload (see [`crate::wire`]) and is validated before the
//! payload shape is trusted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::peer::PeerId;
use crate::state::StateMap;

/// Wildcard marker addressing every peer on a channel.
pub const TARGET_ALL: &str = "*";

/// Discriminant of the event union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Request for a snapshot, self-addressed by a peer with no state.
    Acknowledge,
    /// A donor's full snapshot, addressed to the requester.
    Sync,
    /// Unconditional full-state replacement, addressed to all peers.
    Reset,
    /// Incremental merge announcement carrying the sender's resulting state.
    Update,
}

impl EventKind {
    /// The wire spelling of this kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventKind::Acknowledge => "ACKNOWLEDGE",
            EventKind::Sync => "SYNC",
            EventKind::Reset => "RESET",
            EventKind::Update => "UPDATE",
        }
    }

    /// Parse the wire spelling. Returns `None` for unrecognized kinds.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "ACKNOWLEDGE" => Some(EventKind::Acknowledge),
            "SYNC" => Some(EventKind::Sync),
            "RESET" => Some(EventKind::Reset),
            "UPDATE" => Some(EventKind::Update),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event addressing: a specific peer or the all-peers wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Target {
    /// Every peer on the channel (`"*"` on the wire).
    All,
    /// One specific peer.
    Peer(PeerId),
}

impl Target {
    /// Whether an event with this target is addressed to `peer`.
    pub fn includes(&self, peer: &PeerId) -> bool {
        match self {
            Target::All => true,
            Target::Peer(p) => p == peer,
        }
    }
}

impl From<String> for Target {
    fn from(s: String) -> Self {
        if s == TARGET_ALL {
            Target::All
        } else {
            Target::Peer(PeerId::from(s))
        }
    }
}

impl From<Target> for String {
    fn from(target: Target) -> Self {
        match target {
            Target::All => TARGET_ALL.to_string(),
            Target::Peer(p) => p.as_str().to_string(),
        }
    }
}

/// A protocol event.
///
/// Every variant carries the author's [`PeerId`] and an optional [`Target`].
/// A missing target is never treated as "addressed to me" for SYNC/RESET
/// acceptance; UPDATE ignores targeting entirely.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Snapshot request. Carries no payload; `target` is the requester's own
    /// id so donors know where to send their reply.
    Acknowledge {
        source: PeerId,
        target: Option<Target>,
    },
    /// A donor's full snapshot. Accepted only by peers whose holder is still
    /// empty (first-sync-wins).
    Sync {
        source: PeerId,
        target: Option<Target>,
        state: StateMap,
    },
    /// Unconditional full-state replacement, processed by every recipient,
    /// the originator included.
    Reset {
        source: PeerId,
        target: Option<Target>,
        state: StateMap,
    },
    /// Incremental update: `state` is the sender's resulting full state after
    /// applying `updates`.
    Update {
        source: PeerId,
        target: Option<Target>,
        state: StateMap,
        updates: Option<StateMap>,
    },
}

impl Event {
    /// The discriminant of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Acknowledge { .. } => EventKind::Acknowledge,
            Event::Sync { .. } => EventKind::Sync,
            Event::Reset { .. } => EventKind::Reset,
            Event::Update { .. } => EventKind::Update,
        }
    }

    /// The authoring peer.
    pub fn source(&self) -> &PeerId {
        match self {
            Event::Acknowledge { source, .. }
            | Event::Sync { source, .. }
            | Event::Reset { source, .. }
            | Event::Update { source, .. } => source,
        }
    }

    /// The addressed target, if any.
    pub fn target(&self) -> Option<&Target> {
        match self {
            Event::Acknowledge { target, .. }
            | Event::Sync { target, .. }
            | Event::Reset { target, .. }
            | Event::Update { target, .. } => target.as_ref(),
        }
    }
}

/// Payload handed to the user update callback when the local snapshot
/// changes because of a foreign event.
///
/// `updates: None` means a full snapshot was adopted (SYNC/RESET);
/// `updates: Some(partial)` means an incremental merge was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct StateUpdate {
    pub state: StateMap,
    pub updates: Option<StateMap>,
}
