//! # Statebus
//!
//! The unified API for statebus: eventually-consistent state shared by
//! independent peers over one broadcast medium, without a coordinator.
//!
//! ## Overview
//!
//! Peers sharing a channel key converge on a single application-defined state
//! record:
//!
//! - **Connection**: one peer on one channel, owning a private state holder
//! - **Channel**: a named partition of the shared broadcast medium
//! - **Snapshot**: the full state record a peer currently holds, or empty
//! - **Donor**: a synced peer answering a newcomer's ACKNOWLEDGE with SYNC
//!
//! ## Key Concepts
//!
//! - Any peer may join at any time, contribute updates, or force a reset.
//! - A newcomer without initial state asks the channel for a donor; with one,
//!   it announces its state via RESET.
//! - Convergence is eventual: peers apply merges in local arrival order, and
//!   all reachable peers hold identical state once propagation settles.
//!
//! ## Usage
//!
//! ```rust
//! use statebus::{connect, ConnectOptions, LocalBus, StateMap};
//!
//! let bus = LocalBus::new();
//!
//! let mut initial = StateMap::new();
//! initial.insert("count".into(), 1u32.into());
//!
//! let oldie = connect(
//!     bus.clone(),
//!     ConnectOptions::new("room").initial_state(initial),
//! );
//! let newbie = connect(bus.clone(), ConnectOptions::new("room"));
//!
//! // The in-process bus delivers when pumped; real media deliver on their own.
//! bus.deliver_pending();
//!
//! assert_eq!(newbie.state(), oldie.state());
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `statebus::core` - Events, peer ids, state records, wire codec
//! - `statebus::store` - The state holder
//! - `statebus::sync` - Channels, the peer protocol, the broadcast medium

pub mod bus;

// Re-export component crates
pub use statebus_core as core;
pub use statebus_store as store;
pub use statebus_sync as sync;

// Re-export main entry points
pub use bus::{connect, connect_with_store};

// Re-export commonly used types
pub use statebus_core::{
    Event, EventKind, PeerId, StateMap, StateUpdate, Target, WireError, TARGET_ALL,
};
pub use statebus_store::{ApplyOutcome, MemoryStore, StateStore};
pub use statebus_sync::{
    BroadcastMedium, Channel, ChannelOptions, ConnectOptions, Connection, LocalBus, Subscription,
    SyncError, DEFAULT_CHANNEL_KEY,
};
