//! # Statebus Core
//!
//! Pure primitives for statebus: events, peer identity, state records, and
//! the wire codec.
//!
//! This crate contains no I/O and no knowledge of the broadcast medium. It is
//! pure computation over the protocol's data model.
//!
//! ## Key Types
//!
//! - [`Event`] - The tagged union of protocol events
//! - [`EventKind`] - Discriminant validated before any payload is trusted
//! - [`PeerId`] - Locally generated identity of one connection
//! - [`Target`] - Event addressing, including the all-peers wildcard
//! - [`StateMap`] - The application-defined state record (a JSON object)
//!
//! ## Wire Format
//!
//! Events travel as strings shaped `"{channelKey}@{eventType}:{jsonPayload}"`.
//! See the [`wire`] module for the exact split rules.

pub mod error;
pub mod event;
pub mod peer;
pub mod state;
pub mod wire;

pub use error::WireError;
pub use event::{Event, EventKind, StateUpdate, Target, TARGET_ALL};
pub use peer::PeerId;
pub use state::{merge_into, StateMap};
pub use wire::{decode_event, encode_event};
