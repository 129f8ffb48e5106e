//! # Statebus Sync
//!
//! Channel multiplexing and the peer synchronization protocol.
//!
//! ## Overview
//!
//! This crate composes one state holder with one channel per connection and
//! drives convergence across peers sharing a channel key on a common
//! broadcast medium, without any central coordinator.
//!
//! ## Key Properties
//!
//! - **Coordinator-free**: any peer may join, update, or reset at any time
//! - **Eventually consistent**: all reachable peers converge after the last
//!   RESET/UPDATE has propagated
//! - **Reorder-tolerant**: correct under arbitrary reordering and
//!   duplication of messages (not under loss)
//! - **Self-filtering**: loopback deliveries of a peer's own messages are
//!   ignored, except RESET, which always takes the shared acceptance path
//!
//! ## Usage
//!
//! ```rust
//! use statebus_sync::{ConnectOptions, Connection, LocalBus};
//!
//! let bus = LocalBus::new();
//!
//! let mut seed = statebus_core::StateMap::new();
//! seed.insert("count".into(), 1u32.into());
//!
//! let donor = Connection::connect(
//!     bus.clone(),
//!     ConnectOptions::new("room").initial_state(seed),
//! );
//! let newbie = Connection::connect(bus.clone(), ConnectOptions::new("room"));
//!
//! bus.deliver_pending();
//! assert_eq!(donor.state(), newbie.state());
//! ```
//!
//! ## Message Flow
//!
//! ```text
//! Newbie                               Donor
//!   |-------- ACKNOWLEDGE(to self) ----->|
//!   |<------- SYNC(to newbie) -----------|        first-sync-wins
//!   |<------- UPDATE(all) ---------------|        shallow merge
//!   |<------- RESET(all) ----------------|        unconditional, incl. originator
//! ```

pub mod channel;
pub mod error;
pub mod medium;
pub mod protocol;

pub use channel::{Channel, ChannelOptions, ErrorHandler, EventHandler};
pub use error::SyncError;
pub use medium::{memory::LocalBus, BroadcastMedium, MessageHandler, Subscription};
pub use protocol::{ConnectOptions, Connection, UpdateHandler, DEFAULT_CHANNEL_KEY};
