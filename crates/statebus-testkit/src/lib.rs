//! # Statebus Testkit
//!
//! Testing utilities for statebus.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a shared in-process bus with named, deterministic peers
//!   and callback recorders
//! - **Generators**: proptest strategies for states, peers, and events
//! - **Golden vectors**: exact wire strings with their typed events, for
//!   cross-implementation verification of the codec
//!
//! ## Fixtures
//!
//! ```rust
//! use statebus_sync::ConnectOptions;
//! use statebus_testkit::fixtures::{state, TestFixture};
//!
//! let fixture = TestFixture::new();
//! let donor = fixture.connect(
//!     "donor",
//!     ConnectOptions::new("demo").initial_state(state(serde_json::json!({"n": 1}))),
//! );
//! let newbie = fixture.connect("newbie", ConnectOptions::new("demo"));
//!
//! fixture.settle();
//! assert_eq!(newbie.state(), donor.state());
//! ```
//!
//! ## Golden Vectors
//!
//! ```rust
//! use statebus_testkit::vectors::{all_vectors, verify_vector};
//!
//! for vector in all_vectors() {
//!     verify_vector(&vector).unwrap();
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{state, ErrorRecorder, TestFixture, UpdateRecorder};
pub use generators::{event, nonempty_state_map, peer_id, state_map, target};
pub use vectors::{all_vectors, verify_vector, GoldenVector};
