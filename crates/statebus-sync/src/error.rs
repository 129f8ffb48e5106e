//! Error types for the sync crate.
//!
//! Every error here is advisory: it is reported through the optional error
//! callback supplied at connection time and never halts the protocol.

use thiserror::Error;

use statebus_core::WireError;

/// Errors surfaced by a channel or connection.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A wire message on this channel could not be decoded, or an outbound
    /// event could not be encoded.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// A broadcast was attempted on a disconnected channel. The message is
    /// still published.
    #[error("channel {channel:?} is disconnected")]
    Disconnected { channel: String },

    /// `update` was called before the local holder received its first value.
    #[error("state in channel {channel:?} is not yet in sync")]
    NotSynced { channel: String },

    /// The holder refused a merge that should have succeeded.
    #[error("couldn't read back state in channel {channel:?}")]
    StateUnavailable { channel: String },
}
