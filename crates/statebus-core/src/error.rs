//! Error types for the wire codec.

use thiserror::Error;

/// Errors raised while encoding or decoding wire messages.
///
/// Decode errors are advisory: the channel reports them through its error
/// callback and drops the message, it never halts the protocol.
#[derive(Debug, Error)]
pub enum WireError {
    /// The message carried an unrecognized event type for this channel.
    #[error("invalid eventType {event_type:?} in channel {channel:?}")]
    InvalidEventType { channel: String, event_type: String },

    /// The payload segment failed to parse or had the wrong shape.
    #[error("error occurred during parse in channel {channel:?}: {detail}")]
    MalformedPayload { channel: String, detail: String },

    /// An outbound event could not be serialized.
    #[error("could not encode event for channel {channel:?}: {detail}")]
    Encode { channel: String, detail: String },
}
