//! Wire codec for the shared broadcast medium.
//!
//! Messages are strings shaped `"{channelKey}@{eventType}:{jsonPayload}"`.
//! Decoding splits on the FIRST `:` only (payloads may legally contain
//! colons), then matches the receiver's channel key against the exact
//! `@`-delimited key segment of the prefix. A key that is a proper prefix of
//! another key never receives the longer key's traffic, and keys may
//! themselves contain `@` (the default channel key does). Framing cannot
//! distinguish a key `"a"` carrying type `"b@X"` from a key `"a@b"` carrying
//! type `"X"`; the first decoder to match reports an invalid event type, so
//! avoid key sets where one key plus `@` prefixes another.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WireError;
use crate::event::{Event, EventKind, Target};
use crate::peer::PeerId;
use crate::state::StateMap;

/// JSON body of every wire message: all event fields except the kind, which
/// travels in the message prefix.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    source_peer_id: PeerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_peer_id: Option<Target>,
    #[serde(default)]
    payload: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct SyncPayload {
    state: StateMap,
}

#[derive(Serialize, Deserialize)]
struct UpdatePayload {
    state: StateMap,
    #[serde(default)]
    updates: Option<StateMap>,
}

fn encode_error(channel_key: &str, detail: impl ToString) -> WireError {
    WireError::Encode {
        channel: channel_key.to_string(),
        detail: detail.to_string(),
    }
}

fn malformed(channel_key: &str, detail: impl ToString) -> WireError {
    WireError::MalformedPayload {
        channel: channel_key.to_string(),
        detail: detail.to_string(),
    }
}

/// Serialize `event` into its wire string for `channel_key`.
pub fn encode_event(channel_key: &str, event: &Event) -> Result<String, WireError> {
    let envelope = match event {
        Event::Acknowledge { source, target } => Envelope {
            source_peer_id: source.clone(),
            target_peer_id: target.clone(),
            payload: None,
        },
        Event::Sync { source, target, state } | Event::Reset { source, target, state } => {
            let payload = serde_json::to_value(SyncPayload {
                state: state.clone(),
            })
            .map_err(|e| encode_error(channel_key, e))?;
            Envelope {
                source_peer_id: source.clone(),
                target_peer_id: target.clone(),
                payload: Some(payload),
            }
        }
        Event::Update {
            source,
            target,
            state,
            updates,
        } => {
            let payload = serde_json::to_value(UpdatePayload {
                state: state.clone(),
                updates: updates.clone(),
            })
            .map_err(|e| encode_error(channel_key, e))?;
            Envelope {
                source_peer_id: source.clone(),
                target_peer_id: target.clone(),
                payload: Some(payload),
            }
        }
    };

    let body = serde_json::to_string(&envelope).map_err(|e| encode_error(channel_key, e))?;
    Ok(format!("{channel_key}@{}:{body}", event.kind()))
}

/// Decode a raw wire message for `channel_key`.
///
/// Returns `Ok(None)` when the message belongs to another channel (foreign
/// traffic is invisible, not an error). Returns `Err` for messages on this
/// channel with an unrecognized event type or an unusable payload.
pub fn decode_event(channel_key: &str, message: &str) -> Result<Option<Event>, WireError> {
    let (prefix, body) = match message.split_once(':') {
        Some((prefix, body)) => (prefix, Some(body)),
        None => (message, None),
    };

    // The receiver knows its own key, so exact-segment matching is a strip:
    // the prefix must be the key followed by the '@' delimiter.
    let rest = match prefix.strip_prefix(channel_key) {
        Some(rest) => rest,
        None => return Ok(None),
    };
    let kind_segment = if rest.is_empty() {
        // Key matched but no '@' delimiter follows; not another channel's
        // message, just one with no event type.
        None
    } else if let Some(kind) = rest.strip_prefix('@') {
        Some(kind)
    } else {
        // Another channel whose key merely extends ours.
        return Ok(None);
    };

    let kind = kind_segment
        .and_then(EventKind::from_wire)
        .ok_or_else(|| WireError::InvalidEventType {
            channel: channel_key.to_string(),
            event_type: kind_segment.unwrap_or_default().to_string(),
        })?;

    let body = body.ok_or_else(|| malformed(channel_key, "missing payload segment"))?;
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| malformed(channel_key, e))?;
    let Envelope {
        source_peer_id: source,
        target_peer_id: target,
        payload,
    } = envelope;

    let event = match kind {
        EventKind::Acknowledge => Event::Acknowledge { source, target },
        EventKind::Sync | EventKind::Reset => {
            let payload =
                payload.ok_or_else(|| malformed(channel_key, "missing state payload"))?;
            let SyncPayload { state } =
                serde_json::from_value(payload).map_err(|e| malformed(channel_key, e))?;
            if kind == EventKind::Sync {
                Event::Sync { source, target, state }
            } else {
                Event::Reset { source, target, state }
            }
        }
        EventKind::Update => {
            let payload =
                payload.ok_or_else(|| malformed(channel_key, "missing state payload"))?;
            let UpdatePayload { state, updates } =
                serde_json::from_value(payload).map_err(|e| malformed(channel_key, e))?;
            Event::Update {
                source,
                target,
                state,
                updates,
            }
        }
    };

    Ok(Some(event))
}
