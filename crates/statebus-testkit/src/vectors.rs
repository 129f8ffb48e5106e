//! Golden wire vectors for cross-implementation verification.
//!
//! Every implementation of the protocol must produce these exact wire
//! strings for the given events, and decode them back to the same events.
//! State keys serialize in sorted order, so the strings are deterministic.

use serde_json::json;

use statebus_core::{decode_event, encode_event, Event, PeerId, StateMap, Target};

/// A single golden wire vector.
pub struct GoldenVector {
    pub name: &'static str,
    pub channel_key: &'static str,
    pub wire: &'static str,
    pub event: Event,
}

fn record(value: serde_json::Value) -> StateMap {
    value
        .as_object()
        .cloned()
        .expect("vector states are JSON objects")
}

fn peer(name: &str) -> PeerId {
    PeerId::named(name)
}

/// All golden vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "acknowledge_self_addressed",
            channel_key: "@@statebus",
            wire: r#"@@statebus@ACKNOWLEDGE:{"sourcePeerId":"peer-a1","targetPeerId":"peer-a1","payload":null}"#,
            event: Event::Acknowledge {
                source: peer("peer-a1"),
                target: Some(Target::Peer(peer("peer-a1"))),
            },
        },
        GoldenVector {
            name: "sync_targeted_donation",
            channel_key: "room",
            wire: r#"room@SYNC:{"sourcePeerId":"peer-donor","targetPeerId":"peer-newbie","payload":{"state":{"label":"x","n":1}}}"#,
            event: Event::Sync {
                source: peer("peer-donor"),
                target: Some(Target::Peer(peer("peer-newbie"))),
                state: record(json!({"label": "x", "n": 1})),
            },
        },
        GoldenVector {
            name: "reset_all_peers",
            channel_key: "room",
            wire: r#"room@RESET:{"sourcePeerId":"peer-a1","targetPeerId":"*","payload":{"state":{"n":3,"s":"y"}}}"#,
            event: Event::Reset {
                source: peer("peer-a1"),
                target: Some(Target::All),
                state: record(json!({"n": 3, "s": "y"})),
            },
        },
        GoldenVector {
            name: "update_with_partial",
            channel_key: "room",
            wire: r#"room@UPDATE:{"sourcePeerId":"peer-a1","targetPeerId":"*","payload":{"state":{"n":2,"s":"x"},"updates":{"n":2}}}"#,
            event: Event::Update {
                source: peer("peer-a1"),
                target: Some(Target::All),
                state: record(json!({"n": 2, "s": "x"})),
                updates: Some(record(json!({"n": 2}))),
            },
        },
        GoldenVector {
            name: "update_without_partial",
            channel_key: "room",
            wire: r#"room@UPDATE:{"sourcePeerId":"peer-a1","targetPeerId":"*","payload":{"state":{"n":2},"updates":null}}"#,
            event: Event::Update {
                source: peer("peer-a1"),
                target: Some(Target::All),
                state: record(json!({"n": 2})),
                updates: None,
            },
        },
        GoldenVector {
            name: "payload_with_colons",
            channel_key: "room",
            wire: r#"room@SYNC:{"sourcePeerId":"peer-a1","targetPeerId":"*","payload":{"state":{"url":"https://example.com:8080/a:b"}}}"#,
            event: Event::Sync {
                source: peer("peer-a1"),
                target: Some(Target::All),
                state: record(json!({"url": "https://example.com:8080/a:b"})),
            },
        },
    ]
}

/// Check a vector both ways: encode must be byte-identical, decode must
/// produce the exact event.
pub fn verify_vector(vector: &GoldenVector) -> Result<(), String> {
    let encoded = encode_event(vector.channel_key, &vector.event)
        .map_err(|e| format!("{}: encode failed: {e}", vector.name))?;
    if encoded != vector.wire {
        return Err(format!(
            "{}: encoded wire mismatch:\n  expected: {}\n  actual:   {}",
            vector.name, vector.wire, encoded
        ));
    }

    let decoded = decode_event(vector.channel_key, vector.wire)
        .map_err(|e| format!("{}: decode failed: {e}", vector.name))?;
    if decoded.as_ref() != Some(&vector.event) {
        return Err(format!("{}: decoded event mismatch", vector.name));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_verify() {
        for vector in all_vectors() {
            verify_vector(&vector).unwrap();
        }
    }

    #[test]
    fn test_vectors_are_foreign_on_other_channels() {
        for vector in all_vectors() {
            let decoded = decode_event("unrelated", vector.wire).unwrap();
            assert!(decoded.is_none(), "{} leaked across channels", vector.name);
        }
    }
}
