//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::Value;

use statebus_core::{Event, PeerId, StateMap, Target};

/// Generate a JSON scalar (null, bool, integer, or short string).
pub fn json_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 :@*]{0,12}".prop_map(Value::String),
    ]
}

/// Generate a state record with 0..6 top-level keys.
pub fn state_map() -> impl Strategy<Value = StateMap> {
    prop::collection::btree_map("[a-z]{1,8}", json_scalar(), 0..6)
        .prop_map(|map| map.into_iter().collect())
}

/// Generate a state record with at least one key.
pub fn nonempty_state_map() -> impl Strategy<Value = StateMap> {
    prop::collection::btree_map("[a-z]{1,8}", json_scalar(), 1..6)
        .prop_map(|map| map.into_iter().collect())
}

/// Generate a peer id.
pub fn peer_id() -> impl Strategy<Value = PeerId> {
    "[a-z]{4,10}".prop_map(PeerId::named)
}

/// Generate a target: the wildcard or a specific peer.
pub fn target() -> impl Strategy<Value = Target> {
    prop_oneof![Just(Target::All), peer_id().prop_map(Target::Peer)]
}

/// Generate any protocol event.
pub fn event() -> BoxedStrategy<Event> {
    let ack = (peer_id(), proptest::option::of(target()))
        .prop_map(|(source, target)| Event::Acknowledge { source, target });
    let sync = (peer_id(), proptest::option::of(target()), state_map())
        .prop_map(|(source, target, state)| Event::Sync { source, target, state });
    let reset = (peer_id(), proptest::option::of(target()), state_map())
        .prop_map(|(source, target, state)| Event::Reset { source, target, state });
    let update = (
        peer_id(),
        proptest::option::of(target()),
        state_map(),
        proptest::option::of(state_map()),
    )
        .prop_map(|(source, target, state, updates)| Event::Update {
            source,
            target,
            state,
            updates,
        });
    prop_oneof![ack, sync, reset, update].boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestFixture;
    use statebus_core::{decode_event, encode_event, merge_into};
    use statebus_sync::ConnectOptions;

    proptest! {
        #[test]
        fn test_wire_roundtrip(event in event(), key in "[a-z]{1,6}") {
            let wire = encode_event(&key, &event).unwrap();
            let decoded = decode_event(&key, &wire).unwrap();
            prop_assert_eq!(decoded, Some(event));
        }

        #[test]
        fn test_encoded_events_are_foreign_to_other_channels(event in event()) {
            let wire = encode_event("one", &event).unwrap();
            // Exact-segment matching: neither a different key nor a prefix
            // of the real key may see the message.
            prop_assert!(decode_event("two", &wire).unwrap().is_none());
            prop_assert!(decode_event("on", &wire).unwrap().is_none());
        }

        #[test]
        fn test_merge_overwrites_touched_and_retains_rest(
            base in state_map(),
            updates in state_map(),
        ) {
            let mut merged = base.clone();
            merge_into(&mut merged, &updates);

            for (key, value) in &updates {
                prop_assert_eq!(merged.get(key), Some(value));
            }
            for (key, value) in &base {
                if !updates.contains_key(key) {
                    prop_assert_eq!(merged.get(key), Some(value));
                }
            }
            for key in merged.keys() {
                prop_assert!(base.contains_key(key) || updates.contains_key(key));
            }
        }

        #[test]
        fn test_newcomer_converges_to_any_donor_state(initial in nonempty_state_map()) {
            let fixture = TestFixture::new();
            let donor = fixture.connect(
                "donor",
                ConnectOptions::new("prop").initial_state(initial.clone()),
            );
            let newbie = fixture.connect("newbie", ConnectOptions::new("prop"));
            fixture.settle();

            prop_assert_eq!(donor.state(), Some(initial.clone()));
            prop_assert_eq!(newbie.state(), Some(initial));
        }

        #[test]
        fn test_update_converges_even_when_duplicated(
            initial in nonempty_state_map(),
            updates in nonempty_state_map(),
        ) {
            let fixture = TestFixture::new();
            let a = fixture.connect(
                "alpha",
                ConnectOptions::new("prop").initial_state(initial.clone()),
            );
            let b = fixture.connect("beta", ConnectOptions::new("prop"));
            fixture.settle();

            prop_assert!(a.update(updates.clone()));
            // Deliver the update twice: merging is idempotent on the snapshot.
            for message in fixture.bus.drain() {
                fixture.bus.deliver(&message);
                fixture.bus.deliver(&message);
            }

            let mut expected = initial;
            merge_into(&mut expected, &updates);
            prop_assert_eq!(a.state(), Some(expected.clone()));
            prop_assert_eq!(b.state(), Some(expected));
        }
    }
}
