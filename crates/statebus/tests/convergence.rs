//! End-to-end convergence scenarios over the in-process bus.
//!
//! Every scenario drives real connections through the full wire path:
//! caller -> protocol -> channel -> wire string -> medium -> decode ->
//! protocol, with delivery pumped explicitly between steps.

use std::sync::{Arc, Mutex};

use serde_json::json;
use statebus::{
    connect, ConnectOptions, Connection, LocalBus, PeerId, StateMap, StateUpdate, SyncError,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn record(value: serde_json::Value) -> StateMap {
    value.as_object().cloned().unwrap()
}

#[derive(Clone, Default)]
struct UpdateLog(Arc<Mutex<Vec<StateUpdate>>>);

impl UpdateLog {
    fn callback(&self) -> impl Fn(&StateUpdate) + Send + Sync + 'static {
        let log = Arc::clone(&self.0);
        move |update: &StateUpdate| log.lock().unwrap().push(update.clone())
    }

    fn take(&self) -> Vec<StateUpdate> {
        std::mem::take(&mut self.0.lock().unwrap())
    }

    fn is_empty(&self) -> bool {
        self.0.lock().unwrap().is_empty()
    }
}

#[derive(Clone, Default)]
struct ErrorLog(Arc<Mutex<Vec<String>>>);

impl ErrorLog {
    fn callback(&self) -> impl Fn(&SyncError) + Send + Sync + 'static {
        let log = Arc::clone(&self.0);
        move |error: &SyncError| log.lock().unwrap().push(error.to_string())
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn is_empty(&self) -> bool {
        self.0.lock().unwrap().is_empty()
    }
}

struct Peer {
    conn: Connection,
    updates: UpdateLog,
    errors: ErrorLog,
}

fn peer(bus: &Arc<LocalBus>, name: &str, key: &str, initial: Option<StateMap>) -> Peer {
    let updates = UpdateLog::default();
    let errors = ErrorLog::default();
    let mut options = ConnectOptions::new(key)
        .peer_id(PeerId::named(name))
        .on_update(updates.callback())
        .on_error(errors.callback());
    if let Some(initial) = initial {
        options = options.initial_state(initial);
    }
    Peer {
        conn: connect(bus.clone(), options),
        updates,
        errors,
    }
}

#[test]
fn test_single_connection_initializes_updates_and_disconnects() {
    init_tracing();
    let bus = LocalBus::new();
    let initial = record(json!({"n": 1, "s": "whatever"}));
    let p = peer(&bus, "solo", "room", Some(initial.clone()));

    assert!(p.conn.connected());
    bus.deliver_pending();

    assert_eq!(p.conn.state(), Some(initial.clone()));
    // Own events never fire the update callback.
    assert!(p.updates.is_empty());
    assert!(p.errors.is_empty());

    assert!(p.conn.update(record(json!({"n": 2}))));
    bus.deliver_pending();

    assert_eq!(p.conn.state(), Some(record(json!({"n": 2, "s": "whatever"}))));
    assert!(p.updates.is_empty());
    assert!(p.errors.is_empty());

    p.conn.disconnect();
    assert!(!p.conn.connected());
}

#[test]
fn test_newbie_is_acknowledged_and_synced() {
    init_tracing();
    let bus = LocalBus::new();
    let initial = record(json!({"n": 1, "s": "whatever"}));
    let oldie = peer(&bus, "oldie", "room", Some(initial.clone()));
    bus.deliver_pending();

    let newbie = peer(&bus, "newbie", "room", None);
    assert!(newbie.conn.connected());
    bus.deliver_pending();

    assert_eq!(newbie.conn.state(), Some(initial.clone()));
    // Exactly one adoption callback, with no incremental part.
    assert_eq!(
        newbie.updates.take(),
        vec![StateUpdate {
            state: initial.clone(),
            updates: None,
        }]
    );
    assert!(newbie.errors.is_empty());

    assert!(oldie.conn.update(record(json!({"n": 2}))));
    bus.deliver_pending();

    let merged = record(json!({"n": 2, "s": "whatever"}));
    assert_eq!(newbie.conn.state(), Some(merged.clone()));
    assert_eq!(
        newbie.updates.take(),
        vec![StateUpdate {
            state: merged,
            updates: Some(record(json!({"n": 2}))),
        }]
    );
    assert!(newbie.errors.is_empty());

    newbie.conn.disconnect();
    assert!(!newbie.conn.connected());
}

#[test]
fn test_oldie_syncs_when_newbie_brings_initial_state() {
    init_tracing();
    let bus = LocalBus::new();
    let oldie = peer(&bus, "oldie", "room", None);
    bus.deliver_pending();

    let initial = record(json!({"n": 1, "s": "whatever"}));
    let newbie = peer(&bus, "newbie", "room", Some(initial.clone()));
    bus.deliver_pending();

    assert_eq!(oldie.conn.state(), Some(initial.clone()));
    assert_eq!(
        oldie.updates.take(),
        vec![StateUpdate {
            state: initial,
            updates: None,
        }]
    );
    // The newcomer only saw its own RESET loop back.
    assert!(newbie.updates.is_empty());
    assert!(oldie.errors.is_empty());
    assert!(newbie.errors.is_empty());
}

#[test]
fn test_updates_flow_both_ways_then_reset_overrides() {
    init_tracing();
    let bus = LocalBus::new();
    let initial = record(json!({"n": 1, "s": "x"}));
    let a = peer(&bus, "a", "k", Some(initial.clone()));
    let b = peer(&bus, "b", "k", None);
    bus.deliver_pending();
    assert_eq!(b.conn.state(), Some(initial));

    assert!(a.conn.update(record(json!({"n": 2}))));
    bus.deliver_pending();

    let after_a = record(json!({"n": 2, "s": "x"}));
    assert_eq!(a.conn.state(), Some(after_a.clone()));
    assert_eq!(b.conn.state(), Some(after_a));

    assert!(b.conn.update(record(json!({"s": "breaking change"}))));
    bus.deliver_pending();

    let after_b = record(json!({"n": 2, "s": "breaking change"}));
    assert_eq!(a.conn.state(), Some(after_b.clone()));
    assert_eq!(b.conn.state(), Some(after_b));

    let fresh = record(json!({"n": 3, "s": "y"}));
    a.conn.reset(fresh.clone());
    bus.deliver_pending();

    assert_eq!(a.conn.state(), Some(fresh.clone()));
    assert_eq!(b.conn.state(), Some(fresh));
    assert!(a.errors.is_empty());
    assert!(b.errors.is_empty());
}

#[test]
fn test_reset_reaches_peers_that_never_synced() {
    init_tracing();
    let bus = LocalBus::new();
    let lonely = peer(&bus, "lonely", "k", None);
    let resetter = peer(&bus, "resetter", "k", None);
    bus.deliver_pending();

    // Nobody had state to donate; both are still unsynced.
    assert_eq!(lonely.conn.state(), None);
    assert_eq!(resetter.conn.state(), None);

    let full = record(json!({"n": 3}));
    resetter.conn.reset(full.clone());
    bus.deliver_pending();

    assert_eq!(lonely.conn.state(), Some(full.clone()));
    assert_eq!(resetter.conn.state(), Some(full));
}

#[test]
fn test_first_sync_wins_over_later_donations() {
    init_tracing();
    let bus = LocalBus::new();
    let p = peer(&bus, "nb", "k", None);
    bus.drain();

    bus.deliver(r#"k@SYNC:{"sourcePeerId":"d1","targetPeerId":"nb","payload":{"state":{"n":1}}}"#);
    bus.deliver(r#"k@SYNC:{"sourcePeerId":"d2","targetPeerId":"nb","payload":{"state":{"n":2}}}"#);

    assert_eq!(p.conn.state(), Some(record(json!({"n": 1}))));
    // Only the first donation fired the callback.
    assert_eq!(p.updates.take().len(), 1);
}

#[test]
fn test_channel_keys_partition_traffic() {
    init_tracing();
    let bus = LocalBus::new();
    let k1 = peer(&bus, "p1", "k1", Some(record(json!({"n": 1}))));
    let k2 = peer(&bus, "p2", "k2", None);
    bus.deliver_pending();

    assert!(k1.conn.update(record(json!({"n": 2}))));
    bus.deliver_pending();

    // Nothing on k2: no state, no callbacks, no errors.
    assert_eq!(k2.conn.state(), None);
    assert!(k2.updates.is_empty());
    assert!(k2.errors.is_empty());
}

#[test]
fn test_prefix_channel_keys_stay_isolated() {
    init_tracing();
    let bus = LocalBus::new();
    let short = peer(&bus, "short", "a", None);
    let long = peer(&bus, "long", "ab", Some(record(json!({"n": 1}))));
    bus.deliver_pending();

    // "a" must not adopt "ab" traffic even though "ab" starts with "a".
    assert_eq!(short.conn.state(), None);
    assert!(short.updates.is_empty());
    assert!(short.errors.is_empty());
    assert_eq!(long.conn.state(), Some(record(json!({"n": 1}))));
}

#[test]
fn test_malformed_payload_is_advisory_and_state_survives() {
    init_tracing();
    let bus = LocalBus::new();
    let initial = record(json!({"n": 1}));
    let p = peer(&bus, "p", "k", Some(initial.clone()));
    bus.deliver_pending();

    bus.deliver("k@SYNC:this-is-not-json");
    bus.deliver(r#"k@NONSENSE:{"sourcePeerId":"x"}"#);

    let errors = p.errors.entries();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("parse"));
    assert!(errors[1].contains("invalid eventType"));
    // The snapshot is untouched and the connection keeps working.
    assert_eq!(p.conn.state(), Some(initial.clone()));
    assert!(p.conn.update(record(json!({"n": 2}))));
    bus.deliver_pending();
    assert_eq!(p.conn.state(), Some(record(json!({"n": 2}))));
}

#[test]
fn test_pool_converges_and_survives_one_disconnect() {
    init_tracing();
    let bus = LocalBus::new();
    let key = "pool";
    let good = record(json!({"n": 1, "s": "good"}));

    let pool: Vec<Peer> = (0..10)
        .map(|i| {
            let initial = match i {
                // A competing initial state; the later RESET wins everywhere.
                2 => Some(record(json!({"n": -1, "s": "not so good"}))),
                5 => Some(good.clone()),
                _ => None,
            };
            peer(&bus, &format!("pool-{i}"), key, initial)
        })
        .collect();
    bus.deliver_pending();

    for p in &pool {
        assert_eq!(p.conn.state(), Some(good.clone()));
    }

    assert!(pool[8].conn.update(record(json!({"n": 31337}))));
    bus.deliver_pending();

    let foo = record(json!({"n": 31337, "s": "good"}));
    for p in &pool {
        assert_eq!(p.conn.state(), Some(foo.clone()));
    }

    pool[7].conn.disconnect();
    assert!(pool[4].conn.update(record(json!({"s": "excellent"}))));
    bus.deliver_pending();

    let bar = record(json!({"n": 31337, "s": "excellent"}));
    for (i, p) in pool.iter().enumerate() {
        if i == 7 {
            // The disconnected peer stopped observing the channel.
            assert_eq!(p.conn.state(), Some(foo.clone()));
        } else {
            assert_eq!(p.conn.state(), Some(bar.clone()));
        }
        assert!(p.errors.is_empty());
    }
}

#[test]
fn test_duplicated_delivery_converges_to_same_state() {
    init_tracing();
    let bus = LocalBus::new();
    let p = peer(&bus, "p", "k", Some(record(json!({"n": 1, "s": "x"}))));
    bus.deliver_pending();

    let update =
        r#"k@UPDATE:{"sourcePeerId":"other","targetPeerId":"*","payload":{"state":{"n":2,"s":"x"},"updates":{"n":2}}}"#;
    bus.deliver(update);
    bus.deliver(update);

    // Merging the same update twice is idempotent on the snapshot.
    assert_eq!(p.conn.state(), Some(record(json!({"n": 2, "s": "x"}))));
    assert!(p.errors.is_empty());
}
