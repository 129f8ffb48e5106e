//! Peer synchronization state machine.
//!
//! Each connection composes one state holder with one channel and converges
//! with every other peer sharing the channel key. A connection is UNSYNCED
//! until its holder accepts a value — from a donor's SYNC, from any RESET, or
//! from its own seeded initial state — and SYNCED afterwards.

use std::sync::{Arc, Mutex, OnceLock};

use statebus_core::{Event, EventKind, PeerId, StateMap, StateUpdate, Target};
use statebus_store::{ApplyOutcome, MemoryStore, StateStore};

use crate::channel::{Channel, ChannelOptions, ErrorHandler};
use crate::error::SyncError;
use crate::medium::BroadcastMedium;

/// Channel key used when the caller does not name one.
pub const DEFAULT_CHANNEL_KEY: &str = "@@statebus";

/// Handler invoked whenever a foreign event changes the local snapshot.
pub type UpdateHandler = Arc<dyn Fn(&StateUpdate) + Send + Sync>;

/// Options for opening a connection.
pub struct ConnectOptions {
    channel_key: String,
    initial_state: Option<StateMap>,
    peer_id: Option<PeerId>,
    on_update: Option<UpdateHandler>,
    on_error: Option<ErrorHandler>,
}

impl ConnectOptions {
    /// Options for `channel_key` with no initial state and no callbacks.
    pub fn new(channel_key: impl Into<String>) -> Self {
        Self {
            channel_key: channel_key.into(),
            initial_state: None,
            peer_id: None,
            on_update: None,
            on_error: None,
        }
    }

    /// Seed the connection with a full state record. The connection will
    /// announce it to the channel via RESET on creation.
    pub fn initial_state(mut self, state: StateMap) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Fix the peer id instead of generating a random one. Intended for
    /// deterministic tests.
    pub fn peer_id(mut self, peer_id: PeerId) -> Self {
        self.peer_id = Some(peer_id);
        self
    }

    /// Called whenever a foreign event changes the local snapshot.
    pub fn on_update(mut self, handler: impl Fn(&StateUpdate) + Send + Sync + 'static) -> Self {
        self.on_update = Some(Arc::new(handler));
        self
    }

    /// Called with advisory errors (decode failures, usage errors).
    pub fn on_error(mut self, handler: impl Fn(&SyncError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(handler));
        self
    }
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_KEY)
    }
}

/// One peer on one channel: the unit of ownership binding a peer id, a state
/// holder, and a channel.
pub struct Connection<S: StateStore = MemoryStore> {
    inner: Arc<ConnectionInner<S>>,
    channel: Channel,
}

struct ConnectionInner<S: StateStore> {
    peer_id: PeerId,
    channel_key: String,
    store: Mutex<S>,
    // Set once right after the channel subscribes; the event handler needs it
    // to answer ACKNOWLEDGE requests.
    channel: OnceLock<Channel>,
    on_update: Option<UpdateHandler>,
    on_error: Option<ErrorHandler>,
}

impl Connection<MemoryStore> {
    /// Open a connection with the default in-memory holder.
    pub fn connect(medium: Arc<dyn BroadcastMedium>, options: ConnectOptions) -> Self {
        Self::connect_with_store(medium, MemoryStore::new(), options)
    }
}

impl<S: StateStore + 'static> Connection<S> {
    /// Open a connection over a caller-supplied holder.
    ///
    /// If the options carry an initial state it is seeded into the holder
    /// first. A connection whose holder ends up non-empty announces that
    /// snapshot to the channel via RESET; an empty one broadcasts a
    /// self-addressed ACKNOWLEDGE to request a donor.
    pub fn connect_with_store(
        medium: Arc<dyn BroadcastMedium>,
        mut store: S,
        options: ConnectOptions,
    ) -> Self {
        let ConnectOptions {
            channel_key,
            initial_state,
            peer_id,
            on_update,
            on_error,
        } = options;

        let peer_id = peer_id.unwrap_or_else(PeerId::random);
        if let Some(initial) = initial_state {
            store.sync(initial, true);
        }
        let bootstrap = store.snapshot().cloned();

        let inner = Arc::new(ConnectionInner {
            peer_id: peer_id.clone(),
            channel_key: channel_key.clone(),
            store: Mutex::new(store),
            channel: OnceLock::new(),
            on_update,
            on_error: on_error.clone(),
        });

        let handler_inner = Arc::clone(&inner);
        let channel = Channel::connect(
            medium,
            ChannelOptions {
                channel_key,
                on_event: Box::new(move |event| handler_inner.handle_event(event)),
                on_error,
            },
        );
        let _ = inner.channel.set(channel.clone());

        let connection = Self { inner, channel };
        match bootstrap {
            // Local adoption happens only when this RESET loops back, through
            // the same acceptance path remote resets take.
            Some(state) => connection.reset(state),
            None => connection.request_sync(),
        }
        connection
    }

    /// This connection's peer id.
    pub fn peer_id(&self) -> &PeerId {
        &self.inner.peer_id
    }

    /// The channel key this connection is bound to.
    pub fn channel_key(&self) -> &str {
        &self.inner.channel_key
    }

    /// Whether the underlying channel is still subscribed to the medium.
    pub fn connected(&self) -> bool {
        self.channel.connected()
    }

    /// The current local snapshot, if any value has been accepted yet.
    pub fn state(&self) -> Option<StateMap> {
        self.inner.store.lock().unwrap().snapshot().cloned()
    }

    /// Merge `updates` into the local snapshot and announce the result to all
    /// peers.
    ///
    /// Fails (returns `false` and reports through the error callback) if the
    /// channel is disconnected, the holder has not synced yet, or the merge
    /// did not apply. On success the local state is already merged when this
    /// returns; other peers converge once the event reaches them.
    pub fn update(&self, updates: StateMap) -> bool {
        if !self.channel.connected() {
            self.inner.report(SyncError::Disconnected {
                channel: self.inner.channel_key.clone(),
            });
            return false;
        }

        let merged = {
            let mut store = self.inner.store.lock().unwrap();
            if store.snapshot().is_none() {
                drop(store);
                self.inner.report(SyncError::NotSynced {
                    channel: self.inner.channel_key.clone(),
                });
                return false;
            }
            store.update(&updates).into_state()
        };
        let Some(state) = merged else {
            self.inner.report(SyncError::StateUnavailable {
                channel: self.inner.channel_key.clone(),
            });
            return false;
        };

        self.channel.broadcast(&Event::Update {
            source: self.inner.peer_id.clone(),
            target: Some(Target::All),
            state,
            updates: Some(updates),
        });
        true
    }

    /// Broadcast an unconditional full-state replacement to every peer,
    /// this connection included.
    ///
    /// Has no synchronous local effect: the local snapshot is replaced when
    /// the broadcast loops back, so a competing reset observed in between is
    /// resolved by the same rule on every peer.
    pub fn reset(&self, state: StateMap) {
        self.channel.broadcast(&Event::Reset {
            source: self.inner.peer_id.clone(),
            target: Some(Target::All),
            state,
        });
    }

    /// Unsubscribe from the medium. Idempotent.
    pub fn disconnect(&self) {
        self.channel.disconnect();
    }

    fn request_sync(&self) {
        tracing::debug!(
            peer = %self.inner.peer_id,
            channel = %self.inner.channel_key,
            "requesting snapshot from peers"
        );
        self.channel.broadcast(&Event::Acknowledge {
            source: self.inner.peer_id.clone(),
            target: Some(Target::Peer(self.inner.peer_id.clone())),
        });
    }
}

impl<S: StateStore> ConnectionInner<S> {
    fn report(&self, error: SyncError) {
        if let Some(on_error) = &self.on_error {
            on_error(&error);
        }
    }

    fn handle_event(&self, event: Event) {
        let self_emitted = event.source() == &self.peer_id;
        // RESET is exempt from the self-emission filter: the originator may
        // observe a competing reset between broadcasting its own and seeing
        // it loop back, so adoption must go through the same acceptance path
        // on every recipient, originator included.
        if self_emitted && event.kind() != EventKind::Reset {
            return;
        }

        match event {
            Event::Acknowledge { target, .. } => self.handle_acknowledge(target),
            Event::Sync { target, state, .. } => {
                self.handle_snapshot(target, state, false, self_emitted)
            }
            Event::Reset { target, state, .. } => {
                self.handle_snapshot(target, state, true, self_emitted)
            }
            Event::Update { updates, .. } => self.handle_update(updates),
        }
    }

    /// Donate the current snapshot to a requesting peer. A peer with nothing
    /// to offer stays silent; duplicate donations are harmless because plain
    /// SYNC acceptance is first-sync-wins.
    fn handle_acknowledge(&self, target: Option<Target>) {
        let snapshot = self.store.lock().unwrap().snapshot().cloned();
        let Some(state) = snapshot else { return };
        let Some(channel) = self.channel.get() else {
            return;
        };

        tracing::debug!(peer = %self.peer_id, "donating snapshot");
        channel.broadcast(&Event::Sync {
            source: self.peer_id.clone(),
            target,
            state,
        });
    }

    fn handle_snapshot(
        &self,
        target: Option<Target>,
        state: StateMap,
        forced: bool,
        self_emitted: bool,
    ) {
        let addressed = matches!(&target, Some(t) if t.includes(&self.peer_id));
        if !addressed {
            return;
        }

        let outcome = self.store.lock().unwrap().sync(state, forced);
        let ApplyOutcome::Applied(state) = outcome else {
            return;
        };

        tracing::debug!(peer = %self.peer_id, forced, "adopted full snapshot");
        if !self_emitted {
            if let Some(on_update) = &self.on_update {
                on_update(&StateUpdate {
                    state,
                    updates: None,
                });
            }
        }
    }

    fn handle_update(&self, updates: Option<StateMap>) {
        let Some(updates) = updates else { return };

        let outcome = self.store.lock().unwrap().update(&updates);
        let ApplyOutcome::Applied(state) = outcome else {
            return;
        };

        if let Some(on_update) = &self.on_update {
            on_update(&StateUpdate {
                state,
                updates: Some(updates),
            });
        }
    }
}
