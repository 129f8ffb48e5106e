//! Test fixtures and helpers.
//!
//! Common setup code for protocol scenarios: one shared bus, named peers,
//! and recorders for the user callbacks.

use std::sync::{Arc, Mutex};

use statebus_core::{PeerId, StateMap, StateUpdate};
use statebus_sync::{ConnectOptions, Connection, LocalBus, SyncError};

/// Build a [`StateMap`] from a `serde_json::json!` object literal.
///
/// Panics when handed anything but a JSON object; fixtures are test support.
pub fn state(value: serde_json::Value) -> StateMap {
    value
        .as_object()
        .cloned()
        .expect("state fixtures must be JSON objects")
}

/// A test fixture with a shared in-process bus.
pub struct TestFixture {
    pub bus: Arc<LocalBus>,
}

impl TestFixture {
    /// Create a fixture with a fresh bus.
    pub fn new() -> Self {
        Self {
            bus: LocalBus::new(),
        }
    }

    /// Open a connection with a deterministic peer id.
    pub fn connect(&self, name: &str, options: ConnectOptions) -> Connection {
        Connection::connect(self.bus.clone(), options.peer_id(PeerId::named(name)))
    }

    /// Open `count` peers named `peer-0..` on one channel, no initial state.
    pub fn connect_pool(&self, channel_key: &str, count: usize) -> Vec<Connection> {
        (0..count)
            .map(|i| self.connect(&format!("peer-{i}"), ConnectOptions::new(channel_key)))
            .collect()
    }

    /// Pump the bus until no messages remain. Returns the delivered count.
    pub fn settle(&self) -> usize {
        self.bus.deliver_pending()
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Records every update callback invocation.
#[derive(Clone, Default)]
pub struct UpdateRecorder {
    log: Arc<Mutex<Vec<StateUpdate>>>,
}

impl UpdateRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback suitable for [`ConnectOptions::on_update`].
    pub fn callback(&self) -> impl Fn(&StateUpdate) + Send + Sync + 'static {
        let log = Arc::clone(&self.log);
        move |update: &StateUpdate| log.lock().unwrap().push(update.clone())
    }

    /// Drain and return everything recorded so far.
    pub fn take(&self) -> Vec<StateUpdate> {
        std::mem::take(&mut self.log.lock().unwrap())
    }

    pub fn count(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.lock().unwrap().is_empty()
    }
}

/// Records every advisory error as its display string.
#[derive(Clone, Default)]
pub struct ErrorRecorder {
    log: Arc<Mutex<Vec<String>>>,
}

impl ErrorRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback suitable for [`ConnectOptions::on_error`].
    pub fn callback(&self) -> impl Fn(&SyncError) + Send + Sync + 'static {
        let log = Arc::clone(&self.log);
        move |error: &SyncError| log.lock().unwrap().push(error.to_string())
    }

    pub fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.log.lock().unwrap().is_empty()
    }
}
