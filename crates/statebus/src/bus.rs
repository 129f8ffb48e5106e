//! Top-level connection entry points.

use std::sync::Arc;

use statebus_store::StateStore;
use statebus_sync::{BroadcastMedium, ConnectOptions, Connection};

/// Open a connection on `medium`.
///
/// Use [`ConnectOptions::default`] to join the default channel
/// ([`statebus_sync::DEFAULT_CHANNEL_KEY`]), or name one with
/// [`ConnectOptions::new`].
///
/// ```rust
/// use statebus::{connect, ConnectOptions, LocalBus};
///
/// let bus = LocalBus::new();
/// let conn = connect(bus.clone(), ConnectOptions::default());
/// assert!(conn.connected());
/// ```
pub fn connect(medium: Arc<dyn BroadcastMedium>, options: ConnectOptions) -> Connection {
    Connection::connect(medium, options)
}

/// Open a connection over a caller-supplied state holder.
///
/// A holder that already carries a snapshot bootstraps the channel the same
/// way an initial state does: by announcing it via RESET.
pub fn connect_with_store<S: StateStore + 'static>(
    medium: Arc<dyn BroadcastMedium>,
    store: S,
    options: ConnectOptions,
) -> Connection<S> {
    Connection::connect_with_store(medium, store, options)
}
