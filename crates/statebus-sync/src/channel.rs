//! Logical channels over the shared broadcast medium.
//!
//! A channel binds a key to the medium, encodes outbound events, and decodes,
//! filters, and dispatches inbound wire messages. Other channels' traffic is
//! invisible; decode failures are advisory errors.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use statebus_core::{decode_event, encode_event, Event};

use crate::error::SyncError;
use crate::medium::{BroadcastMedium, Subscription};

/// Handler invoked with every decoded event addressed to this channel.
pub type EventHandler = Box<dyn Fn(Event) + Send + Sync>;

/// Advisory error sink, shared by a channel and the connection that owns it.
pub type ErrorHandler = Arc<dyn Fn(&SyncError) + Send + Sync>;

/// Options for opening a channel.
pub struct ChannelOptions {
    /// Key partitioning this channel's traffic on the shared medium.
    pub channel_key: String,
    /// Receives every well-formed event on this channel, self-authored ones
    /// included.
    pub on_event: EventHandler,
    /// Receives advisory errors; `None` drops them silently.
    pub on_error: Option<ErrorHandler>,
}

/// A logical channel bound to a shared broadcast medium.
///
/// Cheap to clone; all clones share the same subscription and connected flag.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<ChannelInner>,
}

struct ChannelInner {
    key: String,
    medium: Arc<dyn BroadcastMedium>,
    connected: AtomicBool,
    subscription: Mutex<Option<Subscription>>,
    on_error: Option<ErrorHandler>,
}

impl ChannelInner {
    fn report(&self, error: SyncError) {
        tracing::warn!(channel = %self.key, %error, "channel error");
        if let Some(on_error) = &self.on_error {
            on_error(&error);
        }
    }
}

impl Channel {
    /// Open a channel on `medium`, subscribing its handler immediately.
    pub fn connect(medium: Arc<dyn BroadcastMedium>, options: ChannelOptions) -> Self {
        let ChannelOptions {
            channel_key,
            on_event,
            on_error,
        } = options;

        let inner = Arc::new(ChannelInner {
            key: channel_key,
            medium,
            connected: AtomicBool::new(true),
            subscription: Mutex::new(None),
            on_error,
        });

        let handler_inner = Arc::clone(&inner);
        let subscription = inner.medium.subscribe(Box::new(move |message: &str| {
            match decode_event(&handler_inner.key, message) {
                Ok(Some(event)) => on_event(event),
                // Another logical channel's traffic; invisible here.
                Ok(None) => {}
                Err(wire) => handler_inner.report(SyncError::Wire(wire)),
            }
        }));
        *inner.subscription.lock().unwrap() = Some(subscription);

        Self { inner }
    }

    /// This channel's key.
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Whether the channel is still subscribed to the medium.
    pub fn connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    /// Serialize `event` and publish it.
    ///
    /// A disconnected channel reports an advisory error but still attempts
    /// the publish.
    pub fn broadcast(&self, event: &Event) {
        if !self.connected() {
            self.inner.report(SyncError::Disconnected {
                channel: self.inner.key.clone(),
            });
        }
        match encode_event(&self.inner.key, event) {
            Ok(message) => self.inner.medium.publish(&message),
            Err(wire) => self.inner.report(SyncError::Wire(wire)),
        }
    }

    /// Unsubscribe from the medium. Idempotent. Later broadcasts raise the
    /// advisory error above.
    pub fn disconnect(&self) {
        self.inner.connected.store(false, Ordering::SeqCst);
        if let Some(subscription) = self.inner.subscription.lock().unwrap().take() {
            subscription.unsubscribe();
        }
    }
}
