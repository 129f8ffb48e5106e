//! Broadcast medium abstraction.
//!
//! The medium is the only shared resource: every channel and every peer in a
//! process publishes to it and hears everything published on it, including
//! its own messages. Loopback delivery is REQUIRED — without it RESET-based
//! local adoption and the bootstrap path fail silently.
//!
//! Implementations may bridge to any transport that can carry strings. The
//! in-memory [`memory::LocalBus`] is the reference implementation and the one
//! the test suites drive.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Handler invoked for every raw message delivered by the medium.
pub type MessageHandler = Box<dyn Fn(&str) + Send + Sync>;

/// A shared broadcast medium carrying raw wire strings.
pub trait BroadcastMedium: Send + Sync {
    /// Publish a message to every subscriber, the publisher included.
    ///
    /// Delivery MUST happen as a later, independent step, never synchronously
    /// inside `publish`.
    fn publish(&self, message: &str);

    /// Register a handler for every delivered message. The returned guard
    /// removes the handler when unsubscribed or dropped.
    fn subscribe(&self, handler: MessageHandler) -> Subscription;
}

/// Guard for an active subscription; detaches the handler on
/// [`Subscription::unsubscribe`] or drop.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap a cancellation closure.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Detach the handler from the medium.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// A simple in-process broadcast medium.
///
/// Uses an explicit delivery queue to simulate asynchronous fan-out between
/// peers in the same process.
pub mod memory {
    use super::*;

    type SubscriberList = Mutex<Vec<(u64, Arc<dyn Fn(&str) + Send + Sync>)>>;

    /// In-process broadcast medium with queued delivery.
    ///
    /// `publish` only enqueues; [`LocalBus::deliver_pending`] fans each
    /// queued message out to every subscriber, the publisher included
    /// (guaranteed loopback). Tests drive delivery explicitly, which also
    /// makes reordering, duplication, and drops scriptable via
    /// [`LocalBus::drain`] and [`LocalBus::deliver`].
    pub struct LocalBus {
        subscribers: Arc<SubscriberList>,
        queue: Mutex<VecDeque<String>>,
        next_token: AtomicU64,
    }

    impl LocalBus {
        /// Create a new bus.
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Deliver one message to every current subscriber immediately.
        pub fn deliver(&self, message: &str) {
            // Snapshot the handlers so one may publish or unsubscribe while
            // the fan-out is in progress.
            let handlers: Vec<_> = self
                .subscribers
                .lock()
                .unwrap()
                .iter()
                .map(|(_, handler)| Arc::clone(handler))
                .collect();
            for handler in handlers {
                handler(message);
            }
        }

        /// Drain the queue in publish order, delivering each message to all
        /// subscribers. Messages published by handlers during the drain are
        /// delivered too. Returns the number of messages delivered.
        pub fn deliver_pending(&self) -> usize {
            let mut delivered = 0;
            loop {
                // Release the queue lock before fanning out so handlers may
                // publish replies.
                let message = self.queue.lock().unwrap().pop_front();
                let Some(message) = message else { break };
                self.deliver(&message);
                delivered += 1;
            }
            delivered
        }

        /// Remove and return all queued messages without delivering them.
        pub fn drain(&self) -> Vec<String> {
            self.queue.lock().unwrap().drain(..).collect()
        }

        /// Number of queued, undelivered messages.
        pub fn pending(&self) -> usize {
            self.queue.lock().unwrap().len()
        }

        /// Number of active subscriptions.
        pub fn subscriber_count(&self) -> usize {
            self.subscribers.lock().unwrap().len()
        }
    }

    impl Default for LocalBus {
        fn default() -> Self {
            Self {
                subscribers: Arc::new(Mutex::new(Vec::new())),
                queue: Mutex::new(VecDeque::new()),
                next_token: AtomicU64::new(0),
            }
        }
    }

    impl BroadcastMedium for LocalBus {
        fn publish(&self, message: &str) {
            self.queue.lock().unwrap().push_back(message.to_string());
        }

        fn subscribe(&self, handler: MessageHandler) -> Subscription {
            let token = self.next_token.fetch_add(1, Ordering::Relaxed);
            self.subscribers
                .lock()
                .unwrap()
                .push((token, Arc::from(handler)));

            let subscribers = Arc::downgrade(&self.subscribers);
            Subscription::new(move || {
                if let Some(list) = subscribers.upgrade() {
                    list.lock().unwrap().retain(|(t, _)| *t != token);
                }
            })
        }
    }
}
