//! Synchronous change event fan-out.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::event::ChangeEvent;

/// Change event callback.
///
/// Identity is the `Arc` allocation: subscribing the same `Arc` twice is a
/// no-op, and unsubscribing requires the same `Arc`.
pub type Subscriber = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Explicit event bus for change notification.
///
/// Owned by whoever wires the pipeline together and passed around by `Arc`.
/// Publishing invokes every subscriber synchronously on the calling thread.
#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Subscriber>>,
}

fn same_subscriber(a: &Subscriber, b: &Subscriber) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl EventBus {
    /// Create an empty event bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn subscribers(&self) -> std::sync::MutexGuard<'_, Vec<Subscriber>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a subscriber.
    ///
    /// Returns `false` if the subscriber was already registered.
    pub fn subscribe(&self, subscriber: &Subscriber) -> bool {
        let mut subscribers = self.subscribers();
        if subscribers.iter().any(|s| same_subscriber(s, subscriber)) {
            return false;
        }
        subscribers.push(Arc::clone(subscriber));
        true
    }

    /// Remove a subscriber.
    ///
    /// Returns `false` if the subscriber was not registered.
    pub fn unsubscribe(&self, subscriber: &Subscriber) -> bool {
        let mut subscribers = self.subscribers();
        let before = subscribers.len();
        subscribers.retain(|s| !same_subscriber(s, subscriber));
        subscribers.len() != before
    }

    /// Add a subscriber that is removed when the returned guard is dropped.
    pub fn subscribe_scoped(self: &Arc<Self>, subscriber: Subscriber) -> Subscription {
        self.subscribe(&subscriber);
        Subscription {
            bus: Arc::downgrade(self),
            subscriber: Some(subscriber),
        }
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }

    /// Invoke every subscriber with the event on the current thread.
    ///
    /// The subscriber list is snapshotted first, so callbacks may subscribe
    /// or unsubscribe without deadlocking.
    pub fn publish(&self, event: &ChangeEvent) {
        let subscribers: Vec<Subscriber> = self.subscribers().clone();
        tracing::trace!(kind = ?event.kind, path = ?event.path, "Publishing change");
        for subscriber in &subscribers {
            subscriber(event);
        }
    }

    /// Signal that content changed outside the watched directories.
    pub fn notify_content_changed(&self) {
        self.publish(&ChangeEvent::external());
    }
}

/// RAII guard for an [`EventBus`] subscription.
///
/// Dropping the guard unsubscribes. Holds only a weak reference to the bus,
/// so it never keeps a bus alive on its own.
pub struct Subscription {
    bus: Weak<EventBus>,
    subscriber: Option<Subscriber>,
}

impl Subscription {
    /// Unsubscribe immediately (consumes the guard).
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let (Some(subscriber), Some(bus)) = (self.subscriber.take(), self.bus.upgrade()) {
            bus.unsubscribe(&subscriber);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
