//! Broadcast channel for in-process events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. Content
//! mutations publish [`super::SiteEvent`]s for the WebSocket feed; the auth
//! service publishes [`super::AuthEvent`]s for session holders. Both use
//! this one type.

use tokio::sync::broadcast;

/// Broadcast bus for events of type `E`.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity
/// (`EVENT_BUS_CAPACITY`, default 1024). When the ring buffer is full, the
/// oldest events are dropped for lagging receivers.
#[derive(Debug)]
pub struct EventBus<E> {
    sender: broadcast::Sender<E>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<E: Clone> EventBus<E> {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event.
    /// If there are no active receivers, the event is silently dropped.
    pub fn publish(&self, event: E) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a new receiver that will receive all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
