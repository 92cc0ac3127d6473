//! # Event bus for broadcasting reactor lifecycle events.
//!
//! [`Bus`] is a wrapper around [`tokio::sync::broadcast`] that lets the state
//! actor, the watch dispatcher, and the supervisor broadcast [`Event`]s to
//! any number of listeners.
//!
//! ## Key characteristics
//! - **Broadcast semantics**: all active listeners receive a clone of each event
//! - **Non-persistent**: events are lost if there are no active listeners
//! - **Bounded capacity**: old events are dropped when the channel is full
//!
//! This is used internally to deliver lifecycle events to the observer
//! workers; tests subscribe to it directly.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for reactor lifecycle events.
#[derive(Clone)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publishes an event to all active listeners.
    ///
    /// If there are no active listeners, the event is dropped silently; a
    /// reactor operates fine without observers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new listener that will receive all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
