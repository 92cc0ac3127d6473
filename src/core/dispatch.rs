//! # Watch dispatcher: lifecycle reactions after every accepted mutation.
//!
//! Runs inline on the actor task, observing the pre-action snapshot against
//! the post-action record. Reactions fire in a fixed order, and all of them
//! complete before the next action is dequeued:
//!
//! ```text
//! 1. PUBLISHERS_ON_START     started flipped on → start a pump per publisher
//! 2. PUBLISHERS_ON_CHANGE    close detached publisher channels;
//!                            start pumps for publishers added while running
//! 3. SUBSCRIBERS_ON_START    started flipped on → emitter(empty, state)
//!                            delivered to every current subscriber
//! 4. SUBSCRIBERS_ON_CHANGE   close detached subscriber channels; catch-up
//!                            emission to newly added subscribers only
//! 5. ALL_SUBSCRIBERS_REMOVED last subscriber gone while running → implode
//! 6. STATE_CHANGE            state changed while running →
//!                            emitter(old, new) delivered to all subscribers
//! ```
//!
//! ## Rules
//! - "While running" means `started` was true before **and** after the
//!   action; the start transition itself is served by reactions 1 and 3
//!   only, so the initial emission is delivered exactly once.
//! - A fresh subscriber always sees the world as if transitioning from
//!   nothing: its first messages are `emitter(empty, current)`.
//! - Emission awaits subscriber channel capacity; a full subscriber blocks
//!   the actor task. That is the backpressure policy.
//! - Sends into externally closed channels are swallowed; the close-watcher
//!   removes the entry.
//! - Emitter failures propagate as actor-level faults (supervisor path).
//! - Detached endpoints staged by remove actions are closed here regardless
//!   of `started`; the running-only predicates gate pumps and emissions, not
//!   resource release.

use tokio::sync::mpsc;

use crate::core::actor::StateActor;
use crate::core::pump::{spawn_close_watcher, spawn_pump};
use crate::core::record::Snapshot;
use crate::error::FaultError;
use crate::events::EventKind;

/// What the actor loop does after reactions settle.
pub(crate) enum Flow {
    Continue,
    Imploded,
}

impl<S, I, O> StateActor<S, I, O>
where
    S: Clone + Default + PartialEq + Send + Sync + 'static,
    I: Send + 'static,
    O: Clone + Send + Sync + 'static,
{
    /// Fires every reaction whose predicate holds, in the fixed order above.
    pub(crate) async fn react(&mut self, before: &Snapshot<S>) -> Result<Flow, FaultError> {
        let started_now = self.record.started;
        let started_transition = !before.started && started_now;
        let was_running = before.started && started_now;

        // 1. PUBLISHERS_ON_START
        if started_transition {
            self.start_pending_pumps();
        }

        // 2. PUBLISHERS_ON_CHANGE
        let retired = std::mem::take(&mut self.record.retired_publishers);
        for (ident, entry) in retired {
            entry.cancel.cancel();
            drop(entry); // an unstarted receiver closes right here
            self.publish(self.event(EventKind::PublisherRemoved).with_ident(&ident));
        }
        if was_running {
            self.start_pending_pumps();
        }
        for ident in self.record.publishers.keys() {
            if !before.publishers.contains(ident) {
                self.publish(self.event(EventKind::PublisherAdded).with_ident(ident));
            }
        }

        // 3. SUBSCRIBERS_ON_START
        if started_transition && !self.record.subscribers.is_empty() {
            let messages = (self.record.emitter)(&S::default(), &self.record.state)?;
            for entry in self.record.subscribers.values() {
                deliver(&entry.sender, &messages).await;
            }
        }

        // 4. SUBSCRIBERS_ON_CHANGE
        let retired = std::mem::take(&mut self.record.retired_subscribers);
        for (ident, entry) in retired {
            entry.cancel.cancel();
            drop(entry.sender);
            self.publish(self.event(EventKind::SubscriberRemoved).with_ident(&ident));
        }
        self.start_pending_watchers();
        let added: Vec<String> = self
            .record
            .subscribers
            .keys()
            .filter(|ident| !before.subscribers.contains(*ident))
            .cloned()
            .collect();
        for ident in &added {
            self.publish(self.event(EventKind::SubscriberAdded).with_ident(ident));
        }
        if was_running && !added.is_empty() {
            let messages = (self.record.emitter)(&S::default(), &self.record.state)?;
            for ident in &added {
                if let Some(entry) = self.record.subscribers.get(ident) {
                    deliver(&entry.sender, &messages).await;
                }
            }
        }

        // 5. ALL_SUBSCRIBERS_REMOVED
        if was_running && self.record.subscribers.is_empty() && !before.subscribers.is_empty() {
            self.implode();
            return Ok(Flow::Imploded);
        }

        // 6. STATE_CHANGE
        if was_running && self.record.state != before.state {
            if !self.record.subscribers.is_empty() {
                let messages = (self.record.emitter)(&before.state, &self.record.state)?;
                for entry in self.record.subscribers.values() {
                    deliver(&entry.sender, &messages).await;
                }
            }
            self.publish(self.event(EventKind::StateChanged));
        }

        if started_transition {
            self.publish(self.event(EventKind::ReactorStarted));
        }

        Ok(Flow::Continue)
    }

    /// Starts a pump for every publisher entry that still holds its receiver.
    ///
    /// Idempotent: entries whose pump is already running are skipped, so the
    /// start transition and later churn can both call this safely.
    fn start_pending_pumps(&mut self) {
        let reactor = self.reactor.clone();
        for (ident, entry) in self.record.publishers.iter_mut() {
            if let Some(receiver) = entry.receiver.take() {
                spawn_pump(
                    ident.clone(),
                    receiver,
                    entry.cancel.clone(),
                    reactor.clone(),
                );
            }
        }
    }

    /// Spawns a close-watcher for every subscriber entry that lacks one.
    ///
    /// Watchers run from attach time, not from `start`: an externally closed
    /// subscriber is auto-removed even on a reactor that never started.
    fn start_pending_watchers(&mut self) {
        let reactor = self.reactor.clone();
        for (ident, entry) in self.record.subscribers.iter_mut() {
            if !entry.watched {
                entry.watched = true;
                spawn_close_watcher(
                    ident.clone(),
                    entry.sender.clone(),
                    entry.cancel.clone(),
                    reactor.clone(),
                );
            }
        }
    }
}

/// Writes messages into one subscriber channel, in emitter-output order.
///
/// Blocks on a full channel (backpressure); stops silently on a closed one.
async fn deliver<O: Clone>(sender: &mpsc::Sender<O>, messages: &[O]) {
    for message in messages {
        if sender.send(message.clone()).await.is_err() {
            break;
        }
    }
}
