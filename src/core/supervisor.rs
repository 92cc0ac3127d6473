//! # Supervisor: crash recovery and implosion.
//!
//! The supervisor is the error handler of the state actor. When an action
//! raises, recovery runs **inside the actor task** — the reactor is a single
//! writer even while crashing:
//!
//! ```text
//! ActionFailed
//!   └─► recover()
//!         ├─► backoff.next() == None
//!         │     └─► BackoffExhausted → implode() → actor exits
//!         └─► backoff.next() == Some(delay)
//!               ├─► publish RebootScheduled {delay, restarts}
//!               ├─► sleep(delay)
//!               ├─► drain mailbox (the old incarnation's queued work)
//!               ├─► state ← empty, restarts += 1
//!               └─► enqueue re-init → initializer runs as a normal action
//! ```
//!
//! The restart is a **full logical reboot, not a retry**: queued actions are
//! dropped, state is rebuilt by the initializer, and the re-initialized
//! state flows to subscribers through the ordinary state-change reaction
//! (the post-swap old state is empty, so subscribers receive a catch-up
//! emission). A failing initializer faults the re-init action and re-enters
//! recovery, consuming another backoff entry.
//!
//! Publisher pumps are untouched by reboots: they are keyed to publisher
//! entries and keep feeding the restarted actor.
//!
//! ## Implosion
//! Irreversible teardown, executed once, swallowing per-step failures:
//! 1. close every subscriber channel,
//! 2. close every publisher channel,
//! 3. invoke every destructor in ascending ident order
//!    (panics are caught and published as `DestructorPanicked`).

use std::panic::{catch_unwind, AssertUnwindSafe};

use tokio::time;

use crate::core::actor::{panic_reason, StateActor};
use crate::core::record::Phase;
use crate::events::EventKind;

/// Outcome of one recovery pass.
pub(crate) enum Recovery {
    /// A backoff entry was consumed; the re-init action is queued.
    Rebooted,
    /// The backoff sequence is exhausted; the reactor is gone.
    Imploded,
}

impl<S, I, O> StateActor<S, I, O>
where
    S: Clone + Default + PartialEq + Send + Sync + 'static,
    I: Send + 'static,
    O: Clone + Send + Sync + 'static,
{
    /// Handles one fault: schedule a reboot or implode on exhaustion.
    pub(crate) async fn recover(&mut self) -> Recovery {
        self.phase = Phase::Faulted;
        self.reactor.publish_view(self.record.view(self.phase));

        match self.record.backoff.next() {
            None => {
                self.publish(self.event(EventKind::BackoffExhausted));
                self.implode();
                Recovery::Imploded
            }
            Some(delay) => {
                self.publish(
                    self.event(EventKind::RebootScheduled)
                        .with_delay(delay)
                        .with_restarts(self.record.restarts),
                );
                self.phase = Phase::Rebooting;
                self.reactor.publish_view(self.record.view(self.phase));

                time::sleep(delay).await;

                // Discard everything the old incarnation had queued.
                let mut drained: u64 = 0;
                while self.mailbox.try_recv().is_ok() {
                    drained += 1;
                }
                self.reactor.dec_pending(drained);

                self.record.state = S::default();
                self.record.restarts += 1;
                self.reactor.enqueue_reinit();
                Recovery::Rebooted
            }
        }
    }

    /// Irreversible teardown; also used by the all-subscribers-removed
    /// reaction.
    pub(crate) fn implode(&mut self) {
        // 1. subscriber channels
        let retired = std::mem::take(&mut self.record.retired_subscribers);
        let subscribers = std::mem::take(&mut self.record.subscribers);
        for (_ident, entry) in retired.into_iter().chain(subscribers) {
            entry.cancel.cancel();
            drop(entry.sender);
        }

        // 2. publisher channels (cancel ends the pump, which drops the
        //    receiver; unstarted receivers drop with the entry)
        let retired = std::mem::take(&mut self.record.retired_publishers);
        let publishers = std::mem::take(&mut self.record.publishers);
        for (_ident, entry) in retired.into_iter().chain(publishers) {
            entry.cancel.cancel();
        }

        // 3. destructors, ascending ident order, failures swallowed
        let destructors = std::mem::take(&mut self.record.destructors);
        for (ident, destructor) in destructors {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(destructor)) {
                self.publish(
                    self.event(EventKind::DestructorPanicked)
                        .with_ident(&ident)
                        .with_error(panic_reason(payload)),
                );
            }
        }

        self.phase = Phase::Imploded;
        self.publish(self.event(EventKind::Imploded));
    }
}
