//! # StateActor: the single writer behind a reactor.
//!
//! One spawned task owns the [`ReactorRecord`] and pulls [`Action`]s from the
//! FIFO mailbox. At most one action executes at a time; the watch dispatcher
//! runs inline after each accepted mutation, **before** the next action is
//! dequeued, so reactions observe exactly the transition that triggered them.
//!
//! ## Execution flow
//! ```text
//! loop {
//!   ├─► dequeue action
//!   ├─► snapshot record                (old side of the dispatcher diff)
//!   ├─► execute action
//!   │     ├─► fast lane: run inline
//!   │     └─► blocking lane: clone state out, run under spawn_blocking
//!   │           (panic → FaultError::Panicked via the join error)
//!   ├─► Ok  → watch dispatcher reactions (may enqueue more actions)
//!   ├─► Err → publish ActionFailed → supervisor recovery
//!   │           ├─► backoff entry available → reboot, continue loop
//!   │           └─► backoff exhausted       → implode, exit task
//!   └─► republish view, decrement pending depth
//! }
//! ```
//!
//! ## Rules
//! - The pending-depth counter decrements only after an action **and its
//!   reactions** finish, so `settle()` cannot wake while follow-up work
//!   exists.
//! - The mailbox never closes from the sender side (pumps and the handle
//!   hold senders); the loop exits only through implosion.

use std::borrow::Cow;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::action::Action;
use crate::core::dispatch::Flow;
use crate::core::reactor::Reactor;
use crate::core::record::{Phase, ReactorRecord};
use crate::core::supervisor::Recovery;
use crate::error::FaultError;
use crate::events::{Bus, Event, EventKind};

/// Owns the record and serializes every mutation.
pub(crate) struct StateActor<S, I, O> {
    pub(crate) record: ReactorRecord<S, I, O>,
    pub(crate) mailbox: mpsc::UnboundedReceiver<Action<S, I, O>>,
    pub(crate) reactor: Reactor<S, I, O>,
    pub(crate) bus: Bus,
    pub(crate) name: Cow<'static, str>,
    pub(crate) phase: Phase,
    /// Cancelled when the actor exits; stops the observer bridge.
    pub(crate) runtime_token: CancellationToken,
}

impl<S, I, O> StateActor<S, I, O>
where
    S: Clone + Default + PartialEq + Send + Sync + 'static,
    I: Send + 'static,
    O: Clone + Send + Sync + 'static,
{
    pub fn new(
        record: ReactorRecord<S, I, O>,
        mailbox: mpsc::UnboundedReceiver<Action<S, I, O>>,
        reactor: Reactor<S, I, O>,
        bus: Bus,
        name: Cow<'static, str>,
        runtime_token: CancellationToken,
    ) -> Self {
        Self {
            record,
            mailbox,
            reactor,
            bus,
            name,
            phase: Phase::Created,
            runtime_token,
        }
    }

    /// Runs the actor until implosion.
    pub async fn run(mut self) {
        while let Some(action) = self.mailbox.recv().await {
            let label = action.label();
            let before = self.record.snapshot();

            let outcome = match self.execute(action).await {
                Ok(()) => self.react(&before).await,
                Err(fault) => Err(fault),
            };

            match outcome {
                Ok(Flow::Continue) => self.finish_action(),
                Ok(Flow::Imploded) => {
                    self.finish_implosion();
                    return;
                }
                Err(fault) => {
                    self.publish(
                        self.event(EventKind::ActionFailed)
                            .with_error(format!("{label}: {fault}")),
                    );
                    match self.recover().await {
                        Recovery::Rebooted => self.finish_action(),
                        Recovery::Imploded => {
                            self.finish_implosion();
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Executes a single action against the record.
    async fn execute(&mut self, action: Action<S, I, O>) -> Result<(), FaultError> {
        match action {
            Action::Fast { op, .. } => op(&mut self.record),

            Action::Start => {
                let init = self.record.initializer.clone();
                let state = run_blocking(move || init()).await??;
                self.record.state = state;
                self.record.started = true;
                if self.phase == Phase::Created {
                    self.phase = Phase::Running;
                }
                Ok(())
            }

            Action::Reinit => {
                let init = self.record.initializer.clone();
                let state = run_blocking(move || init()).await??;
                self.record.state = state;
                self.phase = Phase::Running;
                self.publish(
                    self.event(EventKind::RebootCompleted)
                        .with_restarts(self.record.restarts),
                );
                Ok(())
            }

            Action::Reduce { ident, message } => {
                let reducer = self.record.reducer.clone();
                let state = self.record.state.clone();
                let handle = self.reactor.clone();
                let next =
                    run_blocking(move || reducer(&handle, state, &ident, message)).await??;
                self.record.state = next;
                Ok(())
            }

            Action::UpdateBlocking { op } => {
                let state = self.record.state.clone();
                let next = run_blocking(move || op(state)).await?;
                self.record.state = next;
                Ok(())
            }

            Action::Reboot => Err(FaultError::RebootRequested),
        }
    }

    /// Republished view + pending decrement after an action fully settles.
    fn finish_action(&mut self) {
        self.reactor.publish_view(self.record.view(self.phase));
        self.reactor.dec_pending(1);
    }

    /// Final bookkeeping after implosion: reject new actions, discard the
    /// queue, release every `settle()` waiter, stop the observer bridge.
    fn finish_implosion(&mut self) {
        self.mailbox.close();
        while self.mailbox.try_recv().is_ok() {}
        self.reactor.publish_view(self.record.view(self.phase));
        self.reactor.zero_pending();
        self.runtime_token.cancel();
    }

    /// Event pre-tagged with this reactor's name.
    pub(crate) fn event(&self, kind: EventKind) -> Event {
        Event::now(kind).with_reactor(self.name.as_ref())
    }

    pub(crate) fn publish(&self, ev: Event) {
        self.bus.publish(ev);
    }
}

/// Runs caller code on the blocking pool, mapping panics to faults.
async fn run_blocking<T>(f: impl FnOnce() -> T + Send + 'static) -> Result<T, FaultError>
where
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|join_err| {
        if join_err.is_panic() {
            FaultError::Panicked {
                reason: panic_reason(join_err.into_panic()),
            }
        } else {
            FaultError::Panicked {
                reason: "blocking task cancelled".to_string(),
            }
        }
    })
}

/// Best-effort extraction of a panic payload message.
pub(crate) fn panic_reason(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
