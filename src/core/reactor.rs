//! # Reactor: the public handle.
//!
//! A [`Reactor`] is a cheap clonable handle to the state actor of one
//! reactor. All mutating operations **enqueue** an action and return `&Self`
//! for chaining; effects are applied asynchronously by the actor, in
//! submission order. Reads come from a snapshot republished after every
//! completed action, so they only ever observe fully applied mutations.
//!
//! ```text
//! caller ──enqueue──► mailbox ──► state actor ──► watch dispatcher
//!    ▲                                │
//!    └──── view snapshot (watch) ◄────┘
//! ```
//!
//! ## Rules
//! - Enqueue operations never fail and never block; after implosion they
//!   become silent no-ops that still return the handle.
//! - [`settle`](Reactor::settle) waits until the mailbox is quiescent,
//!   **including actions enqueued by reactions**, not just a single drain.
//! - [`start`](Reactor::start) returns only after the initial emission has
//!   been delivered.
//! - Channels are owned by the reactor once attached: the caller must not
//!   close an attached channel without removing it first (though the
//!   close-watchers tolerate this by issuing the remove themselves).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::core::action::Action;
use crate::core::record::{
    DestructorFn, Phase, PublisherEntry, ReactorView, SubscriberEntry,
};
use crate::error::FaultError;
use crate::policies::{BackoffPolicy, BackoffSeq};

/// State shared between the handle, the actor, and the pumps.
pub(crate) struct Shared<S, I, O> {
    /// Mailbox sender; the actor owns the receiving end.
    pub tx: mpsc::UnboundedSender<Action<S, I, O>>,
    /// Depth of not-yet-settled actions; `settle()` waits for zero.
    pub pending: watch::Sender<u64>,
    /// Snapshot republished by the actor after every completed action.
    pub views: watch::Sender<ReactorView<S>>,
}

/// Handle to a supervised, single-writer state container with dynamic
/// publisher fan-in and subscriber fan-out.
///
/// Built with [`ReactorBuilder`](crate::ReactorBuilder). Clones address the
/// same reactor.
///
/// Type parameters: `S` = state, `I` = inbound (published) message,
/// `O` = outbound (emitted) message.
pub struct Reactor<S, I, O> {
    pub(crate) shared: Arc<Shared<S, I, O>>,
}

impl<S, I, O> Clone for Reactor<S, I, O> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S, I, O> Reactor<S, I, O>
where
    S: Clone + Default + PartialEq + Send + Sync + 'static,
    I: Send + 'static,
    O: Clone + Send + Sync + 'static,
{
    pub(crate) fn from_shared(shared: Arc<Shared<S, I, O>>) -> Self {
        Self { shared }
    }

    // ---------------------------
    // Lifecycle
    // ---------------------------

    /// Enqueues the start action (`state ← initializer()`, `started ← true`)
    /// and waits for the mailbox to settle, so pumps are live and the
    /// initial emission has been delivered when this returns.
    pub async fn start(&self) -> &Self {
        self.enqueue(Action::Start);
        self.settle().await
    }

    /// Waits until the pending-action depth reaches zero.
    ///
    /// Reactions enqueue further actions before their triggering action is
    /// counted as settled, so the depth cannot reach zero while follow-up
    /// work exists; one wait is a full quiescence barrier.
    pub async fn settle(&self) -> &Self {
        let mut rx = self.shared.pending.subscribe();
        let _ = rx.wait_for(|depth| *depth == 0).await;
        self
    }

    /// Enqueues an action that unconditionally raises, forcing a reboot
    /// through the supervisor (one backoff entry is consumed and the
    /// restart counter increments).
    pub fn reboot(&self) -> &Self {
        self.enqueue(Action::Reboot)
    }

    // ---------------------------
    // State mutation
    // ---------------------------

    /// Enqueues `state ← f(state)` on the fast lane.
    pub fn update(&self, f: impl FnOnce(S) -> S + Send + 'static) -> &Self {
        self.enqueue(Action::Fast {
            label: "update",
            op: Box::new(move |record| {
                let state = record.state.clone();
                record.state = f(state);
                Ok(())
            }),
        })
    }

    /// Enqueues `state ← f(state)` on the blocking lane.
    ///
    /// Use for transformations that do I/O or heavy computation; `f` runs
    /// under `spawn_blocking` and a panic inside it is converted to a fault
    /// (reboot path) instead of tearing down the runtime.
    pub fn update_blocking(&self, f: impl FnOnce(S) -> S + Send + 'static) -> &Self {
        self.enqueue(Action::UpdateBlocking { op: Box::new(f) })
    }

    // ---------------------------
    // Reads
    // ---------------------------

    /// Full snapshot of the reactor as of the last completed action.
    pub fn view(&self) -> ReactorView<S> {
        self.shared.views.borrow().clone()
    }

    /// Current state snapshot.
    pub fn state(&self) -> S {
        self.shared.views.borrow().state.clone()
    }

    /// Idents of attached publishers, ascending.
    pub fn publisher_idents(&self) -> Vec<String> {
        self.shared.views.borrow().publishers.iter().cloned().collect()
    }

    /// Idents of attached subscribers, ascending.
    pub fn subscriber_idents(&self) -> Vec<String> {
        self.shared.views.borrow().subscribers.iter().cloned().collect()
    }

    /// Number of reboots performed so far.
    pub fn restarts(&self) -> u64 {
        self.shared.views.borrow().restarts
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.shared.views.borrow().phase
    }

    // ---------------------------
    // Caller-function installation
    // ---------------------------

    /// Enqueues installation of the fold function.
    pub fn set_reducer(
        &self,
        f: impl Fn(&Reactor<S, I, O>, S, &str, I) -> Result<S, FaultError> + Send + Sync + 'static,
    ) -> &Self {
        let reducer = Arc::new(f);
        self.enqueue(Action::Fast {
            label: "set_reducer",
            op: Box::new(move |record| {
                record.reducer = reducer;
                Ok(())
            }),
        })
    }

    /// Enqueues installation of the change-to-messages function.
    pub fn set_emitter(
        &self,
        f: impl Fn(&S, &S) -> Result<Vec<O>, FaultError> + Send + Sync + 'static,
    ) -> &Self {
        let emitter = Arc::new(f);
        self.enqueue(Action::Fast {
            label: "set_emitter",
            op: Box::new(move |record| {
                record.emitter = emitter;
                Ok(())
            }),
        })
    }

    /// Enqueues installation of the state constructor.
    pub fn set_initializer(
        &self,
        f: impl Fn() -> Result<S, FaultError> + Send + Sync + 'static,
    ) -> &Self {
        let initializer = Arc::new(f);
        self.enqueue(Action::Fast {
            label: "set_initializer",
            op: Box::new(move |record| {
                record.initializer = initializer;
                Ok(())
            }),
        })
    }

    /// Enqueues replacement of the reboot-delay schedule.
    pub fn set_backoff(&self, policy: BackoffPolicy) -> &Self {
        self.set_backoff_seq(policy.delays())
    }

    /// Enqueues replacement of the reboot-delay schedule with an arbitrary
    /// (lazy, possibly infinite) sequence.
    pub fn set_backoff_seq(
        &self,
        delays: impl Iterator<Item = Duration> + Send + 'static,
    ) -> &Self {
        let backoff: BackoffSeq = Box::new(delays);
        self.enqueue(Action::Fast {
            label: "set_backoff",
            op: Box::new(move |record| {
                record.backoff = backoff;
                Ok(())
            }),
        })
    }

    // ---------------------------
    // Publishers
    // ---------------------------

    /// Enqueues attachment of publisher channels.
    ///
    /// Pumps start once the reactor is running; until then the receivers
    /// wait inside the record. Re-attaching an existing ident detaches and
    /// closes the previous channel.
    pub fn add_publishers<K>(
        &self,
        channels: impl IntoIterator<Item = (K, mpsc::Receiver<I>)>,
    ) -> &Self
    where
        K: Into<String>,
    {
        let channels: Vec<(String, mpsc::Receiver<I>)> = channels
            .into_iter()
            .map(|(ident, rx)| (ident.into(), rx))
            .collect();
        self.enqueue(Action::Fast {
            label: "add_publishers",
            op: Box::new(move |record| {
                for (ident, receiver) in channels {
                    let entry = PublisherEntry {
                        receiver: Some(receiver),
                        cancel: CancellationToken::new(),
                    };
                    if let Some(old) = record.publishers.insert(ident.clone(), entry) {
                        record.retired_publishers.push((ident, old));
                    }
                }
                Ok(())
            }),
        })
    }

    /// Enqueues detachment of publisher channels; detached channels are
    /// closed by the dispatcher and their pumps end.
    pub fn remove_publishers<K>(&self, idents: impl IntoIterator<Item = K>) -> &Self
    where
        K: Into<String>,
    {
        let idents: Vec<String> = idents.into_iter().map(Into::into).collect();
        self.enqueue(Action::Fast {
            label: "remove_publishers",
            op: Box::new(move |record| {
                for ident in idents {
                    if let Some(entry) = record.publishers.remove(&ident) {
                        record.retired_publishers.push((ident, entry));
                    }
                }
                Ok(())
            }),
        })
    }

    /// Attaches a single publisher channel.
    pub fn add_publisher(&self, ident: impl Into<String>, rx: mpsc::Receiver<I>) -> &Self {
        self.add_publishers([(ident.into(), rx)])
    }

    /// Detaches a single publisher channel.
    pub fn remove_publisher(&self, ident: impl Into<String>) -> &Self {
        self.remove_publishers([ident.into()])
    }

    // ---------------------------
    // Subscribers
    // ---------------------------

    /// Enqueues attachment of subscriber channels.
    ///
    /// A subscriber added while the reactor is running receives a catch-up
    /// emission (`emitter(empty, current)`) immediately; one added earlier
    /// receives it when `start` processes.
    pub fn add_subscribers<K>(
        &self,
        channels: impl IntoIterator<Item = (K, mpsc::Sender<O>)>,
    ) -> &Self
    where
        K: Into<String>,
    {
        let channels: Vec<(String, mpsc::Sender<O>)> = channels
            .into_iter()
            .map(|(ident, tx)| (ident.into(), tx))
            .collect();
        self.enqueue(Action::Fast {
            label: "add_subscribers",
            op: Box::new(move |record| {
                for (ident, sender) in channels {
                    let entry = SubscriberEntry {
                        sender,
                        cancel: CancellationToken::new(),
                        watched: false,
                    };
                    if let Some(old) = record.subscribers.insert(ident.clone(), entry) {
                        record.retired_subscribers.push((ident, old));
                    }
                }
                Ok(())
            }),
        })
    }

    /// Enqueues detachment of subscriber channels.
    ///
    /// Removing the **last** subscriber of a running reactor triggers
    /// implosion.
    pub fn remove_subscribers<K>(&self, idents: impl IntoIterator<Item = K>) -> &Self
    where
        K: Into<String>,
    {
        let idents: Vec<String> = idents.into_iter().map(Into::into).collect();
        self.enqueue(Action::Fast {
            label: "remove_subscribers",
            op: Box::new(move |record| {
                for ident in idents {
                    if let Some(entry) = record.subscribers.remove(&ident) {
                        record.retired_subscribers.push((ident, entry));
                    }
                }
                Ok(())
            }),
        })
    }

    /// Attaches a single subscriber channel.
    pub fn add_subscriber(&self, ident: impl Into<String>, tx: mpsc::Sender<O>) -> &Self {
        self.add_subscribers([(ident.into(), tx)])
    }

    /// Detaches a single subscriber channel.
    pub fn remove_subscriber(&self, ident: impl Into<String>) -> &Self {
        self.remove_subscribers([ident.into()])
    }

    // ---------------------------
    // Destructors
    // ---------------------------

    /// Enqueues registration of teardown side effects.
    ///
    /// Destructors have no effect until implosion, where they run in
    /// ascending ident order. Re-registering an ident replaces the previous
    /// destructor without invoking it.
    pub fn add_destructors<K>(
        &self,
        destructors: impl IntoIterator<Item = (K, DestructorFn)>,
    ) -> &Self
    where
        K: Into<String>,
    {
        let destructors: Vec<(String, DestructorFn)> = destructors
            .into_iter()
            .map(|(ident, f)| (ident.into(), f))
            .collect();
        self.enqueue(Action::Fast {
            label: "add_destructors",
            op: Box::new(move |record| {
                for (ident, destructor) in destructors {
                    record.destructors.insert(ident, destructor);
                }
                Ok(())
            }),
        })
    }

    /// Enqueues removal of registered destructors.
    pub fn remove_destructors<K>(&self, idents: impl IntoIterator<Item = K>) -> &Self
    where
        K: Into<String>,
    {
        let idents: Vec<String> = idents.into_iter().map(Into::into).collect();
        self.enqueue(Action::Fast {
            label: "remove_destructors",
            op: Box::new(move |record| {
                for ident in idents {
                    record.destructors.remove(&ident);
                }
                Ok(())
            }),
        })
    }

    /// Registers a single destructor.
    pub fn add_destructor(
        &self,
        ident: impl Into<String>,
        f: impl FnOnce() + Send + 'static,
    ) -> &Self {
        self.add_destructors([(ident.into(), Box::new(f) as DestructorFn)])
    }

    /// Removes a single destructor.
    pub fn remove_destructor(&self, ident: impl Into<String>) -> &Self {
        self.remove_destructors([ident.into()])
    }

    // ---------------------------
    // Internal enqueue plumbing
    // ---------------------------

    /// Bumps the pending depth and submits the action.
    ///
    /// The increment happens before the send so the depth can never read
    /// zero while a submitted action is still unprocessed. If the mailbox is
    /// gone (imploded reactor) the increment is rolled back and the action
    /// is silently dropped.
    fn enqueue(&self, action: Action<S, I, O>) -> &Self {
        self.shared.pending.send_modify(|depth| *depth += 1);
        if self.shared.tx.send(action).is_err() {
            self.shared
                .pending
                .send_modify(|depth| *depth = depth.saturating_sub(1));
        }
        self
    }

    /// Pump entry point: fold one published message into the state.
    pub(crate) fn enqueue_reduce(&self, ident: String, message: I) {
        self.enqueue(Action::Reduce { ident, message });
    }

    /// Supervisor entry point: re-run the initializer after a reboot.
    pub(crate) fn enqueue_reinit(&self) {
        self.enqueue(Action::Reinit);
    }

    /// Marks `n` actions as settled.
    pub(crate) fn dec_pending(&self, n: u64) {
        if n > 0 {
            self.shared
                .pending
                .send_modify(|depth| *depth = depth.saturating_sub(n));
        }
    }

    /// Releases every `settle()` waiter; used at implosion.
    pub(crate) fn zero_pending(&self) {
        self.shared.pending.send_modify(|depth| *depth = 0);
    }

    /// Republishes the read-side snapshot.
    pub(crate) fn publish_view(&self, view: ReactorView<S>) {
        self.shared.views.send_replace(view);
    }
}
