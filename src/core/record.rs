//! # The reactor record: the sole mutable entity of a reactor.
//!
//! [`ReactorRecord`] is owned exclusively by the state actor task. Every
//! mutation flows through the actor's mailbox, so external code never sees a
//! half-applied record; reads go through the [`ReactorView`] snapshot that
//! the actor republishes after each completed action.
//!
//! ## Contents
//! - the application state `S` (starts at `S::default()`, the "empty" value)
//! - the `started` flag (never returns to `false` while the reactor lives)
//! - publisher / subscriber / destructor maps (`BTreeMap` — deterministic
//!   iteration; destructors run in ascending ident order at implosion)
//! - the backoff cursor (lazy delay iterator, consumed one entry per reboot)
//! - the caller-supplied reducer / emitter / initializer
//! - staging areas for channel endpoints detached by remove actions, which
//!   the watch dispatcher closes
//!
//! ## Rules
//! - Channels are owned by the reactor once attached: dropping the endpoint
//!   is how a channel is "closed".
//! - A publisher entry keeps its `Receiver` only until the pump starts; the
//!   pump takes it and owns it from then on.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::reactor::Reactor;
use crate::error::FaultError;
use crate::policies::{BackoffPolicy, BackoffSeq};

/// User-supplied fold: `(reactor, state, publisher ident, message) → state`.
///
/// The reactor handle is the explicit first parameter so a reducer can
/// enqueue follow-up work on the reactor that invoked it.
pub type ReducerFn<S, I, O> =
    Arc<dyn Fn(&Reactor<S, I, O>, S, &str, I) -> Result<S, FaultError> + Send + Sync>;

/// User-supplied diff: `(old state, new state) → ordered messages`.
///
/// Must be pure: it runs once per accepted transition and once per catch-up.
pub type EmitterFn<S, O> = Arc<dyn Fn(&S, &S) -> Result<Vec<O>, FaultError> + Send + Sync>;

/// User-supplied state constructor; runs on `start` and after every reboot.
pub type InitializerFn<S> = Arc<dyn Fn() -> Result<S, FaultError> + Send + Sync>;

/// Zero-argument side effect invoked at implosion.
pub type DestructorFn = Box<dyn FnOnce() + Send + 'static>;

/// Identity reducer: ignores the message, keeps the state.
pub(crate) fn identity_reducer<S, I, O>() -> ReducerFn<S, I, O> {
    Arc::new(|_reactor, state, _ident, _message| Ok(state))
}

/// Emitter that never emits.
pub(crate) fn silent_emitter<S, O>() -> EmitterFn<S, O> {
    Arc::new(|_old, _new| Ok(Vec::new()))
}

/// Initializer that yields the empty state.
pub(crate) fn empty_initializer<S: Default>() -> InitializerFn<S> {
    Arc::new(|| Ok(S::default()))
}

/// Lifecycle phase of a reactor.
///
/// `Created → Running → Faulted → (Rebooting → Running)* → Imploded`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Built but not yet started.
    Created,
    /// Started and processing actions.
    Running,
    /// An action raised; the supervisor has not woken yet.
    Faulted,
    /// The supervisor is sleeping out a backoff delay / re-initializing.
    Rebooting,
    /// Terminal: channels closed, destructors invoked.
    Imploded,
}

/// An attached publisher channel.
pub(crate) struct PublisherEntry<I> {
    /// Present until the pump starts; the pump takes ownership of it.
    pub receiver: Option<mpsc::Receiver<I>>,
    /// Cancels the pump; the pump drops the receiver on exit, which closes
    /// the channel for the outside producer.
    pub cancel: CancellationToken,
}

/// An attached subscriber channel.
pub(crate) struct SubscriberEntry<O> {
    pub sender: mpsc::Sender<O>,
    /// Cancels the close-watcher.
    pub cancel: CancellationToken,
    /// Set once the dispatcher has spawned the close-watcher.
    pub watched: bool,
}

/// The single mutable record behind a reactor.
pub(crate) struct ReactorRecord<S, I, O> {
    pub state: S,
    pub started: bool,
    pub restarts: u64,
    pub publishers: BTreeMap<String, PublisherEntry<I>>,
    pub subscribers: BTreeMap<String, SubscriberEntry<O>>,
    pub destructors: BTreeMap<String, DestructorFn>,
    pub backoff: BackoffSeq,
    pub reducer: ReducerFn<S, I, O>,
    pub emitter: EmitterFn<S, O>,
    pub initializer: InitializerFn<S>,
    /// Endpoints detached by remove actions; the dispatcher closes them.
    pub retired_publishers: Vec<(String, PublisherEntry<I>)>,
    pub retired_subscribers: Vec<(String, SubscriberEntry<O>)>,
}

impl<S, I, O> ReactorRecord<S, I, O>
where
    S: Clone + Default + PartialEq + Send + 'static,
{
    /// Fresh record with default caller functions and the default backoff.
    pub fn new() -> Self {
        Self {
            state: S::default(),
            started: false,
            restarts: 0,
            publishers: BTreeMap::new(),
            subscribers: BTreeMap::new(),
            destructors: BTreeMap::new(),
            backoff: BackoffPolicy::default().delays(),
            reducer: identity_reducer(),
            emitter: silent_emitter(),
            initializer: empty_initializer(),
            retired_publishers: Vec::new(),
            retired_subscribers: Vec::new(),
        }
    }

    /// Pre-action snapshot consumed by the watch dispatcher.
    pub fn snapshot(&self) -> Snapshot<S> {
        Snapshot {
            started: self.started,
            state: self.state.clone(),
            publishers: self.publishers.keys().cloned().collect(),
            subscribers: self.subscribers.keys().cloned().collect(),
        }
    }

    /// Read-side view republished after every completed action.
    pub fn view(&self, phase: Phase) -> ReactorView<S> {
        ReactorView {
            state: self.state.clone(),
            started: self.started,
            restarts: self.restarts,
            phase,
            publishers: self.publishers.keys().cloned().collect(),
            subscribers: self.subscribers.keys().cloned().collect(),
        }
    }
}

/// What the watch dispatcher compares a mutation against.
pub(crate) struct Snapshot<S> {
    pub started: bool,
    pub state: S,
    pub publishers: BTreeSet<String>,
    pub subscribers: BTreeSet<String>,
}

/// Consistent snapshot of a reactor, produced by a completed action.
///
/// Returned by [`Reactor::view`](crate::Reactor::view); the accessor methods
/// on the handle each expose one field of this.
#[derive(Debug, Clone)]
pub struct ReactorView<S> {
    /// Application state after the last completed action.
    pub state: S,
    /// Whether `start` has been processed.
    pub started: bool,
    /// Number of reboots performed so far.
    pub restarts: u64,
    /// Current lifecycle phase.
    pub phase: Phase,
    /// Idents of attached publishers.
    pub publishers: BTreeSet<String>,
    /// Idents of attached subscribers.
    pub subscribers: BTreeSet<String>,
}

impl<S: Default> ReactorView<S> {
    /// View of a freshly built, never-started reactor.
    pub(crate) fn initial() -> Self {
        Self {
            state: S::default(),
            started: false,
            restarts: 0,
            phase: Phase::Created,
            publishers: BTreeSet::new(),
            subscribers: BTreeSet::new(),
        }
    }
}
