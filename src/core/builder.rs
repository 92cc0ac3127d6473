//! # ReactorBuilder: construction and wiring.
//!
//! Builds the runtime components of one reactor and spawns its state actor:
//!
//! - mailbox (unbounded FIFO mpsc) + pending-depth watch + view watch
//! - lifecycle event [`Bus`] + [`ObserverSet`] with its bridge task
//! - the [`StateActor`] task owning the [`ReactorRecord`]
//!
//! Must be called within a Tokio runtime.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::config::ReactorConfig;
use crate::core::actor::StateActor;
use crate::core::reactor::{Reactor, Shared};
use crate::core::record::{
    empty_initializer, identity_reducer, silent_emitter, ReactorRecord, ReactorView,
};
use crate::error::FaultError;
use crate::events::Bus;
use crate::observers::{Observer, ObserverSet};
use crate::policies::{BackoffPolicy, BackoffSeq};

/// Builder for a [`Reactor`] with optional caller functions, backoff, and
/// observers.
///
/// ## Example
/// ```rust
/// use statevisor::{ReactorBuilder, ReactorConfig};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let reactor = ReactorBuilder::<i64, i64, i64>::new(ReactorConfig::named("counter"))
///         .with_initializer(|| Ok(0))
///         .with_emitter(|_old, new| Ok(vec![*new]))
///         .build();
///
///     reactor.start().await;
///     assert_eq!(reactor.state(), 0);
/// }
/// ```
pub struct ReactorBuilder<S, I, O> {
    cfg: ReactorConfig,
    reducer: crate::core::record::ReducerFn<S, I, O>,
    emitter: crate::core::record::EmitterFn<S, O>,
    initializer: crate::core::record::InitializerFn<S>,
    backoff: Option<BackoffSeq>,
    observers: Vec<Arc<dyn Observer>>,
}

impl<S, I, O> ReactorBuilder<S, I, O>
where
    S: Clone + Default + PartialEq + Send + Sync + 'static,
    I: Send + 'static,
    O: Clone + Send + Sync + 'static,
{
    /// Creates a builder with default caller functions: identity reducer,
    /// silent emitter, `S::default()` initializer, default backoff
    /// (doubling from 500 ms, eight entries), no observers.
    pub fn new(cfg: ReactorConfig) -> Self {
        Self {
            cfg,
            reducer: identity_reducer(),
            emitter: silent_emitter(),
            initializer: empty_initializer(),
            backoff: None,
            observers: Vec::new(),
        }
    }

    /// Installs the fold function.
    pub fn with_reducer(
        mut self,
        f: impl Fn(&Reactor<S, I, O>, S, &str, I) -> Result<S, FaultError> + Send + Sync + 'static,
    ) -> Self {
        self.reducer = Arc::new(f);
        self
    }

    /// Installs the change-to-messages function.
    pub fn with_emitter(
        mut self,
        f: impl Fn(&S, &S) -> Result<Vec<O>, FaultError> + Send + Sync + 'static,
    ) -> Self {
        self.emitter = Arc::new(f);
        self
    }

    /// Installs the state constructor.
    pub fn with_initializer(
        mut self,
        f: impl Fn() -> Result<S, FaultError> + Send + Sync + 'static,
    ) -> Self {
        self.initializer = Arc::new(f);
        self
    }

    /// Installs the reboot-delay schedule from a computed policy.
    pub fn with_backoff(mut self, policy: BackoffPolicy) -> Self {
        self.backoff = Some(policy.delays());
        self
    }

    /// Installs an arbitrary (lazy, possibly infinite) reboot-delay
    /// schedule.
    pub fn with_backoff_seq(
        mut self,
        delays: impl Iterator<Item = std::time::Duration> + Send + 'static,
    ) -> Self {
        self.backoff = Some(Box::new(delays));
        self
    }

    /// Attaches lifecycle-event observers.
    ///
    /// Observers receive reactor events (start, faults, reboots, churn,
    /// implosion) through dedicated workers with bounded queues.
    pub fn with_observers(mut self, observers: Vec<Arc<dyn Observer>>) -> Self {
        self.observers = observers;
        self
    }

    /// Builds the reactor and spawns its state actor.
    ///
    /// The reactor is in the `Created` phase: channels and destructors can
    /// be attached, but nothing executes caller code until
    /// [`start`](Reactor::start).
    pub fn build(self) -> Reactor<S, I, O> {
        let (tx, mailbox) = mpsc::unbounded_channel();
        let (pending, _) = watch::channel(0u64);
        let (views, _) = watch::channel(ReactorView::initial());

        let shared = Arc::new(Shared { tx, pending, views });
        let reactor = Reactor::from_shared(shared);

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let runtime_token = CancellationToken::new();
        let set = ObserverSet::new(self.observers, bus.clone());
        spawn_observer_bridge(&bus, set, runtime_token.clone());

        let mut record = ReactorRecord::new();
        record.reducer = self.reducer;
        record.emitter = self.emitter;
        record.initializer = self.initializer;
        if let Some(backoff) = self.backoff {
            record.backoff = backoff;
        }

        let actor = StateActor::new(
            record,
            mailbox,
            reactor.clone(),
            bus,
            self.cfg.name,
            runtime_token,
        );
        tokio::spawn(actor.run());

        reactor
    }
}

impl<S, I, O> Reactor<S, I, O>
where
    S: Clone + Default + PartialEq + Send + Sync + 'static,
    I: Send + 'static,
    O: Clone + Send + Sync + 'static,
{
    /// Shorthand for `ReactorBuilder::new(ReactorConfig::default())`.
    pub fn builder() -> ReactorBuilder<S, I, O> {
        ReactorBuilder::new(ReactorConfig::default())
    }
}

/// Bridges the event bus into the observer set.
///
/// Runs until the actor exits (token) or the bus closes; buffered events are
/// drained before shutdown so observers see the terminal `Imploded` event.
fn spawn_observer_bridge(bus: &Bus, set: ObserverSet, token: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit_arc(Arc::new(ev)),
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                },
                _ = token.cancelled() => {
                    while let Ok(ev) = rx.try_recv() {
                        set.emit_arc(Arc::new(ev));
                    }
                    break;
                }
            }
        }
        set.shutdown().await;
    });
}
