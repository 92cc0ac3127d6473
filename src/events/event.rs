//! # Lifecycle events emitted by reactors.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Lifecycle events**: start, state change, fault, reboot, implosion
//! - **Churn events**: publisher / subscriber attach and detach
//! - **Teardown events**: destructor panics during implosion
//! - **Observer events**: overflow / panic inside observer workers
//!
//! The [`Event`] struct carries metadata such as timestamps, the reactor
//! name, the publisher/subscriber ident involved, error messages, backoff
//! delays, and the restart counter.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically, so observers can order events correctly even when they are
//! delivered through independent async queues.
//!
//! ## Event flow examples
//!
//! ### Crash recovery flow
//! ```text
//! ActionFailed
//!   → RebootScheduled {delay, restarts}
//!   → [sleep, mailbox drained, state reset]
//!   → RebootCompleted {restarts}
//!   → StateChanged            (re-initialized state broadcast to subscribers)
//! ```
//!
//! ### Implosion flow
//! ```text
//! SubscriberRemoved            (last one)
//!   → [subscriber channels closed]
//!   → [publisher channels closed]
//!   → DestructorPanicked       (only for destructors that panic)
//!   → Imploded
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use statevisor::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::RebootScheduled)
//!     .with_reactor("session-42")
//!     .with_error("reducer blew up")
//!     .with_delay(Duration::from_millis(500))
//!     .with_restarts(1);
//!
//! assert_eq!(ev.kind, EventKind::RebootScheduled);
//! assert_eq!(ev.reactor.as_deref(), Some("session-42"));
//! assert_eq!(ev.restarts, Some(1));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of reactor lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Observer events ===
    /// Observer panicked during event processing.
    ObserverPanicked,
    /// Observer dropped an event (queue full or worker closed).
    ObserverOverflow,

    // === Lifecycle events ===
    /// The reactor processed its `start` action; pumps are live and the
    /// initial emission has been delivered.
    ReactorStarted,
    /// An accepted mutation changed the state while running.
    StateChanged,
    /// An action raised; the supervisor takes over.
    ActionFailed,
    /// A reboot was scheduled after a fault.
    RebootScheduled,
    /// The reboot finished: state reset, mailbox drained, re-init enqueued.
    RebootCompleted,
    /// The backoff sequence ran out; the reactor implodes.
    BackoffExhausted,
    /// Terminal teardown completed: channels closed, destructors invoked.
    Imploded,

    // === Churn events ===
    /// A publisher channel was attached.
    PublisherAdded,
    /// A publisher channel was detached and closed.
    PublisherRemoved,
    /// A subscriber channel was attached.
    SubscriberAdded,
    /// A subscriber channel was detached and closed.
    SubscriberRemoved,

    // === Teardown events ===
    /// A destructor panicked during implosion (swallowed; teardown continues).
    DestructorPanicked,
}

/// Lifecycle event with optional metadata.
///
/// ## Fields
/// - `seq`: unique sequence number for ordering (monotonically increasing)
/// - `at`: wall-clock timestamp (may go backwards due to NTP, use for logging only)
/// - `kind`: event classification
/// - `reactor`, `ident`, `error`, `delay`, `restarts`: optional metadata
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp (may go backwards, use for logging only).
    pub at: SystemTime,
    /// Name of the reactor that published the event.
    pub reactor: Option<String>,
    /// Publisher/subscriber/destructor ident, if applicable.
    pub ident: Option<String>,
    /// Error message, if the event represents a failure.
    pub error: Option<String>,
    /// Backoff delay before the next reboot attempt (if relevant).
    pub delay: Option<Duration>,
    /// Restart counter value (if relevant).
    pub restarts: Option<u64>,
    /// The kind of event.
    pub kind: EventKind,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            reactor: None,
            ident: None,
            error: None,
            delay: None,
            restarts: None,
            kind,
        }
    }

    /// Attaches the reactor name.
    pub fn with_reactor(mut self, name: impl Into<String>) -> Self {
        self.reactor = Some(name.into());
        self
    }

    /// Attaches a publisher/subscriber/destructor ident.
    pub fn with_ident(mut self, ident: impl Into<String>) -> Self {
        self.ident = Some(ident.into());
        self
    }

    /// Attaches an error message.
    pub fn with_error(mut self, msg: impl Into<String>) -> Self {
        self.error = Some(msg.into());
        self
    }

    /// Attaches a backoff delay.
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay = Some(d);
        self
    }

    /// Attaches the restart counter value.
    pub fn with_restarts(mut self, n: u64) -> Self {
        self.restarts = Some(n);
        self
    }

    /// Creates an observer overflow event.
    ///
    /// Emitted when an observer's queue is full and an event is dropped.
    pub fn observer_overflow(observer: &'static str, reason: &'static str) -> Self {
        Event::now(EventKind::ObserverOverflow)
            .with_error(format!("observer={observer} reason={reason}"))
    }

    /// Creates an observer panic event.
    ///
    /// Emitted when an observer panics during event processing.
    pub fn observer_panicked(observer: &'static str, info: String) -> Self {
        Event::now(EventKind::ObserverPanicked)
            .with_ident(observer)
            .with_error(info)
    }

    /// True for events produced by the observer machinery itself.
    ///
    /// Used to suppress overflow diagnostics about overflow diagnostics.
    pub(crate) fn is_observer_internal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::ObserverOverflow | EventKind::ObserverPanicked
        )
    }
}
