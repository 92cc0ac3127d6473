//! # statevisor
//!
//! **Statevisor** is a lightweight library for building **reactors**:
//! in-process state containers that serialize changes from many async
//! sources, keep a single authoritative state, and broadcast change-derived
//! messages to dynamic subscribers — with supervised crash recovery.
//!
//! A reactor folds everything arriving on its publisher channels into one
//! state via a caller-supplied **reducer**, turns each accepted transition
//! into messages via a caller-supplied **emitter**, and writes those messages
//! into every subscriber channel. When caller code fails, a supervisor
//! reboots the reactor on a backoff schedule; when the schedule runs out (or
//! the last subscriber leaves), the reactor implodes: channels closed,
//! destructors invoked, deterministically.
//!
//! ## Features
//!
//! | Area            | Description                                                    | Key types / traits                        |
//! |-----------------|----------------------------------------------------------------|-------------------------------------------|
//! | **Reactors**    | Single-writer state containers with fan-in/fan-out.            | [`Reactor`], [`ReactorBuilder`]            |
//! | **Policies**    | Reboot backoff schedules and jitter.                           | [`BackoffPolicy`], [`JitterPolicy`]        |
//! | **Supervision** | Crash recovery, restart counting, terminal implosion.          | [`Phase`], [`FaultError`]                  |
//! | **Events**      | Typed lifecycle events on a broadcast bus.                     | [`Event`], [`EventKind`], [`Bus`]          |
//! | **Observers**   | Hook into reactor lifecycle (logging, metrics, custom sinks).  | [`Observer`]                               |
//! | **Reads**       | Snapshot reads that only observe completed actions.            | [`ReactorView`]                            |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] observer _(demo/reference only)_.
//!
//! ```no_run
//! use statevisor::{Reactor, ReactorBuilder, ReactorConfig};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     // State: a counter. Inbound: deltas. Outbound: counter snapshots.
//!     let reactor: Reactor<i64, i64, i64> =
//!         ReactorBuilder::new(ReactorConfig::named("counter"))
//!             .with_initializer(|| Ok(0))
//!             .with_reducer(|_r, state, _ident, delta| Ok(state + delta))
//!             .with_emitter(|_old, new| Ok(vec![*new]))
//!             .build();
//!
//!     let (feed_tx, feed_rx) = mpsc::channel(16);
//!     let (view_tx, mut view_rx) = mpsc::channel(16);
//!
//!     reactor
//!         .add_publisher("feed", feed_rx)
//!         .add_subscriber("view", view_tx)
//!         .start()
//!         .await;
//!
//!     // The subscriber catches up with the initial state first.
//!     assert_eq!(view_rx.recv().await, Some(0));
//!
//!     feed_tx.send(5).await.unwrap();
//!     assert_eq!(view_rx.recv().await, Some(5));
//! }
//! ```
//!
//! ---

mod config;
mod core;
mod error;
mod events;
mod observers;
mod policies;

// ---- Public re-exports ----

pub use config::ReactorConfig;
pub use core::{
    DestructorFn, EmitterFn, InitializerFn, Phase, Reactor, ReactorBuilder, ReactorView,
    ReducerFn,
};
pub use error::FaultError;
pub use events::{Bus, Event, EventKind};
pub use observers::Observer;
pub use policies::{backoff_sequence, BackoffPolicy, BackoffSeq, JitterPolicy};

// Optional: expose a simple built-in logging observer (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use observers::LogWriter;
