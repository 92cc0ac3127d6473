//! Reactor core: the single-writer engine and its lifecycle.
//!
//! This module contains the embedded implementation of one reactor. The
//! public API re-exported from here is [`Reactor`], [`ReactorBuilder`],
//! [`ReactorView`], [`Phase`], and the caller-function type aliases;
//! everything else is an internal building block the builder wires together.
//!
//! ## Files & responsibilities
//! - **reactor.rs**: public handle; enqueue-style operations returning
//!   `&Self`, `start`/`settle` synchronization, snapshot reads.
//! - **builder.rs**: construction; wires mailbox, bus, observer bridge, and
//!   spawns the state actor.
//! - **record.rs**: the reactor record (state, channels, destructors,
//!   backoff cursor, caller functions) plus snapshot/view types.
//! - **action.rs**: the mailbox message type; fast lane vs blocking lane.
//! - **actor.rs**: the single-writer loop; executes actions, maps blocking
//!   lane panics to faults, hands faults to the supervisor.
//! - **dispatch.rs**: watch dispatcher; ordered lifecycle reactions after
//!   every accepted mutation (pump churn, catch-up emissions, state-change
//!   broadcast, implosion trigger).
//! - **pump.rs**: per-publisher pump tasks and per-subscriber
//!   close-watchers.
//! - **supervisor.rs**: crash recovery with backoff consumption and
//!   implosion (terminal teardown).
//!
//! ## Wiring (module-level flow)
//! ```text
//! Application code
//!   └─ ReactorBuilder::build() ──► spawns StateActor task + observer bridge
//!
//! publisher channel ──► pump ──► Reduce action ──┐
//! Reactor handle ──► control/update actions ─────┤
//!                                                ▼
//!                               mailbox (FIFO, unbounded)
//!                                                │
//!                         StateActor (single writer, one action at a time)
//!                                                │
//!                         watch dispatcher (reactions 1-6, inline)
//!                           ├─► pumps started/cancelled
//!                           ├─► emitter → subscriber channels (blocking)
//!                           ├─► implosion on last-subscriber-removed
//!                           └─► events → Bus ──► ObserverSet workers
//!
//! on fault:
//!   StateActor ──► supervisor::recover()
//!     ├─► backoff entry → sleep → drain mailbox → reset state → Reinit
//!     └─► exhausted → implode → actor exits
//! ```
//!
//! ## Notes
//! - Ordering: actions submitted from one task execute in submission order;
//!   reactions complete before the next action is dequeued.
//! - `settle()` waits for true quiescence (reaction-enqueued actions
//!   included).
//! - Pumps outlive reboots; they are keyed to publisher entries.

mod action;
mod actor;
mod builder;
mod dispatch;
mod pump;
mod reactor;
mod record;
mod supervisor;

pub use builder::ReactorBuilder;
pub use reactor::Reactor;
pub use record::{
    DestructorFn, EmitterFn, InitializerFn, Phase, ReactorView, ReducerFn,
};
