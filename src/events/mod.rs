//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle events emitted by the state actor, the
//! watch dispatcher, and the supervisor.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] — event classification and payload metadata
//! - [`Bus`] — thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: the state actor (start/state change/fault), the
//!   dispatcher (publisher/subscriber churn), the supervisor
//!   (reboot/implosion), observer workers (overflow/panic).
//! - **Consumers**: the observer bridge spawned by
//!   [`ReactorBuilder`](crate::ReactorBuilder), and tests.
//!
//! See `core/mod.rs` for the system-level wiring diagram.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
