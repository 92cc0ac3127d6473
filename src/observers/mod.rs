//! Observability fan-out for reactor lifecycle events.
//!
//! - [`Observer`] — the extension-point trait (async handler, name, queue
//!   capacity)
//! - [`ObserverSet`] — per-observer bounded queues, dedicated workers, panic
//!   isolation
//! - `LogWriter` — println observer behind the `logging` feature
//!
//! Note on naming: in this crate a *subscriber* is an outbound state channel
//! attached to a reactor; the things that watch lifecycle events are
//! *observers*.

mod observer;
mod set;

#[cfg(feature = "logging")]
mod log;

pub use observer::Observer;
pub use set::ObserverSet;

#[cfg(feature = "logging")]
pub use log::LogWriter;
