//! Reboot policies: backoff schedules and jitter.
//!
//! - [`BackoffPolicy`] — computed delay schedule (first/factor/max/limit)
//! - [`BackoffSeq`] — boxed lazy delay iterator, the form the record stores
//! - [`backoff_sequence`] — explicit-list constructor
//! - [`JitterPolicy`] — randomization of delays

mod backoff;
mod jitter;

pub use backoff::{backoff_sequence, BackoffPolicy, BackoffSeq};
pub use jitter::JitterPolicy;
