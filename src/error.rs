//! # Error types used by the reactor engine and user-supplied functions.
//!
//! A single enum, [`FaultError`], covers everything that can make an action
//! raise inside the state actor:
//!
//! - failures returned by the caller's reducer / emitter / initializer,
//! - panics caught in the blocking lane,
//! - an explicit [`reboot`](crate::Reactor::reboot) request.
//!
//! Every fault takes the same recovery path: the supervisor consumes one
//! backoff entry and reboots the reactor (or implodes it on exhaustion).
//! Faults are never surfaced synchronously to enqueue callers; they appear as
//! [`ActionFailed`](crate::EventKind::ActionFailed) events.
//!
//! The type provides `as_label()` for stable snake_case labels in logs and
//! metrics.

use thiserror::Error;

/// A failure raised by an action executing inside the state actor.
///
/// User-supplied reducers, emitters, and initializers report failure by
/// returning `Err(FaultError::fault("..."))`.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum FaultError {
    /// A user-supplied function returned an error.
    #[error("action failed: {reason}")]
    Fault {
        /// Human-readable failure description.
        reason: String,
    },

    /// A user-supplied function panicked while running on the blocking lane.
    #[error("action panicked: {reason}")]
    Panicked {
        /// Panic payload, if it was a string.
        reason: String,
    },

    /// The caller asked for a reboot via [`Reactor::reboot`](crate::Reactor::reboot).
    ///
    /// This is **not an error** in the traditional sense; it rides the fault
    /// path so the restart counter and backoff behave exactly as they do for
    /// real failures.
    #[error("reboot requested")]
    RebootRequested,
}

impl FaultError {
    /// Builds a [`FaultError::Fault`] from any displayable reason.
    pub fn fault(reason: impl Into<String>) -> Self {
        FaultError::Fault {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            FaultError::Fault { .. } => "fault",
            FaultError::Panicked { .. } => "fault_panicked",
            FaultError::RebootRequested => "reboot_requested",
        }
    }
}
