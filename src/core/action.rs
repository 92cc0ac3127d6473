//! # Mailbox actions.
//!
//! Everything that mutates a reactor travels through its FIFO mailbox as an
//! [`Action`]. Two lanes exist:
//!
//! - **Fast lane** — [`Action::Fast`]: synchronous record transformations
//!   (setters, channel/destructor attach & detach, `update`). Run inline on
//!   the actor task.
//! - **Blocking lane** — the remaining variants: work that runs a
//!   caller-supplied function which may block (reduce, blocking updates, the
//!   initializer). The actor clones the state out and runs the function under
//!   `spawn_blocking`, so the async runtime is never stalled by caller code.
//!
//! Both lanes drain through the single mailbox, so all actions on one reactor
//! are strictly ordered regardless of lane.

use crate::core::record::ReactorRecord;
use crate::error::FaultError;

/// A fast-lane record transformation.
pub(crate) type FastOp<S, I, O> =
    Box<dyn FnOnce(&mut ReactorRecord<S, I, O>) -> Result<(), FaultError> + Send>;

/// One unit of work in the reactor mailbox.
pub(crate) enum Action<S, I, O> {
    /// Fast lane: pure record transformation.
    Fast {
        label: &'static str,
        op: FastOp<S, I, O>,
    },

    /// Run the initializer and flip `started` on.
    Start,

    /// Run the initializer after a reboot (state was already reset).
    Reinit,

    /// Fold one published message into the state via the reducer.
    Reduce { ident: String, message: I },

    /// Caller-supplied state transformation on the blocking lane.
    UpdateBlocking {
        op: Box<dyn FnOnce(S) -> S + Send>,
    },

    /// Unconditionally raise, taking the supervisor path.
    Reboot,
}

impl<S, I, O> Action<S, I, O> {
    /// Stable label for fault events and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Action::Fast { label, .. } => label,
            Action::Start => "start",
            Action::Reinit => "reinit",
            Action::Reduce { .. } => "reduce",
            Action::UpdateBlocking { .. } => "update_blocking",
            Action::Reboot => "reboot",
        }
    }
}
