//! # LogWriter — simple event printer
//!
//! A minimal observer that prints incoming [`Event`]s to stdout.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [started] reactor="session"
//! [state-changed] reactor="session"
//! [action-failed] reactor="session" err="reducer blew up"
//! [reboot-scheduled] reactor="session" delay=500ms restarts=0
//! [reboot-completed] reactor="session" restarts=1
//! [imploded] reactor="session"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::observers::Observer;

/// Event writer observer.
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Observer for LogWriter {
    async fn on_event(&self, e: &Event) {
        let reactor = e.reactor.as_deref().unwrap_or("<unnamed>");
        match e.kind {
            EventKind::ReactorStarted => {
                println!("[started] reactor={reactor:?}");
            }
            EventKind::StateChanged => {
                println!("[state-changed] reactor={reactor:?}");
            }
            EventKind::ActionFailed => {
                println!(
                    "[action-failed] reactor={reactor:?} err={:?}",
                    e.error.as_deref().unwrap_or("<no error>")
                );
            }
            EventKind::RebootScheduled => {
                println!(
                    "[reboot-scheduled] reactor={reactor:?} delay={:?} restarts={:?}",
                    e.delay, e.restarts
                );
            }
            EventKind::RebootCompleted => {
                println!("[reboot-completed] reactor={reactor:?} restarts={:?}", e.restarts);
            }
            EventKind::BackoffExhausted => {
                println!("[backoff-exhausted] reactor={reactor:?}");
            }
            EventKind::Imploded => {
                println!("[imploded] reactor={reactor:?}");
            }
            EventKind::PublisherAdded => {
                println!("[publisher-added] reactor={reactor:?} ident={:?}", e.ident);
            }
            EventKind::PublisherRemoved => {
                println!("[publisher-removed] reactor={reactor:?} ident={:?}", e.ident);
            }
            EventKind::SubscriberAdded => {
                println!("[subscriber-added] reactor={reactor:?} ident={:?}", e.ident);
            }
            EventKind::SubscriberRemoved => {
                println!("[subscriber-removed] reactor={reactor:?} ident={:?}", e.ident);
            }
            EventKind::DestructorPanicked => {
                println!(
                    "[destructor-panicked] reactor={reactor:?} ident={:?} err={:?}",
                    e.ident, e.error
                );
            }
            EventKind::ObserverPanicked | EventKind::ObserverOverflow => {
                println!("[observer-issue] err={:?}", e.error);
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
