//! # Publisher pumps and subscriber close-watchers.
//!
//! One pump task runs per attached publisher once the reactor has started.
//! The pump owns the channel's `Receiver` and loops:
//!
//! ```text
//! loop {
//!   ├─► cancelled?            → exit (drop receiver = close channel)
//!   ├─► recv() == Some(msg)   → enqueue blocking-lane reduce action
//!   └─► recv() == None        → producer closed the channel externally:
//!                                enqueue remove_publishers({id}) and exit
//! }
//! ```
//!
//! One close-watcher task runs per attached subscriber; it waits for the
//! consumer side to drop its `Receiver` and then enqueues
//! `remove_subscribers({id})`, keeping the record consistent with reality
//! when consumers go away.
//!
//! ## Rules
//! - Pumps are keyed to publisher **entries**, not actor incarnations: a
//!   reboot does not touch them, they keep feeding the restarted actor.
//! - A reducer fault never terminates the pump; the fault rides the
//!   supervisor path while the pump keeps receiving.
//! - External close of a publisher before `start` is detected at `start`,
//!   when the pump first runs and immediately reads `None`.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::reactor::Reactor;

/// Spawns the pump task for one publisher channel.
pub(crate) fn spawn_pump<S, I, O>(
    ident: String,
    mut receiver: mpsc::Receiver<I>,
    cancel: CancellationToken,
    reactor: Reactor<S, I, O>,
) where
    S: Clone + Default + PartialEq + Send + Sync + 'static,
    I: Send + 'static,
    O: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                msg = receiver.recv() => match msg {
                    Some(message) => {
                        reactor.enqueue_reduce(ident.clone(), message);
                    }
                    None => {
                        reactor.remove_publishers([ident.as_str()]);
                        break;
                    }
                }
            }
        }
        // receiver drops here; outside producers now observe a closed channel
    });
}

/// Spawns the close-watcher task for one subscriber channel.
pub(crate) fn spawn_close_watcher<S, I, O>(
    ident: String,
    sender: mpsc::Sender<O>,
    cancel: CancellationToken,
    reactor: Reactor<S, I, O>,
) where
    S: Clone + Default + PartialEq + Send + Sync + 'static,
    I: Send + 'static,
    O: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = sender.closed() => {
                reactor.remove_subscribers([ident.as_str()]);
            }
        }
    });
}
