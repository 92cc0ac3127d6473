//! # Demo: crash_recovery
//!
//! A reducer that fails on demand, and the supervisor that keeps the
//! reactor alive through it.
//!
//! Demonstrates how to:
//! - Configure a reboot backoff schedule.
//! - Watch a fault trigger a full logical reboot (state reset via the
//!   initializer, queued work discarded).
//! - See subscribers receive the re-initialized state as a catch-up
//!   emission after every reboot.
//! - Confirm publisher pumps survive reboots and feed the new incarnation.
//!
//! ## Run
//! ```bash
//! cargo run --example crash_recovery
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use statevisor::{BackoffPolicy, FaultError, JitterPolicy, Reactor, ReactorBuilder, ReactorConfig};
use tokio::sync::mpsc;

type State = BTreeMap<String, i64>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let healthy = Arc::new(AtomicBool::new(true));
    let mode = Arc::clone(&healthy);

    let reactor: Reactor<State, State, Vec<String>> =
        ReactorBuilder::new(ReactorConfig::named("session"))
            .with_initializer(|| Ok(BTreeMap::from([("zero".to_string(), 0)])))
            .with_reducer(move |_reactor, mut state, _ident, change| {
                if !mode.load(Ordering::SeqCst) {
                    return Err(FaultError::fault("storage offline"));
                }
                state.extend(change);
                Ok(state)
            })
            // Emit the keys each transition added.
            .with_emitter(|old, new| {
                Ok(vec![new
                    .keys()
                    .filter(|k| !old.contains_key(*k))
                    .cloned()
                    .collect::<Vec<_>>()])
            })
            .with_backoff(BackoffPolicy {
                first: Duration::from_millis(50),
                max: Duration::from_millis(400),
                factor: 2.0,
                limit: Some(6),
                jitter: JitterPolicy::None,
            })
            .build();

    let (feed_tx, feed_rx) = mpsc::channel::<State>(16);
    let (view_tx, mut view_rx) = mpsc::channel::<Vec<String>>(16);

    reactor
        .add_publisher("feed", feed_rx)
        .add_subscriber("view", view_tx)
        .start()
        .await;

    println!("[view] {:?}", view_rx.recv().await); // ["zero"]

    feed_tx.send(BTreeMap::from([("one".to_string(), 1)])).await?;
    println!("[view] {:?}", view_rx.recv().await); // ["one"]

    // Break the reducer: the next message faults the actor, the supervisor
    // reboots it, and the subscriber sees the world rebuilt from scratch.
    healthy.store(false, Ordering::SeqCst);
    feed_tx.send(BTreeMap::from([("two".to_string(), 2)])).await?;
    println!("[view] {:?} (after reboot)", view_rx.recv().await); // ["zero"]
    reactor.settle().await;
    println!("[main] restarts so far: {}", reactor.restarts());

    // Heal and retry: the same pump delivers into the new incarnation.
    healthy.store(true, Ordering::SeqCst);
    feed_tx.send(BTreeMap::from([("two".to_string(), 2)])).await?;
    println!("[view] {:?}", view_rx.recv().await); // ["two"]

    println!("[main] state: {:?}", reactor.state());
    Ok(())
}
