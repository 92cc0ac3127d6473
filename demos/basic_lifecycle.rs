//! # Demo: basic_lifecycle
//!
//! One reactor, one publisher, two subscribers, one destructor.
//!
//! Demonstrates how to:
//! - Build a reactor with an initializer, reducer, and emitter.
//! - Attach a publisher channel and watch reductions fold into the state.
//! - Attach subscribers before and after `start` (both catch up with the
//!   full state on arrival).
//! - Let the reactor implode when the last subscriber leaves: channels
//!   close, destructors fire.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► build reactor (counter state, delta messages)
//!   ├─► add_publisher("keys") + add_subscriber("alice") + start()
//!   ├─► send deltas → reducer folds → emitter broadcasts totals
//!   ├─► add_subscriber("bob") → catch-up emission
//!   └─► remove both subscribers → implosion → destructor runs
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic_lifecycle
//! ```

use statevisor::{Reactor, ReactorBuilder, ReactorConfig};
use tokio::sync::mpsc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // State: a running total. Inbound: deltas. Outbound: total snapshots.
    let reactor: Reactor<i64, i64, i64> = ReactorBuilder::new(ReactorConfig::named("totals"))
        .with_initializer(|| Ok(0))
        .with_reducer(|_reactor, total, ident, delta| {
            println!("[reducer] {ident} contributes {delta}");
            Ok(total + delta)
        })
        .with_emitter(|_old, new| Ok(vec![*new]))
        .build();

    let (keys_tx, keys_rx) = mpsc::channel(16);
    let (alice_tx, mut alice_rx) = mpsc::channel(16);

    reactor
        .add_publisher("keys", keys_rx)
        .add_subscriber("alice", alice_tx)
        .add_destructor("goodbye", || println!("[destructor] session closed"))
        .start()
        .await;

    // Alice catches up with the initial state first.
    println!("[alice] {:?}", alice_rx.recv().await);

    keys_tx.send(5).await?;
    println!("[alice] {:?}", alice_rx.recv().await);

    // Bob joins late and still sees the current world immediately.
    let (bob_tx, mut bob_rx) = mpsc::channel(16);
    reactor.add_subscriber("bob", bob_tx).settle().await;
    println!("[bob]   {:?}", bob_rx.recv().await);

    keys_tx.send(-2).await?;
    println!("[alice] {:?}", alice_rx.recv().await);
    println!("[bob]   {:?}", bob_rx.recv().await);

    // Last subscriber out turns the lights off: the destructor runs and the
    // publisher channel closes.
    reactor
        .remove_subscriber("alice")
        .remove_subscriber("bob")
        .settle()
        .await;

    // The pump releases the channel at its next suspension point.
    while !keys_tx.is_closed() {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    println!("[main] publisher channel closed, phase: {:?}", reactor.phase());
    Ok(())
}
