//! # Demo: dynamic_fanout
//!
//! Subscribers joining and leaving a live reactor, with the built-in
//! `LogWriter` observer narrating the lifecycle.
//!
//! Demonstrates how to:
//! - Attach the `LogWriter` observer (requires `--features logging`).
//! - Add subscribers while the reactor is running (catch-up emissions).
//! - Watch churn events (`subscriber-added`, `subscriber-removed`) and the
//!   terminal implosion in the log output.
//!
//! ## Run
//! ```bash
//! cargo run --example dynamic_fanout --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use statevisor::{LogWriter, Reactor, ReactorBuilder, ReactorConfig};
use tokio::sync::mpsc;
use tokio::time::sleep;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let reactor: Reactor<u64, u64, u64> = ReactorBuilder::new(ReactorConfig::named("ticker"))
        .with_initializer(|| Ok(0))
        .with_reducer(|_reactor, ticks, _ident, n| Ok(ticks + n))
        .with_emitter(|_old, new| Ok(vec![*new]))
        .with_observers(vec![Arc::new(LogWriter)])
        .build();

    let (tick_tx, tick_rx) = mpsc::channel(16);
    reactor.add_publisher("clock", tick_rx).start().await;

    // A background clock publishes ticks.
    let clock = tokio::spawn(async move {
        for _ in 0..6 {
            if tick_tx.send(1).await.is_err() {
                break;
            }
            sleep(Duration::from_millis(100)).await;
        }
    });

    // Viewers drain their channels and print what they see.
    let mut viewers = Vec::new();
    for name in ["ana", "ben"] {
        let (tx, mut rx) = mpsc::channel(16);
        reactor.add_subscriber(name, tx).settle().await;
        viewers.push(tokio::spawn(async move {
            while let Some(ticks) = rx.recv().await {
                println!("[{name}] ticks={ticks}");
            }
            println!("[{name}] channel closed");
        }));
        sleep(Duration::from_millis(150)).await;
    }

    sleep(Duration::from_millis(250)).await;

    // Viewers leave one by one; the second departure implodes the reactor.
    reactor.remove_subscriber("ana").settle().await;
    sleep(Duration::from_millis(100)).await;
    reactor.remove_subscriber("ben").settle().await;

    clock.await?;
    for viewer in viewers {
        viewer.await?;
    }
    println!("[main] phase: {:?}", reactor.phase());
    Ok(())
}
