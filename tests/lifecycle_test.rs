//! Lifecycle integration tests: start, emissions, destructor timing,
//! ordering under concurrency, and post-implosion no-op behavior.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use statevisor::{Phase, Reactor, ReactorBuilder, ReactorConfig};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Test state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
struct Counter {
    count: u32,
}

fn counter_reactor() -> Reactor<Counter, (), Counter> {
    ReactorBuilder::new(ReactorConfig::named("lifecycle"))
        .with_initializer(|| Ok(Counter { count: 1 }))
        .with_emitter(|_old, new| Ok(vec![new.clone()]))
        .build()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lifecycle_and_destructor_timing() {
    let destroyed = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&destroyed);

    let reactor = counter_reactor();

    let (s1_tx, mut s1_rx) = mpsc::channel(8);
    reactor
        .add_destructor("d1", move || flag.store(true, Ordering::SeqCst))
        .add_subscriber("s1", s1_tx)
        .start()
        .await;

    // Subscriber attached before start catches up with the initial state.
    assert_eq!(s1_rx.recv().await, Some(Counter { count: 1 }));

    // A late subscriber catches up the same way.
    let (s2_tx, mut s2_rx) = mpsc::channel(8);
    reactor.add_subscriber("s2", s2_tx).settle().await;
    assert_eq!(s2_rx.recv().await, Some(Counter { count: 1 }));

    // Removing one of two subscribers does not tear anything down.
    reactor.remove_subscriber("s1").settle().await;
    assert!(!destroyed.load(Ordering::SeqCst));
    assert_eq!(reactor.subscriber_idents(), vec!["s2".to_string()]);
    assert_eq!(s1_rx.recv().await, None);

    // Removing the last subscriber implodes: destructor fires exactly then.
    reactor.remove_subscriber("s2").settle().await;
    assert!(destroyed.load(Ordering::SeqCst));
    assert_eq!(reactor.phase(), Phase::Imploded);
    assert_eq!(s2_rx.recv().await, None);
}

#[tokio::test]
async fn update_is_visible_after_settle() {
    let reactor = counter_reactor();
    reactor.start().await;

    reactor.update(|s| Counter { count: s.count + 41 }).settle().await;
    assert_eq!(reactor.state(), Counter { count: 42 });
}

#[tokio::test]
async fn update_blocking_is_visible_after_settle() {
    let reactor = counter_reactor();
    reactor.start().await;

    reactor
        .update_blocking(|s| Counter { count: s.count * 10 })
        .settle()
        .await;
    assert_eq!(reactor.state(), Counter { count: 10 });
}

#[tokio::test]
async fn state_changes_reach_all_subscribers_in_order() {
    let reactor = counter_reactor();

    let (a_tx, mut a_rx) = mpsc::channel(8);
    let (b_tx, mut b_rx) = mpsc::channel(8);
    reactor
        .add_subscriber("a", a_tx)
        .add_subscriber("b", b_tx)
        .start()
        .await;

    assert_eq!(a_rx.recv().await, Some(Counter { count: 1 }));
    assert_eq!(b_rx.recv().await, Some(Counter { count: 1 }));

    reactor.update(|s| Counter { count: s.count + 1 }).settle().await;
    assert_eq!(a_rx.recv().await, Some(Counter { count: 2 }));
    assert_eq!(b_rx.recv().await, Some(Counter { count: 2 }));
}

#[tokio::test]
async fn attachments_are_visible_before_start() {
    let reactor = counter_reactor();

    let (_feed_tx, feed_rx) = mpsc::channel(4);
    let (view_tx, mut view_rx) = mpsc::channel(4);
    reactor
        .add_publisher("feed", feed_rx)
        .add_subscriber("view", view_tx)
        .settle()
        .await;

    assert_eq!(reactor.phase(), Phase::Created);
    assert_eq!(reactor.publisher_idents(), vec!["feed".to_string()]);
    assert_eq!(reactor.subscriber_idents(), vec!["view".to_string()]);
    assert_eq!(reactor.state(), Counter::default());

    // Nothing is emitted before start.
    assert!(view_rx.try_recv().is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn ordering_under_concurrent_updates() {
    let reactor: Reactor<i64, i64, i64> = Reactor::builder().build();
    reactor.start().await;

    let mut submitters = Vec::new();
    for _ in 0..10 {
        let handle = reactor.clone();
        submitters.push(tokio::spawn(async move {
            for _ in 0..1000 {
                handle.update(|n| n + 1);
            }
        }));
    }
    for submitter in submitters {
        submitter.await.unwrap();
    }

    reactor.settle().await;
    assert_eq!(reactor.state(), 10_000);
}

#[tokio::test]
async fn imploded_reactor_is_a_silent_no_op() {
    let reactor = counter_reactor();

    let (s_tx, mut s_rx) = mpsc::channel(8);
    reactor.add_subscriber("s", s_tx).start().await;
    assert_eq!(s_rx.recv().await, Some(Counter { count: 1 }));

    reactor.remove_subscriber("s").settle().await;
    assert_eq!(reactor.phase(), Phase::Imploded);

    // Every operation still chains and returns, but nothing happens.
    let (late_tx, mut late_rx) = mpsc::channel(4);
    reactor
        .update(|s| Counter { count: s.count + 1 })
        .add_subscriber("late", late_tx)
        .reboot()
        .settle()
        .await;

    assert_eq!(reactor.phase(), Phase::Imploded);
    assert_eq!(reactor.state(), Counter { count: 1 });
    assert!(reactor.subscriber_idents().is_empty());
    // The dropped attach action released the only sender.
    assert_eq!(late_rx.recv().await, None);
}
