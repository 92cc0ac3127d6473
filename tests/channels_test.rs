//! Channel churn integration tests: pumps, close-watchers, catch-up
//! emissions, and channel ownership on removal.

mod support;

use statevisor::{Phase, Reactor, ReactorBuilder, ReactorConfig};
use tokio::sync::mpsc;

use support::eventually;

fn summing_reactor() -> Reactor<i64, i64, i64> {
    ReactorBuilder::new(ReactorConfig::named("channels"))
        .with_reducer(|_reactor, state, _ident, delta| Ok(state + delta))
        .with_emitter(|_old, new| Ok(vec![*new]))
        .build()
}

#[tokio::test]
async fn publisher_feeds_reductions_into_state() {
    let reactor = summing_reactor();

    let (feed_tx, feed_rx) = mpsc::channel(8);
    reactor.add_publisher("feed", feed_rx).start().await;

    feed_tx.send(5).await.unwrap();
    feed_tx.send(2).await.unwrap();
    eventually(|| reactor.state() == 7, "reductions to apply").await;
}

#[tokio::test]
async fn publisher_removal_closes_channel_and_stops_reductions() {
    let reactor = summing_reactor();

    let (feed_tx, feed_rx) = mpsc::channel(8);
    reactor.add_publisher("p", feed_rx).start().await;

    feed_tx.send(5).await.unwrap();
    eventually(|| reactor.state() == 5, "first reduction").await;

    reactor.remove_publisher("p").settle().await;
    assert!(reactor.publisher_idents().is_empty());

    // The pump drops the receiver, so the producer observes a closed channel.
    eventually(|| feed_tx.is_closed(), "channel to close").await;
    assert!(feed_tx.send(7).await.is_err());
    assert_eq!(reactor.state(), 5);
}

#[tokio::test]
async fn publisher_added_while_running_gets_a_pump() {
    let reactor = summing_reactor();
    reactor.start().await;

    let (feed_tx, feed_rx) = mpsc::channel(8);
    reactor.add_publisher("late", feed_rx).settle().await;

    feed_tx.send(3).await.unwrap();
    eventually(|| reactor.state() == 3, "late publisher reduction").await;
}

#[tokio::test]
async fn externally_closed_publisher_is_auto_removed() {
    let reactor = summing_reactor();

    let (feed_tx, feed_rx) = mpsc::channel::<i64>(8);
    reactor.add_publisher("p", feed_rx).start().await;
    assert_eq!(reactor.publisher_idents(), vec!["p".to_string()]);

    drop(feed_tx);
    eventually(
        || reactor.publisher_idents().is_empty(),
        "publisher auto-removal",
    )
    .await;
}

#[tokio::test]
async fn externally_closed_subscriber_is_auto_removed() {
    let reactor = summing_reactor();

    let (a_tx, mut a_rx) = mpsc::channel(8);
    let (b_tx, b_rx) = mpsc::channel(8);
    reactor
        .add_subscriber("a", a_tx)
        .add_subscriber("b", b_tx)
        .start()
        .await;
    assert_eq!(a_rx.recv().await, Some(0));

    drop(b_rx);
    eventually(
        || reactor.subscriber_idents() == vec!["a".to_string()],
        "subscriber auto-removal",
    )
    .await;
    assert_eq!(reactor.phase(), Phase::Running);
}

#[tokio::test]
async fn late_subscriber_catches_up_with_current_state() {
    let reactor = summing_reactor();
    reactor.start().await;

    // No subscribers attached: the transition emits nothing.
    reactor.update(|_| 41).settle().await;

    let (view_tx, mut view_rx) = mpsc::channel(8);
    reactor.add_subscriber("late", view_tx).settle().await;

    // First message equals emitter(empty, current).
    assert_eq!(view_rx.recv().await, Some(41));

    reactor.update(|n| n + 1).settle().await;
    assert_eq!(view_rx.recv().await, Some(42));
}

#[tokio::test]
async fn reattaching_an_ident_closes_the_previous_channel() {
    let reactor = summing_reactor();

    let (old_tx, old_rx) = mpsc::channel::<i64>(8);
    reactor.add_publisher("p", old_rx).start().await;

    let (new_tx, new_rx) = mpsc::channel::<i64>(8);
    reactor.add_publisher("p", new_rx).settle().await;

    eventually(|| old_tx.is_closed(), "replaced channel to close").await;

    new_tx.send(9).await.unwrap();
    eventually(|| reactor.state() == 9, "reduction from replacement").await;
}
