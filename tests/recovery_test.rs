//! Crash-recovery integration tests: reducer faults, reboot semantics,
//! catch-up re-broadcast, explicit reboot, and backoff exhaustion.

mod support;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use statevisor::{FaultError, Phase, Reactor, ReactorBuilder, ReactorConfig};
use tokio::sync::mpsc;

use support::eventually;

// ---------------------------------------------------------------------------
// Test state: a keyed map; emissions carry the keys added by a transition.
// ---------------------------------------------------------------------------

type State = BTreeMap<String, i64>;

fn added_keys(old: &State, new: &State) -> Vec<String> {
    new.keys()
        .filter(|key| !old.contains_key(*key))
        .cloned()
        .collect()
}

fn entry(key: &str, value: i64) -> State {
    BTreeMap::from([(key.to_string(), value)])
}

/// Reactor that merges published maps into its state; the reducer faults
/// whenever the mode flag is off.
fn merging_reactor(mode_on: Arc<AtomicBool>) -> Reactor<State, State, Vec<String>> {
    ReactorBuilder::new(ReactorConfig::named("recovery"))
        .with_initializer(|| Ok(entry("zero", 0)))
        .with_reducer(move |_reactor, mut state, _ident, change: State| {
            if !mode_on.load(Ordering::SeqCst) {
                return Err(FaultError::fault("mode off"));
            }
            state.extend(change);
            Ok(state)
        })
        .with_emitter(|old, new| Ok(vec![added_keys(old, new)]))
        .with_backoff_seq(std::iter::repeat(Duration::from_millis(5)))
        .build()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn crash_recovery_reemits_full_state() {
    let mode_on = Arc::new(AtomicBool::new(true));
    let reactor = merging_reactor(Arc::clone(&mode_on));

    let (feed_tx, feed_rx) = mpsc::channel::<State>(16);
    let (view_tx, mut view_rx) = mpsc::channel::<Vec<String>>(16);
    reactor
        .add_publisher("p", feed_rx)
        .add_subscriber("s", view_tx)
        .start()
        .await;

    assert_eq!(view_rx.recv().await, Some(vec!["zero".to_string()]));

    feed_tx.send(entry("one", 1)).await.unwrap();
    assert_eq!(view_rx.recv().await, Some(vec!["one".to_string()]));

    // The reducer now faults; the supervisor reboots, resets the state via
    // the initializer, and the full state is re-broadcast from empty.
    mode_on.store(false, Ordering::SeqCst);
    feed_tx.send(entry("two", 1)).await.unwrap();
    assert_eq!(view_rx.recv().await, Some(vec!["zero".to_string()]));
    reactor.settle().await;
    assert_eq!(reactor.restarts(), 1);
    assert_eq!(reactor.state(), entry("zero", 0));

    // Still crashing: same pump, same outcome, one more backoff entry.
    feed_tx.send(entry("two", 1)).await.unwrap();
    assert_eq!(view_rx.recv().await, Some(vec!["zero".to_string()]));
    reactor.settle().await;
    assert_eq!(reactor.restarts(), 2);

    // Healed: the pump survived both reboots and feeds the new incarnation.
    mode_on.store(true, Ordering::SeqCst);
    feed_tx.send(entry("two", 1)).await.unwrap();
    assert_eq!(view_rx.recv().await, Some(vec!["two".to_string()]));

    let mut expected = entry("zero", 0);
    expected.extend(entry("two", 1));
    eventually(|| reactor.state() == expected, "merged state").await;
    assert_eq!(reactor.phase(), Phase::Running);
}

#[tokio::test]
async fn explicit_reboot_takes_the_recovery_path() {
    let reactor: Reactor<i64, i64, i64> = ReactorBuilder::new(ReactorConfig::named("reboot"))
        .with_initializer(|| Ok(7))
        .with_emitter(|_old, new| Ok(vec![*new]))
        .with_backoff_seq(std::iter::repeat(Duration::from_millis(5)))
        .build();

    let (view_tx, mut view_rx) = mpsc::channel(8);
    reactor.add_subscriber("s", view_tx).start().await;
    assert_eq!(view_rx.recv().await, Some(7));

    reactor.update(|n| n + 1).settle().await;
    assert_eq!(view_rx.recv().await, Some(8));

    reactor.reboot().settle().await;
    assert_eq!(reactor.restarts(), 1);
    assert_eq!(reactor.state(), 7);
    // The re-initialized state is re-broadcast after the reboot.
    assert_eq!(view_rx.recv().await, Some(7));
    assert_eq!(reactor.phase(), Phase::Running);
}

#[tokio::test]
async fn queued_actions_are_discarded_by_reboot() {
    let reactor: Reactor<i64, i64, i64> = ReactorBuilder::new(ReactorConfig::named("discard"))
        .with_initializer(|| Ok(0))
        .with_backoff_seq(std::iter::repeat(Duration::from_millis(20)))
        .build();
    reactor.start().await;

    // The fault is queued first; the updates behind it belong to the old
    // incarnation and die with it.
    reactor
        .reboot()
        .update(|n| n + 1)
        .update(|n| n + 1)
        .settle()
        .await;

    assert_eq!(reactor.state(), 0);
    assert_eq!(reactor.restarts(), 1);
}

#[tokio::test]
async fn emitter_failure_faults_the_actor() {
    let poisoned = Arc::new(AtomicBool::new(false));
    let poison = Arc::clone(&poisoned);

    let reactor: Reactor<i64, i64, i64> = ReactorBuilder::new(ReactorConfig::named("emitter"))
        .with_initializer(|| Ok(1))
        .with_emitter(move |_old, new| {
            if poison.load(Ordering::SeqCst) {
                return Err(FaultError::fault("emitter blew up"));
            }
            Ok(vec![*new])
        })
        .with_backoff_seq(std::iter::repeat(Duration::from_millis(5)))
        .build();

    let (view_tx, mut view_rx) = mpsc::channel(8);
    reactor.add_subscriber("s", view_tx).start().await;
    assert_eq!(view_rx.recv().await, Some(1));

    // While poisoned, every re-broadcast attempt faults again, so the
    // reactor keeps consuming backoff entries until the emitter heals.
    poisoned.store(true, Ordering::SeqCst);
    reactor.update(|n| n + 1);
    eventually(|| reactor.restarts() >= 1, "emitter fault to trigger reboot").await;

    poisoned.store(false, Ordering::SeqCst);
    reactor.settle().await;
    assert_eq!(reactor.state(), 1);
    assert_eq!(reactor.phase(), Phase::Running);
    // No partial emissions leaked while poisoned; the healed reboot
    // re-broadcasts the full state.
    assert_eq!(view_rx.recv().await, Some(1));
}

#[tokio::test]
async fn panic_in_blocking_update_is_a_fault() {
    let reactor: Reactor<i64, i64, i64> = ReactorBuilder::new(ReactorConfig::named("panicky"))
        .with_initializer(|| Ok(3))
        .with_backoff_seq(std::iter::repeat(Duration::from_millis(5)))
        .build();
    reactor.start().await;

    reactor.update_blocking(|_| panic!("boom")).settle().await;
    assert_eq!(reactor.restarts(), 1);
    assert_eq!(reactor.state(), 3);
    assert_eq!(reactor.phase(), Phase::Running);
}

#[tokio::test]
async fn backoff_exhaustion_implodes() {
    let destroyed = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&destroyed);

    let reactor: Reactor<i64, i64, i64> = ReactorBuilder::new(ReactorConfig::named("doomed"))
        .with_initializer(|| Err(FaultError::fault("init always fails")))
        .with_backoff_seq([1u64, 1, 1].map(Duration::from_millis).into_iter())
        .build();

    let (view_tx, _view_rx) = mpsc::channel::<i64>(4);
    reactor
        .add_destructor("d1", move || flag.store(true, Ordering::SeqCst))
        .add_subscriber("s", view_tx)
        .start()
        .await;

    // Three backoff entries → three reboots, then terminal implosion.
    assert_eq!(reactor.phase(), Phase::Imploded);
    assert_eq!(reactor.restarts(), 3);
    assert!(destroyed.load(Ordering::SeqCst));
}
