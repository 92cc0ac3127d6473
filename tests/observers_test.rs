//! Observer fan-out integration tests: lifecycle event delivery, ordering,
//! and panic isolation.

mod support;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use statevisor::{Event, EventKind, Observer, Reactor, ReactorBuilder, ReactorConfig};
use tokio::sync::mpsc;

use support::eventually;

// ---------------------------------------------------------------------------
// Test observers
// ---------------------------------------------------------------------------

/// Records every event kind (and seq) it sees.
struct Recorder {
    seen: Arc<Mutex<Vec<(u64, EventKind)>>>,
}

#[async_trait]
impl Observer for Recorder {
    async fn on_event(&self, event: &Event) {
        self.seen.lock().unwrap().push((event.seq, event.kind));
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

/// Panics on every event; other observers must be unaffected.
struct Grenade;

#[async_trait]
impl Observer for Grenade {
    async fn on_event(&self, _event: &Event) {
        panic!("observer grenade");
    }

    fn name(&self) -> &'static str {
        "grenade"
    }
}

fn kinds(seen: &Arc<Mutex<Vec<(u64, EventKind)>>>) -> Vec<EventKind> {
    seen.lock().unwrap().iter().map(|(_, kind)| *kind).collect()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn observers_see_the_lifecycle_in_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Recorder {
        seen: Arc::clone(&seen),
    };

    let reactor: Reactor<i64, i64, i64> = ReactorBuilder::new(ReactorConfig::named("observed"))
        .with_initializer(|| Ok(1))
        .with_emitter(|_old, new| Ok(vec![*new]))
        .with_observers(vec![Arc::new(recorder)])
        .build();

    let (view_tx, mut view_rx) = mpsc::channel(8);
    reactor.add_subscriber("s", view_tx).start().await;
    assert_eq!(view_rx.recv().await, Some(1));

    reactor.update(|n| n + 1).settle().await;
    assert_eq!(view_rx.recv().await, Some(2));

    reactor.remove_subscriber("s").settle().await;

    eventually(
        || kinds(&seen).contains(&EventKind::Imploded),
        "terminal event to reach the observer",
    )
    .await;

    let observed = kinds(&seen);
    let position = |kind: EventKind| observed.iter().position(|k| *k == kind);

    assert!(observed.contains(&EventKind::SubscriberAdded));
    assert!(observed.contains(&EventKind::ReactorStarted));
    assert!(observed.contains(&EventKind::StateChanged));
    assert!(observed.contains(&EventKind::SubscriberRemoved));
    assert!(position(EventKind::ReactorStarted) < position(EventKind::StateChanged));
    assert!(position(EventKind::StateChanged) < position(EventKind::Imploded));

    // Sequence numbers arrive monotonically within one observer's queue.
    let seqs: Vec<u64> = seen.lock().unwrap().iter().map(|(seq, _)| *seq).collect();
    assert!(seqs.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn a_panicking_observer_does_not_affect_others() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Recorder {
        seen: Arc::clone(&seen),
    };

    let reactor: Reactor<i64, i64, i64> = ReactorBuilder::new(ReactorConfig::named("isolated"))
        .with_observers(vec![Arc::new(Grenade), Arc::new(recorder)])
        .build();
    reactor.start().await;

    eventually(
        || kinds(&seen).contains(&EventKind::ReactorStarted),
        "healthy observer to keep receiving",
    )
    .await;

    // The panic surfaces as an event instead of killing the worker.
    reactor.update(|n| n + 1).settle().await;
    eventually(
        || kinds(&seen).contains(&EventKind::ObserverPanicked),
        "panic report to be published",
    )
    .await;
}
