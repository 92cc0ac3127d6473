//! Backoff schedule and jitter unit-style tests.

use std::time::Duration;

use statevisor::{backoff_sequence, BackoffPolicy, JitterPolicy};

#[test]
fn default_backoff_doubles_from_500ms_for_eight_entries() {
    let delays: Vec<Duration> = BackoffPolicy::default().delays().collect();
    let expected: Vec<Duration> = [500u64, 1000, 2000, 4000, 8000, 16000, 32000, 64000]
        .iter()
        .map(|ms| Duration::from_millis(*ms))
        .collect();
    assert_eq!(delays, expected);
}

#[test]
fn growth_is_capped_at_max() {
    let policy = BackoffPolicy {
        first: Duration::from_millis(100),
        max: Duration::from_millis(250),
        factor: 2.0,
        limit: Some(4),
        jitter: JitterPolicy::None,
    };
    let delays: Vec<Duration> = policy.delays().collect();
    assert_eq!(
        delays,
        vec![
            Duration::from_millis(100),
            Duration::from_millis(200),
            Duration::from_millis(250),
            Duration::from_millis(250),
        ]
    );
}

#[test]
fn unlimited_policy_is_infinite() {
    let policy = BackoffPolicy {
        limit: None,
        ..BackoffPolicy::default()
    };
    let taken: Vec<Duration> = policy.delays().take(20).collect();
    assert_eq!(taken.len(), 20);
    assert_eq!(taken.last(), Some(&Duration::from_secs(64)));
}

#[test]
fn explicit_sequence_is_consumed_head_first() {
    let mut seq = backoff_sequence([1u64, 2, 3].map(Duration::from_millis));
    assert_eq!(seq.next(), Some(Duration::from_millis(1)));
    assert_eq!(seq.next(), Some(Duration::from_millis(2)));
    assert_eq!(seq.next(), Some(Duration::from_millis(3)));
    assert_eq!(seq.next(), None);
}

#[test]
fn full_jitter_never_exceeds_the_base_delay() {
    let base = Duration::from_millis(200);
    for _ in 0..100 {
        assert!(JitterPolicy::Full.apply(base) <= base);
    }
}

#[test]
fn equal_jitter_keeps_at_least_half_the_delay() {
    let base = Duration::from_millis(200);
    for _ in 0..100 {
        let jittered = JitterPolicy::Equal.apply(base);
        assert!(jittered >= base / 2);
        assert!(jittered <= base);
    }
}

#[test]
fn decorrelated_jitter_stays_within_bounds() {
    let base = Duration::from_millis(50);
    let max = Duration::from_millis(400);
    let prev = Duration::from_millis(100);
    for _ in 0..100 {
        let jittered = JitterPolicy::Decorrelated.apply_decorrelated(base, prev, max);
        assert!(jittered >= base);
        assert!(jittered <= prev * 3);
        assert!(jittered <= max);
    }
}

#[test]
fn jittered_schedule_respects_the_entry_limit() {
    let policy = BackoffPolicy {
        first: Duration::from_millis(100),
        max: Duration::from_secs(1),
        factor: 2.0,
        limit: Some(3),
        jitter: JitterPolicy::Equal,
    };
    assert_eq!(policy.delays().count(), 3);
}
