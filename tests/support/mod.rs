//! Shared helpers for integration tests.

use std::time::Duration;

use tokio::time::{sleep, Instant};

/// Polls `cond` until it holds or a 2 s deadline passes.
///
/// Used for effects that arrive through independent tasks (pumps,
/// close-watchers) where `settle()` alone cannot observe the hand-off.
pub async fn eventually(cond: impl Fn() -> bool, what: &str) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for: {what}");
        sleep(Duration::from_millis(5)).await;
    }
}
