//! # Backoff policy for reactor reboots.
//!
//! A reactor consumes one backoff delay per reboot; when the sequence runs
//! out, the reactor implodes. Two shapes are supported:
//!
//! - [`BackoffPolicy`] — a computed schedule parameterized by an initial
//!   delay, a multiplicative growth factor, a cap, an optional entry limit,
//!   and a [`JitterPolicy`]. `limit: None` yields an infinite schedule (the
//!   reactor reboots forever).
//! - [`BackoffSeq`] — any boxed iterator of delays, for callers who want an
//!   arbitrary (lazy, possibly infinite) sequence.
//!
//! The default policy doubles from 500 ms and stops after eight entries:
//! `500ms, 1s, 2s, 4s, 8s, 16s, 32s, 64s`.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use statevisor::BackoffPolicy;
//!
//! let mut delays = BackoffPolicy::default().delays();
//! assert_eq!(delays.next(), Some(Duration::from_millis(500)));
//! assert_eq!(delays.next(), Some(Duration::from_secs(1)));
//! assert_eq!(delays.nth(5), Some(Duration::from_secs(64)));
//! assert_eq!(delays.next(), None); // exhausted → the reactor would implode
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Lazy sequence of reboot delays, consumed head-first.
///
/// Exhaustion (the iterator returning `None`) is what triggers implosion
/// during recovery. Infinite iterators are allowed and mean "reboot forever".
pub type BackoffSeq = Box<dyn Iterator<Item = Duration> + Send + 'static>;

/// Computed reboot-delay schedule.
///
/// Encapsulates parameters that determine how reboot delays grow:
/// - [`first`](Self::first) — the initial delay;
/// - [`factor`](Self::factor) — multiplicative growth factor (`>= 1.0` recommended);
/// - [`max`](Self::max) — the delay cap;
/// - [`limit`](Self::limit) — number of entries before exhaustion (`None` = infinite);
/// - [`jitter`](Self::jitter) — randomization applied to each delay.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Initial delay before the first reboot.
    pub first: Duration,
    /// Maximum delay cap.
    pub max: Duration,
    /// Multiplicative growth factor.
    pub factor: f64,
    /// Number of reboots allowed before the schedule exhausts.
    ///
    /// `None` makes the schedule infinite; the reactor then never implodes
    /// from backoff exhaustion.
    pub limit: Option<u32>,
    /// Jitter policy to prevent thundering herd across many reactors.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns a schedule with:
    /// - `first = 500ms`;
    /// - `factor = 2.0`;
    /// - `max = 64s`;
    /// - `limit = 8`;
    /// - no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(500),
            max: Duration::from_secs(64),
            factor: 2.0,
            limit: Some(8),
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Converts the policy into its lazy delay sequence.
    pub fn delays(self) -> BackoffSeq {
        Box::new(Schedule {
            policy: self,
            prev: None,
            used: 0,
        })
    }

    /// Computes the next raw delay from the previous one (pre-jitter).
    ///
    /// - If `prev` is `None`, returns `first` **clamped to `max`**.
    /// - Otherwise multiplies the previous delay by [`factor`](Self::factor)
    ///   and caps it at [`max`](Self::max).
    fn next_raw(&self, prev: Option<Duration>) -> Duration {
        let unclamped = match prev {
            None => self.first,
            Some(d) => {
                let mul = d.as_secs_f64() * self.factor;
                if !mul.is_finite() {
                    self.max
                } else {
                    d.mul_f64(self.factor)
                }
            }
        };
        unclamped.min(self.max)
    }
}

/// Iterator state for a computed schedule.
struct Schedule {
    policy: BackoffPolicy,
    prev: Option<Duration>,
    used: u32,
}

impl Iterator for Schedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if let Some(limit) = self.policy.limit {
            if self.used >= limit {
                return None;
            }
        }
        self.used += 1;

        let base = self.policy.next_raw(self.prev);
        self.prev = Some(base);

        let jittered = match self.policy.jitter {
            JitterPolicy::Decorrelated => {
                let floor = self.policy.first.min(self.policy.max);
                let prev_for_jitter = self.prev.unwrap_or(floor);
                self.policy
                    .jitter
                    .apply_decorrelated(floor, prev_for_jitter, self.policy.max)
            }
            _ => self.policy.jitter.apply(base),
        };
        Some(jittered)
    }
}

/// Builds a [`BackoffSeq`] from an explicit list of delays.
///
/// Convenient in tests and for hand-tuned schedules:
/// ```rust
/// use std::time::Duration;
/// use statevisor::backoff_sequence;
///
/// let mut seq = backoff_sequence([1, 1, 1].map(Duration::from_millis));
/// assert_eq!(seq.next(), Some(Duration::from_millis(1)));
/// ```
pub fn backoff_sequence(delays: impl IntoIterator<Item = Duration>) -> BackoffSeq {
    let collected: Vec<Duration> = delays.into_iter().collect();
    Box::new(collected.into_iter())
}
