//! # Reactor configuration.
//!
//! [`ReactorConfig`] carries the ambient settings of a reactor: its name
//! (attached to every lifecycle event) and the capacity of the internal event
//! bus. The behavioral knobs — reducer, emitter, initializer, backoff,
//! observers — are installed through [`ReactorBuilder`](crate::ReactorBuilder)
//! because they are closures and cannot live in a plain config struct.
//!
//! # Example
//! ```
//! use statevisor::ReactorConfig;
//!
//! let mut cfg = ReactorConfig::default();
//! cfg.name = "session-42".into();
//! cfg.bus_capacity = 256;
//!
//! assert_eq!(cfg.bus_capacity_clamped(), 256);
//! ```

use std::borrow::Cow;

/// Ambient configuration for a reactor.
#[derive(Clone, Debug)]
pub struct ReactorConfig {
    /// Name attached to every event this reactor publishes.
    ///
    /// Useful when one process hosts many reactors and observers need to tell
    /// them apart.
    pub name: Cow<'static, str>,
    /// Capacity of the lifecycle event bus channel.
    pub bus_capacity: usize,
}

impl Default for ReactorConfig {
    /// Provides a default configuration:
    /// - `name = "reactor"`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            name: Cow::Borrowed("reactor"),
            bus_capacity: 1024,
        }
    }
}

impl ReactorConfig {
    /// Creates a configuration with the given reactor name.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Bus capacity clamped to at least 1 (a zero-capacity broadcast channel
    /// panics at construction).
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}
