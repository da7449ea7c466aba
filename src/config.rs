//! # Runtime configuration.
//!
//! Provides [`Config`], centralized settings for a [`Synchronizer`](crate::Synchronizer).
//!
//! Config is used in two ways:
//! 1. **Shorthand**: `Synchronizer::new(timeout)` fills the rest with defaults.
//! 2. **Full control**: `Synchronizer::with_config(config, subscribers)`.

use std::time::Duration;

/// Configuration for a synchronizer instance.
///
/// ## Field semantics
/// - `stop_timeout`: Maximum wall-clock wait inside `stop()` for all tasks to
///   complete. The window is always finite; when it closes, `stop()` reports
///   the stragglers but does not terminate them.
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by the bus).
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time `stop()` waits for tasks to complete before reporting an
    /// ungraceful shutdown.
    pub stop_timeout: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages
    /// will skip older items.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `stop_timeout = 30s` (reasonable graceful shutdown window)
    /// - `bus_capacity = 256` (good baseline)
    fn default() -> Self {
        Self {
            stop_timeout: Duration::from_secs(30),
            bus_capacity: 256,
        }
    }
}
