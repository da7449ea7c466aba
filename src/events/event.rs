//! # Runtime events emitted by the synchronizer and its tasks.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Lifecycle events**: task registration, start, and stop
//! - **Shutdown events**: the stop sequence (requested, completed, timed out)
//! - **Diagnostic events**: cadence overruns, misuse, subscriber faults
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! task name, reasons, and durations.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Task lifecycle events ===
    /// Task was added to the registry.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskRegistered,

    /// Task body was started by `run()`.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskStarted,

    /// Task body returned (after observing cancellation or on its own).
    ///
    /// Sets:
    /// - `task`: task name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskStopped,

    /// A periodic task's job ran longer than its interval; the next
    /// invocation starts back-to-back with no idle wait.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `lag_ms`: how far past the interval the job ran (ms)
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    IntervalOverrun,

    // === Shutdown events ===
    /// Stop requested; cancellation is being fanned out to all tasks.
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ShutdownRequested,

    /// All tasks stopped within the configured stop timeout.
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    AllStoppedWithin,

    /// Stop timeout elapsed; some tasks are still running (left detached).
    ///
    /// Sets:
    /// - `timeout_ms`: configured stop timeout (ms)
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    StopTimeout,

    // === Diagnostics ===
    /// `run()` was called more than once; the repeated call did nothing.
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    RunRepeated,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info/message
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the task (or subscriber), if applicable.
    pub task: Option<Arc<str>>,
    /// Human-readable reason (overflow details, panic info, etc.).
    pub reason: Option<Arc<str>>,
    /// Stop timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Periodic overrun lag in milliseconds (compact).
    pub lag_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            reason: None,
            timeout_ms: None,
            lag_ms: None,
        }
    }

    /// Attaches a task (or subscriber) name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a stop timeout (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(Self::as_clamped_ms(d));
        self
    }

    /// Attaches an overrun lag (stored as milliseconds).
    #[inline]
    pub fn with_lag(mut self, d: Duration) -> Self {
        self.lag_ms = Some(Self::as_clamped_ms(d));
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::now(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::now(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    fn as_clamped_ms(d: Duration) -> u32 {
        d.as_millis().min(u128::from(u32::MAX)) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::now(EventKind::TaskStarted);
        let b = Event::now(EventKind::TaskStopped);
        assert!(b.seq > a.seq, "seq must increase: {} then {}", a.seq, b.seq);
    }

    #[test]
    fn test_builders_set_fields() {
        let ev = Event::now(EventKind::IntervalOverrun)
            .with_task("poller")
            .with_lag(Duration::from_millis(250));
        assert_eq!(ev.task.as_deref(), Some("poller"));
        assert_eq!(ev.lag_ms, Some(250));
        assert!(ev.timeout_ms.is_none());
    }

    #[test]
    fn test_huge_duration_clamps_to_u32() {
        let ev = Event::now(EventKind::StopTimeout).with_timeout(Duration::from_secs(u64::MAX / 2));
        assert_eq!(ev.timeout_ms, Some(u32::MAX));
    }
}
