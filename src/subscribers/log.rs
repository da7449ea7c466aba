//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [registered] task=poller
//! [started] task=poller
//! [overrun] task=poller lag=250ms
//! [shutdown-requested]
//! [stopped] task=poller
//! [all-stopped-within-timeout]
//! [stop-timeout] timeout=5000ms
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::Subscribe;

/// Simple stdout logging subscriber.
///
/// Prints human-readable event descriptions to stdout for debugging and
/// demonstration purposes. Not intended for production use - implement a
/// custom [`Subscribe`] for structured logging or metrics collection.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::TaskRegistered => {
                if let Some(task) = &e.task {
                    println!("[registered] task={task}");
                }
            }
            EventKind::TaskStarted => {
                if let Some(task) = &e.task {
                    println!("[started] task={task}");
                }
            }
            EventKind::TaskStopped => {
                if let Some(task) = &e.task {
                    println!("[stopped] task={task}");
                }
            }
            EventKind::IntervalOverrun => {
                println!("[overrun] task={:?} lag={:?}ms", e.task, e.lag_ms);
            }
            EventKind::ShutdownRequested => {
                println!("[shutdown-requested]");
            }
            EventKind::AllStoppedWithin => {
                println!("[all-stopped-within-timeout]");
            }
            EventKind::StopTimeout => {
                println!("[stop-timeout] timeout={:?}ms", e.timeout_ms);
            }
            EventKind::RunRepeated => {
                println!("[run-repeated]");
            }
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {
                println!("[subscriber-fault] name={:?} reason={:?}", e.task, e.reason);
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
