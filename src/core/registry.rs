//! # Task registry: ordered task list and completion barrier.
//!
//! The registry owns everything `run()`/`stop()` operate on:
//! - the ordered list of registered tasks (insertion order = registration
//!   order), each paired with its own [`CancellationToken`];
//! - the [`TaskTracker`] completion barrier;
//! - the join handles of started bodies, kept for straggler reporting.
//!
//! ## Rules
//! - The list lock is held only for the duration of a read or append, never
//!   across an await.
//! - `spawn_all` iterates a **snapshot** of the list, so every started body is
//!   bound to its own entry and its own token.
//! - The tracker registers a task before its body is polled and releases when
//!   the body completes; `wait_all` can therefore never observe a count lower
//!   than the number of running bodies.
//! - Cancelling a token never blocks, and cancelling twice is a no-op; the
//!   cancel fan-out is a plain loop with no helper tasks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::events::{Bus, Event, EventKind};
use crate::tasks::{Task, TaskRef};

/// One registered task and its cancellation token.
#[derive(Clone)]
struct Entry {
    task: TaskRef,
    cancel: CancellationToken,
}

/// A started body's name and join handle.
struct Started {
    name: Arc<str>,
    join: JoinHandle<()>,
}

/// Ordered registry of tasks with a completion barrier.
pub(crate) struct Registry {
    entries: RwLock<Vec<Entry>>,
    started: Mutex<Vec<Started>>,
    tracker: TaskTracker,
    spawned: AtomicBool,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            started: Mutex::new(Vec::new()),
            tracker: TaskTracker::new(),
            spawned: AtomicBool::new(false),
        }
    }

    /// Appends a task with a fresh cancellation token.
    pub(crate) fn add(&self, task: TaskRef) {
        let entry = Entry {
            task,
            cancel: CancellationToken::new(),
        };
        self.entries
            .write()
            .expect("task registry lock poisoned")
            .push(entry);
    }

    /// Number of registered tasks.
    pub(crate) fn len(&self) -> usize {
        self.entries
            .read()
            .expect("task registry lock poisoned")
            .len()
    }

    /// Starts every registered task body on the tracker.
    ///
    /// Returns `false` if the registry was already spawned (repeated `run()`).
    /// Tasks registered after this call never start; their tokens are still
    /// cancelled by [`cancel_all`](Self::cancel_all), which is harmless.
    pub(crate) fn spawn_all(&self, bus: &Bus) -> bool {
        if self.spawned.swap(true, Ordering::SeqCst) {
            return false;
        }

        let snapshot: Vec<Entry> = self
            .entries
            .read()
            .expect("task registry lock poisoned")
            .clone();

        for entry in snapshot {
            let name: Arc<str> = Arc::from(entry.task.name());
            let body = entry.task.spawn(entry.cancel.clone());

            bus.publish(Event::now(EventKind::TaskStarted).with_task(Arc::clone(&name)));

            let bus = bus.clone();
            let stopped_name = Arc::clone(&name);
            let join = self.tracker.spawn(async move {
                body.await;
                bus.publish(Event::now(EventKind::TaskStopped).with_task(stopped_name));
            });

            self.started
                .lock()
                .expect("started-handles lock poisoned")
                .push(Started { name, join });
        }
        true
    }

    /// Cancels every registered task's token.
    ///
    /// The lock is released before any token is touched; cancellation itself
    /// is non-blocking and idempotent, so no send can stall another and a
    /// repeated call changes nothing.
    pub(crate) fn cancel_all(&self) {
        let tokens: Vec<CancellationToken> = self
            .entries
            .read()
            .expect("task registry lock poisoned")
            .iter()
            .map(|e| e.cancel.clone())
            .collect();

        for token in tokens {
            token.cancel();
        }
    }

    /// Waits up to `timeout` for every started body to complete.
    ///
    /// On timeout, returns the names of bodies that were still running. They
    /// are left running; nothing is aborted.
    pub(crate) async fn wait_all(&self, timeout: Duration) -> Result<(), Vec<String>> {
        self.tracker.close();

        match tokio::time::timeout(timeout, self.tracker.wait()).await {
            Ok(()) => Ok(()),
            Err(_elapsed) => {
                let stuck: Vec<String> = self
                    .started
                    .lock()
                    .expect("started-handles lock poisoned")
                    .iter()
                    .filter(|s| !s.join.is_finished())
                    .map(|s| s.name.to_string())
                    .collect();
                Err(stuck)
            }
        }
    }
}
