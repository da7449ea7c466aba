//! # Synchronizer: coordinated start and deadline-bounded graceful shutdown.
//!
//! The [`Synchronizer`] owns the task registry, the event bus, and the stop
//! timeout. Tasks are registered through the builders
//! ([`every`](Synchronizer::every), [`continuous`](Synchronizer::continuous))
//! or directly ([`add_task`](Synchronizer::add_task)), started together by
//! [`run`](Synchronizer::run), and stopped together by
//! [`stop`](Synchronizer::stop).
//!
//! ## High-level architecture
//! ```text
//! Registration (before run):
//!   every(d).run(f)      ──► periodic task   ──┐
//!   continuous(run,stop) ──► bridge task     ──┼──► Registry (ordered list,
//!   add_task(task)       ──► any Task impl   ──┘     token per task)
//!
//! run():
//!   Registry snapshot ──► one tokio task per entry, tracked by the
//!   completion barrier; subscriber listener starts fanning out events
//!
//! stop():
//!   publish ShutdownRequested
//!     └─► cancel every task's token (non-blocking fan-out)
//!     └─► race stop_timeout against the completion barrier:
//!            ├─ all done   → publish AllStoppedWithin → Ok(())
//!            └─ timeout    → publish StopTimeout      → Err(StopTimeout
//!                            { timeout, stuck })  (stragglers keep running)
//! ```
//!
//! ## Misuse safety
//! The hazards of a channel-based design (second stop blocking forever, stop
//! before run deadlocking) are defined away by the token-based cancellation:
//! - `stop()` may be called again; it re-evaluates the barrier and returns.
//! - `stop()` before `run()` pre-cancels the tokens; bodies started later
//!   observe cancellation immediately and exit.
//! - a repeated `run()` starts nothing and publishes
//!   [`RunRepeated`](crate::EventKind::RunRepeated).
//!
//! ## Example
//! ```no_run
//! use std::time::Duration;
//! use tasksync::{Synchronizer, block_until_quit};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let sync = Synchronizer::new(Duration::from_secs(10));
//!
//!     sync.every(Duration::from_secs(5)).named("poller").run(|| async {
//!         // poll something...
//!     });
//!
//!     sync.run();
//!     block_until_quit().await?;
//!
//!     if let Err(e) = sync.stop().await {
//!         eprintln!("ungraceful shutdown: {e}");
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;

use crate::config::Config;
use crate::core::bridge::ContinuousTask;
use crate::core::periodic::Every;
use crate::core::registry::Registry;
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::tasks::{Task, TaskRef};

/// Deferred subscriber wiring, consumed by the first `run()`.
///
/// The receiver is created at construction time so registration events are
/// retained (up to bus capacity) until the listener starts draining them.
struct ListenerInit {
    rx: broadcast::Receiver<Event>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

/// Coordinates a group of background tasks: start together, stop together
/// within a bounded window.
pub struct Synchronizer {
    cfg: Config,
    bus: Bus,
    registry: Registry,
    listener: Mutex<Option<ListenerInit>>,
    periodic_seq: AtomicU64,
}

impl Synchronizer {
    /// Creates a synchronizer with the given stop timeout and no subscribers.
    pub fn new(stop_timeout: Duration) -> Self {
        Self::with_config(
            Config {
                stop_timeout,
                ..Config::default()
            },
            Vec::new(),
        )
    }

    /// Creates a synchronizer with full configuration and event subscribers.
    pub fn with_config(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let rx = bus.subscribe();
        Self {
            cfg,
            bus,
            registry: Registry::new(),
            listener: Mutex::new(Some(ListenerInit { rx, subscribers })),
            periodic_seq: AtomicU64::new(0),
        }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Returns the number of registered tasks.
    pub fn task_count(&self) -> usize {
        self.registry.len()
    }

    /// Creates an independent receiver for the runtime's events.
    ///
    /// Useful for tests and ad-hoc observation; for long-lived consumers
    /// prefer a [`Subscribe`] implementation passed to
    /// [`with_config`](Synchronizer::with_config).
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Begins building a periodic task: `sync.every(d).run(job)`.
    ///
    /// The job's nominal cadence is `interval` regardless of how long the job
    /// itself takes, until the job's cost exceeds the interval (then
    /// invocations run back-to-back).
    pub fn every(&self, interval: Duration) -> Every<'_> {
        Every::new(self, interval)
    }

    /// Registers a continuous task from a blocking `run`/`stop` pair.
    ///
    /// `run` is executed on the blocking pool until it returns; on
    /// cancellation `stop` is invoked, whose contract is to make `run` return
    /// eventually. The pair's only shutdown bound is this synchronizer's stop
    /// timeout.
    pub fn continuous(
        &self,
        name: impl Into<std::borrow::Cow<'static, str>>,
        run: impl FnOnce() + Send + 'static,
        stop: impl FnOnce() + Send + 'static,
    ) {
        self.add_task(Arc::new(ContinuousTask::new(name, run, stop)));
    }

    /// Registers any [`Task`](crate::Task) implementation.
    ///
    /// Registration order is preserved but carries no scheduling meaning.
    /// Tasks registered after `run()` never start.
    pub fn add_task(&self, task: TaskRef) {
        let name: Arc<str> = Arc::from(task.name());
        self.registry.add(task);
        self.bus
            .publish(Event::now(EventKind::TaskRegistered).with_task(name));
    }

    /// Starts every registered task. Returns immediately.
    ///
    /// Each task body runs as its own tokio task, registered on the
    /// completion barrier before it is polled. A repeated call starts nothing
    /// and publishes [`RunRepeated`](crate::EventKind::RunRepeated).
    ///
    /// Must be called from within a tokio runtime.
    pub fn run(&self) {
        self.start_listener();
        if !self.registry.spawn_all(&self.bus) {
            self.bus.publish(Event::now(EventKind::RunRepeated));
        }
    }

    /// Cancels every registered task and waits for all of them to complete,
    /// up to the configured stop timeout.
    ///
    /// Returns `Ok(())` when every task completed within the window, or
    /// [`RuntimeError::StopTimeout`] naming the tasks that were still running
    /// when it closed. Stragglers are never force-terminated; they keep
    /// running detached and the caller decides what to do about them.
    ///
    /// Calling `stop()` again is safe: cancellation is idempotent and the
    /// barrier is simply re-evaluated.
    pub async fn stop(&self) -> Result<(), RuntimeError> {
        self.bus.publish(Event::now(EventKind::ShutdownRequested));
        self.registry.cancel_all();

        match self.registry.wait_all(self.cfg.stop_timeout).await {
            Ok(()) => {
                self.bus.publish(Event::now(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(stuck) => {
                self.bus.publish(
                    Event::now(EventKind::StopTimeout).with_timeout(self.cfg.stop_timeout),
                );
                Err(RuntimeError::StopTimeout {
                    timeout: self.cfg.stop_timeout,
                    stuck,
                })
            }
        }
    }

    /// Spawns the bus → subscriber fan-out on the first `run()`.
    fn start_listener(&self) {
        let init = self
            .listener
            .lock()
            .expect("listener init lock poisoned")
            .take();

        let Some(ListenerInit { mut rx, subscribers }) = init else {
            return;
        };
        if subscribers.is_empty() {
            return;
        }

        let set = SubscriberSet::new(subscribers);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
            set.shutdown().await;
        });
    }

    pub(crate) fn bus(&self) -> &Bus {
        &self.bus
    }

    pub(crate) fn next_periodic_name(&self) -> String {
        format!("periodic-{}", self.periodic_seq.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskFn;
    use std::sync::atomic::{AtomicBool, AtomicU32};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    #[tokio::test(start_paused = true)]
    async fn test_stop_in_wait_phase_is_graceful() {
        let sync = Synchronizer::new(Duration::from_secs(5));
        let ticks = Arc::new(AtomicU32::new(0));

        {
            let ticks = Arc::clone(&ticks);
            sync.every(Duration::from_millis(100)).named("ticker").run(move || {
                let ticks = Arc::clone(&ticks);
                async move {
                    ticks.fetch_add(1, Ordering::SeqCst);
                }
            });
        }

        sync.run();
        tokio::time::sleep(Duration::from_millis(350)).await;

        sync.stop().await.expect("ticker honors cancellation promptly");
        assert!(
            ticks.load(Ordering::SeqCst) >= 3,
            "ticker should have run a few times before stop"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_timeout_reports_stuck_task() {
        let sync = Synchronizer::with_config(
            Config {
                stop_timeout: Duration::from_millis(50),
                ..Config::default()
            },
            Vec::new(),
        );

        sync.add_task(TaskFn::arc("deaf", |_ctx: CancellationToken| async {
            std::future::pending::<()>().await;
        }));
        sync.add_task(TaskFn::arc("obedient", |ctx: CancellationToken| async move {
            ctx.cancelled().await;
        }));

        sync.run();
        let err = sync.stop().await.expect_err("deaf task must trip the timeout");

        match err {
            RuntimeError::StopTimeout { timeout, stuck } => {
                assert_eq!(timeout, Duration::from_millis(50));
                assert_eq!(stuck, vec!["deaf".to_string()]);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_run_and_double_stop_do_not_hang() {
        let sync = Synchronizer::new(Duration::from_millis(100));
        sync.add_task(TaskFn::arc("late", |ctx: CancellationToken| async move {
            ctx.cancelled().await;
        }));

        // Stop before run: tokens are pre-cancelled, nothing deadlocks.
        sync.stop().await.expect("stop before run completes");

        // The late-started body observes an already-cancelled token.
        sync.run();
        sync.stop().await.expect("second stop completes");
        sync.stop().await.expect("third stop is still a no-op");
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_run_publishes_event_and_starts_nothing() {
        let sync = Synchronizer::new(Duration::from_secs(1));
        let starts = Arc::new(AtomicU32::new(0));

        {
            let starts = Arc::clone(&starts);
            sync.add_task(TaskFn::arc("once", move |ctx: CancellationToken| {
                let starts = Arc::clone(&starts);
                async move {
                    starts.fetch_add(1, Ordering::SeqCst);
                    ctx.cancelled().await;
                }
            }));
        }

        let mut rx = sync.subscribe();
        assert_eq!(sync.task_count(), 1);
        sync.run();
        sync.run();

        tokio::task::yield_now().await;
        assert_eq!(starts.load(Ordering::SeqCst), 1, "body must start exactly once");

        let mut saw_repeated = false;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::RunRepeated {
                saw_repeated = true;
            }
        }
        assert!(saw_repeated, "second run() must surface RunRepeated");

        sync.stop().await.expect("graceful stop");
    }

    #[tokio::test(start_paused = true)]
    async fn test_lifecycle_events_in_causal_order() {
        let sync = Synchronizer::new(Duration::from_secs(1));
        let mut rx = sync.subscribe();

        sync.add_task(TaskFn::arc("observed", |ctx: CancellationToken| async move {
            ctx.cancelled().await;
        }));
        sync.run();
        tokio::task::yield_now().await;
        sync.stop().await.expect("graceful stop");

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        let pos = |k: EventKind| kinds.iter().position(|x| *x == k);

        let registered = pos(EventKind::TaskRegistered).expect("TaskRegistered");
        let started = pos(EventKind::TaskStarted).expect("TaskStarted");
        let requested = pos(EventKind::ShutdownRequested).expect("ShutdownRequested");
        let stopped = pos(EventKind::TaskStopped).expect("TaskStopped");
        let all_done = pos(EventKind::AllStoppedWithin).expect("AllStoppedWithin");

        assert!(registered < started, "registered before started");
        assert!(started < requested, "started before shutdown request");
        assert!(requested < stopped, "cancellation precedes task exit");
        assert!(stopped < all_done, "task exit precedes the all-done event");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_ten_continuous_tasks_all_graceful() {
        const N: usize = 10;
        let sync = Arc::new(Synchronizer::new(Duration::from_secs(5)));

        let mut flags = Vec::with_capacity(N);
        for i in 0..N {
            let quit = Arc::new(AtomicBool::new(false));
            let graceful = Arc::new(AtomicBool::new(false));
            let iterations = Arc::new(AtomicU32::new(0));
            flags.push((Arc::clone(&graceful), Arc::clone(&iterations)));

            let run = {
                let quit = Arc::clone(&quit);
                let graceful = Arc::clone(&graceful);
                let iterations = Arc::clone(&iterations);
                move || {
                    while !quit.load(Ordering::SeqCst) {
                        iterations.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(1));
                    }
                    graceful.store(true, Ordering::SeqCst);
                }
            };
            let stop = move || quit.store(true, Ordering::SeqCst);
            sync.continuous(format!("worker-{i}"), run, stop);
        }

        sync.run();
        tokio::time::sleep(Duration::from_millis(100)).await;
        sync.stop().await.expect("all workers stop within the window");

        for (i, (graceful, iterations)) in flags.iter().enumerate() {
            assert!(
                graceful.load(Ordering::SeqCst),
                "worker-{i} must have returned from run before stop() returned"
            );
            assert!(
                iterations.load(Ordering::SeqCst) >= 5,
                "worker-{i} should have iterated during the run window"
            );
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_slow_stopper_trips_timeout_but_keeps_running() {
        let sync = Synchronizer::with_config(
            Config {
                stop_timeout: Duration::from_millis(30),
                ..Config::default()
            },
            Vec::new(),
        );

        let quit = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        {
            let quit = Arc::clone(&quit);
            let finished = Arc::clone(&finished);
            let quit_run = Arc::clone(&quit);
            sync.continuous(
                "slow-stopper",
                move || {
                    while !quit_run.load(Ordering::SeqCst) {
                        std::thread::sleep(Duration::from_millis(1));
                    }
                    finished.store(true, Ordering::SeqCst);
                },
                {
                    let quit = Arc::clone(&quit);
                    // stop() takes far longer than the global window.
                    move || {
                        std::thread::sleep(Duration::from_millis(200));
                        quit.store(true, Ordering::SeqCst);
                    }
                },
            );
        }

        sync.run();
        tokio::time::sleep(Duration::from_millis(20)).await;

        match sync.stop().await {
            Err(RuntimeError::StopTimeout { stuck, .. }) => {
                assert_eq!(stuck, vec!["slow-stopper".to_string()]);
            }
            other => panic!("expected StopTimeout, got {other:?}"),
        }

        // Not forcibly terminated: the straggler eventually finishes.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(
            finished.load(Ordering::SeqCst),
            "run must still complete after the timed-out stop"
        );
    }
}
