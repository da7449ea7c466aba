//! # Periodic tasks: drift-compensated fixed-interval execution.
//!
//! [`Every`] is the ephemeral builder returned by
//! [`Synchronizer::every`](crate::Synchronizer::every). Its
//! [`run`](Every::run) method materializes a task whose body re-invokes a job
//! forever, waiting between invocations for either the interval to elapse or
//! cancellation.
//!
//! ## Cadence
//! The wait after each invocation is `interval - elapsed(job)`, so the nominal
//! cadence is `interval`, not `interval + duration(job)`. A job that runs
//! longer than the interval is immediately re-invoked (no idle wait) and an
//! [`IntervalOverrun`](crate::EventKind::IntervalOverrun) event is published;
//! the invocation count over a window `T` then approaches `T / duration(job)`
//! rather than `T / interval`.
//!
//! ## Cancellation
//! A job invocation is never interrupted mid-flight. Cancellation is observed
//! only at the wait step, so the worst-case stop latency contributed by a
//! periodic task is the duration of its in-flight invocation.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::core::synchronizer::Synchronizer;
use crate::events::{Bus, Event, EventKind};
use crate::tasks::{TaskFn, TaskRef};

/// Builder for a periodic task: `sync.every(interval).run(job)`.
///
/// The builder has no lifecycle of its own; [`run`](Every::run) registers the
/// task on the synchronizer it came from and consumes the builder.
#[must_use = "calling every() registers nothing until run() is called"]
pub struct Every<'a> {
    sync: &'a Synchronizer,
    interval: Duration,
    name: Option<Cow<'static, str>>,
}

impl<'a> Every<'a> {
    pub(crate) fn new(sync: &'a Synchronizer, interval: Duration) -> Self {
        Self {
            sync,
            interval,
            name: None,
        }
    }

    /// Names the task (otherwise a `periodic-N` name is generated).
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Registers a task invoking `job` on the builder's interval.
    ///
    /// `job` is called to completion on every tick; it is not preemptible by
    /// cancellation. Blocking work belongs in
    /// [`spawn_blocking`](tokio::task::spawn_blocking) inside the job.
    pub fn run<F, Fut>(self, job: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = self
            .name
            .unwrap_or_else(|| self.sync.next_periodic_name().into());
        let task = periodic_task(name, self.interval, job, self.sync.bus().clone());
        self.sync.add_task(task);
    }
}

/// Materializes the drift-compensated periodic loop as a task.
fn periodic_task<F, Fut>(
    name: impl Into<Cow<'static, str>>,
    interval: Duration,
    job: F,
    bus: Bus,
) -> TaskRef
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let name = name.into();
    let event_name: Arc<str> = Arc::from(name.as_ref());
    let job = Arc::new(job);

    TaskFn::arc(name, move |ctx: CancellationToken| {
        let job = Arc::clone(&job);
        let bus = bus.clone();
        let event_name = Arc::clone(&event_name);

        async move {
            loop {
                let started = Instant::now();
                job().await;
                let elapsed = started.elapsed();

                if elapsed > interval {
                    bus.publish(
                        Event::now(EventKind::IntervalOverrun)
                            .with_task(Arc::clone(&event_name))
                            .with_lag(elapsed - interval),
                    );
                }

                let wait = interval.saturating_sub(elapsed);
                tokio::select! {
                    // When the job overran, the sleep below is already
                    // expired; cancellation must still win that race.
                    biased;
                    _ = ctx.cancelled() => return,
                    _ = time::sleep(wait) => {}
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::Task;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counting_task(
        interval: Duration,
        job_cost: Duration,
        count: Arc<AtomicU32>,
    ) -> TaskRef {
        periodic_task("counting", interval, move || {
            let count = Arc::clone(&count);
            async move {
                if job_cost > Duration::ZERO {
                    time::sleep(job_cost).await;
                }
                count.fetch_add(1, Ordering::SeqCst);
            }
        }, Bus::new(64))
    }

    #[tokio::test(start_paused = true)]
    async fn test_cheap_job_cadence_tracks_interval() {
        let count = Arc::new(AtomicU32::new(0));
        let task = counting_task(
            Duration::from_millis(100),
            Duration::ZERO,
            Arc::clone(&count),
        );

        let ctx = CancellationToken::new();
        let handle = tokio::spawn(task.spawn(ctx.clone()));

        // Window T = 1s, d = 100ms: first invocation fires immediately, so
        // floor(T/d) = 10 ticks land in the window (±1 tolerated).
        time::sleep(Duration::from_millis(1001)).await;
        ctx.cancel();
        handle.await.expect("periodic body must exit after cancel");

        let n = count.load(Ordering::SeqCst);
        assert!(
            (10..=12).contains(&n),
            "expected ~11 invocations in 1s at 100ms cadence, got {n}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_job_degrades_to_back_to_back() {
        let count = Arc::new(AtomicU32::new(0));
        // Job cost 300ms against a 100ms interval: cadence is governed by the
        // job, so a 1.5s window fits ~5 invocations, not 15.
        let task = counting_task(
            Duration::from_millis(100),
            Duration::from_millis(300),
            Arc::clone(&count),
        );

        let ctx = CancellationToken::new();
        let handle = tokio::spawn(task.spawn(ctx.clone()));

        time::sleep(Duration::from_millis(1501)).await;
        ctx.cancel();
        handle.await.expect("periodic body must exit after cancel");

        let n = count.load(Ordering::SeqCst);
        assert!(
            (4..=6).contains(&n),
            "expected ~5 invocations (window / job cost), got {n}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrun_publishes_event() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let task = periodic_task(
            "slow",
            Duration::from_millis(50),
            || time::sleep(Duration::from_millis(200)),
            bus,
        );

        let ctx = CancellationToken::new();
        let handle = tokio::spawn(task.spawn(ctx.clone()));

        time::sleep(Duration::from_millis(250)).await;
        ctx.cancel();
        handle.await.expect("periodic body must exit after cancel");

        let ev = rx.recv().await.expect("overrun event expected");
        assert_eq!(ev.kind, EventKind::IntervalOverrun);
        assert_eq!(ev.task.as_deref(), Some("slow"));
        assert_eq!(ev.lag_ms, Some(150));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_wait_exits_promptly() {
        let count = Arc::new(AtomicU32::new(0));
        let task = counting_task(
            Duration::from_secs(3600),
            Duration::ZERO,
            Arc::clone(&count),
        );

        let ctx = CancellationToken::new();
        let handle = tokio::spawn(task.spawn(ctx.clone()));

        // One immediate invocation, then a very long wait.
        time::sleep(Duration::from_millis(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        ctx.cancel();
        time::timeout(Duration::from_millis(10), handle)
            .await
            .expect("cancellation in the wait phase must not linger")
            .expect("body must not panic");
        assert_eq!(count.load(Ordering::SeqCst), 1, "no further invocations");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_mid_invocation_waits_for_job() {
        let count = Arc::new(AtomicU32::new(0));
        let task = counting_task(
            Duration::from_millis(100),
            Duration::from_millis(500),
            Arc::clone(&count),
        );

        let ctx = CancellationToken::new();
        let handle = tokio::spawn(task.spawn(ctx.clone()));

        // Cancel while the first invocation is still in flight.
        time::sleep(Duration::from_millis(50)).await;
        ctx.cancel();
        handle.await.expect("body must exit after the job finishes");

        assert_eq!(
            count.load(Ordering::SeqCst),
            1,
            "in-flight invocation runs to completion, no new one starts"
        );
    }
}
