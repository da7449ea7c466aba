//! # tasksync
//!
//! **tasksync** is a lightweight in-process coordinator for background tasks
//! that start together, run indefinitely or on a fixed cadence, and shut down
//! gracefully within a bounded time window.
//!
//! It targets long-running service processes that host several independent
//! background activities (periodic polling, continuous workers) and need one
//! uniform shutdown sequence, triggered by an OS termination signal or an
//! explicit caller decision.
//!
//! ## Architecture
//! ```text
//!     ┌─────────────┐   ┌──────────────────┐   ┌───────────────┐
//!     │ every(d)    │   │ continuous(r, s) │   │ add_task(t)   │
//!     │ .run(job)   │   │                  │   │               │
//!     └──────┬──────┘   └────────┬─────────┘   └───────┬───────┘
//!            ▼                   ▼                     ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  Synchronizer                                                    │
//! │  - Registry (ordered task list, CancellationToken per task)      │
//! │  - TaskTracker (completion barrier)                              │
//! │  - Bus (broadcast events) ──► SubscriberSet (fan-out)            │
//! └───────┬──────────────────────────────────────────────────┬───────┘
//!         │ run(): one tokio task per entry                  │
//!         ▼                                                  ▼
//!   task bodies run until each observes              stop(): cancel all,
//!   its own cancellation token                       await barrier vs timeout
//! ```
//!
//! ## Lifecycle
//! ```text
//! register 0..N tasks ──► run() ──► ... ──► stop()
//!
//! stop():
//!   ├─► publish ShutdownRequested
//!   ├─► cancel every task's token (non-blocking, idempotent)
//!   └─► race stop_timeout vs completion barrier
//!         ├─ all done  → Ok(())                (graceful)
//!         └─ timeout   → Err(StopTimeout       (ungraceful; stragglers are
//!                        { timeout, stuck })    reported, never killed)
//! ```
//!
//! ## Features
//! | Area            | Description                                             | Key types / functions                |
//! |-----------------|---------------------------------------------------------|--------------------------------------|
//! | **Periodic**    | Drift-compensated fixed-interval jobs.                  | [`Synchronizer::every`], [`Every`]   |
//! | **Continuous**  | Blocking run/stop pairs bridged into cancellable tasks. | [`Synchronizer::continuous`]         |
//! | **Custom tasks**| Any cancellable unit of work.                           | [`Task`], [`TaskFn`], [`TaskRef`]    |
//! | **Shutdown**    | Bounded-window graceful stop, straggler reporting.      | [`Synchronizer::stop`], [`RuntimeError`] |
//! | **Signals**     | Wait for SIGINT/SIGTERM before stopping.                | [`block_until_quit`]                 |
//! | **Events**      | Observe the lifecycle (logging, metrics, tests).        | [`Event`], [`Subscribe`], [`LogWriter`] |
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::time::Duration;
//! use tasksync::{Synchronizer, block_until_quit};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let sync = Synchronizer::new(Duration::from_secs(10));
//!
//!     // A periodic poller: nominal cadence 5s, regardless of poll cost.
//!     sync.every(Duration::from_secs(5)).named("poller").run(|| async {
//!         // fetch, refresh, flush...
//!     });
//!
//!     // A continuous worker with a blocking loop and an explicit stop.
//!     let quit = Arc::new(AtomicBool::new(false));
//!     let quit2 = Arc::clone(&quit);
//!     sync.continuous(
//!         "worker",
//!         move || while !quit.load(Ordering::SeqCst) { /* work */ },
//!         move || quit2.store(true, Ordering::SeqCst),
//!     );
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

mod config;
mod core;
mod error;
mod events;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use config::Config;
pub use core::{Every, Synchronizer, block_until_quit};
pub use error::RuntimeError;
pub use events::{Bus, Event, EventKind};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use tasks::{BoxTaskFuture, Task, TaskFn, TaskRef};
