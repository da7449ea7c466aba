//! # Continuous tasks: bridging a blocking run/stop pair.
//!
//! [`ContinuousTask`] adapts an arbitrary blocking `run` function together
//! with a `stop` function into a cancellable task:
//!
//! 1. `run` is launched on the blocking pool; its join handle is the private
//!    completion marker.
//! 2. The body waits for the task's cancellation token.
//! 3. On cancellation, `stop` is invoked (also on the blocking pool) and
//!    awaited; its expected side effect is that `run` observes a termination
//!    condition and returns. The bridge does not verify this itself.
//! 4. The body waits for the completion marker, then returns.
//!
//! There is no internal timeout: if `stop` fails to make `run` return, the
//! only bound is the synchronizer's global stop window, after which the
//! blocking thread is left running detached.
//!
//! A `run` that returns before cancellation does not complete the task early;
//! the body still waits for cancellation and invokes `stop` before exiting.

use std::borrow::Cow;
use std::sync::Mutex;

use tokio::task;
use tokio_util::sync::CancellationToken;

use crate::tasks::{BoxTaskFuture, Task};

/// The run/stop pair, moved out of the task on its single spawn.
struct Parts {
    run: Box<dyn FnOnce() + Send>,
    stop: Box<dyn FnOnce() + Send>,
}

/// Task wrapping a blocking `run` function and its `stop` counterpart.
pub(crate) struct ContinuousTask {
    name: Cow<'static, str>,
    parts: Mutex<Option<Parts>>,
}

impl ContinuousTask {
    pub(crate) fn new(
        name: impl Into<Cow<'static, str>>,
        run: impl FnOnce() + Send + 'static,
        stop: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            parts: Mutex::new(Some(Parts {
                run: Box::new(run),
                stop: Box::new(stop),
            })),
        }
    }
}

impl Task for ContinuousTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture {
        let parts = self
            .parts
            .lock()
            .expect("continuous task lock poisoned")
            .take();
        let name = self.name.to_string();

        Box::pin(async move {
            // The run/stop pair is consumed by the first spawn; the registry
            // never spawns an entry twice.
            let Some(Parts { run, stop }) = parts else {
                return;
            };

            let done = task::spawn_blocking(run);

            ctx.cancelled().await;

            if task::spawn_blocking(stop).await.is_err() {
                eprintln!("[tasksync] continuous task '{name}': stop panicked");
            }
            if done.await.is_err() {
                eprintln!("[tasksync] continuous task '{name}': run panicked");
            }
        })
    }
}
