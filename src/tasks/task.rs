//! # Task abstraction.
//!
//! This module defines the [`Task`] trait, the unit of cancellable background
//! work managed by a [`Synchronizer`](crate::Synchronizer). The common handle
//! type is [`TaskRef`], an `Arc<dyn Task>` suitable for sharing across the
//! runtime.
//!
//! A task receives a [`CancellationToken`] and should observe it to stop
//! cooperatively during shutdown.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Boxed future produced by [`Task::spawn`].
///
/// Tasks carry no result value; failures inside a body are the body's own
/// concern (log, count, ignore) and are never propagated to the caller.
pub type BoxTaskFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Shared handle to a task (`Arc<dyn Task>`).
pub type TaskRef = Arc<dyn Task>;

/// # Cancellable unit of background work.
///
/// A `Task` has a stable [`name`](Task::name) and a [`spawn`](Task::spawn)
/// method that produces the task's body as a future. The body runs until it
/// decides to exit, which must happen promptly once the [`CancellationToken`]
/// is observed cancelled.
///
/// ## Contract
/// - `spawn` is called **once** per registration lifecycle; the body consumes
///   exactly one cancellation signal before or during its termination sequence.
/// - The token may already be cancelled when the body starts (a stop that
///   raced registration); bodies must treat that as an immediate exit request.
///
/// # Example
/// ```
/// use tasksync::{Task, BoxTaskFuture};
/// use tokio_util::sync::CancellationToken;
///
/// struct Heartbeat;
///
/// impl Task for Heartbeat {
///     fn name(&self) -> &str { "heartbeat" }
///
///     fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture {
///         Box::pin(async move {
///             ctx.cancelled().await;
///         })
///     }
/// }
/// ```
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Produces the task body bound to the given cancellation token.
    fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture;
}
