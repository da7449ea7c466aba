//! Error types used by the tasksync runtime.
//!
//! There is deliberately no per-task error taxonomy: task bodies carry no
//! result value, and the only failure the runtime itself can report is a stop
//! sequence that outlived its deadline.

use std::time::Duration;

use thiserror::Error;

/// # Errors produced by the tasksync runtime.
///
/// These represent failures in the coordination machinery itself, not in the
/// tasks it runs.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The stop timeout elapsed before every task completed. The named tasks
    /// were still running and remain running, detached; nothing is
    /// force-terminated.
    #[error("stop timeout {timeout:?} exceeded; still running: {stuck:?}")]
    StopTimeout {
        /// The configured stop timeout.
        timeout: Duration,
        /// Names of tasks that had not completed when the window closed.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tasksync::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::StopTimeout { timeout: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_stop_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::StopTimeout { .. } => "runtime_stop_timeout",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::StopTimeout { timeout, stuck } => {
                format!("stop timeout after {timeout:?}; stuck tasks={stuck:?}")
            }
        }
    }
}
