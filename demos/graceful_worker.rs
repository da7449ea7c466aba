//! # Example: graceful_worker
//!
//! Demonstrates bridging a blocking run/stop pair into a cancellable task.
//!
//! Shows how to:
//! - Register a continuous task with [`Synchronizer::continuous`]
//! - Verify that `run` has returned before `stop()` reports success
//! - Read the straggler list when the stop window is too short
//!
//! ## Run
//! ```bash
//! cargo run --example graceful_worker
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tasksync::{RuntimeError, Synchronizer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("=== graceful_worker example ===\n");

    let sync = Synchronizer::new(Duration::from_secs(2));

    // 1. A blocking worker loop with an explicit quit flag. The stop function
    //    flips the flag; the loop notices and returns, raising `graceful` as
    //    its last action.
    let quit = Arc::new(AtomicBool::new(false));
    let graceful = Arc::new(AtomicBool::new(false));
    let processed = Arc::new(AtomicU64::new(0));
    {
        let quit = Arc::clone(&quit);
        let graceful = Arc::clone(&graceful);
        let processed = Arc::clone(&processed);
        let quit_run = Arc::clone(&quit);
        sync.continuous(
            "batch-worker",
            move || {
                while !quit_run.load(Ordering::SeqCst) {
                    // pretend to process one item
                    processed.fetch_add(1, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(10));
                }
                graceful.store(true, Ordering::SeqCst);
                println!("[batch-worker] drained, exiting");
            },
            {
                let quit = Arc::clone(&quit);
                move || {
                    println!("[batch-worker] stop requested");
                    quit.store(true, Ordering::SeqCst);
                }
            },
        );
    }

    // 2. Run for a moment, then stop.
    sync.run();
    println!(
        "worker running for 1s (stop window {:?})...\n",
        sync.config().stop_timeout
    );
    tokio::time::sleep(Duration::from_secs(1)).await;

    match sync.stop().await {
        Ok(()) => {
            println!(
                "\ngraceful: worker returned (flag={}), processed {} items",
                graceful.load(Ordering::SeqCst),
                processed.load(Ordering::SeqCst),
            );
        }
        Err(RuntimeError::StopTimeout { timeout, stuck }) => {
            eprintln!("\ntimed out after {timeout:?}; still running: {stuck:?}");
        }
        Err(e) => eprintln!("\nunexpected stop failure: {e}"),
    }

    println!("=== example completed ===");
    Ok(())
}
