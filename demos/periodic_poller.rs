//! # Example: periodic_poller
//!
//! Demonstrates drift-compensated periodic tasks.
//!
//! Shows how to:
//! - Register periodic tasks with [`Synchronizer::every`]
//! - Observe lifecycle events with the built-in [`LogWriter`]
//! - Stop everything gracefully on Ctrl-C
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► register "fast-poller" (every 1s, cheap job)
//!   ├─► register "slow-poller" (every 1s, 1.5s job → overrun events)
//!   ├─► run()
//!   ├─► block_until_quit()        (press Ctrl-C)
//!   └─► stop()                    (graceful within 5s)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example periodic_poller
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tasksync::{Config, LogWriter, Subscribe, Synchronizer, block_until_quit};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("=== periodic_poller example ===\n");

    // 1. Configure the runtime with a 5s stop window and event logging.
    let cfg = Config {
        stop_timeout: Duration::from_secs(5),
        ..Config::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];
    let sync = Synchronizer::with_config(cfg, subs);

    // 2. A cheap poller: the cadence stays at 1s no matter how fast it runs.
    let polls = Arc::new(AtomicU32::new(0));
    {
        let polls = Arc::clone(&polls);
        sync.every(Duration::from_secs(1)).named("fast-poller").run(move || {
            let polls = Arc::clone(&polls);
            async move {
                let n = polls.fetch_add(1, Ordering::SeqCst) + 1;
                println!("[fast-poller] poll #{n}");
            }
        });
    }

    // 3. A poller that overruns its interval: invocations go back-to-back
    //    and IntervalOverrun events show up in the log.
    sync.every(Duration::from_secs(1)).named("slow-poller").run(|| async {
        println!("[slow-poller] starting a 1.5s poll...");
        tokio::time::sleep(Duration::from_millis(1500)).await;
        println!("[slow-poller] done");
    });

    // 4. Start everything and wait for Ctrl-C.
    sync.run();
    println!("\npolling; press Ctrl-C to stop\n");
    block_until_quit().await?;

    // 5. Graceful stop: both pollers observe cancellation at their next wait.
    println!("\nstopping...");
    match sync.stop().await {
        Ok(()) => println!("all tasks stopped gracefully"),
        Err(e) => eprintln!("ungraceful shutdown: {e}"),
    }

    println!(
        "fast-poller ran {} times\n=== example completed ===",
        polls.load(Ordering::SeqCst)
    );
    Ok(())
}
