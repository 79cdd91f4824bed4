//! Non-overlapping ingestion scheduler.
//!
//! Holds the Idle/Running state explicitly. A tick that arrives while a cycle
//! is still running is dropped, never queued.

use crate::application::ingestion::IngestionPipeline;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

/// Cycle counters, readable while the scheduler runs.
#[derive(Debug, Default)]
pub struct SchedulerStats {
    pub cycles_started: AtomicU64,
    pub cycles_succeeded: AtomicU64,
    pub cycles_failed: AtomicU64,
    pub ticks_skipped: AtomicU64,
}

pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

// Resets the scheduler to Idle when the cycle task finishes, fails, panics or
// is aborted.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct Scheduler {
    pipeline: Arc<IngestionPipeline>,
    interval: Duration,
    run_on_startup: bool,
    shutdown_grace: Duration,
    running: Arc<AtomicBool>,
    current: Mutex<Option<JoinHandle<()>>>,
    stats: Arc<SchedulerStats>,
}

impl Scheduler {
    pub fn new(pipeline: Arc<IngestionPipeline>, interval: Duration, run_on_startup: bool) -> Self {
        Self {
            pipeline,
            interval,
            run_on_startup,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            running: Arc::new(AtomicBool::new(false)),
            current: Mutex::new(None),
            stats: Arc::new(SchedulerStats::default()),
        }
    }

    /// How long `run` waits for the in-flight cycle after shutdown before
    /// aborting it.
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    /// Start one cycle if Idle. Returns `false` when a cycle is already
    /// running; the trigger is then dropped.
    pub fn try_start(&self) -> bool {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            self.stats.ticks_skipped.fetch_add(1, Ordering::SeqCst);
            warn!("Scheduler: previous ingestion cycle still running, tick skipped");
            return false;
        }

        let guard = RunningGuard(self.running.clone());
        let pipeline = self.pipeline.clone();
        let stats = self.stats.clone();
        stats.cycles_started.fetch_add(1, Ordering::SeqCst);

        // Held across spawn and store so a cycle that ends at once cannot let a
        // later try_start store its handle before this one.
        let mut current = self.lock_current();
        *current = Some(tokio::spawn(async move {
            let _guard = guard;
            match pipeline.run_cycle().await {
                Ok(report) => {
                    stats.cycles_succeeded.fetch_add(1, Ordering::SeqCst);
                    info!(
                        "Scheduler: cycle finished at {} ({} coins)",
                        report.finished_at.to_rfc3339(),
                        report.stored
                    );
                }
                Err(e) => {
                    stats.cycles_failed.fetch_add(1, Ordering::SeqCst);
                    error!("Scheduler: ingestion cycle failed: {}", e);
                }
            }
        }));
        true
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait for the most recently started cycle, if any.
    pub async fn join_current(&self) {
        let handle = self.lock_current().take();
        if let Some(handle) = handle {
            log_outcome(handle.await);
        }
    }

    /// Wait up to `grace` for the most recently started cycle, then abort it.
    /// An aborted cycle leaves the store as it was before the cycle.
    pub async fn finish_current(&self, grace: Duration) {
        let handle = self.lock_current().take();
        let Some(mut handle) = handle else {
            return;
        };

        match time::timeout(grace, &mut handle).await {
            Ok(outcome) => log_outcome(outcome),
            Err(_) => {
                warn!("Scheduler: cycle still running after {:?}, aborting", grace);
                handle.abort();
                log_outcome(handle.await);
            }
        }
    }

    /// Tick until `shutdown` resolves, then give the in-flight cycle the
    /// shutdown grace period to finish.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let start = if self.run_on_startup {
            Instant::now()
        } else {
            Instant::now() + self.interval
        };
        let mut ticker = time::interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Scheduler started. Interval: {:?}, run on startup: {}",
            self.interval, self.run_on_startup
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Scheduler: shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    self.try_start();
                }
            }
        }

        self.finish_current(self.shutdown_grace).await;
    }
}

fn log_outcome(outcome: Result<(), JoinError>) {
    match outcome {
        Ok(()) => {}
        Err(e) if e.is_cancelled() => info!("Scheduler: cycle aborted"),
        Err(e) => error!("Scheduler: cycle task ended abnormally: {}", e),
    }
}
