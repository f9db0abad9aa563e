//! Periodic sync trigger.
//!
//! Runs the engine once after a short initial delay, then on a fixed
//! interval until stopped. Ticks that fall due while a run is still going
//! are skipped rather than queued.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::AppError;
use crate::models::{SyncConfig, SyncSummary};
use crate::pipeline::SyncEngine;

/// Callback invoked with the summary of every successful run.
pub type RunHook = Box<dyn Fn(&SyncSummary) + Send + Sync>;

/// When scheduled runs happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleOptions {
    pub initial_delay: Duration,
    pub interval: Duration,
}

impl ScheduleOptions {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            initial_delay: config.initial_delay(),
            interval: config.interval(),
        }
    }
}

/// Handle to a running scheduler task.
pub struct SchedulerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop scheduling and wait for the task to exit.
    ///
    /// A run in progress is dropped at its next suspension point; every
    /// upsert is its own transaction, so no partial item is left behind.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(e) = (&mut self.task).await {
            log::warn!("Scheduler ended abnormally: {}", e);
        }
    }
}

/// Start the scheduler. Must be called inside a tokio runtime.
pub fn start(
    engine: Arc<SyncEngine>,
    options: ScheduleOptions,
    on_complete: Option<RunHook>,
) -> SchedulerHandle {
    let (shutdown, mut stop) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        log::info!(
            "Scheduler started: first run in {:?}, then every {:?}",
            options.initial_delay,
            options.interval
        );

        tokio::select! {
            _ = tokio::time::sleep(options.initial_delay) => {}
            _ = &mut stop => return,
        }

        let mut ticker =
            tokio::time::interval_at(Instant::now() + options.interval, options.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = run_once(&engine, on_complete.as_ref()) => {}
                _ = &mut stop => break,
            }
            tokio::select! {
                _ = ticker.tick() => {}
                _ = &mut stop => break,
            }
        }

        log::info!("Scheduler stopped");
    });

    SchedulerHandle {
        shutdown: Some(shutdown),
        task,
    }
}

async fn run_once(engine: &SyncEngine, on_complete: Option<&RunHook>) {
    match engine.sync().await {
        Ok(summary) => {
            if let Some(hook) = on_complete {
                hook(&summary);
            }
        }
        Err(AppError::SyncInProgress) => {
            log::info!("Skipping scheduled sync: a run is already in progress");
        }
        Err(e) => log::error!("Scheduled sync failed: {}", e),
    }
}
