//! Periodic sampling
//!
//! Drives `TelemetryStore::tick` at a fixed rate on a tokio task.

use super::store::TelemetryStore;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Default sampling period
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Fixed-rate driver for the telemetry store
pub struct TickScheduler {
    store: Arc<TelemetryStore>,
    period: Duration,
}

impl TickScheduler {
    pub fn new(store: Arc<TelemetryStore>, period: Duration) -> Self {
        Self { store, period }
    }

    /// Start ticking on the current tokio runtime
    ///
    /// Missed ticks are skipped rather than bursted, so the cadence stays
    /// aligned to the start time when a tick runs late.
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let Self { store, period } = self;

        tracing::info!("Starting tick scheduler every {:?}", period);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut ticks: u64 = 0;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let result = panic::catch_unwind(AssertUnwindSafe(|| store.tick(Instant::now())));
                        match result {
                            Ok(()) => ticks += 1,
                            Err(_) => tracing::error!("Telemetry tick panicked, continuing"),
                        }
                    }
                    _ = &mut shutdown_rx => break,
                }
            }

            tracing::info!("Tick scheduler stopped after {} ticks", ticks);
            ticks
        });

        SchedulerHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }
}

/// Handle to a running scheduler
pub struct SchedulerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<u64>,
}

impl SchedulerHandle {
    /// Stop the loop and wait for it, returning the number of completed ticks
    pub async fn shutdown(mut self) -> u64 {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        match (&mut self.task).await {
            Ok(ticks) => ticks,
            Err(e) => {
                tracing::error!("Tick scheduler task failed: {}", e);
                0
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
