use super::ArtifactStore;
use crate::cancellation::CancellationToken;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Periodically removes expired artifacts.
///
/// Runs independently of pipelines: a sweep never waits for a pipeline and
/// a pipeline never waits for a sweep.
#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    store: Arc<ArtifactStore>,
    interval: Duration,
}

impl RetentionSweeper {
    /// Creates a sweeper for `store` that runs every `interval`.
    #[must_use]
    pub fn new(store: Arc<ArtifactStore>, interval: Duration) -> Self {
        Self {
            store,
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    /// Runs one sweep now and returns the removed names.
    pub fn sweep_once(&self) -> Vec<String> {
        self.store.sweep_once()
    }

    /// Starts sweeping in a background task.
    ///
    /// The first sweep runs immediately.
    #[must_use]
    pub fn start(self) -> SweeperHandle {
        let token = Arc::new(CancellationToken::new());
        let task_token = Arc::clone(&token);

        info!(interval_secs = self.interval.as_secs_f64(), "Retention sweeper started");
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        let store = Arc::clone(&self.store);
                        match tokio::task::spawn_blocking(move || store.sweep_once()).await {
                            Ok(removed) if removed.is_empty() => {}
                            Ok(removed) => debug!(count = removed.len(), ?removed, "Sweep removed artifacts"),
                            Err(e) => warn!(error = %e, "Sweep task failed"),
                        }
                    }
                }
            }
            info!("Retention sweeper stopped");
        });

        SweeperHandle { token, task }
    }
}

/// Stop hook for a running sweeper.
#[derive(Debug)]
pub struct SweeperHandle {
    token: Arc<CancellationToken>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Returns true while the background task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops the sweeper and waits for the in-flight sweep to finish.
    pub async fn stop(self) {
        self.token.cancel("sweeper stopped");
        if let Err(e) = self.task.await {
            warn!(error = %e, "Retention sweeper ended abnormally");
        }
    }
}
