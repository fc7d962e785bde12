//! Background eviction of abandoned tasks
//!
//! A user who never finishes authenticating leaves a task behind. The sweeper
//! wakes every `sweep_interval` and drops tasks older than the registry TTL,
//! until its cancellation token fires.

use crate::registry::TaskRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Periodically evicts expired tasks from a [`TaskRegistry`]
pub struct TaskSweeper {
    registry: Arc<dyn TaskRegistry>,
    interval: Duration,
}

impl TaskSweeper {
    /// Create a sweeper for `registry` that runs every `interval`
    pub fn new(registry: Arc<dyn TaskRegistry>, interval: Duration) -> Self {
        Self { registry, interval }
    }

    /// Run until `shutdown` is cancelled
    pub async fn run(self, shutdown: CancellationToken) {
        info!(interval = ?self.interval, "task sweeper started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; nothing can have expired yet.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("task sweeper shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let evicted = self.registry.evict_expired().await;
                    if evicted > 0 {
                        info!(evicted, "evicted abandoned tasks");
                    } else {
                        debug!("no expired tasks");
                    }
                }
            }
        }
    }

    /// Spawn [`TaskSweeper::run`] onto the runtime
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
