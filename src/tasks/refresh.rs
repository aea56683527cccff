//! Cache Refresh Task
//!
//! Background task that periodically rotates the cache contents using a
//! [`RotationStrategy`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::rotation::RotationStrategy;

/// Source of the timestamp handed to the strategy.
pub type Clock = fn() -> DateTime<Utc>;

/// Floor for strategy-provided delays so a zero interval cannot spin.
const MIN_ROTATION_DELAY: Duration = Duration::from_millis(10);

/// State of a started refresh scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    Stopped,
}

// == Refresh Scheduler ==
/// Drives a rotation strategy on a timer and installs its output into the cache.
///
/// The scheduler is the only writer to the cache. It never waits on request
/// handlers; requests are served from whatever the cache holds while a rotation
/// is in progress.
pub struct RefreshScheduler {
    cache: Arc<CacheStore>,
    strategy: Arc<dyn RotationStrategy>,
    fallback_interval: Duration,
    clock: Clock,
}

impl RefreshScheduler {
    /// Creates an idle scheduler.
    ///
    /// # Arguments
    /// * `cache` - Store the rotated entries are written to
    /// * `strategy` - Producer of each rotation's data set and next delay
    /// * `fallback_interval` - Retry delay used when no rotation has succeeded yet
    pub fn new(
        cache: Arc<CacheStore>,
        strategy: Arc<dyn RotationStrategy>,
        fallback_interval: Duration,
    ) -> Self {
        Self {
            cache,
            strategy,
            fallback_interval,
            clock: Utc::now,
        }
    }

    /// Replaces the wall clock passed to the strategy.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Runs the cold-start rotation, then spawns the periodic tick loop.
    ///
    /// The cache holds the first rotation's entries by the time this returns,
    /// so callers can start serving immediately afterwards.
    pub async fn start(self) -> SchedulerHandle {
        info!(
            strategy = self.strategy.name(),
            fallback_secs = self.fallback_interval.as_secs_f64(),
            "Starting cache refresh scheduler"
        );

        let mut delay = self.rotate().await.unwrap_or(self.fallback_interval);

        let token = CancellationToken::new();
        let state = Arc::new(Mutex::new(SchedulerState::Running));

        let task = {
            let token = token.clone();
            let state = state.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                    // A rotation that has begun runs to completion even if a stop arrives
                    if let Some(next) = self.rotate().await {
                        delay = next;
                    }
                }

                *state.lock() = SchedulerState::Stopped;
                info!(strategy = self.strategy.name(), "Cache refresh scheduler stopped");
            })
        };

        SchedulerHandle { token, task, state }
    }

    /// Performs one rotation. Returns the next delay on success.
    async fn rotate(&self) -> Option<Duration> {
        let now = (self.clock)();
        match self.strategy.produce(now).await {
            Ok(result) => {
                let total = result.entries.len();
                let mut installed = 0;
                for entry in result.entries {
                    let (key, cost) = (entry.key, entry.cost);
                    if self.cache.set(key.clone(), entry.value, cost) {
                        installed += 1;
                    } else {
                        debug!(key = %key, cost, "Cache declined rotated entry");
                    }
                }

                let next_delay = result.next_delay.max(MIN_ROTATION_DELAY);
                debug!(
                    strategy = self.strategy.name(),
                    installed,
                    total,
                    next_delay_ms = next_delay.as_millis() as u64,
                    "Cache rotation complete"
                );
                Some(next_delay)
            }
            Err(e) => {
                warn!(
                    strategy = self.strategy.name(),
                    error = %e,
                    "Cache rotation failed, keeping previous contents"
                );
                None
            }
        }
    }
}

// == Scheduler Handle ==
/// Owner's handle to a running scheduler.
pub struct SchedulerHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
    state: Arc<Mutex<SchedulerState>>,
}

impl SchedulerHandle {
    pub fn state(&self) -> SchedulerState {
        *self.state.lock()
    }

    /// Stops ticking and waits for the loop to exit.
    ///
    /// A rotation already in progress completes; no further rotations start.
    pub async fn stop(self) -> SchedulerState {
        self.token.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "Cache refresh task ended abnormally");
            *self.state.lock() = SchedulerState::Stopped;
        }
        *self.state.lock()
    }
}
