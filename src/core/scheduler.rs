//! Fixed-interval tick loop
//!
//! Ticks run inline on the loop: a slow tick delays the next one instead of
//! overlapping it. Shutdown is only observed between ticks.

use crate::utils::MonitorError;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

/// Work performed on every tick
#[async_trait]
pub trait Tick: Send {
    /// Errors are reserved for unexpected faults; they stop the scheduler.
    async fn tick(&mut self) -> Result<(), MonitorError>;
}

#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    interval: Duration,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Tick immediately, then every interval, until `shutdown` resolves
    ///
    /// Returns the number of completed ticks, or the first tick error.
    pub async fn run<T, S>(&self, action: &mut T, shutdown: S) -> Result<u64, MonitorError>
    where
        T: Tick + ?Sized,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut completed = 0u64;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    debug!(completed, "scheduler stopping");
                    return Ok(completed);
                }
                _ = interval.tick() => {
                    if let Err(e) = action.tick().await {
                        error!(error = %e, "tick failed");
                        return Err(e);
                    }
                    completed += 1;
                }
            }
        }
    }
}
