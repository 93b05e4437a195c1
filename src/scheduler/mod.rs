//! Countdown scheduler: one repeating 1-second tick that fires a refresh when
//! the remaining time reaches zero.
//!
//! The tick task and every refresh it spawned are owned by [`SchedulerHandle`];
//! dropping the handle aborts all of them.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, interval_at};
use tracing::{debug, info, warn};

pub const TICK: Duration = Duration::from_secs(1);

/// Remaining-seconds counter shared between the tick task and manual refreshes.
#[derive(Debug)]
pub struct Countdown {
    interval_secs: u64,
    remaining: AtomicU64,
}

impl Countdown {
    pub fn new(interval_secs: u64) -> Self {
        let interval_secs = interval_secs.max(1);
        Self {
            interval_secs,
            remaining: AtomicU64::new(interval_secs),
        }
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::SeqCst)
    }

    /// Advance one second. Returns `true` when the counter hit zero, in which
    /// case it has already been reset to the full interval.
    pub fn tick(&self) -> bool {
        let prev = match self.remaining.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |r| {
            Some(if r <= 1 { self.interval_secs } else { r - 1 })
        }) {
            Ok(prev) | Err(prev) => prev,
        };
        prev <= 1
    }

    pub fn reset(&self) {
        self.remaining.store(self.interval_secs, Ordering::SeqCst);
    }
}

/// Whatever the scheduler refreshes when the countdown expires.
#[async_trait]
pub trait Refresh: Send + Sync + 'static {
    async fn refresh_due(&self);
}

pub struct CountdownScheduler;

impl CountdownScheduler {
    pub fn spawn(countdown: Arc<Countdown>, target: Arc<dyn Refresh>) -> SchedulerHandle {
        info!(
            "Countdown scheduler started ({}s interval)",
            countdown.interval_secs()
        );
        let task = tokio::spawn(run(countdown, target));
        SchedulerHandle { task: Some(task) }
    }
}

async fn run(countdown: Arc<Countdown>, target: Arc<dyn Refresh>) {
    // First tick one period out; `interval` would otherwise fire immediately.
    let mut ticker = interval_at(Instant::now() + TICK, TICK);
    let mut refreshes = JoinSet::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if countdown.tick() {
                    debug!("Countdown expired, refreshing");
                    let target = Arc::clone(&target);
                    refreshes.spawn(async move { target.refresh_due().await });
                }
            }
            Some(done) = refreshes.join_next(), if !refreshes.is_empty() => {
                if let Err(e) = done {
                    warn!("Scheduled refresh did not complete: {}", e);
                }
            }
        }
    }
}

/// Owns the tick task. Stopping or dropping it releases the timer.
pub struct SchedulerHandle {
    task: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Stop ticking and wait until the task is gone.
    pub async fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
            info!("Countdown scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Countdown scheduler dropped");
        }
    }
}
