//! Auto-refresh strategy - live view of the newest rows

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::pager::buffer::{LoadOutcome, RowBuffer};
use crate::pager::source::TableSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoRefreshStatus {
    pub paused: bool,
    /// Timer refreshes since the last start or resume
    pub update_count: u32,
    /// 0 means the timer never pauses itself
    pub max_auto_update_count: u32,
}

#[derive(Debug, Default)]
struct Counters {
    update_count: AtomicU32,
    paused: AtomicBool,
}

/// Refreshes the window on a fixed period and pauses itself after
/// `max_auto_update_count` timer refreshes, so an idle view stops polling.
///
/// The timer runs as a tokio task; starting or resuming must happen inside a
/// runtime. Dropping the strategy stops the timer.
pub struct AutoRefreshStrategy<S: TableSource> {
    buffer: Arc<RowBuffer<S>>,
    update_period: Duration,
    max_auto_update_count: u32,
    counters: Arc<Counters>,
    timer: Option<JoinHandle<()>>,
}

impl<S: TableSource> AutoRefreshStrategy<S> {
    pub fn new(
        buffer: Arc<RowBuffer<S>>,
        update_period: Duration,
        max_auto_update_count: u32,
    ) -> Self {
        Self {
            buffer,
            update_period,
            max_auto_update_count,
            counters: Arc::new(Counters::default()),
            timer: None,
        }
    }

    /// Start the timer, then load the newest rows right away
    pub async fn start(&mut self) -> Result<LoadOutcome> {
        self.counters.update_count.store(0, Ordering::SeqCst);
        self.counters.paused.store(false, Ordering::SeqCst);
        self.spawn_timer();
        self.refresh_now().await
    }

    /// Refresh outside the timer; does not count toward the pause threshold
    pub async fn refresh_now(&self) -> Result<LoadOutcome> {
        self.buffer.abort();
        self.buffer.refresh().await
    }

    pub fn pause(&mut self) {
        self.stop();
        self.counters.paused.store(true, Ordering::SeqCst);
        info!("auto refresh paused");
    }

    /// Reset the counter and restart the timer
    pub fn resume(&mut self) {
        self.counters.update_count.store(0, Ordering::SeqCst);
        self.counters.paused.store(false, Ordering::SeqCst);
        self.spawn_timer();
        info!("auto refresh resumed");
    }

    /// Tear the timer down
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    pub fn is_paused(&self) -> bool {
        self.counters.paused.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> AutoRefreshStatus {
        AutoRefreshStatus {
            paused: self.is_paused(),
            update_count: self.counters.update_count.load(Ordering::SeqCst),
            max_auto_update_count: self.max_auto_update_count,
        }
    }

    fn spawn_timer(&mut self) {
        self.stop();
        let buffer = Arc::clone(&self.buffer);
        let counters = Arc::clone(&self.counters);
        let period = self.update_period.max(Duration::from_millis(1));
        let max_count = self.max_auto_update_count;

        self.timer = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                buffer.abort();
                if let Err(err) = buffer.refresh().await {
                    warn!("auto refresh failed: {err:#}");
                }
                let count = counters.update_count.fetch_add(1, Ordering::SeqCst) + 1;
                if max_count > 0 && count >= max_count {
                    counters.paused.store(true, Ordering::SeqCst);
                    info!(count, "auto refresh paused itself");
                    break;
                }
            }
        }));
    }
}

impl<S: TableSource> Drop for AutoRefreshStrategy<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
