//! Buffered visit analytics
//!
//! - `Analytics`: in-memory write queue, periodic durable flush, stats
//! - `AnalyticsLogFile`: the atomically replaced JSON log
//! - `StatsCollector`: aggregate projection of the persisted log
//! - `BotClassifier`: user-agent heuristic for the human/bot split
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//! ┌─────────┐    ┌──────────────┐   every 10s   ┌──────────────┐    ┌──────────────────┐
//! │ Request │───►│ record() into│──────────────►│ drain queue, │───►│ write .tmp, fsync│
//! │ handler │    │ memory queue │   (or at      │ re-read log, │    │ rename over log  │
//! └─────────┘    └──────────────┘   shutdown)   │ append       │    └──────────────────┘
//!                                               └──────────────┘
//!
//! Read Path:
//! ┌───────────────┐    ┌───────────────────┐
//! │ re-read log   │───►│ StatsCollector    │───► AggregateStats
//! │ (flushed only)│    │ .collect(now)     │
//! └───────────────┘    └───────────────────┘
//! ```

mod classify;
mod log;
mod stats;

pub use classify::{BotClassifier, DEFAULT_BOT_PATTERNS};
pub use log::AnalyticsLogFile;
pub use stats::{page_key, traffic_source, StatsCollector, StatsLimits, DIRECT_SOURCE, UNKNOWN_SOURCE};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::error::{CmsError, CmsResult};
use crate::types::{AggregateStats, AnalyticsLog, Visit, VisitEvent};
use crate::utils::capture_timestamp;

/// Configuration for the analytics buffer
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsConfig {
    /// Seconds between periodic flushes
    pub flush_interval_secs: u64,
    /// Entries in the most-visited ranking
    pub top_pages: usize,
    /// Entries in the referer ranking
    pub top_sources: usize,
    /// Entries in the recent-visits list
    pub recent_visits: usize,
    /// User-agent substrings that mark a visit as automated
    pub bot_patterns: Vec<String>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            flush_interval_secs: 10,
            top_pages: 10,
            top_sources: 10,
            recent_visits: 50,
            bot_patterns: DEFAULT_BOT_PATTERNS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl AnalyticsConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs.max(1))
    }

    fn stats_collector(&self) -> StatsCollector {
        StatsCollector::new(
            StatsLimits {
                top_pages: self.top_pages,
                top_sources: self.top_sources,
                recent_visits: self.recent_visits,
            },
            BotClassifier::new(&self.bot_patterns),
        )
    }
}

/// Result of one flush attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was queued; the log was not touched
    Skipped,
    /// `written` events were appended, giving `total` persisted events
    Flushed { written: usize, total: usize },
}

struct FlushTask {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Visit buffer with a durable, periodically flushed log
pub struct Analytics {
    log: AnalyticsLogFile,
    queue: Mutex<Vec<VisitEvent>>,
    /// Held for the whole of a flush so there is only ever one writer
    flush_lock: Mutex<()>,
    collector: StatsCollector,
    config: AnalyticsConfig,
    task: Mutex<Option<FlushTask>>,
}

impl Analytics {
    /// Open (and if needed create) the log at `path`
    pub fn open<P: AsRef<Path>>(path: P, config: AnalyticsConfig) -> CmsResult<Self> {
        let log = AnalyticsLogFile::new(path);
        log.initialize()?;

        Ok(Self {
            log,
            queue: Mutex::new(Vec::new()),
            flush_lock: Mutex::new(()),
            collector: config.stats_collector(),
            config,
            task: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn log_path(&self) -> &Path {
        self.log.path()
    }

    /// Queue a visit, stamped with the current time
    ///
    /// Only takes the queue lock for the push; never touches the disk.
    pub fn record(&self, visit: Visit) {
        let mut queue = self.queue.lock();
        queue.push(visit.stamp(capture_timestamp()));
    }

    /// Number of visits waiting for the next flush
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Persist every queued visit
    ///
    /// The queue is swapped out under its lock, so visits recorded while the
    /// write is in progress wait for the next flush. If the write fails the
    /// drained visits go back to the front of the queue, ahead of anything
    /// recorded since, and the error is returned.
    pub fn flush(&self) -> CmsResult<FlushOutcome> {
        let _writer = self.flush_lock.lock();

        let drained = std::mem::take(&mut *self.queue.lock());
        if drained.is_empty() {
            return Ok(FlushOutcome::Skipped);
        }
        let written = drained.len();

        let mut log = self.log.read_for_append();
        let previous = log.visits.len();
        log.visits.extend(drained);

        match self.log.write(&log) {
            Ok(()) => {
                debug!(written, total = log.visits.len(), "flushed analytics");
                Ok(FlushOutcome::Flushed {
                    written,
                    total: log.visits.len(),
                })
            }
            Err(e) => {
                let retained = log.visits.split_off(previous);
                self.requeue_front(retained);
                error!(
                    path = %self.log.path().display(),
                    error = %e,
                    pending = self.pending(),
                    "failed to flush analytics, will retry"
                );
                Err(e)
            }
        }
    }

    fn requeue_front(&self, mut events: Vec<VisitEvent>) {
        let mut queue = self.queue.lock();
        events.append(&mut queue);
        *queue = events;
    }

    /// Everything persisted so far
    pub fn read_log(&self) -> AnalyticsLog {
        self.log.read()
    }

    /// Statistics over the persisted log, with calendar windows in local time
    pub fn compute_stats(&self) -> AggregateStats {
        self.compute_stats_at(&Local::now())
    }

    /// Statistics over the persisted log, with calendar windows anchored at `now`
    ///
    /// Visits still waiting in the queue are not included.
    pub fn compute_stats_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> AggregateStats {
        let log = self.log.read();
        self.collector.collect(&log.visits, now)
    }

    /// Spawn the recurring flush on the current tokio runtime
    ///
    /// Calling it again while a task is running does nothing.
    pub fn start_flush_task(self: &Arc<Self>) {
        let mut slot = self.task.lock();
        if slot.is_some() {
            return;
        }

        let period = self.config.flush_interval();
        let (stop, mut stopped) = oneshot::channel::<()>();
        let analytics = Arc::clone(self);

        let handle = tokio::spawn(async move {
            let mut timer = interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        let analytics = Arc::clone(&analytics);
                        // Write failures are logged inside flush() and retried next tick
                        run_blocking_flush(move || analytics.flush()).await;
                    }
                    _ = &mut stopped => break,
                }
            }
        });

        info!(interval_secs = period.as_secs(), "analytics flush task started");
        *slot = Some(FlushTask { stop, handle });
    }

    /// Stop the recurring flush and persist whatever is still queued
    ///
    /// Waits for an in-progress periodic flush before the final one.
    pub async fn shutdown(self: &Arc<Self>) -> CmsResult<FlushOutcome> {
        let task = self.task.lock().take();
        if let Some(task) = task {
            let _ = task.stop.send(());
            if let Err(e) = task.handle.await {
                error!(error = %e, "analytics flush task ended abnormally");
            }
        }

        let analytics = Arc::clone(self);
        let outcome = tokio::task::spawn_blocking(move || analytics.flush())
            .await
            .map_err(|e| CmsError::Io(std::io::Error::other(e.to_string())))??;

        info!(?outcome, "final analytics flush complete");
        Ok(outcome)
    }
}

/// Run one periodic flush on the blocking pool
///
/// A panicking flush is logged and reported as `None`; the timer keeps going.
async fn run_blocking_flush<F>(flush: F) -> Option<CmsResult<FlushOutcome>>
where
    F: FnOnce() -> CmsResult<FlushOutcome> + Send + 'static,
{
    match tokio::task::spawn_blocking(flush).await {
        Ok(result) => Some(result),
        Err(e) => {
            error!(error = %e, "analytics flush panicked");
            None
        }
    }
}
