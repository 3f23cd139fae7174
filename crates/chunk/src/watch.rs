//! Periodic progress reporting for chunked reads.

use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::plan::ChunkPlan;

/// Default progress notification interval.
const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// Callback invoked with read progress.
pub type ProgressCallback = Box<dyn Fn(ProgressSnapshot) + Send + Sync>;

/// Point-in-time view of a plan's aggregate read progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    /// Total file size in bytes.
    pub total_bytes: i64,
    /// Bytes delivered by counting regions so far.
    pub read_bytes: i64,
    /// Measured throughput, 0.0 until enough samples exist.
    pub bytes_per_second: f64,
}

impl ProgressSnapshot {
    /// Progress as a percentage (0-100).
    pub fn percentage(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.read_bytes as f64 / self.total_bytes as f64 * 100.0
    }

    /// Estimated time until the remaining bytes are read.
    ///
    /// Returns `None` while the measured rate is zero.
    pub fn eta(&self) -> Option<Duration> {
        if self.bytes_per_second <= 0.0 {
            return None;
        }
        let remaining = (self.total_bytes - self.read_bytes).max(0);
        Some(Duration::from_secs_f64(
            remaining as f64 / self.bytes_per_second,
        ))
    }
}

/// Polls a plan's progress counter and notifies callbacks periodically.
///
/// The watcher is the independent observer side of a transfer: it samples
/// [`ChunkPlan::bytes_read`] on a fixed interval while regions are being
/// consumed elsewhere, and fans snapshots out to registered callbacks.
pub struct ProgressWatcher {
    inner: Arc<RwLock<WatcherInner>>,
    stop: Arc<Mutex<Option<tokio::sync::oneshot::Sender<()>>>>,
}

struct WatcherInner {
    plan: Arc<ChunkPlan>,
    callbacks: Vec<ProgressCallback>,
    interval: Duration,
    rate: RateEstimator,
    last_read: i64,
}

impl WatcherInner {
    // A fresh reader generation resets the counter, so a negative delta is
    // a restart, not throughput.
    fn sample(&mut self) {
        let read = self.plan.bytes_read();
        let delta = read - self.last_read;
        if delta > 0 {
            self.rate.add_sample(delta);
        }
        self.last_read = read;
    }

    fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total_bytes: self.plan.size(),
            read_bytes: self.plan.bytes_read(),
            bytes_per_second: self.rate.bytes_per_second(),
        }
    }
}

impl ProgressWatcher {
    /// Creates a watcher over an opened plan.
    ///
    /// If `interval` is `None`, defaults to 500 ms.
    pub fn new(plan: Arc<ChunkPlan>, interval: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(WatcherInner {
                plan,
                callbacks: Vec::new(),
                interval: interval.unwrap_or(DEFAULT_INTERVAL),
                rate: RateEstimator::new(None, None),
                last_read: 0,
            })),
            stop: Arc::new(Mutex::new(None)),
        }
    }

    /// Registers a progress callback.
    pub fn on_progress(&self, callback: ProgressCallback) {
        let mut inner = self.inner.write().unwrap();
        inner.callbacks.push(callback);
    }

    /// Returns the current progress without waiting for a tick.
    pub fn snapshot(&self) -> ProgressSnapshot {
        let inner = self.inner.read().unwrap();
        inner.snapshot()
    }

    /// Samples progress once and notifies every callback.
    pub fn notify_progress(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.sample();
        let snapshot = inner.snapshot();
        for cb in &inner.callbacks {
            cb(snapshot.clone());
        }
    }

    /// Starts periodic progress notifications in a background tokio task.
    ///
    /// Call [`stop`](Self::stop) to cancel.
    pub fn start(&self) {
        let (tx, mut rx) = tokio::sync::oneshot::channel();
        {
            let mut stop = self.stop.lock().unwrap();
            // Stop any existing task.
            drop(stop.take());
            *stop = Some(tx);
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let interval = {
                let i = inner.read().unwrap();
                i.interval
            };
            let mut ticker = tokio::time::interval(interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let mut i = inner.write().unwrap();
                        i.sample();
                        let snapshot = i.snapshot();
                        for cb in &i.callbacks {
                            cb(snapshot.clone());
                        }
                    }
                    _ = &mut rx => {
                        break;
                    }
                }
            }
        });
    }

    /// Stops the periodic notification task.
    pub fn stop(&self) {
        let mut stop = self.stop.lock().unwrap();
        // Dropping the sender signals the task to exit.
        drop(stop.take());
    }
}

// ---------------------------------------------------------------------------
// RateEstimator
// ---------------------------------------------------------------------------

struct RateSample {
    bytes: i64,
    timestamp: Instant,
}

/// Estimates read throughput from a sliding window of samples.
pub struct RateEstimator {
    inner: Mutex<RateInner>,
}

struct RateInner {
    samples: Vec<RateSample>,
    max_samples: usize,
    window: Duration,
}

impl RateEstimator {
    /// Creates a new estimator.
    ///
    /// - `window`: time window for the estimate (default 5 s).
    /// - `max_samples`: maximum retained samples (default 100).
    pub fn new(window: Option<Duration>, max_samples: Option<usize>) -> Self {
        Self {
            inner: Mutex::new(RateInner {
                samples: Vec::new(),
                max_samples: max_samples.unwrap_or(100),
                window: window.unwrap_or(Duration::from_secs(5)),
            }),
        }
    }

    /// Records `bytes` read at the current instant.
    pub fn add_sample(&self, bytes: i64) {
        let mut s = self.inner.lock().unwrap();
        let now = Instant::now();
        s.samples.push(RateSample {
            bytes,
            timestamp: now,
        });

        // Prune samples outside the window.
        let cutoff = now - s.window;
        s.samples.retain(|sample| sample.timestamp >= cutoff);

        // Limit sample count.
        if s.samples.len() > s.max_samples {
            let excess = s.samples.len() - s.max_samples;
            s.samples.drain(..excess);
        }
    }

    /// Average bytes/second within the window (0.0 with fewer than 2
    /// samples).
    pub fn bytes_per_second(&self) -> f64 {
        let s = self.inner.lock().unwrap();
        if s.samples.len() < 2 {
            return 0.0;
        }

        let first = &s.samples[0];
        let last = &s.samples[s.samples.len() - 1];
        let elapsed = last.timestamp.duration_since(first.timestamp);
        if elapsed.is_zero() {
            return 0.0;
        }

        let total_bytes: i64 = s.samples.iter().map(|sample| sample.bytes).sum();
        total_bytes as f64 / elapsed.as_secs_f64()
    }

    /// Estimated time to read `remaining_bytes`, `None` while the rate is
    /// zero.
    pub fn eta(&self, remaining_bytes: i64) -> Option<Duration> {
        let rate = self.bytes_per_second();
        if rate <= 0.0 {
            return None;
        }
        Some(Duration::from_secs_f64(remaining_bytes as f64 / rate))
    }

    /// Clears all recorded samples.
    pub fn reset(&self) {
        let mut s = self.inner.lock().unwrap();
        s.samples.clear();
    }
}
