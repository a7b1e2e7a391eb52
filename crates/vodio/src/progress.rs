use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Serialize;

/// One throttled measurement of an in-flight transfer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSample {
    /// Completion percentage, absent when the total size is unknown.
    pub percent: Option<f64>,
    pub bytes_downloaded: u64,
    pub bytes_total: Option<u64>,
    pub bytes_per_sec: f64,
    /// 0 on the first attempt, incremented per retry.
    pub retry_index: u32,
}

impl ProgressSample {
    pub fn new(
        bytes_downloaded: u64,
        bytes_total: Option<u64>,
        bytes_per_sec: f64,
        retry_index: u32,
    ) -> Self {
        let percent = bytes_total
            .filter(|total| *total > 0)
            .map(|total| bytes_downloaded as f64 / total as f64 * 100.0);
        Self {
            percent,
            bytes_downloaded,
            bytes_total,
            bytes_per_sec,
            retry_index,
        }
    }

    /// Zero-progress sample emitted when an attempt is abandoned and a
    /// retry is scheduled, so consumers can reset their display.
    pub fn retry_marker(bytes_total: Option<u64>, retry_index: u32) -> Self {
        Self::new(0, bytes_total, 0.0, retry_index)
    }
}

/// Everything a transfer reports to its consumer, as a closed set of
/// variants. Serializes with a `kind` tag for line-oriented output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressEvent {
    Progress { sample: ProgressSample },
    Status { message: String },
    ItemStarted { title: String, path: PathBuf },
    ItemRetrying { title: String, retry_count: u32, error: String },
    ItemCompleted { title: String, path: PathBuf },
    ItemFailed { title: String, error: String },
}

/// Receiver for [`ProgressEvent`]s. Implementations must tolerate being
/// called from the download task; keep `emit` non-blocking.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

impl<F> EventSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: ProgressEvent) {
        self(event)
    }
}

/// Sink that drops everything, for callers without a UI.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Throttles progress sampling to one measurement per interval and
/// derives the transfer rate from the delta since the last sample.
#[derive(Debug)]
pub struct RateMeter {
    interval: Duration,
    last_instant: Instant,
    last_bytes: u64,
}

impl RateMeter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_instant: Instant::now(),
            last_bytes: 0,
        }
    }

    /// Returns the current rate in bytes per second, or `None` while
    /// still inside the throttle window.
    pub fn sample(&mut self, bytes_downloaded: u64) -> Option<f64> {
        self.sample_at(Instant::now(), bytes_downloaded)
    }

    fn sample_at(&mut self, now: Instant, bytes_downloaded: u64) -> Option<f64> {
        let elapsed = now.duration_since(self.last_instant);
        if elapsed < self.interval {
            return None;
        }
        let delta = bytes_downloaded.saturating_sub(self.last_bytes);
        let secs = elapsed.as_secs_f64();
        let rate = if secs > 0.0 { delta as f64 / secs } else { 0.0 };
        self.last_instant = now;
        self.last_bytes = bytes_downloaded;
        Some(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_percent_from_total() {
        let sample = ProgressSample::new(512, Some(2048), 100.0, 0);
        assert_eq!(sample.percent, Some(25.0));
    }

    #[test]
    fn sample_suppresses_percent_without_total() {
        let sample = ProgressSample::new(512, None, 100.0, 0);
        assert_eq!(sample.percent, None);

        let zero_total = ProgressSample::new(512, Some(0), 100.0, 0);
        assert_eq!(zero_total.percent, None);
    }

    #[test]
    fn retry_marker_resets_counters() {
        let sample = ProgressSample::retry_marker(Some(1000), 2);
        assert_eq!(sample.bytes_downloaded, 0);
        assert_eq!(sample.bytes_per_sec, 0.0);
        assert_eq!(sample.retry_index, 2);
        assert_eq!(sample.percent, Some(0.0));
    }

    #[test]
    fn meter_throttles_within_interval() {
        let start = Instant::now();
        let mut meter = RateMeter {
            interval: Duration::from_millis(500),
            last_instant: start,
            last_bytes: 0,
        };

        assert!(meter.sample_at(start + Duration::from_millis(100), 1024).is_none());
        assert!(meter.sample_at(start + Duration::from_millis(499), 2048).is_none());

        let rate = meter.sample_at(start + Duration::from_millis(500), 4096);
        assert_eq!(rate, Some(8192.0));
    }

    #[test]
    fn meter_rate_uses_delta_since_last_sample() {
        let start = Instant::now();
        let mut meter = RateMeter {
            interval: Duration::from_secs(1),
            last_instant: start,
            last_bytes: 0,
        };

        assert_eq!(meter.sample_at(start + Duration::from_secs(1), 1000), Some(1000.0));
        // Only the 500 bytes since the previous sample count.
        assert_eq!(meter.sample_at(start + Duration::from_secs(2), 1500), Some(500.0));
    }

    #[test]
    fn meter_zero_interval_samples_every_call() {
        let start = Instant::now();
        let mut meter = RateMeter {
            interval: Duration::ZERO,
            last_instant: start,
            last_bytes: 0,
        };
        assert!(meter.sample_at(start + Duration::from_nanos(1), 10).is_some());
        assert!(meter.sample_at(start + Duration::from_nanos(2), 20).is_some());
    }

    #[test]
    fn event_serializes_with_kind_tag() {
        let event = ProgressEvent::ItemRetrying {
            title: "clip".into(),
            retry_count: 1,
            error: "connection reset".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "item_retrying");
        assert_eq!(json["retry_count"], 1);

        let progress = ProgressEvent::Progress {
            sample: ProgressSample::new(10, Some(100), 5.0, 0),
        };
        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["kind"], "progress");
        assert_eq!(json["sample"]["bytes_total"], 100);
    }
}
