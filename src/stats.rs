// src/stats.rs
//! Run-wide counters shared by workers and the output sink

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Thread-safe statistics collector
#[derive(Clone)]
pub struct StatsCollector {
    entries_sampled: Arc<AtomicU64>,
    certs_written: Arc<AtomicU64>,
    decode_failures: Arc<AtomicU64>,
    start_time: Instant,
}

/// Snapshot of statistics at a point in time
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub entries_sampled: u64,
    pub certs_written: u64,
    pub decode_failures: u64,
    pub entries_per_minute: f64,
    pub uptime_secs: u64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            entries_sampled: Arc::new(AtomicU64::new(0)),
            certs_written: Arc::new(AtomicU64::new(0)),
            decode_failures: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    /// Count a batch of sampled entries
    pub fn add_sampled(&self, n: u64) {
        self.entries_sampled.fetch_add(n, Ordering::Relaxed);
    }

    pub fn increment_written(&self) {
        self.certs_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_decode_failures(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let elapsed = self.start_time.elapsed();
        let sampled = self.entries_sampled.load(Ordering::Relaxed);

        let rate = if elapsed.as_secs() > 0 {
            (sampled as f64 / elapsed.as_secs() as f64) * 60.0
        } else {
            0.0
        };

        StatsSnapshot {
            entries_sampled: sampled,
            certs_written: self.certs_written.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            entries_per_minute: rate,
            uptime_secs: elapsed.as_secs(),
        }
    }

    /// Format uptime duration
    pub fn format_uptime(secs: u64) -> String {
        let hours = secs / 3600;
        let minutes = (secs % 3600) / 60;
        let seconds = secs % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_collector_new() {
        let stats = StatsCollector::new();
        let snapshot = stats.snapshot();

        assert_eq!(snapshot.entries_sampled, 0);
        assert_eq!(snapshot.certs_written, 0);
        assert_eq!(snapshot.decode_failures, 0);
    }

    #[test]
    fn test_add_sampled_batches() {
        let stats = StatsCollector::new();

        stats.add_sampled(1000);
        stats.add_sampled(557);

        assert_eq!(stats.snapshot().entries_sampled, 1557);
    }

    #[test]
    fn test_clone_shares_state() {
        let stats1 = StatsCollector::new();
        let stats2 = stats1.clone();

        stats1.increment_written();
        stats2.increment_written();
        stats2.increment_decode_failures();

        assert_eq!(stats1.snapshot().certs_written, 2);
        assert_eq!(stats1.snapshot().decode_failures, 1);
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(StatsCollector::format_uptime(30), "30s");
        assert_eq!(StatsCollector::format_uptime(90), "1m 30s");
        assert_eq!(StatsCollector::format_uptime(3661), "1h 1m 1s");
    }
}
