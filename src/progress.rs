// src/progress.rs
//! Per-log progress bars using indicatif

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Owns the shared multi-bar area; one bar is handed to each worker
#[derive(Clone)]
pub struct SampleProgress {
    multi: MultiProgress,
    enabled: bool,
}

impl SampleProgress {
    pub fn new(enabled: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            enabled,
        }
    }

    /// Add a bar for one log. The target length is set once the worker
    /// knows its sampling target.
    pub fn add_log(&self, label: &str) -> LogProgress {
        if !self.enabled {
            return LogProgress { bar: None };
        }

        let bar = self.multi.add(ProgressBar::new(0));
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:.cyan} {wide_bar} {pos}/{len} ({per_sec}, eta {eta}) {msg}")
                .expect("Invalid template"),
        );
        bar.set_prefix(label.to_string());

        LogProgress { bar: Some(bar) }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Handle for a single worker's bar
pub struct LogProgress {
    bar: Option<ProgressBar>,
}

impl LogProgress {
    pub fn set_target(&self, target: u64) {
        if let Some(ref bar) = self.bar {
            bar.set_length(target);
        }
    }

    pub fn inc(&self, n: u64) {
        if let Some(ref bar) = self.bar {
            bar.inc(n);
        }
    }

    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }

    /// Leave the bar in place with a terminal status message
    pub fn abandon(&self, msg: &str) {
        if let Some(ref bar) = self.bar {
            bar.abandon_with_message(msg.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_progress_is_inert() {
        let progress = SampleProgress::new(false);
        assert!(!progress.is_enabled());

        // Should not panic
        let bar = progress.add_log("https://ct.example.com");
        bar.set_target(100);
        bar.inc(10);
        bar.finish();
        bar.abandon("failed");
    }

    #[test]
    fn test_enabled_progress_hands_out_bars() {
        let progress = SampleProgress::new(true);
        assert!(progress.is_enabled());

        let bar = progress.add_log("log-a");
        bar.set_target(50);
        bar.inc(25);
        bar.finish();
    }
}
