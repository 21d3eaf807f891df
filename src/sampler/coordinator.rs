// src/sampler/coordinator.rs
//! Run coordinator: one task per log, all spawned before any is awaited.
//!
//! Workers share only the entry router (sink + run log) and the stats
//! counters; a failed log is counted and otherwise ignored, so a run
//! finishes even when every worker failed.

use futures_util::future::join_all;
use tokio::sync::watch;
use tracing::{error, info};

use super::worker::{LogWorker, SampleOutcome, WorkerConfig};
use crate::classify::EntryRouter;
use crate::progress::SampleProgress;
use crate::run_log::RunLog;
use crate::stats::StatsCollector;

/// Aggregated terminal states across the whole run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub completed: usize,
    pub exhausted: usize,
    pub cancelled: usize,
    pub failed: usize,
    pub total_entries: u64,
}

impl RunSummary {
    fn record(&mut self, outcome: &SampleOutcome) {
        self.total_entries += outcome.processed();
        match outcome {
            SampleOutcome::Completed { .. } => self.completed += 1,
            SampleOutcome::Exhausted { .. } => self.exhausted += 1,
            SampleOutcome::Cancelled { .. } => self.cancelled += 1,
            SampleOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn logs(&self) -> usize {
        self.completed + self.exhausted + self.cancelled + self.failed
    }
}

pub struct SampleCoordinator {
    log_urls: Vec<String>,
    skip_tls_verify: bool,
    worker_config: WorkerConfig,
    router: EntryRouter,
    run_log: RunLog,
    stats: StatsCollector,
    progress: SampleProgress,
    shutdown_rx: watch::Receiver<bool>,
}

impl SampleCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        log_urls: Vec<String>,
        skip_tls_verify: bool,
        worker_config: WorkerConfig,
        router: EntryRouter,
        run_log: RunLog,
        stats: StatsCollector,
        progress: SampleProgress,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            log_urls,
            skip_tls_verify,
            worker_config,
            router,
            run_log,
            stats,
            progress,
            shutdown_rx,
        }
    }

    /// Spawn every worker, wait for all, and aggregate their outcomes.
    /// Returns only after each worker reached a terminal state.
    pub async fn run(self) -> RunSummary {
        info!("Starting {} log samplers", self.log_urls.len());

        let mut handles = Vec::new();
        let mut summary = RunSummary::default();

        for log_url in self.log_urls {
            let worker = match LogWorker::new(
                log_url.clone(),
                self.skip_tls_verify,
                self.router.clone(),
                self.run_log.clone(),
                self.stats.clone(),
                self.worker_config.clone(),
                self.progress.add_log(&log_url),
                self.shutdown_rx.clone(),
            ) {
                Ok(worker) => worker,
                Err(e) => {
                    error!("Failed to create sampler for {}: {:#}", log_url, e);
                    self.run_log
                        .line(format!("Failed to create sampler for {}: {:#}", log_url, e));
                    summary.failed += 1;
                    continue;
                }
            };

            handles.push(tokio::spawn(worker.run()));
        }

        for result in join_all(handles).await {
            match result {
                Ok(outcome) => summary.record(&outcome),
                Err(e) => {
                    error!("Sampler task failed: {}", e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "All samplers finished: {} completed, {} exhausted, {} cancelled, {} failed",
            summary.completed, summary.exhausted, summary.cancelled, summary.failed
        );

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_records_outcomes() {
        let mut summary = RunSummary::default();
        summary.record(&SampleOutcome::Completed { processed: 100 });
        summary.record(&SampleOutcome::Exhausted { processed: 10 });
        summary.record(&SampleOutcome::Failed {
            processed: 5,
            error: "boom".to_string(),
        });

        assert_eq!(summary.completed, 1);
        assert_eq!(summary.exhausted, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.cancelled, 0);
        assert_eq!(summary.total_entries, 115);
        assert_eq!(summary.logs(), 3);
    }
}
