// src/sampler/worker.rs
//! Per-log sampling worker.
//!
//! One worker owns one log's session: it fetches the STH once, computes
//! the sampling target, then loops fetching random batches until the
//! target is reached or a terminal condition ends the session. The tree
//! size captured at startup is never refreshed, so entries appended while
//! sampling runs are simply never candidates.

use anyhow::Result;
use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info};

use super::range::RangeSampler;
use crate::classify::EntryRouter;
use crate::ct_log::CtLogClient;
use crate::leaf::decode_leaf;
use crate::progress::LogProgress;
use crate::run_log::RunLog;
use crate::stats::StatsCollector;

/// Per-worker sampling parameters
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub batch_size: u64,
    pub sample_rate: f64,
    pub min_sample: u64,
    pub fetch_retries: u32,
}

/// Terminal state of one log's sampling session
#[derive(Debug)]
pub enum SampleOutcome {
    /// Reached the sampling target
    Completed { processed: u64 },
    /// A batch returned zero entries before the target was reached
    Exhausted { processed: u64 },
    /// Shutdown was requested mid-session
    Cancelled { processed: u64 },
    /// STH or batch fetch failed; this worker stops, others are unaffected
    Failed { processed: u64, error: String },
}

impl SampleOutcome {
    pub fn processed(&self) -> u64 {
        match self {
            SampleOutcome::Completed { processed }
            | SampleOutcome::Exhausted { processed }
            | SampleOutcome::Cancelled { processed }
            | SampleOutcome::Failed { processed, .. } => *processed,
        }
    }
}

/// Sampling target for a log: `rate * tree_size`, floored, raised to
/// `min_sample`, and capped at the tree size. Small logs get sampled in
/// full while large logs stay at a proportional cost.
pub fn sample_target(tree_size: u64, sample_rate: f64, min_sample: u64) -> u64 {
    let scaled = (sample_rate * tree_size as f64).floor() as u64;
    scaled.max(min_sample).min(tree_size)
}

pub struct LogWorker {
    log_url: String,
    client: CtLogClient,
    router: EntryRouter,
    run_log: RunLog,
    stats: StatsCollector,
    config: WorkerConfig,
    progress: LogProgress,
    shutdown_rx: watch::Receiver<bool>,
}

impl LogWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        log_url: String,
        skip_tls_verify: bool,
        router: EntryRouter,
        run_log: RunLog,
        stats: StatsCollector,
        config: WorkerConfig,
        progress: LogProgress,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Result<Self> {
        let client = CtLogClient::new(log_url.clone(), skip_tls_verify)?;

        Ok(Self {
            log_url,
            client,
            router,
            run_log,
            stats,
            config,
            progress,
            shutdown_rx,
        })
    }

    /// Run the session to a terminal state. All observable effects are
    /// run-log lines and sink writes; the outcome value is returned for
    /// the coordinator to aggregate.
    pub async fn run(self) -> SampleOutcome {
        info!("Starting sampler for {}", self.log_url);

        let sth = match self.client.get_sth_with_retry(self.config.fetch_retries).await {
            Ok(sth) => sth,
            Err(e) => {
                self.run_log
                    .line(format!("STH error from {}: {:#}", self.log_url, e));
                self.progress.abandon("STH error");
                return SampleOutcome::Failed {
                    processed: 0,
                    error: format!("{:#}", e),
                };
            }
        };

        let tree_size = sth.tree_size;
        if tree_size == 0 {
            self.run_log
                .line(format!("No entries returned for log {}: empty tree", self.log_url));
            self.progress.finish();
            return SampleOutcome::Exhausted { processed: 0 };
        }

        let target = sample_target(tree_size, self.config.sample_rate, self.config.min_sample);
        self.progress.set_target(target);

        debug!(
            "{}: tree_size={}, sampling target={}",
            self.log_url, tree_size, target
        );

        let mut sampler = RangeSampler::new(self.config.batch_size);
        let mut processed: u64 = 0;

        while processed < target {
            if *self.shutdown_rx.borrow() {
                self.run_log.line(format!(
                    "Sampling of {} cancelled after {} entries",
                    self.log_url, processed
                ));
                self.progress.abandon("cancelled");
                return SampleOutcome::Cancelled { processed };
            }

            let (first, last) = sampler.next_range(tree_size);

            let entries = match self
                .client
                .get_entries_with_retry(first, last, self.config.fetch_retries)
                .await
            {
                Ok(entries) => entries,
                Err(e) => {
                    self.run_log.line(format!(
                        "get-entries error for [{}, {}] from {}: {:#}",
                        first, last, self.log_url, e
                    ));
                    self.progress.abandon("fetch error");
                    return SampleOutcome::Failed {
                        processed,
                        error: format!("{:#}", e),
                    };
                }
            };

            if entries.is_empty() {
                self.run_log
                    .line(format!("No entries returned for log {}", self.log_url));
                self.progress.abandon("no entries");
                return SampleOutcome::Exhausted { processed };
            }

            for (offset, raw) in entries.iter().enumerate() {
                let index = first + offset as u64;
                match decode_leaf(index, raw) {
                    Ok(entry) => self.router.route(&entry),
                    Err(e) => {
                        // One bad leaf never aborts its batch
                        self.run_log.line(format!(
                            "Index={} failed to decode leaf entry from {}: {:#}",
                            index, self.log_url, e
                        ));
                        self.stats.increment_decode_failures();
                    }
                }
            }

            let batch_len = entries.len() as u64;
            processed += batch_len;
            self.stats.add_sampled(batch_len);
            self.progress.inc(batch_len);
        }

        self.run_log.line(format!(
            "log: {} finished at: {} total entries: {}",
            self.log_url,
            Utc::now().to_rfc3339(),
            processed
        ));
        self.progress.finish();

        SampleOutcome::Completed { processed }
    }
}
