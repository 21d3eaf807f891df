// src/main.rs
use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use ct_sampler::classify::EntryRouter;
use ct_sampler::cli::Cli;
use ct_sampler::config::Config;
use ct_sampler::ct_log::log_list::{check_log_key, LogListFetcher};
use ct_sampler::progress::SampleProgress;
use ct_sampler::run_log::RunLog;
use ct_sampler::sampler::{SampleCoordinator, WorkerConfig};
use ct_sampler::sink::CertSink;
use ct_sampler::stats::StatsCollector;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    cli.validate()?;

    // Load config file, then fold CLI overrides into one immutable value
    let mut config = match cli.config {
        Some(ref path) => Config::from_file(Path::new(path))?,
        None => Config::default(),
    };
    apply_cli_overrides(&mut config, &cli);
    config.validate()?;

    // Initialize logging
    let log_level = cli.log_level().unwrap_or(config.logging.level.as_str());
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting ct-sampler...");

    // Resolve log targets before touching the filesystem
    let log_urls = resolve_log_targets(&cli, &config).await?;
    tracing::info!("Sampling {} CT logs", log_urls.len());

    // Fatal setup errors abort here, before any worker starts
    let out_dir = PathBuf::from(&config.output.dir);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let run_log = RunLog::create(Path::new(&config.output.run_log))?;

    let stats = StatsCollector::new();
    let sink = Arc::new(CertSink::new(
        out_dir,
        config.output.text_output,
        config.output.combined.as_deref().map(Path::new),
        stats.clone(),
    )?);
    let router = EntryRouter::new(
        sink,
        run_log.clone(),
        config.output.include_precerts,
        config.output.include_chain,
    );

    let progress = SampleProgress::new(cli.should_show_progress());

    // Ctrl-C drains workers at their next loop iteration
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Shutdown requested, draining samplers...");
            let _ = shutdown_tx.send(true);
        }
    });

    let worker_config = WorkerConfig {
        batch_size: config.sampling.batch_size,
        sample_rate: config.sampling.sample_rate,
        min_sample: config.sampling.min_sample,
        fetch_retries: config.sampling.fetch_retries,
    };

    let coordinator = SampleCoordinator::new(
        log_urls,
        config.network.skip_tls_verify,
        worker_config,
        router,
        run_log,
        stats.clone(),
        progress,
        shutdown_rx,
    );

    let summary = coordinator.run().await;

    let snapshot = stats.snapshot();
    eprintln!("\n{}", "Sampling run finished".bold());
    eprintln!(
        "  Logs: {} completed, {} exhausted, {} cancelled, {} failed",
        summary.completed.to_string().green(),
        summary.exhausted.to_string().yellow(),
        summary.cancelled.to_string().yellow(),
        summary.failed.to_string().red()
    );
    eprintln!("  Entries sampled: {}", snapshot.entries_sampled);
    eprintln!("  Certificates written: {}", snapshot.certs_written);
    eprintln!("  Decode failures: {}", snapshot.decode_failures);
    eprintln!(
        "  Rate: {:.1} entries/min | Uptime: {}",
        snapshot.entries_per_minute,
        StatsCollector::format_uptime(snapshot.uptime_secs)
    );

    Ok(())
}

fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if let Some(ref dir) = cli.out_dir {
        config.output.dir = dir.clone();
    }
    if let Some(ref combined) = cli.combined {
        config.output.combined = Some(combined.clone());
    }
    if let Some(ref run_log) = cli.run_log {
        config.output.run_log = run_log.clone();
    }
    if cli.chain {
        config.output.include_chain = true;
    }
    if cli.text {
        config.output.text_output = true;
    }
    if cli.precerts {
        config.output.include_precerts = true;
    }
    if cli.skip_tls_verify {
        config.network.skip_tls_verify = true;
    }
    if let Some(batch_size) = cli.batch_size {
        config.sampling.batch_size = batch_size;
    }
    if let Some(rate) = cli.sample_rate {
        config.sampling.sample_rate = rate;
    }
    if let Some(min_sample) = cli.min_sample {
        config.sampling.min_sample = min_sample;
    }
    if let Some(ref list_url) = cli.log_list {
        config.network.log_list_url = list_url.clone();
    }
}

/// Read the input list (one URI per line, blank and '#' lines skipped) or
/// resolve a single log by catalog name. An unreadable list or an invalid
/// URI is a fatal configuration error.
async fn resolve_log_targets(cli: &Cli, config: &Config) -> anyhow::Result<Vec<String>> {
    if let Some(ref name) = cli.log_name {
        let fetcher = LogListFetcher::new();
        let log = fetcher
            .find_log_by_name(&config.network.log_list_url, name)
            .await?;

        if let Some(ref key_path) = cli.public_key {
            let key_der = std::fs::read(key_path)
                .with_context(|| format!("Failed to read public key {}", key_path))?;
            check_log_key(&log, &key_der)?;
        }

        tracing::info!("Resolved log {:?} to {}", log.description, log.url);
        return Ok(vec![log.url]);
    }

    let path = cli.input.as_ref().expect("validated: input or log-name");
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read log URI file {}", path))?;

    let mut urls = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        url::Url::parse(line).with_context(|| format!("Invalid log URI in input list: {line}"))?;
        urls.push(line.to_string());
    }

    if urls.is_empty() {
        anyhow::bail!("Input list {} contains no log URIs", path);
    }

    Ok(urls)
}
