// src/cli.rs
use clap::Parser;
use is_terminal::IsTerminal;

/// ct-sampler: statistical Certificate Transparency log sampler
///
/// Estimates each log's size from its Signed Tree Head, then fetches
/// randomly positioned batches of entries until a per-log target is
/// reached, persisting every sampled certificate to disk.
#[derive(Parser, Debug, Clone)]
#[command(name = "ct-sampler")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    // ===== Input & Configuration =====
    /// Path to TOML config file
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    /// File listing CT log URIs, one per line
    #[arg(short = 'i', long = "input")]
    pub input: Option<String>,

    /// Sample a single log resolved by name from the log catalog
    #[arg(long = "log-name")]
    pub log_name: Option<String>,

    /// Override the log catalog URL used by --log-name
    #[arg(long = "log-list")]
    pub log_list: Option<String>,

    /// Path to the log's public key (DER); cross-checked against the
    /// catalog entry selected by --log-name
    #[arg(long = "public-key")]
    pub public_key: Option<String>,

    // ===== Output =====
    /// Output directory for certificate artifacts
    #[arg(short = 'o', long = "out-dir")]
    pub out_dir: Option<String>,

    /// Append all PEM output to a single bundle file
    #[arg(long = "combined")]
    pub combined: Option<String>,

    /// Path to the run log file
    #[arg(long = "run-log")]
    pub run_log: Option<String>,

    /// Emit every certificate in each entry's chain
    #[arg(long = "chain")]
    pub chain: bool,

    /// Write parsed certificate text instead of PEM
    #[arg(long = "text")]
    pub text: bool,

    /// Include precertificates in the output
    #[arg(long = "precerts")]
    pub precerts: bool,

    // ===== Sampling =====
    /// Entries requested per get-entries batch
    #[arg(long = "batch-size")]
    pub batch_size: Option<u64>,

    /// Fraction of each log to sample, in (0, 1]
    #[arg(long = "sample-rate")]
    pub sample_rate: Option<f64>,

    /// Minimum entries to sample per log
    #[arg(long = "min-sample")]
    pub min_sample: Option<u64>,

    // ===== Network =====
    /// Skip TLS certificate verification when talking to logs
    #[arg(short = 'k', long = "skip-tls-verify")]
    pub skip_tls_verify: bool,

    // ===== Display & Logging =====
    /// Disable per-log progress bars
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    /// Verbose logging (set log level to debug)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Quiet logging (set log level to warn)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl Cli {
    /// Validate flag combinations and return errors for invalid usage
    pub fn validate(&self) -> anyhow::Result<()> {
        match (&self.input, &self.log_name) {
            (None, None) => anyhow::bail!(
                "No logs to sample. Provide --input <file> or --log-name <name>."
            ),
            (Some(_), Some(_)) => anyhow::bail!(
                "Cannot specify both --input and --log-name. Choose one."
            ),
            _ => {}
        }

        if self.public_key.is_some() && self.log_name.is_none() {
            anyhow::bail!("--public-key requires --log-name (it cross-checks the catalog entry)");
        }

        if self.log_list.is_some() && self.log_name.is_none() {
            anyhow::bail!("--log-list requires --log-name");
        }

        if self.batch_size == Some(0) {
            anyhow::bail!("--batch-size must be greater than 0");
        }

        if let Some(rate) = self.sample_rate {
            if !(rate > 0.0 && rate <= 1.0) {
                anyhow::bail!("--sample-rate must be in (0, 1]");
            }
        }

        if self.verbose && self.quiet {
            anyhow::bail!("Cannot specify both --verbose and --quiet");
        }

        Ok(())
    }

    /// Check if progress bars should be enabled
    pub fn should_show_progress(&self) -> bool {
        !self.no_progress && !self.quiet && std::io::stderr().is_terminal()
    }

    /// Determine log level based on verbose/quiet flags; `None` defers to
    /// the config file
    pub fn log_level(&self) -> Option<&str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("warn")
        } else {
            None
        }
    }
}
