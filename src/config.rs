// src/config.rs

use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct SamplingConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,
    #[serde(default = "default_min_sample")]
    pub min_sample: u64,
    #[serde(default = "default_fetch_retries")]
    pub fetch_retries: u32,
}

fn default_batch_size() -> u64 { 1000 }
fn default_sample_rate() -> f64 { 0.01 }
fn default_min_sample() -> u64 { 5_000_000 }
fn default_fetch_retries() -> u32 { 3 }

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_out_dir")]
    pub dir: String,
    /// Append all PEM output into one bundle file instead of per-cert files
    #[serde(default)]
    pub combined: Option<String>,
    #[serde(default = "default_run_log")]
    pub run_log: String,
    #[serde(default)]
    pub include_chain: bool,
    #[serde(default)]
    pub text_output: bool,
    #[serde(default)]
    pub include_precerts: bool,
}

fn default_out_dir() -> String { "certs".to_string() }
fn default_run_log() -> String { "sample-run.log".to_string() }

#[derive(Debug, Deserialize, Clone)]
pub struct NetworkConfig {
    #[serde(default)]
    pub skip_tls_verify: bool,
    #[serde(default = "default_log_list_url")]
    pub log_list_url: String,
}

fn default_log_list_url() -> String {
    "https://www.gstatic.com/ct/log_list/v3/all_logs_list.json".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String { "info".to_string() }

/// Immutable process-wide configuration, constructed once at startup and
/// passed by reference into the coordinator and every worker.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            sample_rate: default_sample_rate(),
            min_sample: default_min_sample(),
            fetch_retries: default_fetch_retries(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_out_dir(),
            combined: None,
            run_log: default_run_log(),
            include_chain: false,
            text_output: false,
            include_precerts: false,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            skip_tls_verify: false,
            log_list_url: default_log_list_url(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig::default(),
            output: OutputConfig::default(),
            network: NetworkConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.sampling.batch_size == 0 {
            anyhow::bail!("sampling.batch_size must be greater than 0");
        }
        if !(self.sampling.sample_rate > 0.0 && self.sampling.sample_rate <= 1.0) {
            anyhow::bail!("sampling.sample_rate must be in (0, 1]");
        }
        Ok(())
    }
}
