// src/sink.rs
//! Output sink: turns certificate bytes into artifact files.
//!
//! The sink is the only resource shared by every worker. Per-file PEM and
//! text artifacts need no locking because their names are unique by
//! construction; the optional combined bundle is the single mutex-guarded
//! critical section, held only across one encode+write.

use anyhow::{Context, Result};
use base64::Engine;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cert_parser::CertSummary;
use crate::stats::StatsCollector;

const PEM_LINE_WIDTH: usize = 64;

pub struct CertSink {
    out_dir: PathBuf,
    text_output: bool,
    combined: Option<Mutex<File>>,
    stats: StatsCollector,
}

impl CertSink {
    /// Create a sink writing into `out_dir`. When `combined` is set, PEM
    /// output is appended to that single bundle file instead of one file
    /// per certificate.
    pub fn new(
        out_dir: PathBuf,
        text_output: bool,
        combined: Option<&Path>,
        stats: StatsCollector,
    ) -> Result<Self> {
        let combined = match combined {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| {
                        format!("Failed to open combined bundle at {}", path.display())
                    })?;
                Some(Mutex::new(file))
            }
            None => None,
        };

        Ok(Self {
            out_dir,
            text_output,
            combined,
            stats,
        })
    }

    /// Persist one certificate. Never fails the caller: every error is
    /// logged and the certificate is skipped.
    pub fn write(&self, der_bytes: &[u8], timestamp_key: &str) {
        if der_bytes.is_empty() {
            return;
        }

        let outcome = if self.text_output {
            self.write_text(der_bytes, timestamp_key)
        } else {
            self.write_pem(der_bytes, timestamp_key)
        };

        match outcome {
            Ok(()) => self.stats.increment_written(),
            Err(e) => warn!("Failed to write certificate artifact: {:#}", e),
        }
    }

    /// Text mode: `<ts>-<serial_hex>.txt` with a parsed description.
    /// Same timestamp second + same serial collides; we disambiguate with
    /// a uuid suffix rather than overwrite.
    fn write_text(&self, der_bytes: &[u8], timestamp_key: &str) -> Result<()> {
        let summary =
            CertSummary::from_der(der_bytes).context("Failed to parse certificate for text output")?;

        let path = self
            .out_dir
            .join(format!("{}-{}.txt", timestamp_key, summary.serial_hex));

        let mut file = match OpenOptions::new().create_new(true).write(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let alt = self.out_dir.join(format!(
                    "{}-{}_{}.txt",
                    timestamp_key,
                    summary.serial_hex,
                    Uuid::new_v4()
                ));
                debug!(
                    "Artifact name collision on {}, using {}",
                    path.display(),
                    alt.display()
                );
                File::create(&alt)
                    .with_context(|| format!("Failed to create {}", alt.display()))?
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to create {}", path.display()));
            }
        };

        file.write_all(summary.describe().as_bytes())
            .context("Failed to write certificate text")?;
        Ok(())
    }

    /// PEM mode: `<ts>_<uuid>.pem`, or an append to the combined bundle
    fn write_pem(&self, der_bytes: &[u8], timestamp_key: &str) -> Result<()> {
        let block = pem_encode(der_bytes);

        if let Some(ref combined) = self.combined {
            let mut file = match combined.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            file.write_all(block.as_bytes())
                .context("Failed to append to combined bundle")?;
            return Ok(());
        }

        let path = self
            .out_dir
            .join(format!("{}_{}.pem", timestamp_key, Uuid::new_v4()));

        let mut file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        file.write_all(block.as_bytes())
            .context("Failed to write PEM data")?;
        Ok(())
    }
}

/// Standard PEM CERTIFICATE block with 64-column base64
fn pem_encode(der_bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(der_bytes);

    let mut out = String::with_capacity(encoded.len() + encoded.len() / PEM_LINE_WIDTH + 64);
    out.push_str("-----BEGIN CERTIFICATE-----\n");
    let mut rest = encoded.as_str();
    while !rest.is_empty() {
        let split = rest.len().min(PEM_LINE_WIDTH);
        out.push_str(&rest[..split]);
        out.push('\n');
        rest = &rest[split..];
    }
    out.push_str("-----END CERTIFICATE-----\n");
    out
}
