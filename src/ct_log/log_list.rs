// src/ct_log/log_list.rs
use anyhow::{Context, Result};
use base64::Engine;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, info};

use super::types::{LogInfo, LogListV3};

/// Fetches Google's CT log list and resolves a log by catalog name.
pub struct LogListFetcher {
    http_client: reqwest::Client,
}

impl LogListFetcher {
    pub fn new() -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .gzip(true)
            .build()
            .unwrap();

        Self { http_client }
    }

    /// Fetch and parse the full log list.
    pub async fn fetch(&self, list_url: &str) -> Result<LogListV3> {
        info!("Fetching CT log list from {}", list_url);

        let response = self
            .http_client
            .get(list_url)
            .send()
            .await
            .context("Failed to fetch CT log list")?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to fetch log list: HTTP {}", response.status());
        }

        response
            .json()
            .await
            .context("Failed to parse log list JSON")
    }

    /// Resolve a single log URL by (case-insensitive, substring) name match.
    ///
    /// Zero matches and multiple matches are both errors so a misspelled
    /// name cannot silently sample the wrong log.
    pub async fn find_log_by_name(&self, list_url: &str, name: &str) -> Result<LogInfo> {
        let log_list = self.fetch(list_url).await?;

        let needle = name.to_lowercase();
        let mut matches: Vec<LogInfo> = Vec::new();

        for operator in &log_list.operators {
            for log in &operator.logs {
                if !log.url.is_empty() && log.description.to_lowercase().contains(&needle) {
                    debug!("Catalog match: {} ({})", log.description, log.url);
                    matches.push(log.clone());
                }
            }
        }

        match matches.len() {
            0 => anyhow::bail!("No log with name like {:?} found in log list {}", name, list_url),
            1 => Ok(matches.remove(0)),
            _ => {
                let names: Vec<String> = matches
                    .iter()
                    .map(|l| format!("{:?}", l.description))
                    .collect();
                anyhow::bail!(
                    "Multiple logs with name like {:?} found in log list: {}",
                    name,
                    names.join(", ")
                )
            }
        }
    }
}

/// Cross-check a catalog entry against a locally supplied public key.
///
/// A log's id is the SHA-256 of its SPKI, so the entry's `log_id` (or the
/// key itself) must match the DER bytes read from disk. This catches a
/// catalog lookup that resolved to the wrong log; it is not signature
/// verification.
pub fn check_log_key(log: &LogInfo, key_der: &[u8]) -> Result<()> {
    let local_id = {
        let mut hasher = Sha256::new();
        hasher.update(key_der);
        base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
    };

    if let Some(ref catalog_key) = log.key {
        if catalog_key == &base64::engine::general_purpose::STANDARD.encode(key_der) {
            return Ok(());
        }
    }

    if let Some(ref log_id) = log.log_id {
        if log_id == &local_id {
            return Ok(());
        }
    }

    anyhow::bail!(
        "Supplied public key does not match catalog entry for {:?}",
        log.description
    )
}

impl Default for LogListFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use sha2::{Digest, Sha256};

    fn log_info(description: &str, key: Option<String>, log_id: Option<String>) -> LogInfo {
        LogInfo {
            description: description.to_string(),
            log_id,
            key,
            url: "https://ct.example.com/".to_string(),
        }
    }

    #[test]
    fn test_check_log_key_matches_key() {
        let key = b"fake-spki-bytes";
        let encoded = base64::engine::general_purpose::STANDARD.encode(key);
        let log = log_info("Example Log", Some(encoded), None);

        assert!(check_log_key(&log, key).is_ok());
    }

    #[test]
    fn test_check_log_key_matches_log_id() {
        let key = b"fake-spki-bytes";
        let id = {
            let mut hasher = Sha256::new();
            hasher.update(key);
            base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
        };
        let log = log_info("Example Log", None, Some(id));

        assert!(check_log_key(&log, key).is_ok());
    }

    #[test]
    fn test_check_log_key_mismatch() {
        let log = log_info("Example Log", None, Some("bm90LXRoZS1pZA==".to_string()));
        assert!(check_log_key(&log, b"some-other-key").is_err());
    }
}
