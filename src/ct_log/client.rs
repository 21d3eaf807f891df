// src/ct_log/client.rs
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, warn};

use super::types::{GetEntriesResponse, RawEntry, SignedTreeHead};

/// HTTP client for the Certificate Transparency log RFC 6962 API.
///
/// Network-level concerns (timeouts, TLS, retry with backoff) live here;
/// the sampling loop above never retries on its own.
pub struct CtLogClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl CtLogClient {
    /// Create a new CT log client. `skip_tls_verify` disables certificate
    /// validation for logs fronted by broken or private TLS.
    pub fn new(base_url: String, skip_tls_verify: bool) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(100))
            .connect_timeout(Duration::from_secs(30))
            .gzip(true)
            .danger_accept_invalid_certs(skip_tls_verify)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get Signed Tree Head (current log size and timestamp)
    /// Endpoint: GET {base_url}/ct/v1/get-sth
    pub async fn get_sth(&self) -> Result<SignedTreeHead> {
        let url = format!("{}/ct/v1/get-sth", self.base_url);

        debug!("Fetching STH from {}", url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch STH")?;

        if !response.status().is_success() {
            anyhow::bail!(
                "STH request failed with status {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            );
        }

        let sth: SignedTreeHead = response
            .json()
            .await
            .context("Failed to parse STH JSON")?;

        debug!(
            "STH received: tree_size={}, timestamp={}",
            sth.tree_size, sth.timestamp
        );

        Ok(sth)
    }

    /// Get raw entries for the inclusive index range `[start, end]`.
    /// Endpoint: GET {base_url}/ct/v1/get-entries?start={start}&end={end}
    ///
    /// Logs may return fewer entries than requested; an empty list is a
    /// valid response and surfaces to the caller unchanged.
    pub async fn get_entries(&self, start: u64, end: u64) -> Result<Vec<RawEntry>> {
        let url = format!(
            "{}/ct/v1/get-entries?start={}&end={}",
            self.base_url, start, end
        );

        debug!("Fetching entries {}-{} from {}", start, end, self.base_url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch entries")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                warn!("Rate limited by CT log: {}", self.base_url);
                anyhow::bail!("Rate limited (429)");
            }

            anyhow::bail!(
                "Get entries request failed with status {}: {}",
                status,
                body
            );
        }

        let entries_response: GetEntriesResponse = response
            .json()
            .await
            .context("Failed to parse entries JSON")?;

        debug!(
            "Received {} entries from {}",
            entries_response.entries.len(),
            self.base_url
        );

        Ok(entries_response.entries)
    }

    /// Get entries with retry logic and exponential backoff
    pub async fn get_entries_with_retry(
        &self,
        start: u64,
        end: u64,
        max_retries: u32,
    ) -> Result<Vec<RawEntry>> {
        let mut retries = 0;
        let mut backoff = Duration::from_secs(1);

        loop {
            match self.get_entries(start, end).await {
                Ok(entries) => return Ok(entries),
                Err(e) => {
                    retries += 1;

                    if retries >= max_retries {
                        return Err(e.context(format!(
                            "Failed after {} retries",
                            max_retries
                        )));
                    }

                    warn!(
                        "Error fetching entries (attempt {}/{}): {}. Retrying in {:?}",
                        retries, max_retries, e, backoff
                    );

                    tokio::time::sleep(backoff).await;
                    backoff = std::cmp::min(backoff * 2, Duration::from_secs(60));
                }
            }
        }
    }

    /// Get STH with retry logic
    pub async fn get_sth_with_retry(&self, max_retries: u32) -> Result<SignedTreeHead> {
        let mut retries = 0;
        let mut backoff = Duration::from_secs(1);

        loop {
            match self.get_sth().await {
                Ok(sth) => return Ok(sth),
                Err(e) => {
                    retries += 1;

                    if retries >= max_retries {
                        return Err(e.context(format!(
                            "Failed after {} retries",
                            max_retries
                        )));
                    }

                    warn!(
                        "Error fetching STH (attempt {}/{}): {}. Retrying in {:?}",
                        retries, max_retries, e, backoff
                    );

                    tokio::time::sleep(backoff).await;
                    backoff = std::cmp::min(backoff * 2, Duration::from_secs(60));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = CtLogClient::new("https://ct.example.com/log/".to_string(), false).unwrap();
        assert_eq!(client.base_url(), "https://ct.example.com/log");
    }
}
