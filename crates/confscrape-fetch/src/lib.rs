//! HTTP fetch + raw page snapshot utilities.
//!
//! The pipeline core never touches the network; collectors go through
//! [`HttpFetcher`] and optionally archive what they fetched in a
//! [`PageSnapshotStore`] so a broken extraction can be debugged against the
//! exact markup that produced it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

pub const CRATE_NAME: &str = "confscrape-fetch";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; AcademicConferenceScraper/1.0)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retryable,
    NonRetryable,
}

pub fn classify_status(status: StatusCode) -> RetryDisposition {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        RetryDisposition::Retryable
    } else {
        RetryDisposition::NonRetryable
    }
}

pub fn classify_reqwest_error(err: &reqwest::Error) -> RetryDisposition {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        RetryDisposition::Retryable
    } else {
        RetryDisposition::NonRetryable
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl BackoffPolicy {
    pub fn delay_for_attempt(&self, attempt_index: usize) -> Duration {
        let factor = 1u32.checked_shl(attempt_index as u32).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub backoff: BackoffPolicy,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            backoff: BackoffPolicy::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed after retries: {0}")]
    Request(#[from] reqwest::Error),
    #[error("http status {status} for {url}")]
    HttpStatus { status: u16, url: String },
}

/// Thin wrapper over a shared `reqwest::Client`: one timeout, one user agent,
/// bounded retry on retryable failures. Pages are fetched one at a time; the
/// pipeline is a sequential batch job.
#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    backoff: BackoffPolicy,
}

impl HttpFetcher {
    pub fn new(config: HttpClientConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .context("building reqwest client")?;
        Ok(Self {
            client,
            backoff: config.backoff,
        })
    }

    /// Fetch a page body as text. Non-success statuses and transport errors
    /// are retried per the backoff policy when retryable, otherwise returned
    /// as [`FetchError`].
    pub async fn fetch_text(&self, source_id: &str, url: &str) -> Result<String, FetchError> {
        let mut last_request_error: Option<reqwest::Error> = None;

        for attempt in 0..=self.backoff.max_retries {
            debug!(source_id, url, attempt, "fetching page");
            match self.client.get(url).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    let final_url = resp.url().to_string();

                    if status.is_success() {
                        return Ok(resp.text().await?);
                    }

                    if classify_status(status) == RetryDisposition::Retryable
                        && attempt < self.backoff.max_retries
                    {
                        tokio::time::sleep(self.backoff.delay_for_attempt(attempt)).await;
                        continue;
                    }

                    return Err(FetchError::HttpStatus {
                        status: status.as_u16(),
                        url: final_url,
                    });
                }
                Err(err) => {
                    if classify_reqwest_error(&err) == RetryDisposition::Retryable
                        && attempt < self.backoff.max_retries
                    {
                        last_request_error = Some(err);
                        tokio::time::sleep(self.backoff.delay_for_attempt(attempt)).await;
                        continue;
                    }
                    return Err(FetchError::Request(err));
                }
            }
        }

        Err(FetchError::Request(
            last_request_error.expect("retry loop always records a request error"),
        ))
    }
}

#[derive(Debug, Clone)]
pub struct StoredSnapshot {
    pub content_hash: String,
    pub path: PathBuf,
    pub deduplicated: bool,
}

/// Hash-addressed archive of raw fetched pages, laid out as
/// `<root>/<YYYYMMDD>/<source>/<sha256>.html`. Refetching identical markup
/// within a day lands on the same path and is skipped.
#[derive(Debug, Clone)]
pub struct PageSnapshotStore {
    root: PathBuf,
}

impl PageSnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sha256_hex(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    pub async fn store(
        &self,
        fetched_at: DateTime<Utc>,
        source_id: &str,
        body: &str,
    ) -> anyhow::Result<StoredSnapshot> {
        let content_hash = Self::sha256_hex(body.as_bytes());
        let dir = self
            .root
            .join(fetched_at.format("%Y%m%d").to_string())
            .join(source_id);
        let path = dir.join(format!("{content_hash}.html"));

        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating snapshot directory {}", dir.display()))?;

        if fs::try_exists(&path)
            .await
            .with_context(|| format!("checking snapshot path {}", path.display()))?
        {
            return Ok(StoredSnapshot {
                content_hash,
                path,
                deduplicated: true,
            });
        }

        fs::write(&path, body)
            .await
            .with_context(|| format!("writing snapshot {}", path.display()))?;
        Ok(StoredSnapshot {
            content_hash,
            path,
            deduplicated: false,
        })
    }
}
