//! Picture downloads over HTTP with retries on transient failures.
//!
//! - [`FetchAsync`]: one GET of one URL
//! - [`HttpFetch`]: the `reqwest` implementation
//! - [`RetryFetch`]: retries a [`FetchAsync`] while its error
//!   [`is_transient`](FetchError::is_transient)
//!
//! Connection errors, timeouts, `429` and `5xx` are retried with exponential
//! backoff plus jitter; any other status fails on the first attempt.

use crate::error::FetchError;
use rand::{Rng, rng};
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

const MAX_RETRIES: usize = 3;
const BASE_DELAY: Duration = Duration::from_millis(500);
const MAX_DELAY: Duration = Duration::from_secs(30);
const MAX_JITTER_MS: u64 = 250;

/// A fetched response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    /// The `Content-Type` header, when the server sent one.
    pub content_type: Option<String>,
}

pub trait FetchAsync {
    type Response;

    async fn fetch(&self, url: &str) -> Result<Self::Response, FetchError>;
}

/// Retry wrapper: `delay = min(base * 2^(attempt-1), 30s) + jitter(0..=250ms)`.
#[derive(Debug)]
pub struct RetryFetch<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
}

impl<T: FetchAsync> RetryFetch<T> {
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
        }
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let shift = (attempt - 1).min(16) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift).min(MAX_DELAY);
        delay + Duration::from_millis(rng().random_range(0..=MAX_JITTER_MS))
    }
}

impl<T: FetchAsync> FetchAsync for RetryFetch<T> {
    type Response = T::Response;

    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<Self::Response, FetchError> {
        let started = Instant::now();
        let mut retries = 0usize;
        loop {
            let err = match self.inner.fetch(url).await {
                Ok(resp) => return Ok(resp),
                Err(e) => e,
            };
            if !err.is_transient() {
                debug!(error = %err, "Permanent failure; not retrying");
                return Err(err);
            }
            if retries == self.max_retries {
                warn!(
                    retries,
                    elapsed_ms = started.elapsed().as_millis(),
                    error = %err,
                    "Giving up after retries"
                );
                return Err(err);
            }
            retries += 1;
            let delay = self.backoff(retries);
            warn!(retry = retries, ?delay, error = %err, "Transient failure; retrying");
            sleep(delay).await;
        }
    }
}

/// GET over a shared client; non-2xx statuses become [`FetchError::Status`].
#[derive(Debug)]
pub struct HttpFetch<'a> {
    client: &'a Client,
}

impl<'a> HttpFetch<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }
}

impl FetchAsync for HttpFetch<'_> {
    type Response = Fetched;

    async fn fetch(&self, url: &str) -> Result<Fetched, FetchError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.bytes().await?.to_vec();
        Ok(Fetched {
            bytes,
            content_type,
        })
    }
}

/// Download `url`, retrying transient failures up to three times starting
/// at half a second.
#[instrument(level = "info", skip(client))]
pub async fn download_with_backoff(client: &Client, url: &str) -> Result<Fetched, FetchError> {
    let started = Instant::now();
    let fetched = RetryFetch::new(HttpFetch::new(client), MAX_RETRIES, BASE_DELAY)
        .fetch(url)
        .await?;
    info!(
        bytes = fetched.bytes.len(),
        elapsed_ms = started.elapsed().as_millis(),
        "Downloaded"
    );
    Ok(fetched)
}
