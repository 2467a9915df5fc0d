//! HTTP fetcher implementation
//!
//! This module performs the single GET behind every scrape:
//! - One request per attempt with a per-attempt timeout
//! - HTTP status >= 400 counts as a failed attempt
//! - Exponential backoff with random jitter between attempts
//! - Charset-aware decoding and an optional byte cap
//! - Lifecycle notifications to the progress sink

use super::decode::{cap_body, decode_body};
use super::progress::{notify, ProgressEvent, ProgressSink};
use crate::config::Config;
use crate::{FetchCause, FetchError};
use rand::Rng;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Retry and sizing parameters for one fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPolicy {
    /// Total number of attempts (at least 1)
    pub attempts: u32,
    /// Timeout applied to each attempt
    pub timeout: Duration,
    /// Delay before the second attempt; doubles for every later one
    pub backoff_base: Duration,
    /// Upper bound of the uniform jitter added to each delay
    pub max_jitter: Duration,
    /// Maximum decoded body size in bytes (None = uncapped)
    pub max_body_bytes: Option<usize>,
}

impl FetchPolicy {
    /// Derives the policy from a configuration snapshot
    pub fn from_config(config: &Config) -> Self {
        Self {
            attempts: config.fetch.retries.max(1),
            timeout: config.fetch.timeout(),
            backoff_base: Duration::from_millis(500),
            max_jitter: Duration::from_millis(250),
            max_body_bytes: config.fetch.max_body_bytes,
        }
    }

    /// Delay to wait after the given failed attempt (1-based)
    ///
    /// `backoff_base * 2^(attempt-1)` plus a jitter drawn uniformly from
    /// `[0, max_jitter]`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let base = self.backoff_base.saturating_mul(1u32 << exponent);

        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        };

        base + jitter
    }
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// A successfully fetched and decoded response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Decoded (and possibly capped) body text
    pub body: String,
    /// Content-Type header value, empty when absent
    pub content_type: String,
    /// HTTP status code
    pub status: u16,
}

/// Fetches a URL with retry and backoff
///
/// # Request Flow
///
/// 1. Emit `fetch_attempt` and send the GET with the per-attempt timeout
/// 2. Status >= 400 or a transport error fails the attempt
/// 3. On success, decode the body, cap it and emit `fetched`
/// 4. On failure with attempts left, emit `fetch_retry`, sleep, and go to 1
/// 5. On the last failure, emit `fetch_failed` and return the last cause
///
/// # Arguments
///
/// * `client` - The shared HTTP client
/// * `url` - The URL to fetch
/// * `headers` - Extra request headers (e.g. API accept/authorization)
/// * `policy` - Retry, timeout and size parameters
/// * `sink` - Receiver of lifecycle notifications
///
/// # Returns
///
/// * `Ok(FetchedPage)` - The decoded response
/// * `Err(FetchError)` - Every attempt failed
pub async fn fetch(
    client: &Client,
    url: &Url,
    headers: &[(String, String)],
    policy: &FetchPolicy,
    sink: &dyn ProgressSink,
) -> Result<FetchedPage, FetchError> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        notify(
            sink,
            ProgressEvent::FetchAttempt {
                url: url.to_string(),
                attempt,
            },
        );
        tracing::debug!("GET {} (attempt {}/{})", url, attempt, attempts);

        let cause = match send_once(client, url, headers, policy).await {
            Ok(page) => {
                notify(
                    sink,
                    ProgressEvent::Fetched {
                        url: url.to_string(),
                        status: page.status,
                    },
                );
                return Ok(page);
            }
            Err(cause) => cause,
        };

        if attempt >= attempts {
            tracing::warn!("Giving up on {} after {} attempt(s): {}", url, attempt, cause);
            notify(
                sink,
                ProgressEvent::FetchFailed {
                    url: url.to_string(),
                    attempt,
                    error: cause.to_string(),
                },
            );
            return Err(FetchError::Exhausted {
                url: url.to_string(),
                attempts: attempt,
                source: cause,
            });
        }

        let wait = policy.backoff_delay(attempt);
        tracing::warn!(
            "Attempt {} for {} failed ({}), retrying in {:.2}s",
            attempt,
            url,
            cause,
            wait.as_secs_f64()
        );
        notify(
            sink,
            ProgressEvent::FetchRetry {
                url: url.to_string(),
                attempt,
                wait_secs: wait.as_secs_f64(),
                error: cause.to_string(),
            },
        );
        tokio::time::sleep(wait).await;
        attempt += 1;
    }
}

async fn send_once(
    client: &Client,
    url: &Url,
    headers: &[(String, String)],
    policy: &FetchPolicy,
) -> Result<FetchedPage, FetchCause> {
    let mut request = client.get(url.clone()).timeout(policy.timeout);
    for (name, value) in headers {
        request = request.header(name.as_str(), value.as_str());
    }

    let response = request.send().await?;
    let status = response.status().as_u16();
    if status >= 400 {
        return Err(FetchCause::Status(status));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let bytes = response.bytes().await?;
    let body = cap_body(decode_body(&bytes, &content_type), policy.max_body_bytes);

    Ok(FetchedPage {
        body,
        content_type,
        status,
    })
}
