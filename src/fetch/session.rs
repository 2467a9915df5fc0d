//! Shared HTTP session
//!
//! A single `reqwest::Client` is shared by every fetch. It is built lazily
//! from a configuration snapshot and rebuilt whenever a different snapshot is
//! presented; the previous client is dropped, which closes its connection pool.

use crate::config::Config;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL};
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Builds an HTTP client with browser-like defaults
///
/// # Arguments
///
/// * `config` - The configuration snapshot providing the user agent and timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use sumi_scrape::config::Config;
/// use sumi_scrape::fetch::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,application/json;q=0.9,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));

    Client::builder()
        .user_agent(config.fetch.user_agent.clone())
        .default_headers(headers)
        .timeout(config.fetch.timeout())
        .connect_timeout(Duration::from_secs(10).min(config.fetch.timeout()))
        .gzip(true)
        .brotli(true)
        .build()
}

struct SessionState {
    snapshot: Arc<Config>,
    client: Client,
}

/// Lazily constructed client bound to the snapshot it was built from
#[derive(Default)]
pub struct Session {
    state: Mutex<Option<SessionState>>,
    builds: AtomicU64,
}

impl Session {
    /// Creates an empty session; no client is built until first use
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a client matching the given snapshot
    ///
    /// If the stored client was built from an equal snapshot it is reused;
    /// otherwise it is replaced by a fresh one.
    pub fn client(&self, config: &Arc<Config>) -> Result<Client, reqwest::Error> {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(current) = state.as_ref() {
            if Arc::ptr_eq(&current.snapshot, config) || *current.snapshot == **config {
                return Ok(current.client.clone());
            }
        }

        if state.take().is_some() {
            tracing::info!("Configuration changed, rebuilding HTTP session");
        }

        let client = build_http_client(config)?;
        *state = Some(SessionState {
            snapshot: Arc::clone(config),
            client: client.clone(),
        });
        let builds = self.builds.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!("HTTP session ready (client build #{})", builds);

        Ok(client)
    }

    /// Drops the current client, if any
    ///
    /// Calling this more than once is harmless.
    pub fn close(&self) {
        let previous = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if previous.is_some() {
            tracing::debug!("HTTP session closed");
        }
    }

    /// Returns true if a client is currently held
    pub fn is_open(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    /// Number of clients built over the session's lifetime
    pub fn build_count(&self) -> u64 {
        self.builds.load(Ordering::Relaxed)
    }
}
