use serde::Deserialize;
use std::time::Duration;

/// Browser-like user agent sent when the configuration does not override it
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Main configuration snapshot for Sumi-Scrape
///
/// A snapshot is an immutable value: callers replace it wholesale rather than
/// mutating fields of a live one. Snapshots compare by value so the shared
/// HTTP session can tell when it must be rebuilt.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub summary: SummaryConfig,
    pub batch: BatchConfig,
    pub access: AccessConfig,
    pub handlers: HandlerConfig,
    pub cache: CacheConfig,
}

/// HTTP retrieval behavior
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Number of attempts per fetch (values below 1 are treated as 1)
    pub retries: u32,

    /// Per-attempt request timeout in seconds
    pub timeout_secs: u64,

    /// Truncate decoded bodies to this many bytes (unset = uncapped)
    pub max_body_bytes: Option<usize>,

    /// User-Agent header value
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            timeout_secs: 10,
            max_body_bytes: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    /// Returns the per-attempt timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Plaintext summary thresholds
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SummaryConfig {
    /// Bodies whose length is at or below this many characters are returned raw
    pub min_size: usize,

    /// Maximum number of characters in an extracted plaintext
    pub max_size: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            min_size: 2048,
            max_size: 16384,
        }
    }
}

/// Largest accepted `batch.concurrency` (the permit pool's upper bound)
pub const MAX_CONCURRENCY: usize = tokio::sync::Semaphore::MAX_PERMITS;

/// Multi-URL fan-out settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BatchConfig {
    /// Maximum number of simultaneously in-flight fetches
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

impl BatchConfig {
    /// Returns the effective permit count, clamped to `1..=MAX_CONCURRENCY`
    pub fn permits(&self) -> usize {
        self.concurrency.clamp(1, MAX_CONCURRENCY)
    }
}

/// Host allow/deny policy
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AccessConfig {
    /// When non-empty, only these exact hosts may be fetched
    pub allow_hosts: Vec<String>,

    /// Exact hosts that may never be fetched (ignored for allowlisted hosts)
    pub deny_hosts: Vec<String>,
}

/// Site handler settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HandlerConfig {
    /// Language subdomain used for bare article titles
    pub api_lang: String,

    /// Optional bearer token for the code-hosting REST API
    pub github_token: Option<String>,

    /// Origin used for bare article titles instead of the `api-lang` edition,
    /// e.g. a mirror such as `https://wiki.internal`
    pub wiki_base_url: Option<String>,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            api_lang: "en".to_string(),
            github_token: None,
            wiki_base_url: None,
        }
    }
}

/// In-memory result cache settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CacheConfig {
    /// Whether the scraper memoizes fetched bodies
    pub enabled: bool,

    /// Time-to-live of an entry in seconds
    pub ttl_secs: u64,

    /// Maximum number of entries before the oldest is evicted
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_secs: 300,
            max_entries: 128,
        }
    }
}
