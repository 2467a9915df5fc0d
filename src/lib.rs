//! Sumi-Scrape: resilient single-shot web retrieval
//!
//! This crate fetches arbitrary web resources on demand, classifies their
//! representation (JSON, XML, HTML or plain text) and optionally reduces them
//! to readable plaintext. Site handlers re-target known URLs to richer APIs,
//! host policy is enforced before any network call, and multi-URL requests fan
//! out under a concurrency bound while preserving input order.

pub mod batch;
pub mod config;
pub mod content;
pub mod fetch;
pub mod handlers;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Scrape operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Input and result validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("URL must not be empty")]
    EmptyUrl,

    #[error("Failed to parse URL '{url}': {reason}")]
    Malformed { url: String, reason: String },

    #[error("Unsupported URL scheme '{scheme}' in {url}")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("Missing host in URL: {0}")]
    MissingHost(String),

    #[error("Host '{host}' is not on the allowlist")]
    HostNotAllowed { host: String },

    #[error("Host '{host}' is on the denylist")]
    HostDenied { host: String },

    #[error("No URLs were supplied")]
    NoUrls,

    #[error("Empty result for {0}")]
    EmptyResult(String),
}

/// Underlying cause of a failed fetch attempt
#[derive(Debug, Error)]
pub enum FetchCause {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Network errors that survived every retry
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to fetch {url} after {attempts} attempt(s): {source}")]
    Exhausted {
        url: String,
        attempts: u32,
        source: FetchCause,
    },
}

impl FetchError {
    /// Returns the URL whose fetch failed
    pub fn url(&self) -> &str {
        match self {
            Self::Exhausted { url, .. } => url,
        }
    }
}

/// Errors raised by site handlers and the handler registry
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{handler} handler cannot plan {url}: {reason}")]
    Unplannable {
        handler: &'static str,
        url: String,
        reason: String,
    },

    #[error("A handler named '{0}' is already registered")]
    Duplicate(&'static str),
}

/// Result type alias for Sumi-Scrape operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use batch::{ScrapeEntry, ScrapeRequest, ScrapeResponse, Scraper, TtlCache};
pub use config::Config;
pub use content::{ScrapeOutput, XmlElement};
pub use fetch::{NoProgress, ProgressEvent, ProgressRecorder, ProgressSink, TracingProgress};
pub use handlers::{ArticleMode, HandlerRegistry, RequestPlan, SiteHandler};
