//! Site handlers for Sumi-Scrape
//!
//! A handler claims URLs of one site and re-targets them to a richer
//! endpoint, usually a structured API. Handlers are plain capability objects
//! held in a priority-ordered [`HandlerRegistry`]; the first handler whose
//! [`SiteHandler::can_handle`] accepts a URL decides its [`RequestPlan`].

mod github;
mod registry;
mod wikipedia;

use crate::HandlerError;
use url::Url;

// Re-export main types
pub use github::{build_api_url, GithubHandler, GITHUB_API_HOST};
pub use registry::HandlerRegistry;
pub use wikipedia::{
    api_url, article_target, collapse_pages, normalize_title, site_base, ArticleMode,
    WikipediaHandler,
};

/// Per-dispatch inputs a handler may consult
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchContext<'a> {
    /// The caller asked for the raw resource rather than plaintext
    pub want_raw: bool,
    /// Language used for bare article titles
    pub api_lang: &'a str,
    /// Optional API token for handlers that support authentication
    pub token: Option<&'a str>,
}

/// Post-processing applied to an alternate response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reshape {
    /// Use the body as received
    Verbatim,
    /// Collapse an article-extract response to its page object(s)
    ArticleExtract,
}

impl Reshape {
    /// Applies the reshape to a response body
    pub fn apply(&self, body: String) -> String {
        match self {
            Self::Verbatim => body,
            Self::ArticleExtract => collapse_pages(&body).unwrap_or(body),
        }
    }
}

/// What to fetch for a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPlan {
    /// Fetch the caller's URL as-is
    PassThrough,
    /// Fetch another URL and reshape its response
    Alternate {
        url: Url,
        headers: Vec<(String, String)>,
        reshape: Reshape,
    },
}

impl RequestPlan {
    /// Builds an alternate plan without extra headers
    pub fn alternate(url: Url, reshape: Reshape) -> Self {
        Self::Alternate {
            url,
            headers: Vec::new(),
            reshape,
        }
    }

    /// Returns the URL to fetch for `original`
    pub fn target<'a>(&'a self, original: &'a Url) -> &'a Url {
        match self {
            Self::PassThrough => original,
            Self::Alternate { url, .. } => url,
        }
    }
}

/// A site-specific URL translator
///
/// Implementations must be deterministic and free of side effects: the plan
/// depends only on the URL and the dispatch context.
pub trait SiteHandler: Send + Sync {
    /// Unique handler name, used for registration and logging
    fn name(&self) -> &'static str;

    /// Returns true if this handler owns the URL
    fn can_handle(&self, url: &Url) -> bool;

    /// Plans the fetch for a URL this handler owns
    ///
    /// An error means the handler claims the URL but cannot plan it; it is
    /// reported to the caller and never retried.
    fn translate(&self, url: &Url, ctx: &DispatchContext<'_>) -> Result<RequestPlan, HandlerError>;
}
