//! Wikipedia handler
//!
//! Article pages are re-targeted to the MediaWiki extracts API, which
//! returns the article as plaintext inside a JSON envelope.

use super::{DispatchContext, RequestPlan, Reshape, SiteHandler};
use crate::url::{extract_host, parse_target};
use crate::HandlerError;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::Value;
use url::Url;

const HOST_SUFFIX: &str = ".wikipedia.org";
const ARTICLE_PREFIX: &str = "/wiki/";
const API_PATH: &str = "/w/api.php";

/// Characters escaped in a title placed in the API query string
const TITLE_QUERY: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'>')
    .add(b'=')
    .add(b'%');

/// Characters escaped in a title placed in an article path
const TITLE_PATH: &AsciiSet = &TITLE_QUERY.add(b'?').add(b'/');

/// What [`article_target`] should point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArticleMode {
    /// The extracts API (JSON)
    #[default]
    Api,
    /// The article's HTML page
    Page,
}

/// Re-targets Wikipedia article pages to the extracts API
#[derive(Debug, Clone, Copy, Default)]
pub struct WikipediaHandler;

impl SiteHandler for WikipediaHandler {
    fn name(&self) -> &'static str {
        "wikipedia"
    }

    fn can_handle(&self, url: &Url) -> bool {
        extract_host(url).is_some_and(|host| host.ends_with(HOST_SUFFIX))
    }

    fn translate(&self, url: &Url, ctx: &DispatchContext<'_>) -> Result<RequestPlan, HandlerError> {
        if ctx.want_raw || url.path() == API_PATH {
            return Ok(RequestPlan::PassThrough);
        }

        let title = page_title(url)?;
        let lang = host_language(url).unwrap_or(ctx.api_lang);
        let target = api_url(lang, &title).map_err(|e| unplannable(url, e.to_string()))?;

        tracing::debug!("Re-targeting {} to {}", url, target);
        Ok(RequestPlan::alternate(target, Reshape::ArticleExtract))
    }
}

fn unplannable(url: &Url, reason: impl Into<String>) -> HandlerError {
    HandlerError::Unplannable {
        handler: "wikipedia",
        url: url.to_string(),
        reason: reason.into(),
    }
}

/// Language subdomain of a Wikipedia host (`de` for `de.wikipedia.org`)
fn host_language(url: &Url) -> Option<&str> {
    let host = url.host_str()?;
    let prefix = host
        .strip_suffix(HOST_SUFFIX)
        .or_else(|| host.strip_suffix(".wikipedia.org."))?;
    prefix.split('.').next().filter(|lang| !lang.is_empty())
}

/// Normalized title of an article page URL
fn page_title(url: &Url) -> Result<String, HandlerError> {
    let raw = url
        .path()
        .strip_prefix(ARTICLE_PREFIX)
        .ok_or_else(|| unplannable(url, "not an article path"))?;

    let title = normalize_title(raw);
    if title.is_empty() {
        return Err(unplannable(url, "article title is empty"));
    }
    Ok(title)
}

/// Normalizes an article title
///
/// Percent-escapes are decoded, underscores become spaces, and every word is
/// capitalized with the rest of it lowercased. The casing rule is naive:
/// titles such as "McDonald's" or "iPhone" come out as "Mcdonald's" and "Iphone".
///
/// # Examples
///
/// ```
/// use sumi_scrape::handlers::normalize_title;
///
/// assert_eq!(normalize_title("python_programming"), "Python Programming");
/// assert_eq!(normalize_title("Caf%C3%A9"), "Café");
/// ```
pub fn normalize_title(raw: &str) -> String {
    let decoded = percent_decode_str(raw).decode_utf8_lossy().replace('_', " ");

    decoded
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Origin of a Wikipedia language edition
///
/// # Examples
///
/// ```
/// use sumi_scrape::handlers::site_base;
///
/// assert_eq!(site_base("de"), "https://de.wikipedia.org");
/// ```
pub fn site_base(lang: &str) -> String {
    format!("https://{}{}", lang, HOST_SUFFIX)
}

/// Builds the extracts API URL for a title
///
/// # Examples
///
/// ```
/// use sumi_scrape::handlers::api_url;
///
/// let url = api_url("en", "Alan Turing").unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://en.wikipedia.org/w/api.php?action=query&prop=extracts&explaintext&format=json&titles=Alan%20Turing"
/// );
/// ```
pub fn api_url(lang: &str, title: &str) -> Result<Url, url::ParseError> {
    article_url(&site_base(lang), title, ArticleMode::Api)
}

/// Builds the API or page URL for a title under a site origin
fn article_url(base: &str, title: &str, mode: ArticleMode) -> Result<Url, url::ParseError> {
    let base = base.trim_end_matches('/');
    match mode {
        ArticleMode::Api => Url::parse(&format!(
            "{}{}?action=query&prop=extracts&explaintext&format=json&titles={}",
            base,
            API_PATH,
            utf8_percent_encode(title, TITLE_QUERY)
        )),
        ArticleMode::Page => Url::parse(&format!(
            "{}{}{}",
            base,
            ARTICLE_PREFIX,
            utf8_percent_encode(&title.replace(' ', "_"), TITLE_PATH)
        )),
    }
}

/// Resolves an article title or Wikipedia URL to the URL to fetch
///
/// Bare titles are normalized and resolved under `base`, normally
/// [`site_base`] of the configured language. Article URLs keep their own
/// language edition. In [`ArticleMode::Api`] the result is the extracts API
/// URL, in [`ArticleMode::Page`] the HTML page.
///
/// # Arguments
///
/// * `input` - A title such as `"Alan Turing"` or a URL such as
///   `"https://de.wikipedia.org/wiki/Berlin"`
/// * `base` - Site origin for bare titles, e.g. `"https://en.wikipedia.org"`
/// * `mode` - Which representation to fetch
pub fn article_target(input: &str, base: &str, mode: ArticleMode) -> Result<Url, HandlerError> {
    let input = input.trim();
    let invalid = |reason: &str| HandlerError::Unplannable {
        handler: "wikipedia",
        url: input.to_string(),
        reason: reason.to_string(),
    };

    if input.contains("://") {
        let url = parse_target(input).map_err(|e| invalid(&e.to_string()))?;
        if !WikipediaHandler.can_handle(&url) {
            return Err(invalid("not a Wikipedia URL"));
        }
        if url.path() == API_PATH {
            return Ok(url);
        }
        let title = page_title(&url)?;
        let site = match host_language(&url) {
            Some(lang) => site_base(lang),
            None => url.origin().ascii_serialization(),
        };
        return article_url(&site, &title, mode).map_err(|e| invalid(&e.to_string()));
    }

    let title = normalize_title(input);
    if title.is_empty() {
        return Err(invalid("article title is empty"));
    }
    article_url(base, &title, mode).map_err(|e| invalid(&e.to_string()))
}

/// Collapses an extracts API response to its page object(s)
///
/// `{"query": {"pages": {"123": {...}}}}` becomes the single page object, or
/// an array of page objects when several titles were requested. Returns None
/// if the body is not such a response.
pub fn collapse_pages(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let pages = value.get("query")?.get("pages")?.as_object()?;

    let mut collapsed: Vec<Value> = pages.values().cloned().collect();
    let result = match collapsed.len() {
        0 => return None,
        1 => collapsed.remove(0),
        _ => Value::Array(collapsed),
    };
    serde_json::to_string(&result).ok()
}
