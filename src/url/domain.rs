use crate::ValidationError;
use url::Url;

/// Parses a caller-supplied URL and checks that it is fetchable
///
/// A target must be an absolute `http` or `https` URL with a host. Leading
/// and trailing whitespace is ignored.
///
/// # Arguments
///
/// * `raw` - The URL text as supplied by the caller
///
/// # Returns
///
/// * `Ok(Url)` - The parsed URL
/// * `Err(ValidationError)` - The URL is empty, malformed, hostless or uses another scheme
///
/// # Examples
///
/// ```
/// use sumi_scrape::url::parse_target;
///
/// assert!(parse_target("https://example.com/page").is_ok());
/// assert!(parse_target("not-a-url").is_err());
/// assert!(parse_target("mailto:someone@example.com").is_err());
/// ```
pub fn parse_target(raw: &str) -> Result<Url, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }

    let url = Url::parse(trimmed).map_err(|e| ValidationError::Malformed {
        url: trimmed.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ValidationError::UnsupportedScheme {
            url: trimmed.to_string(),
            scheme: url.scheme().to_string(),
        });
    }

    if extract_host(&url).is_none() {
        return Err(ValidationError::MissingHost(trimmed.to_string()));
    }

    Ok(url)
}

/// Extracts the host from a URL in the form used for policy comparisons
///
/// The host is lowercased and a trailing root dot (`example.com.`) is dropped.
/// Returns None when the URL has no host or the host is empty.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_scrape::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.com./path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.trim_end_matches('.').to_lowercase();
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}
