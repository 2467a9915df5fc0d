//! URL handling module for Sumi-Scrape
//!
//! This module provides target URL parsing, host extraction, and the host
//! access policy that runs before any network call.

mod domain;

use crate::config::AccessConfig;
use crate::ValidationError;

// Re-export main functions
pub use domain::{extract_host, parse_target};

/// Outcome of checking a host against the access policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostVerdict {
    /// Host may be fetched
    Allowed,
    /// An allowlist is configured and the host is not on it
    NotAllowlisted,
    /// Host is on the denylist (and not on the allowlist)
    Denied,
}

impl HostVerdict {
    /// Returns true if the host may be fetched
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Classifies a host according to the access policy
///
/// Hosts are compared exactly (case-insensitively). The lists are checked in
/// the following priority order:
/// 1. Allowlist (an entry here always wins, even over the denylist)
/// 2. Allowlist present but not matched → rejected
/// 3. Denylist
/// 4. Allowed (default)
///
/// # Arguments
///
/// * `host` - The host to classify (as returned by `extract_host`)
/// * `access` - The allow/deny configuration
///
/// # Examples
///
/// ```
/// use sumi_scrape::config::AccessConfig;
/// use sumi_scrape::url::{classify_host, HostVerdict};
///
/// let access = AccessConfig {
///     allow_hosts: vec!["x.com".to_string()],
///     deny_hosts: vec!["x.com".to_string()],
/// };
/// assert_eq!(classify_host("x.com", &access), HostVerdict::Allowed);
/// assert_eq!(classify_host("y.com", &access), HostVerdict::NotAllowlisted);
/// ```
pub fn classify_host(host: &str, access: &AccessConfig) -> HostVerdict {
    let listed = |entries: &[String]| entries.iter().any(|entry| entry.eq_ignore_ascii_case(host));

    if !access.allow_hosts.is_empty() {
        if listed(&access.allow_hosts) {
            return HostVerdict::Allowed;
        }
        return HostVerdict::NotAllowlisted;
    }

    if listed(&access.deny_hosts) {
        return HostVerdict::Denied;
    }

    HostVerdict::Allowed
}

/// Parses a target URL and enforces the access policy on its host
///
/// # Returns
///
/// * `Ok(Url)` - The URL is well-formed and its host may be fetched
/// * `Err(ValidationError)` - The URL is invalid or its host is rejected
pub fn validate_target(raw: &str, access: &AccessConfig) -> Result<::url::Url, ValidationError> {
    let url = parse_target(raw)?;
    let host = extract_host(&url).ok_or_else(|| ValidationError::MissingHost(raw.to_string()))?;

    match classify_host(&host, access) {
        HostVerdict::Allowed => Ok(url),
        HostVerdict::NotAllowlisted => Err(ValidationError::HostNotAllowed { host }),
        HostVerdict::Denied => Err(ValidationError::HostDenied { host }),
    }
}
