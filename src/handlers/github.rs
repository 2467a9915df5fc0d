//! GitHub handler
//!
//! Repository browsing URLs are mapped to their REST API equivalents. The
//! mapping is a table keyed on the path segments after `owner/repo`; any
//! path the table does not recognize falls back to the repository itself.

use super::{DispatchContext, RequestPlan, Reshape, SiteHandler};
use crate::url::extract_host;
use crate::HandlerError;
use url::Url;

/// Host of the REST API
pub const GITHUB_API_HOST: &str = "api.github.com";

const WEB_HOSTS: &[&str] = &["github.com", "www.github.com"];

/// Subresources that map to themselves, with any trailing segments kept
const DIRECT_KEYWORDS: &[&str] = &[
    "branches",
    "tags",
    "issues",
    "pulls",
    "commits",
    "releases",
    "contents",
    "milestones",
    "compare",
    "labels",
    "forks",
    "deployments",
    "actions",
];

/// Subresources that map to themselves only when nothing follows them
const LEAF_KEYWORDS: &[&str] = &[
    "contributors",
    "languages",
    "topics",
    "license",
    "readme",
    "subscribers",
    "stargazers",
    "collaborators",
    "events",
];

/// Re-targets github.com pages to the REST API
#[derive(Debug, Clone, Copy, Default)]
pub struct GithubHandler;

impl SiteHandler for GithubHandler {
    fn name(&self) -> &'static str {
        "github"
    }

    fn can_handle(&self, url: &Url) -> bool {
        extract_host(url)
            .is_some_and(|host| host == GITHUB_API_HOST || WEB_HOSTS.contains(&host.as_str()))
    }

    fn translate(&self, url: &Url, ctx: &DispatchContext<'_>) -> Result<RequestPlan, HandlerError> {
        let target = build_api_url(url)?;
        tracing::debug!("Re-targeting {} to {}", url, target);

        let mut headers = vec![(
            "Accept".to_string(),
            "application/vnd.github+json".to_string(),
        )];
        if let Some(token) = ctx.token {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        Ok(RequestPlan::Alternate {
            url: target,
            headers,
            reshape: Reshape::Verbatim,
        })
    }
}

/// Maps a GitHub URL to its REST API URL
///
/// # Mapping
///
/// | Web path | API path |
/// |----------|----------|
/// | `owner` | `users/owner` |
/// | `owner/repo` | `repos/owner/repo` |
/// | `owner/repo/tree/{branch}` | `repos/owner/repo/branches/{branch}` |
/// | `owner/repo/blob/{branch}/{path}` | `repos/owner/repo/contents/{path}?ref={branch}` |
/// | `owner/repo/pull/{n}` | `repos/owner/repo/pulls/{n}` |
/// | `owner/repo/commit/{sha}` | `repos/owner/repo/commits/{sha}` |
/// | `owner/repo/releases/tag/{tag}` | `repos/owner/repo/releases/tags/{tag}` |
/// | `owner/repo/archive/{ref}[.zip\|.tar.gz]` | `repos/owner/repo/{zipball\|tarball}/{ref}` |
/// | `owner/repo/actions` | `repos/owner/repo/actions/runs` |
/// | anything unrecognized | `repos/owner/repo` |
///
/// URLs already on `api.github.com` are returned unchanged. Case is preserved.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_scrape::handlers::build_api_url;
///
/// let url = Url::parse("https://github.com/owner/repo/tree/main").unwrap();
/// assert_eq!(
///     build_api_url(&url).unwrap().as_str(),
///     "https://api.github.com/repos/owner/repo/branches/main"
/// );
/// ```
pub fn build_api_url(url: &Url) -> Result<Url, HandlerError> {
    let unplannable = |reason: &str| HandlerError::Unplannable {
        handler: "github",
        url: url.to_string(),
        reason: reason.to_string(),
    };

    if extract_host(url).as_deref() == Some(GITHUB_API_HOST) {
        return Ok(url.clone());
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|parts| parts.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    let api_path = match segments.as_slice() {
        [] => return Err(unplannable("no owner in path")),
        [owner] => format!("users/{}", owner),
        [owner, repo, rest @ ..] => {
            let repo = repo.strip_suffix(".git").unwrap_or(repo);
            match subresource(rest) {
                Some(tail) => format!("repos/{}/{}/{}", owner, repo, tail),
                None => format!("repos/{}/{}", owner, repo),
            }
        }
    };

    Url::parse(&format!("https://{}/{}", GITHUB_API_HOST, api_path))
        .map_err(|e| unplannable(&e.to_string()))
}

/// Maps the segments after `owner/repo` to an API suffix
fn subresource(rest: &[&str]) -> Option<String> {
    let suffix = match rest {
        [] => return None,
        ["tree", branch @ ..] if !branch.is_empty() => format!("branches/{}", branch.join("/")),
        ["blob", branch, path @ ..] if !path.is_empty() => {
            format!("contents/{}?ref={}", path.join("/"), branch)
        }
        ["pull", number, ..] => format!("pulls/{}", number),
        ["commit", sha, ..] => format!("commits/{}", sha),
        ["releases", "tag", tag, ..] => format!("releases/tags/{}", tag),
        ["archive", reference, ..] => archive(reference),
        ["actions"] => "actions/runs".to_string(),
        [keyword, ..] if DIRECT_KEYWORDS.contains(keyword) => rest.join("/"),
        [keyword] if LEAF_KEYWORDS.contains(keyword) => keyword.to_string(),
        _ => return None,
    };
    Some(suffix)
}

fn archive(reference: &str) -> String {
    if let Some(stem) = reference.strip_suffix(".zip") {
        format!("zipball/{}", stem)
    } else if let Some(stem) = reference.strip_suffix(".tar.gz") {
        format!("tarball/{}", stem)
    } else {
        format!("tarball/{}", reference)
    }
}
