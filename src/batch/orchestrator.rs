//! Scrape orchestration
//!
//! The [`Scraper`] ties the pipeline together for one or many URLs:
//! access control, handler dispatch, cache, fetch, classification and
//! aggregation. Multi-URL requests fan out under a permit pool and are
//! collected by index, so output order always matches input order.

use super::cache::TtlCache;
use super::output::{concatenate, ScrapeEntry, ScrapeResponse};
use crate::config::{validate, Config};
use crate::content::{classify, render, ContentKind, ScrapeOutput};
use crate::fetch::{fetch, notify, FetchPolicy, NoProgress, ProgressEvent, ProgressSink, Session};
use crate::handlers::{
    article_target, site_base, ArticleMode, DispatchContext, HandlerRegistry, RequestPlan,
    Reshape, SiteHandler,
};
use crate::url::validate_target;
use crate::{Result, ScrapeError, ValidationError};
use futures::future::join_all;
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

/// One or many URLs plus the flags that shape their output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    /// Caller URLs, in the order results should appear
    pub urls: Vec<String>,
    /// Return bodies untransformed instead of plaintext
    pub want_raw: bool,
    /// Let site handlers re-target URLs they own
    pub redirect: bool,
    /// Return `{url, content}` records instead of one string
    pub structured: bool,
}

impl ScrapeRequest {
    /// A request for a single URL with default flags
    pub fn single(url: impl Into<String>) -> Self {
        Self::many([url])
    }

    /// A request for several URLs with default flags
    ///
    /// Defaults: plaintext output, handler redirect enabled, concatenated result.
    pub fn many<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            want_raw: false,
            redirect: true,
            structured: false,
        }
    }

    pub fn raw(mut self, want_raw: bool) -> Self {
        self.want_raw = want_raw;
        self
    }

    pub fn redirect(mut self, redirect: bool) -> Self {
        self.redirect = redirect;
        self
    }

    pub fn structured(mut self, structured: bool) -> Self {
        self.structured = structured;
        self
    }
}

/// Runs `f` over `items` with at most `limit` futures in flight
///
/// Results are returned in input order regardless of completion order. A
/// single item runs inline without touching the permit pool. Waiting futures
/// acquire permits in FIFO order. `limit` is clamped to
/// `1..=Semaphore::MAX_PERMITS`.
pub async fn run_bounded<T, R, F, Fut>(items: Vec<T>, limit: usize, f: F) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    if items.len() <= 1 {
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            results.push(f(item).await);
        }
        return results;
    }

    let semaphore = Semaphore::new(limit.clamp(1, Semaphore::MAX_PERMITS));
    let semaphore = &semaphore;
    let f = &f;

    join_all(items.into_iter().map(|item| async move {
        let _permit = semaphore.acquire().await.ok();
        f(item).await
    }))
    .await
}

/// The scraping engine
///
/// # Example
///
/// ```no_run
/// use sumi_scrape::{Config, ScrapeRequest, Scraper};
///
/// # async fn run() -> sumi_scrape::Result<()> {
/// let scraper = Scraper::new(Config::default())?;
/// let response = scraper
///     .scrape(&ScrapeRequest::many(["https://example.com", "https://example.org"]))
///     .await?;
/// println!("{}", response);
/// scraper.close();
/// # Ok(())
/// # }
/// ```
pub struct Scraper {
    config: RwLock<Arc<Config>>,
    session: Session,
    registry: HandlerRegistry,
    cache: Option<TtlCache>,
    progress: Arc<dyn ProgressSink>,
}

impl Scraper {
    /// Creates a scraper with the built-in site handlers
    ///
    /// The cache is created when `config.cache.enabled` is set.
    ///
    /// # Returns
    ///
    /// * `Ok(Scraper)` - Ready to scrape; no connection is opened yet
    /// * `Err(ScrapeError::Config)` - The configuration is invalid
    pub fn new(config: Config) -> Result<Self> {
        validate(&config)?;

        let cache = config.cache.enabled.then(|| {
            TtlCache::new(
                Duration::from_secs(config.cache.ttl_secs),
                config.cache.max_entries,
            )
        });

        Ok(Self {
            config: RwLock::new(Arc::new(config)),
            session: Session::new(),
            registry: HandlerRegistry::with_defaults(),
            cache,
            progress: Arc::new(NoProgress),
        })
    }

    /// Replaces the handler registry
    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the progress sink
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Installs a cache, replacing any configured one
    pub fn with_cache(mut self, cache: TtlCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Removes the cache layer
    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    /// Appends a site handler at the lowest priority
    pub fn register_handler(&mut self, handler: Box<dyn SiteHandler>) -> Result<()> {
        self.registry.register(handler)?;
        Ok(())
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Returns the cache, if one is installed
    pub fn cache(&self) -> Option<&TtlCache> {
        self.cache.as_ref()
    }

    /// Returns the current configuration snapshot
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(
            &self
                .config
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }

    /// Validates and installs a new configuration snapshot
    ///
    /// The HTTP session is rebuilt on the next fetch if the snapshot differs
    /// from the one it was built with. Requests already running keep the
    /// snapshot they started with.
    ///
    /// The `[cache]` section is read only by [`Scraper::new`]; a changed cache
    /// section is logged and otherwise ignored. Use [`Scraper::with_cache`] or
    /// [`Scraper::without_cache`] to change the cache layer.
    pub fn set_config(&self, config: Config) -> Result<()> {
        validate(&config)?;
        let mut current = self
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if current.cache != config.cache {
            tracing::warn!(
                "Cache settings changed; they apply only to newly built scrapers"
            );
        }
        *current = Arc::new(config);
        Ok(())
    }

    /// Drops the shared HTTP session; safe to call repeatedly
    pub fn close(&self) {
        self.session.close();
    }

    /// Scrapes a single URL
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute http(s) URL
    /// * `want_raw` - Return the body untransformed
    /// * `redirect` - Let a site handler re-target the URL
    ///
    /// # Returns
    ///
    /// * `Ok(ScrapeOutput)` - Non-empty content for the URL
    /// * `Err(ScrapeError)` - Validation, handler or fetch failure
    pub async fn scrape_url(&self, url: &str, want_raw: bool, redirect: bool) -> Result<ScrapeOutput> {
        let config = self.config();
        let target = validate_target(url, &config.access)?;
        self.process(url.trim(), target, want_raw, redirect, &config)
            .await
    }

    /// Scrapes every URL of a request, returning one result per URL
    ///
    /// All URLs are validated before the first fetch starts. A URL that fails
    /// validation is never fetched; the others still are.
    ///
    /// # Returns
    ///
    /// * `Ok(results)` - One result per input URL, in input order
    /// * `Err(ValidationError::NoUrls)` - The request holds no URLs
    pub async fn scrape_each(&self, request: &ScrapeRequest) -> Result<Vec<Result<ScrapeEntry>>> {
        if request.urls.is_empty() {
            return Err(ValidationError::NoUrls.into());
        }

        let config = self.config();
        let validated: Vec<(String, Result<Url>)> = request
            .urls
            .iter()
            .map(|raw| {
                let checked = validate_target(raw, &config.access).map_err(Into::into);
                if let Err(e) = &checked {
                    tracing::warn!("Rejected {}: {}", raw, e);
                }
                (raw.trim().to_string(), checked)
            })
            .collect();

        let config = &config;
        let results = run_bounded(validated, config.batch.permits(), |(source, checked)| async move {
            let target = checked?;
            let content = self
                .process(&source, target, request.want_raw, request.redirect, config)
                .await?;
            Ok::<_, ScrapeError>(ScrapeEntry {
                url: source,
                content,
            })
        })
        .await;

        Ok(results)
    }

    /// Scrapes every URL of a request and aggregates the results
    ///
    /// Fails with the first per-URL error in input order; a failed URL never
    /// turns into empty or placeholder content.
    pub async fn scrape(&self, request: &ScrapeRequest) -> Result<ScrapeResponse> {
        let entries = self
            .scrape_each(request)
            .await?
            .into_iter()
            .collect::<Result<Vec<_>>>()?;

        if request.structured {
            Ok(ScrapeResponse::Structured(entries))
        } else {
            Ok(ScrapeResponse::Concatenated(concatenate(&entries)))
        }
    }

    /// Fetches several Wikipedia articles and concatenates them in input order
    ///
    /// Inputs may be bare titles or article URLs. Bare titles resolve under
    /// `handlers.wiki-base-url` when set, otherwise under the `api-lang`
    /// edition. [`ArticleMode::Api`] returns the raw extracts JSON of
    /// each article, [`ArticleMode::Page`] its HTML page.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Non-empty concatenation with provenance lines
    /// * `Err(ScrapeError)` - An input could not be resolved or fetched, or the
    ///   aggregate came out empty
    pub async fn fetch_articles<S: AsRef<str>>(&self, inputs: &[S], mode: ArticleMode) -> Result<String> {
        let config = self.config();
        let base = config
            .handlers
            .wiki_base_url
            .clone()
            .unwrap_or_else(|| site_base(&config.handlers.api_lang));
        let urls = inputs
            .iter()
            .map(|input| {
                article_target(input.as_ref(), &base, mode)
                    .map(|url| url.to_string())
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let request = ScrapeRequest::many(urls).raw(true).redirect(false);
        let combined = self.scrape(&request).await?.to_string();

        if combined.trim().is_empty() {
            let names: Vec<&str> = inputs.iter().map(AsRef::as_ref).collect();
            return Err(ValidationError::EmptyResult(names.join(", ")).into());
        }
        Ok(combined)
    }

    /// Runs the per-URL pipeline for a validated URL
    async fn process(
        &self,
        source: &str,
        url: Url,
        want_raw: bool,
        redirect: bool,
        config: &Arc<Config>,
    ) -> Result<ScrapeOutput> {
        let sink = self.progress.as_ref();
        notify(
            sink,
            ProgressEvent::Start {
                url: source.to_string(),
            },
        );

        let plan = self.plan(&url, want_raw, redirect, config)?;
        let (target, headers, reshape) = match &plan {
            RequestPlan::PassThrough => (&url, &[][..], Reshape::Verbatim),
            RequestPlan::Alternate {
                url: alternate,
                headers,
                reshape,
            } => (alternate, headers.as_slice(), *reshape),
        };

        let cached = self.cache.as_ref().and_then(|cache| cache.get(target.as_str()));
        let from_cache = cached.is_some();
        let body = match cached {
            Some(body) => {
                tracing::debug!("Cache hit for {}", target);
                body
            }
            None => {
                let client = self.session.client(config)?;
                let policy = FetchPolicy::from_config(config);
                match fetch(&client, target, headers, &policy, sink).await {
                    Ok(page) => reshape.apply(page.body),
                    Err(e) => {
                        notify(
                            sink,
                            ProgressEvent::FetchFailedFinal {
                                url: source.to_string(),
                                error: e.to_string(),
                            },
                        );
                        return Err(e.into());
                    }
                }
            }
        };

        let classification = classify(&body, &config.summary);
        if classification.kind() == ContentKind::Json {
            notify(
                sink,
                ProgressEvent::FoundJson {
                    url: source.to_string(),
                },
            );
        }

        let output = render(source, &body, classification, want_raw, &config.summary);
        if output.is_empty() {
            return Err(ValidationError::EmptyResult(source.to_string()).into());
        }

        notify(
            sink,
            ProgressEvent::Done {
                url: source.to_string(),
            },
        );

        if let Some(cache) = self.cache.as_ref().filter(|_| !from_cache) {
            cache.set(target.as_str(), body);
        }

        Ok(output)
    }

    fn plan(&self, url: &Url, want_raw: bool, redirect: bool, config: &Config) -> Result<RequestPlan> {
        if !redirect {
            return Ok(RequestPlan::PassThrough);
        }

        let Some(handler) = self.registry.resolve(url) else {
            return Ok(RequestPlan::PassThrough);
        };

        let ctx = DispatchContext {
            want_raw,
            api_lang: &config.handlers.api_lang,
            token: config.handlers.github_token.as_deref(),
        };
        let plan = handler.translate(url, &ctx)?;
        tracing::debug!("Handler '{}' planned {:?} for {}", handler.name(), plan, url);
        Ok(plan)
    }
}

impl Drop for Scraper {
    fn drop(&mut self) {
        self.session.close();
    }
}
