//! Site handler dispatch tests

use crate::{recording_scraper, test_config, url_for};
use std::time::Duration;
use sumi_scrape::handlers::{build_api_url, DispatchContext, Reshape};
use sumi_scrape::{
    ArticleMode, HandlerError, HandlerRegistry, RequestPlan, ScrapeError, ScrapeOutput, Scraper,
    SiteHandler, ValidationError,
};
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Re-targets `/wiki/<title>` on the local mock server to its extracts API
struct LocalWikiHandler {
    headers: Vec<(String, String)>,
    broken: bool,
}

impl LocalWikiHandler {
    fn new() -> Self {
        Self {
            headers: Vec::new(),
            broken: false,
        }
    }
}

impl SiteHandler for LocalWikiHandler {
    fn name(&self) -> &'static str {
        "local-wiki"
    }

    fn can_handle(&self, url: &Url) -> bool {
        url.host_str() == Some("127.0.0.1") && url.path().starts_with("/wiki/")
    }

    fn translate(&self, url: &Url, ctx: &DispatchContext<'_>) -> Result<RequestPlan, HandlerError> {
        if self.broken {
            return Err(HandlerError::Unplannable {
                handler: self.name(),
                url: url.to_string(),
                reason: "refusing on purpose".to_string(),
            });
        }
        if ctx.want_raw {
            return Ok(RequestPlan::PassThrough);
        }

        let title = url.path().trim_start_matches("/wiki/");
        let mut target = url.join("/w/api.php").map_err(|e| HandlerError::Unplannable {
            handler: self.name(),
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        target
            .query_pairs_mut()
            .append_pair("action", "query")
            .append_pair("prop", "extracts")
            .append_pair("titles", title)
            .append_pair("format", "json");

        Ok(RequestPlan::Alternate {
            url: target,
            headers: self.headers.clone(),
            reshape: Reshape::ArticleExtract,
        })
    }
}

fn scraper_with(handler: LocalWikiHandler) -> Scraper {
    let mut registry = HandlerRegistry::new();
    registry.register(Box::new(handler)).unwrap();
    let (scraper, _) = recording_scraper(test_config());
    scraper.with_registry(registry)
}

async fn mount_wiki(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("titles", "Rust"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"batchcomplete": "", "query": {"pages": {"42": {"pageid": 42, "title": "Rust", "extract": "Rust is a language."}}}}"#,
            "application/json",
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wiki/Rust"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<html><body><p>Rust article page</p></body></html>",
            "text/html",
        ))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_handler_retargets_and_reshapes() {
    let server = MockServer::start().await;
    mount_wiki(&server).await;
    let scraper = scraper_with(LocalWikiHandler::new());

    let output = scraper
        .scrape_url(&url_for(&server, "/wiki/Rust"), false, true)
        .await
        .unwrap();

    let page = output.as_json().expect("page object");
    assert_eq!(page["title"], "Rust");
    assert_eq!(page["extract"], "Rust is a language.");
}

#[tokio::test]
async fn test_redirect_off_fetches_literal_url() {
    let server = MockServer::start().await;
    mount_wiki(&server).await;
    let scraper = scraper_with(LocalWikiHandler::new());
    let target = url_for(&server, "/wiki/Rust");

    let output = scraper.scrape_url(&target, false, false).await.unwrap();
    assert_eq!(
        output,
        ScrapeOutput::Text(format!("Contents of url: {}\nRust article page", target))
    );
}

#[tokio::test]
async fn test_raw_request_passes_through_handler() {
    let server = MockServer::start().await;
    mount_wiki(&server).await;
    let scraper = scraper_with(LocalWikiHandler::new());

    let output = scraper
        .scrape_url(&url_for(&server, "/wiki/Rust"), true, true)
        .await
        .unwrap();
    assert_eq!(
        output,
        ScrapeOutput::Raw("<html><body><p>Rust article page</p></body></html>".to_string())
    );
}

#[tokio::test]
async fn test_handler_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(header("x-wiki-key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"query": {"pages": {"1": {"title": "Rust", "extract": "ok"}}}}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let mut handler = LocalWikiHandler::new();
    handler.headers = vec![("x-wiki-key".to_string(), "secret".to_string())];
    let scraper = scraper_with(handler);

    let output = scraper
        .scrape_url(&url_for(&server, "/wiki/Rust"), false, true)
        .await
        .unwrap();
    assert_eq!(output.as_json().unwrap()["extract"], "ok");
}

#[tokio::test]
async fn test_handler_error_is_reported_without_fetching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut handler = LocalWikiHandler::new();
    handler.broken = true;
    let scraper = scraper_with(handler);

    let result = scraper
        .scrape_url(&url_for(&server, "/wiki/Rust"), false, true)
        .await;
    assert!(matches!(
        result,
        Err(ScrapeError::Handler(HandlerError::Unplannable { handler: "local-wiki", .. }))
    ));
}

#[tokio::test]
async fn test_unclaimed_url_is_fetched_directly() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/other"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>plain</p>", "text/html"))
        .expect(1)
        .mount(&server)
        .await;
    let scraper = scraper_with(LocalWikiHandler::new());

    let output = scraper
        .scrape_url(&url_for(&server, "/other"), false, true)
        .await
        .unwrap();
    assert!(output.as_text().unwrap().ends_with("plain"));
}

#[test]
fn test_default_registry_claims_known_sites() {
    let registry = HandlerRegistry::with_defaults();
    assert_eq!(registry.names(), vec!["wikipedia", "github"]);

    let wiki = Url::parse("https://de.wikipedia.org/wiki/Rost").unwrap();
    let github = Url::parse("https://github.com/rust-lang/rust").unwrap();
    let other = Url::parse("https://example.com/").unwrap();

    assert_eq!(registry.resolve(&wiki).map(|h| h.name()), Some("wikipedia"));
    assert_eq!(registry.resolve(&github).map(|h| h.name()), Some("github"));
    assert!(registry.resolve(&other).is_none());
}

#[test]
fn test_github_tree_maps_to_branch() {
    let url = Url::parse("https://github.com/rust-lang/rust/tree/master").unwrap();
    assert_eq!(
        build_api_url(&url).unwrap().as_str(),
        "https://api.github.com/repos/rust-lang/rust/branches/master"
    );
}

#[tokio::test]
async fn test_fetch_articles_rejects_foreign_urls() {
    let (scraper, _) = recording_scraper(test_config());
    let result = scraper
        .fetch_articles(&["https://example.com/wiki/Rust"], ArticleMode::Api)
        .await;
    assert!(matches!(result, Err(ScrapeError::Handler(_))));
}

#[tokio::test]
async fn test_fetch_articles_requires_input() {
    let (scraper, _) = recording_scraper(test_config());
    let inputs: [&str; 0] = [];
    let result = scraper.fetch_articles(&inputs, ArticleMode::Api).await;
    assert!(matches!(
        result,
        Err(ScrapeError::Validation(ValidationError::NoUrls))
    ));
}

async fn mount_articles(server: &MockServer) {
    for (title, delay) in [("Rust", 150u64), ("Tokio", 0)] {
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("titles", title))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(
                        format!(r#"{{"query": {{"pages": {{"1": {{"title": "{}"}}}}}}}}"#, title),
                        "application/json",
                    )
                    .set_delay(Duration::from_millis(delay)),
            )
            .mount(server)
            .await;
    }

    for title in ["Rust", "Tokio"] {
        Mock::given(method("GET"))
            .and(path(format!("/wiki/{}", title)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(format!("<h1>{}</h1>", title), "text/html"),
            )
            .mount(server)
            .await;
    }
}

fn mirror_scraper(server: &MockServer) -> Scraper {
    let mut config = test_config();
    config.handlers.wiki_base_url = Some(server.uri());
    recording_scraper(config).0
}

#[tokio::test]
async fn test_fetch_articles_api_mode_concatenates_in_input_order() {
    let server = MockServer::start().await;
    mount_articles(&server).await;
    let scraper = mirror_scraper(&server);

    let combined = scraper
        .fetch_articles(&["rust", "tokio"], ArticleMode::Api)
        .await
        .unwrap();

    let api = |title: &str| {
        format!(
            "{}/w/api.php?action=query&prop=extracts&explaintext&format=json&titles={}",
            server.uri(),
            title
        )
    };
    assert_eq!(
        combined,
        format!(
            "Contents of url: {}\n{{\"query\": {{\"pages\": {{\"1\": {{\"title\": \"Rust\"}}}}}}}}\n\
             Contents of url: {}\n{{\"query\": {{\"pages\": {{\"1\": {{\"title\": \"Tokio\"}}}}}}}}",
            api("Rust"),
            api("Tokio")
        )
    );
}

#[tokio::test]
async fn test_fetch_articles_page_mode_returns_markup() {
    let server = MockServer::start().await;
    mount_articles(&server).await;
    let scraper = mirror_scraper(&server);

    let combined = scraper
        .fetch_articles(&["Tokio", "Rust"], ArticleMode::Page)
        .await
        .unwrap();

    assert_eq!(
        combined,
        format!(
            "Contents of url: {0}/wiki/Tokio\n<h1>Tokio</h1>\n\
             Contents of url: {0}/wiki/Rust\n<h1>Rust</h1>",
            server.uri()
        )
    );
}
