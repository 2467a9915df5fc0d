//! End-to-end scrape tests against mock servers

use crate::{recording_scraper, test_config, url_for};
use std::sync::Arc;
use std::time::{Duration, Instant};
use sumi_scrape::fetch::SinkError;
use sumi_scrape::{
    ProgressEvent, ScrapeError, ScrapeOutput, ScrapeRequest, ScrapeResponse, Scraper, TtlCache,
    ValidationError,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HELLO_HTML: &str = "<html><body>Hello</body></html>";

async fn mount_html(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_html_raw_and_plaintext() {
    let server = MockServer::start().await;
    mount_html(&server, "/", HELLO_HTML).await;
    let target = url_for(&server, "/");

    let (scraper, _) = recording_scraper(test_config());

    let raw = scraper.scrape_url(&target, true, true).await.unwrap();
    assert_eq!(raw, ScrapeOutput::Raw(HELLO_HTML.to_string()));

    let plain = scraper.scrape_url(&target, false, true).await.unwrap();
    assert_eq!(
        plain,
        ScrapeOutput::Text(format!("Contents of url: {}\nHello", target))
    );
}

#[tokio::test]
async fn test_success_event_order() {
    let server = MockServer::start().await;
    mount_html(&server, "/page", HELLO_HTML).await;

    let (scraper, recorder) = recording_scraper(test_config());
    scraper
        .scrape_url(&url_for(&server, "/page"), false, true)
        .await
        .unwrap();

    assert_eq!(
        recorder.kinds(),
        vec!["start", "fetch_attempt", "fetched", "done"]
    );
}

#[tokio::test]
async fn test_json_plaintext_returns_value_regardless_of_length() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"name": "sumi"}"#, "application/json"),
        )
        .mount(&server)
        .await;
    let target = url_for(&server, "/data.json");

    // A minimum size far above the body length must not force raw for JSON
    let mut config = test_config();
    config.summary.min_size = 10_000;
    let (scraper, recorder) = recording_scraper(config);

    let parsed = scraper.scrape_url(&target, false, true).await.unwrap();
    assert_eq!(parsed.as_json().unwrap()["name"], "sumi");
    assert_eq!(recorder.count("found_json"), 1);

    let raw = scraper.scrape_url(&target, true, true).await.unwrap();
    assert_eq!(raw, ScrapeOutput::Raw(r#"{"name": "sumi"}"#.to_string()));
}

#[tokio::test]
async fn test_body_at_min_size_is_forced_raw() {
    let server = MockServer::start().await;
    let body = "<p>exactly this long</p>";
    mount_html(&server, "/small", body).await;

    let mut config = test_config();
    config.summary.min_size = body.len();
    let (scraper, _) = recording_scraper(config);

    let output = scraper
        .scrape_url(&url_for(&server, "/small"), false, true)
        .await
        .unwrap();
    assert_eq!(output, ScrapeOutput::Raw(body.to_string()));
}

#[tokio::test]
async fn test_exhausted_retries_emit_one_final_failure_and_skip_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;
    let target = url_for(&server, "/broken");

    let mut config = test_config();
    config.fetch.retries = 2;
    let (scraper, recorder) = recording_scraper(config);
    let scraper = scraper.with_cache(TtlCache::new(Duration::from_secs(60), 10));

    let result = scraper.scrape_url(&target, false, true).await;
    assert!(matches!(result, Err(ScrapeError::Fetch(_))));

    assert_eq!(recorder.count("fetch_failed_final"), 1);
    assert_eq!(recorder.count("fetch_failed"), 1);
    assert_eq!(recorder.count("fetch_retry"), 1);
    assert_eq!(recorder.count("done"), 0);

    let cache = scraper.cache().unwrap();
    assert!(!cache.contains(&target));
    assert_eq!(cache.info().entries, 0);
}

#[tokio::test]
async fn test_zero_retries_still_attempts_once() {
    let server = MockServer::start().await;
    mount_html(&server, "/once", HELLO_HTML).await;

    let mut config = test_config();
    config.fetch.retries = 0;
    let (scraper, recorder) = recording_scraper(config);

    scraper
        .scrape_url(&url_for(&server, "/once"), true, true)
        .await
        .unwrap();
    assert_eq!(recorder.count("fetch_attempt"), 1);
}

#[tokio::test]
async fn test_structured_output_preserves_input_order() {
    let server = MockServer::start().await;
    let delays = [120u64, 10, 80, 0];
    for (i, delay) in delays.iter().enumerate() {
        Mock::given(method("GET"))
            .and(path(format!("/item/{}", i)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(format!("<p>item {}</p>", i), "text/html")
                    .set_delay(Duration::from_millis(*delay)),
            )
            .mount(&server)
            .await;
    }

    let urls: Vec<String> = (0..delays.len())
        .map(|i| url_for(&server, &format!("/item/{}", i)))
        .collect();

    let mut config = test_config();
    config.batch.concurrency = 4;
    let (scraper, _) = recording_scraper(config);

    let response = scraper
        .scrape(&ScrapeRequest::many(urls.clone()).structured(true))
        .await
        .unwrap();

    let entries = response.entries().unwrap();
    assert_eq!(entries.len(), urls.len());
    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.url, urls[i]);
        assert!(entry
            .content
            .as_text()
            .unwrap()
            .ends_with(&format!("item {}", i)));
    }
}

#[tokio::test]
async fn test_concatenated_output_joins_in_order() {
    let server = MockServer::start().await;
    mount_html(&server, "/a", "<p>alpha</p>").await;
    mount_html(&server, "/b", "<p>beta</p>").await;
    let a = url_for(&server, "/a");
    let b = url_for(&server, "/b");

    let (scraper, _) = recording_scraper(test_config());
    let response = scraper
        .scrape(&ScrapeRequest::many([a.clone(), b.clone()]))
        .await
        .unwrap();

    assert_eq!(
        response,
        ScrapeResponse::Concatenated(format!(
            "Contents of url: {}\nalpha\nContents of url: {}\nbeta",
            a, b
        ))
    );
}

#[tokio::test]
async fn test_concurrency_bound_limits_in_flight_fetches() {
    let server = MockServer::start().await;
    let delay = Duration::from_millis(300);
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<p>slow</p>", "text/html")
                .set_delay(delay),
        )
        .expect(5)
        .mount(&server)
        .await;

    let urls: Vec<String> = (0..5)
        .map(|i| url_for(&server, &format!("/slow/{}", i)))
        .collect();

    let mut config = test_config();
    config.batch.concurrency = 2;
    let (scraper, _) = recording_scraper(config);

    let started = Instant::now();
    let response = scraper
        .scrape(&ScrapeRequest::many(urls).structured(true))
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(response.entries().map(|entries| entries.len()), Some(5));
    // Five requests with two permits need at least three rounds
    assert!(
        elapsed >= delay * 3,
        "five fetches finished in {:?} with two permits",
        elapsed
    );
}

#[tokio::test]
async fn test_allowlist_overrides_denylist() {
    let server = MockServer::start().await;
    mount_html(&server, "/page", HELLO_HTML).await;

    let mut config = test_config();
    config.access.allow_hosts = vec!["127.0.0.1".to_string()];
    config.access.deny_hosts = vec!["127.0.0.1".to_string()];
    let (scraper, _) = recording_scraper(config);

    assert!(scraper
        .scrape_url(&url_for(&server, "/page"), false, true)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_denied_host_is_never_fetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(HELLO_HTML, "text/html"))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config();
    config.access.deny_hosts = vec!["127.0.0.1".to_string()];
    let (scraper, recorder) = recording_scraper(config);

    let result = scraper
        .scrape_url(&url_for(&server, "/page"), false, true)
        .await;
    assert!(matches!(
        result,
        Err(ScrapeError::Validation(ValidationError::HostDenied { .. }))
    ));
    assert!(recorder.events().is_empty());
}

#[tokio::test]
async fn test_rejected_url_does_not_block_the_rest_of_the_batch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(HELLO_HTML, "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config();
    config.access.deny_hosts = vec!["blocked.test".to_string()];
    let (scraper, _) = recording_scraper(config);

    let request = ScrapeRequest::many([
        "https://blocked.test/page".to_string(),
        url_for(&server, "/ok"),
        "not a url".to_string(),
    ]);
    let results = scraper.scrape_each(&request).await.unwrap();

    assert_eq!(results.len(), 3);
    assert!(matches!(
        results[0],
        Err(ScrapeError::Validation(ValidationError::HostDenied { .. }))
    ));
    assert!(results[1].is_ok());
    assert!(matches!(
        results[2],
        Err(ScrapeError::Validation(ValidationError::Malformed { .. }))
    ));

    // The aggregate call reports the first failure in input order
    let aggregate = scraper.scrape(&request).await;
    assert!(matches!(
        aggregate,
        Err(ScrapeError::Validation(ValidationError::HostDenied { .. }))
    ));
}

#[tokio::test]
async fn test_body_cap_truncates_after_header() {
    let server = MockServer::start().await;
    let body = "abcdefghij".repeat(20);
    mount_html(&server, "/long", &body).await;

    let mut config = test_config();
    config.fetch.max_body_bytes = Some(50);
    let (scraper, _) = recording_scraper(config);

    let output = scraper
        .scrape_url(&url_for(&server, "/long"), true, true)
        .await
        .unwrap();
    assert_eq!(output, ScrapeOutput::Raw(body[..50].to_string()));
}

#[tokio::test]
async fn test_empty_body_is_a_validation_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (scraper, recorder) = recording_scraper(test_config());
    let result = scraper
        .scrape_url(&url_for(&server, "/empty"), false, true)
        .await;

    assert!(matches!(
        result,
        Err(ScrapeError::Validation(ValidationError::EmptyResult(_)))
    ));
    assert_eq!(recorder.count("done"), 0);
}

#[tokio::test]
async fn test_cache_serves_repeat_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cached"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(HELLO_HTML, "text/html"))
        .expect(1)
        .mount(&server)
        .await;
    let target = url_for(&server, "/cached");

    let mut config = test_config();
    config.cache.enabled = true;
    let (scraper, recorder) = recording_scraper(config);

    let first = scraper.scrape_url(&target, false, true).await.unwrap();
    let second = scraper.scrape_url(&target, false, true).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(recorder.count("fetch_attempt"), 1);
    assert_eq!(recorder.count("done"), 2);

    let cache = scraper.cache().unwrap();
    assert_eq!(cache.info().entries, 1);
    cache.clear();
    assert_eq!(cache.info().entries, 0);
}

#[tokio::test]
async fn test_failing_sink_does_not_affect_scrape() {
    let server = MockServer::start().await;
    mount_html(&server, "/page", HELLO_HTML).await;

    let failing = |_: &ProgressEvent| -> Result<(), SinkError> { Err("sink unavailable".into()) };
    let scraper = Scraper::new(test_config())
        .unwrap()
        .with_progress(Arc::new(failing));

    let output = scraper
        .scrape_url(&url_for(&server, "/page"), false, true)
        .await
        .unwrap();
    assert!(output.as_text().unwrap().ends_with("Hello"));
}

#[tokio::test]
async fn test_config_change_applies_to_next_request() {
    let server = MockServer::start().await;
    mount_html(&server, "/page", HELLO_HTML).await;
    let target = url_for(&server, "/page");

    let (scraper, _) = recording_scraper(test_config());
    scraper.scrape_url(&target, false, true).await.unwrap();

    let mut config = test_config();
    config.summary.min_size = 10_000;
    scraper.set_config(config).unwrap();

    // The larger minimum now forces the same page raw
    let output = scraper.scrape_url(&target, false, true).await.unwrap();
    assert_eq!(output, ScrapeOutput::Raw(HELLO_HTML.to_string()));

    scraper.close();
    scraper.close();
}
