//! Integration tests for `ResilientFetcher::get` against a local wiremock
//! server. Retry delays and throttle intervals are kept small so the suite
//! runs on real time.

use std::time::{Duration, Instant};

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pricewatch_scraper::{FetchError, FetcherConfig, ResilientFetcher};

const TIMEOUT: Duration = Duration::from_secs(5);

fn fetcher(max_retries: u32) -> ResilientFetcher {
    ResilientFetcher::new(FetcherConfig {
        request_timeout: TIMEOUT,
        user_agent: "pricewatch-test/0.1".to_string(),
        max_retries,
        retry_delay: Duration::from_millis(10),
        min_request_interval: Duration::ZERO,
    })
    .expect("failed to build test fetcher")
}

#[tokio::test]
async fn get_returns_body_on_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let body = fetcher(3)
        .get(&format!("{}/search", server.uri()), TIMEOUT)
        .await
        .unwrap();
    assert_eq!(body, "<html>ok</html>");
}

#[tokio::test]
async fn get_retries_server_errors_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .expect(1)
        .mount(&server)
        .await;

    let body = fetcher(3)
        .get(&format!("{}/search", server.uri()), TIMEOUT)
        .await
        .unwrap();
    assert_eq!(body, "recovered");
}

#[tokio::test]
async fn get_returns_last_status_after_exhausting_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&server)
        .await;

    let err = fetcher(2)
        .get(&format!("{}/search", server.uri()), TIMEOUT)
        .await
        .unwrap_err();
    assert!(
        matches!(err, FetchError::Status { status: 404, .. }),
        "expected Status(404), got: {err:?}"
    );
}

#[tokio::test]
async fn get_treats_blank_body_as_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("   \n"))
        .expect(2)
        .mount(&server)
        .await;

    let err = fetcher(1)
        .get(&format!("{}/search", server.uri()), TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::EmptyBody { .. }));
}

#[tokio::test]
async fn get_classifies_slow_response_as_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let err = fetcher(0)
        .get(&format!("{}/slow", server.uri()), Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Timeout { .. }), "got: {err:?}");
}

#[tokio::test]
async fn get_fails_fast_on_malformed_url() {
    let start = Instant::now();
    let err = fetcher(5).get("not a url", TIMEOUT).await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidRequest { .. }));
    assert!(start.elapsed() < Duration::from_millis(50));
}

#[tokio::test]
async fn get_reports_connection_failure() {
    // Port 9 (discard) on localhost is almost never listening.
    let err = fetcher(0)
        .get("http://127.0.0.1:9/search", TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FetchError::Connection { .. } | FetchError::Timeout { .. }
    ));
}

#[tokio::test]
async fn consecutive_gets_respect_min_request_interval() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let fetcher = ResilientFetcher::new(FetcherConfig {
        request_timeout: TIMEOUT,
        user_agent: "pricewatch-test/0.1".to_string(),
        max_retries: 0,
        retry_delay: Duration::ZERO,
        min_request_interval: Duration::from_millis(150),
    })
    .unwrap();

    let url = format!("{}/a", server.uri());
    let start = Instant::now();
    fetcher.get(&url, TIMEOUT).await.unwrap();
    fetcher.get(&url, TIMEOUT).await.unwrap();
    assert!(
        start.elapsed() >= Duration::from_millis(150),
        "second request should wait for the throttle"
    );
}
