use super::*;
use std::sync::Arc;
use std::time::Duration;

use price_watcher::models::ExtractionRule;
use price_watcher::retry::{CellRef, RetryController, RetryPolicy};
use price_watcher::scraper::{FetchError, FetchOutcome, HttpFetcher, NotFoundReason, PriceSource};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn rule() -> ExtractionRule {
    ExtractionRule::new("meta[itemprop=price]", "content")
}

async fn serve(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_extracts_attribute() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/iphone-x"))
        .and(header("user-agent", "PriceWatcher-Test/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page("64990")))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&get_test_scraper_config()).unwrap();
    let outcome = fetcher.fetch(&format!("{}/iphone-x", server.uri()), &rule()).await.unwrap();

    assert_eq!(outcome, FetchOutcome::Found(64990));
}

#[tokio::test]
async fn test_fetch_reports_missing_selector_and_attribute() {
    let server = MockServer::start().await;
    let sold_out = "<html><body>Sold out</body></html>";
    serve(&server, "/no-meta", ResponseTemplate::new(200).set_body_string(sold_out)).await;
    let no_content = r#"<html><head><meta itemprop="price"></head></html>"#;
    serve(&server, "/no-content", ResponseTemplate::new(200).set_body_string(no_content)).await;

    let fetcher = HttpFetcher::new(&get_test_scraper_config()).unwrap();

    let outcome = fetcher.fetch(&format!("{}/no-meta", server.uri()), &rule()).await.unwrap();
    assert_eq!(outcome, FetchOutcome::NotFound(NotFoundReason::SelectorMissing));

    let outcome = fetcher.fetch(&format!("{}/no-content", server.uri()), &rule()).await.unwrap();
    assert_eq!(outcome, FetchOutcome::NotFound(NotFoundReason::AttributeMissing));
}

#[tokio::test]
async fn test_fetch_errors_on_server_error_and_bad_value() {
    let server = MockServer::start().await;
    serve(&server, "/down", ResponseTemplate::new(503)).await;
    let text_price = product_page("call us");
    serve(&server, "/text", ResponseTemplate::new(200).set_body_string(text_price)).await;

    let fetcher = HttpFetcher::new(&get_test_scraper_config()).unwrap();

    let err = fetcher.fetch(&format!("{}/down", server.uri()), &rule()).await.unwrap_err();
    assert!(matches!(err, FetchError::Status(503)));

    let err = fetcher.fetch(&format!("{}/text", server.uri()), &rule()).await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidPrice { ref value } if value == "call us"));
}

#[tokio::test]
async fn test_retry_recovers_after_transient_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page("12990")))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&get_test_scraper_config()).unwrap();
    let policy = RetryPolicy {
        max_attempts: 5,
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        attempt_timeout: Some(Duration::from_secs(5)),
    };
    let controller = RetryController::new(Arc::new(fetcher), policy);

    let cell = CellRef {
        company: "Shop A",
        model: "Apple AirPods",
    };
    let resolution = controller.resolve(cell, &format!("{}/flaky", server.uri()), &rule()).await;

    assert_eq!(resolution.price, 12990);
    assert_eq!(resolution.attempts, 3);
}
