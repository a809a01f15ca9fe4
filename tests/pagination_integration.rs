//! Integration tests for Crossref works pagination.
//!
//! A mock server plays the works endpoint; each cursor value is a separate
//! mock so the tests can assert the exact request sequence.

use std::time::Duration;

use sci_clone::download::{HttpClient, RetryPolicy};
use sci_clone::metadata::{CrossrefClient, MetadataError};
use sci_clone::source::JournalQuery;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(1, Duration::from_millis(0))
}

fn client() -> HttpClient {
    HttpClient::new().expect("client should build")
}

fn work(doi: &str, year: i32) -> serde_json::Value {
    serde_json::json!({
        "DOI": doi,
        "volume": "10",
        "container-title": ["Test Journal"],
        "published": {"date-parts": [[year]]}
    })
}

fn page(total: u64, next_cursor: Option<&str>, items: Vec<serde_json::Value>) -> serde_json::Value {
    serde_json::json!({
        "message": {
            "total-results": total,
            "next-cursor": next_cursor,
            "items": items
        }
    })
}

#[tokio::test]
async fn test_pagination_follows_cursor_until_total_reached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/journals/0002-9602/works"))
        .and(query_param("cursor", "*"))
        .and(query_param("rows", "1000"))
        .and(query_param(
            "filter",
            "from-pub-date:2019-01,until-pub-date:2020-12",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            5,
            Some("cursor-2"),
            vec![work("10.1/a", 2019), work("10.1/b", 2019)],
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/journals/0002-9602/works"))
        .and(query_param("cursor", "cursor-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            5,
            Some("cursor-3"),
            vec![work("10.1/c", 2019), work("10.1/d", 2020)],
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/journals/0002-9602/works"))
        .and(query_param("cursor", "cursor-3"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page(5, Some("cursor-4"), vec![work("10.1/e", 2020)])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let crossref = CrossrefClient::with_base_url(client(), fast_retry(), mock_server.uri());
    let query = JournalQuery::new("0002-9602", 2019, 2020).expect("valid query");
    let works = crossref.journal_works(&query).await.expect("should paginate");

    // Exactly three requests: the fourth cursor is never fetched because
    // the accumulated count reached total-results.
    assert_eq!(works.container_title.as_deref(), Some("Test Journal"));
    assert_eq!(works.for_year(2019).len(), 3);
    assert_eq!(works.for_year(2020).len(), 2);
    assert!(works.for_year(2021).is_empty());
}

#[tokio::test]
async fn test_pagination_stops_on_empty_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/journals/1234-567X/works"))
        .and(query_param("cursor", "*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            100,
            Some("cursor-2"),
            vec![work("10.2/a", 2018)],
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    // The reported total overstates reality; the empty page ends the walk.
    Mock::given(method("GET"))
        .and(path("/journals/1234-567X/works"))
        .and(query_param("cursor", "cursor-2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page(100, Some("cursor-3"), vec![])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let crossref = CrossrefClient::with_base_url(client(), fast_retry(), mock_server.uri());
    let query = JournalQuery::new("1234-567X", 2018, 2018).expect("valid query");
    let works = crossref.journal_works(&query).await.expect("should paginate");

    assert_eq!(works.for_year(2018).len(), 1);
}

#[tokio::test]
async fn test_pagination_single_page_without_next_cursor() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/journals/0028-0836/works"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            2,
            None,
            vec![work("10.3/a", 2015), work("10.3/b", 2015)],
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let crossref = CrossrefClient::with_base_url(client(), fast_retry(), mock_server.uri());
    let query = JournalQuery::new("0028-0836", 2015, 2015).expect("valid query");
    let works = crossref.journal_works(&query).await.expect("should paginate");

    assert_eq!(works.for_year(2015).len(), 2);
}

#[tokio::test]
async fn test_pagination_empty_result_set() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/journals/0028-0836/works"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0, None, vec![])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let crossref = CrossrefClient::with_base_url(client(), fast_retry(), mock_server.uri());
    let query = JournalQuery::new("0028-0836", 2015, 2016).expect("valid query");
    let works = crossref.journal_works(&query).await.expect("should paginate");

    assert!(works.by_year.is_empty());
    assert!(works.container_title.is_none());
}

#[tokio::test]
async fn test_pagination_server_error_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/journals/0002-9602/works"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let crossref = CrossrefClient::with_base_url(client(), fast_retry(), mock_server.uri());
    let query = JournalQuery::new("0002-9602", 2019, 2019).expect("valid query");
    let result = crossref.journal_works(&query).await;

    match result {
        Err(MetadataError::Api { issn, .. }) => assert_eq!(issn, "0002-9602"),
        other => panic!("Expected MetadataError::Api, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_pagination_retries_transient_failures() {
    let mock_server = MockServer::start().await;

    // First attempt 503, then success; a 2-attempt policy should recover.
    Mock::given(method("GET"))
        .and(path("/journals/0002-9602/works"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/journals/0002-9602/works"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page(1, None, vec![work("10.1/a", 2019)])),
        )
        .mount(&mock_server)
        .await;

    let retry = RetryPolicy::new(2, Duration::from_millis(1));
    let crossref = CrossrefClient::with_base_url(client(), retry, mock_server.uri());
    let query = JournalQuery::new("0002-9602", 2019, 2019).expect("valid query");
    let works = crossref.journal_works(&query).await.expect("should recover");

    assert_eq!(works.for_year(2019).len(), 1);
}
