//! Tests for pagination module

use super::*;
use crate::context::RequestContext;
use crate::error::{Error, ErrorKind};
use crate::http::{HttpClient, HttpClientConfig};
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Item {
    id: u32,
}

fn test_client(max_retries: u32) -> Arc<HttpClient> {
    let config = HttpClientConfig::builder()
        .no_rate_limit()
        .retry_wait(Duration::ZERO, Duration::ZERO)
        .max_retries(max_retries)
        .build();
    Arc::new(HttpClient::with_config(config).unwrap())
}

async fn collect_ids(iter: &mut PageIter<Item>) -> Vec<u32> {
    let mut ids = Vec::new();
    while iter.advance().await {
        ids.push(iter.current().id);
    }
    ids
}

// ============================================================================
// Page Tests
// ============================================================================

#[test]
fn test_page_decode_full() {
    let page: Page<Item> = serde_json::from_value(json!({
        "count": 3,
        "next": "http://x/items?page=2",
        "previous": null,
        "results": [{"id": 1}, {"id": 2}]
    }))
    .unwrap();

    assert_eq!(page.count, 3);
    assert_eq!(page.next_url(), Some("http://x/items?page=2"));
    assert!(page.previous.is_none());
    assert_eq!(page.results, vec![Item { id: 1 }, Item { id: 2 }]);
    assert!(!page.is_last());
}

#[test]
fn test_page_decode_minimal() {
    let page: Page<Item> = serde_json::from_value(json!({"count": 0, "results": []})).unwrap();
    assert!(page.next.is_none());
    assert!(page.is_last());
    assert!(page.results.is_empty());
}

#[test]
fn test_page_empty_next_is_last() {
    let page: Page<Item> = serde_json::from_value(json!({"count": 0, "next": ""})).unwrap();
    assert!(page.is_last());
}

#[test]
fn test_page_null_results_is_empty() {
    let page: Page<Item> =
        serde_json::from_value(json!({"count": 0, "next": null, "results": null})).unwrap();
    assert!(page.results.is_empty());
    assert!(page.is_last());
}

#[test]
fn test_iter_state_helpers() {
    assert!(!IterState::NotStarted.is_terminal());
    assert!(!IterState::HasItem(0).is_terminal());
    assert!(IterState::Exhausted.is_terminal());
    let failed = IterState::Failed(Error::status("iter.fetch", 404));
    assert!(failed.is_terminal());
    assert!(failed.error().unwrap().is_not_found());
    assert!(IterState::Exhausted.error().is_none());
}

// ============================================================================
// PageIter Tests
// ============================================================================

#[tokio::test]
async fn test_single_page_single_item() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1, "next": null, "previous": null,
            "results": [{"id": 1}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut iter = PageIter::<Item>::new(test_client(0), mock_server.uri());

    assert!(iter.advance().await);
    assert_eq!(iter.current(), &Item { id: 1 });
    assert!(!iter.advance().await);
    assert!(iter.last_error().is_none());
    assert!(matches!(iter.state(), IterState::Exhausted));

    // Terminal: no further fetches
    assert!(!iter.advance().await);
}

#[tokio::test]
async fn test_follows_next_cursor() {
    let mock_server = MockServer::start().await;
    let page2 = format!("{}/items?page=2", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 3, "next": null, "previous": "x",
            "results": [{"id": 3}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 3, "next": page2, "previous": null,
            "results": [{"id": 1}, {"id": 2}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut iter = PageIter::<Item>::new(test_client(0), format!("{}/items", mock_server.uri()));
    assert_eq!(collect_ids(&mut iter).await, vec![1, 2, 3]);
    assert!(iter.last_error().is_none());
}

#[tokio::test]
async fn test_does_not_prefetch() {
    let mock_server = MockServer::start().await;
    let page2 = format!("{}/items?page=2", mock_server.uri());

    Mock::given(method("GET"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"count": 3, "results": [{"id": 3}]})),
        )
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 3, "next": page2, "results": [{"id": 1}, {"id": 2}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut iter = PageIter::<Item>::new(test_client(0), format!("{}/items", mock_server.uri()));
    assert!(iter.advance().await);
    assert!(iter.advance().await);
    assert_eq!(iter.current().id, 2);
}

#[tokio::test]
async fn test_empty_page_exhausts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 0, "next": "http://never.invalid/next", "results": []
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut iter = PageIter::<Item>::new(test_client(0), mock_server.uri());
    assert!(!iter.advance().await);
    assert!(iter.last_error().is_none());
    assert!(!iter.advance().await);
}

#[tokio::test]
async fn test_null_results_exhausts_without_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 0, "next": null, "previous": null, "results": null
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut iter = PageIter::<Item>::new(test_client(0), mock_server.uri());
    assert!(!iter.advance().await);
    assert!(iter.last_error().is_none());
    assert!(matches!(iter.state(), IterState::Exhausted));
}

#[tokio::test]
async fn test_dropped_advance_keeps_cursor() {
    let mock_server = MockServer::start().await;
    let page2 = format!("{}/items?page=2", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"count": 2, "next": null, "results": [{"id": 2}]}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2, "next": page2, "results": [{"id": 1}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut iter = PageIter::<Item>::new(test_client(0), format!("{}/items", mock_server.uri()));
    assert!(iter.advance().await);
    assert_eq!(iter.current().id, 1);

    // Abandon the second page fetch while it is still in flight
    let abandoned = tokio::time::timeout(Duration::from_millis(50), iter.advance()).await;
    assert!(abandoned.is_err());

    assert!(iter.advance().await);
    assert_eq!(iter.current().id, 2);
    assert!(!iter.advance().await);
    assert!(iter.last_error().is_none());
}

#[tokio::test]
async fn test_empty_first_url_is_exhausted() {
    let mut iter = PageIter::<Item>::new(test_client(0), "");
    assert!(!iter.advance().await);
    assert!(matches!(iter.state(), IterState::Exhausted));
}

#[tokio::test]
async fn test_page_not_found_latches_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut iter = PageIter::<Item>::new(test_client(0), mock_server.uri());
    assert!(!iter.advance().await);

    let err = iter.last_error().unwrap();
    assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    assert_eq!(err.op(), Some("iter.fetch"));

    // Latched: reported again, never refetched
    assert!(!iter.advance().await);
    assert!(iter.last_error().unwrap().is_not_found());
}

#[tokio::test]
async fn test_page_server_error_kind() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut iter = PageIter::<Item>::new(test_client(0), mock_server.uri());
    assert!(!iter.advance().await);
    assert_eq!(iter.last_error().unwrap().kind(), Some(ErrorKind::Server));
}

#[tokio::test]
async fn test_page_malformed_body_is_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": "nope"})))
        .mount(&mock_server)
        .await;

    let mut iter = PageIter::<Item>::new(test_client(0), mock_server.uri());
    assert!(!iter.advance().await);
    assert_eq!(iter.last_error().unwrap().kind(), Some(ErrorKind::Server));
}

#[tokio::test]
async fn test_error_on_second_page_after_items() {
    let mock_server = MockServer::start().await;
    let page2 = format!("{}/items?page=2", mock_server.uri());

    Mock::given(method("GET"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2, "next": page2, "results": [{"id": 1}]
        })))
        .mount(&mock_server)
        .await;

    let mut iter = PageIter::<Item>::new(test_client(0), format!("{}/items", mock_server.uri()));
    assert_eq!(collect_ids(&mut iter).await, vec![1]);
    assert_eq!(
        iter.last_error().unwrap().kind(),
        Some(ErrorKind::RateLimited)
    );
}

#[tokio::test]
async fn test_page_fetch_retries_inside_transport() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"count": 1, "results": [{"id": 7}]})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut iter = PageIter::<Item>::new(test_client(1), mock_server.uri());
    assert_eq!(collect_ids(&mut iter).await, vec![7]);
}

#[tokio::test]
async fn test_cancelled_context_latches_cancellation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (ctx, handle) = RequestContext::cancellable();
    handle.cancel();

    let mut iter = PageIter::<Item>::new(test_client(0), mock_server.uri()).with_context(ctx);
    assert!(!iter.advance().await);
    let err = iter.last_error().unwrap();
    assert!(matches!(err, Error::Cancelled));
    assert!(err.kind().is_none());
}

#[tokio::test]
async fn test_into_stream_yields_items_then_error() {
    let mock_server = MockServer::start().await;
    let page2 = format!("{}/items?page=2", mock_server.uri());

    Mock::given(method("GET"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 3, "next": page2, "results": [{"id": 1}, {"id": 2}]
        })))
        .mount(&mock_server)
        .await;

    let iter = PageIter::<Item>::new(test_client(0), format!("{}/items", mock_server.uri()));
    let results: Vec<_> = iter.into_stream().collect().await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().id, 1);
    assert_eq!(results[1].as_ref().unwrap().id, 2);
    assert!(results[2].as_ref().unwrap_err().is_not_found());
}

// ============================================================================
// Misuse
// ============================================================================

#[test]
#[should_panic(expected = "before advance")]
fn test_current_before_advance_panics() {
    let iter = PageIter::<Item>::new(test_client(0), "http://localhost/");
    let _ = iter.current();
}

#[tokio::test]
#[should_panic(expected = "after exhaustion")]
async fn test_current_after_exhaustion_panics() {
    let mut iter = PageIter::<Item>::new(test_client(0), "");
    assert!(!iter.advance().await);
    let _ = iter.current();
}

#[tokio::test]
#[should_panic(expected = "after a failed fetch")]
async fn test_current_after_failure_panics() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let mut iter = PageIter::<Item>::new(test_client(0), mock_server.uri());
    assert!(!iter.advance().await);
    let _ = iter.current();
}
