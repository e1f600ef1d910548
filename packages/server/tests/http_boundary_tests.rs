//! HTTP control surface tests against in-memory backends.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use pipeline::stores::MemoryKvStore;
use pipeline::testing::{FleetCall, MockAI, MockFleet, RecordingQueue};
use pipeline::{KvStore, LaunchOptions, ListingConfig, PipelineConfig, WorkItem};
use server_core::kernel::{Backends, ServerDeps};
use server_core::server::build_app;
use tower::ServiceExt;

const LISTING: &str = "https://blog.example.com/page/";

struct TestApp {
    app: Router,
    listing: Arc<MemoryKvStore>,
    queue: Arc<RecordingQueue>,
    fleet: Arc<MockFleet>,
}

fn test_app(fleet: MockFleet, listing: MemoryKvStore) -> TestApp {
    let listing = Arc::new(listing);
    let queue = Arc::new(RecordingQueue::new());
    let fleet = Arc::new(fleet);
    let ai = Arc::new(MockAI::new());

    let deps = ServerDeps::new(
        PipelineConfig::new("content-pipeline"),
        ListingConfig::new(LISTING, "article > a"),
        Backends {
            cache: Arc::new(MemoryKvStore::new()),
            listing: listing.clone(),
            queue: queue.clone(),
            fleet: fleet.clone(),
            text_generator: ai.clone(),
            translator: ai,
        },
    );

    TestApp {
        app: build_app(Arc::new(deps)),
        listing,
        queue,
        fleet,
    }
}

async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_get_without_start_is_bad_request() {
    let t = test_app(MockFleet::new(), MemoryKvStore::new());

    let (status, _) = send(&t.app, Method::GET, "/?end=3").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(t.fleet.calls().is_empty());
}

#[tokio::test]
async fn test_get_without_end_is_bad_request() {
    let t = test_app(MockFleet::new(), MemoryKvStore::new());

    let (status, _) = send(&t.app, Method::GET, "/?start=1").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(t.fleet.calls().is_empty());
}

#[tokio::test]
async fn test_get_with_unparsable_page_is_bad_request() {
    let t = test_app(MockFleet::new(), MemoryKvStore::new());

    let (status, _) = send(&t.app, Method::GET, "/?start=one&end=3").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_other_methods_are_not_allowed() {
    let t = test_app(MockFleet::new(), MemoryKvStore::new());

    for method in [Method::PUT, Method::DELETE, Method::PATCH, Method::HEAD] {
        let (status, _) = send(&t.app, method, "/").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
    assert!(t.queue.sent().is_empty());
}

#[tokio::test]
async fn test_head_does_not_crawl() {
    let t = test_app(
        MockFleet::new().with_links(format!("{}1", LISTING), vec!["https://blog.example.com/hello/"]),
        MemoryKvStore::new(),
    );

    let (status, _) = send(&t.app, Method::HEAD, "/?start=1&end=2").await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(t.fleet.calls().is_empty());
    assert!(t.listing.is_empty());
}

#[tokio::test]
async fn test_control_surface_answers_on_any_path() {
    let t = test_app(
        MockFleet::new(),
        MemoryKvStore::new().with_entry("https://blog.example.com/one/", "one/"),
    );

    let (status, _) = send(&t.app, Method::GET, "/anything?end=3").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&t.app, Method::PUT, "/anything").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = send(&t.app, Method::POST, "/nested/path").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        t.queue.sent(),
        vec![WorkItem::fetch("https://blog.example.com/one/")]
    );
}

#[tokio::test]
async fn test_dropped_crawl_request_still_terminates_browser() {
    let t = test_app(
        MockFleet::new().with_goto_delay(Duration::from_millis(100)),
        MemoryKvStore::new(),
    );

    let request = t.app.clone().oneshot(
        Request::builder()
            .method(Method::GET)
            .uri("/?start=1&end=3")
            .body(Body::empty())
            .unwrap(),
    );
    assert!(tokio::time::timeout(Duration::from_millis(50), request)
        .await
        .is_err());

    for _ in 0..100 {
        if t.fleet.calls().contains(&FleetCall::Terminate("launched-0".into())) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(t
        .fleet
        .calls()
        .contains(&FleetCall::Terminate("launched-0".into())));
}

#[tokio::test]
async fn test_get_crawls_listing_pages() {
    let t = test_app(
        MockFleet::new()
            .with_links(format!("{}2", LISTING), vec!["https://blog.example.com/hello/"])
            .with_links(
                format!("{}3", LISTING),
                vec!["https://blog.example.com/one/", "https://blog.example.com/two/"],
            ),
        MemoryKvStore::new(),
    );

    let (status, body) = send(&t.app, Method::GET, "/?start=2&end=4").await;

    assert_eq!(status, StatusCode::OK);
    let found: BTreeMap<String, String> = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        found,
        BTreeMap::from([
            ("2-0".to_string(), "hello/".to_string()),
            ("3-0".to_string(), "one/".to_string()),
            ("3-1".to_string(), "two/".to_string()),
        ])
    );
    assert_eq!(t.listing.len(), 3);

    let calls = t.fleet.calls();
    assert!(calls.contains(&FleetCall::Launch(LaunchOptions::ephemeral())));
    assert!(calls.contains(&FleetCall::Terminate("launched-0".into())));
    assert!(t.queue.sent().is_empty());
}

#[tokio::test]
async fn test_post_enqueues_fetch_per_recorded_link() {
    let t = test_app(
        MockFleet::new(),
        MemoryKvStore::new()
            .with_entry("https://blog.example.com/one/", "one/")
            .with_entry("https://blog.example.com/two/", "two/"),
    );

    let (status, body) = send(&t.app, Method::POST, "/").await;

    assert_eq!(status, StatusCode::OK);
    let seeded: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        seeded,
        serde_json::json!({
            "https://blog.example.com/one/": "",
            "https://blog.example.com/two/": ""
        })
    );
    assert_eq!(
        t.queue.sent(),
        vec![
            WorkItem::fetch("https://blog.example.com/one/"),
            WorkItem::fetch("https://blog.example.com/two/"),
        ]
    );
    assert_eq!(t.listing.list_keys().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_crawl_failure_is_server_error() {
    let t = test_app(MockFleet::new().failing_goto(), MemoryKvStore::new());

    let (status, _) = send(&t.app, Method::GET, "/?start=1&end=2").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(t
        .fleet
        .calls()
        .contains(&FleetCall::Terminate("launched-0".into())));
}

#[tokio::test]
async fn test_health_reports_ok() {
    let t = test_app(MockFleet::new(), MemoryKvStore::new());

    let (status, body) = send(&t.app, Method::GET, "/health").await;

    assert_eq!(status, StatusCode::OK);
    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["queue"], "content-pipeline");
}
