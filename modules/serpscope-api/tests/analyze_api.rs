//! HTTP tests for the analyze endpoint, run against mock services.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tokio::sync::Notify;
use tower::ServiceExt;

use serpscope_api::{router, AppState};
use serpscope_common::SearchResponse;
use serpscope_pipeline::testing::{
    report_json, search_results, MockGenerator, MockReply, MockScraper, MockSearcher, MockStore,
};
use serpscope_pipeline::{Pipeline, PipelineDeps, TextGenerator};

const NOTION_URL: &str = "https://www.notion.so/Report-abc123";

struct Services {
    searcher: Arc<MockSearcher>,
    store: Arc<MockStore>,
    app: axum::Router,
}

fn services(generator: Arc<dyn TextGenerator>, store: MockStore) -> Services {
    let searcher = Arc::new(MockSearcher::new(SearchResponse {
        organic: search_results(5),
        summary: None,
    }));
    let store = Arc::new(store);
    let pipeline = Pipeline::new(
        PipelineDeps::builder()
            .searcher(searcher.clone())
            .scraper(Arc::new(
                MockScraper::new().on_page("https://site1.example/", "Page one text"),
            ))
            .generator(generator)
            .store(store.clone())
            .models(vec!["primary".to_string(), "backup".to_string()])
            .build(),
    );
    Services {
        searcher,
        store,
        app: router(Arc::new(AppState::new(pipeline))),
    }
}

fn working_generator() -> Arc<dyn TextGenerator> {
    Arc::new(MockGenerator::new().on_model("primary", MockReply::Text(report_json("Report"))))
}

fn analyze_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: axum::Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), 1_000_000)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn analyze_returns_record_url() {
    let s = services(working_generator(), MockStore::new(NOTION_URL));
    let (status, json) = send(s.app, analyze_request(r#"{"prompt":"best running shoes 2025"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["url"], NOTION_URL);
    assert_eq!(s.store.created().len(), 1);
}

#[tokio::test]
async fn missing_or_blank_prompt_is_rejected() {
    for body in [r#"{}"#, r#"{"prompt":""}"#, r#"{"prompt":"   "}"#, "not json"] {
        let s = services(working_generator(), MockStore::new(NOTION_URL));
        let (status, json) = send(s.app, analyze_request(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(json["error"], "Prompt is required");
        assert_eq!(s.searcher.call_count(), 0);
    }
}

#[tokio::test]
async fn missing_database_id_fails_before_search() {
    let s = services(working_generator(), MockStore::unconfigured());
    let (status, json) = send(s.app, analyze_request(r#"{"prompt":"topic"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "DATABASE_ID is not configured");
    assert_eq!(s.searcher.call_count(), 0);
}

#[tokio::test]
async fn unknown_database_has_guidance_message() {
    let s = services(working_generator(), MockStore::database_not_found());
    let (status, json) = send(s.app, analyze_request(r#"{"prompt":"topic"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("database not found"), "{message}");
    assert!(message.contains("invited"), "{message}");
}

#[tokio::test]
async fn all_models_unavailable_is_single_analysis_error() {
    let s = services(Arc::new(MockGenerator::new()), MockStore::new(NOTION_URL));
    let (status, json) = send(s.app, analyze_request(r#"{"prompt":"topic"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().starts_with("Analysis failed"));
    assert!(s.store.created().is_empty());
}

#[tokio::test]
async fn index_and_health_are_served() {
    let s = services(working_generator(), MockStore::new(NOTION_URL));

    let resp = s
        .app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["cache-control"], "no-store");
    let body = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
    assert!(String::from_utf8_lossy(&body).contains("/api/analyze"));

    let resp = s
        .app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

/// Holds every call until released, so a test can drop the request while
/// analysis is in flight.
struct GatedGenerator {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl TextGenerator for GatedGenerator {
    async fn generate_json(&self, _model: &str, _prompt: &str) -> ai_client::Result<String> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(report_json("Late report"))
    }
}

#[tokio::test]
async fn client_disconnect_during_analysis_creates_no_record() {
    let gate = Arc::new(GatedGenerator {
        entered: Notify::new(),
        release: Notify::new(),
    });
    let s = services(gate.clone(), MockStore::new(NOTION_URL));

    let request = tokio::spawn(s.app.oneshot(analyze_request(r#"{"prompt":"topic"}"#)));
    gate.entered.notified().await;

    // Dropping the handler future is what a disconnect looks like to axum.
    request.abort();
    let dropped = request.await;
    assert!(dropped.unwrap_err().is_cancelled(), "the client never sees a response");

    gate.release.notify_one();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(s.store.created().is_empty());
}
