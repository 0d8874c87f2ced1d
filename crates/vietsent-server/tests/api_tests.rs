//! HTTP API tests driven through the router with `oneshot`

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use common::{app_state, in_memory_service, FailingModel, MockModel};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use vietsent_classifiers::LexiconModel;
use vietsent_server::build_router;
use vietsent_server::server::SentimentResponse;

fn router_with_builtin() -> Router {
    let service = in_memory_service(Arc::new(LexiconModel::new().unwrap()), 50);
    build_router(app_state(service), &[])
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn post_sentiment(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/sentiment")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = router_with_builtin();
    let (status, body) = send(&app, get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_classify_and_list_history() {
    let app = router_with_builtin();

    let (status, body) = send(&app, post_sentiment(r#"{"text": "  Hôm nay tôi rất vui "}"#)).await;
    assert_eq!(status, StatusCode::OK);
    let response: SentimentResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(response.text, "Hôm nay tôi rất vui");
    assert_eq!(response.sentiment.as_str(), "POSITIVE");
    assert!((0.0..=1.0).contains(&response.confidence));
    assert!(response.warning.is_none());

    send(&app, post_sentiment(r#"{"text": "Món ăn này dở quá"}"#)).await;

    let (status, body) = send(&app, get("/api/history?limit=1")).await;
    assert_eq!(status, StatusCode::OK);
    let records: Vec<Value> = serde_json::from_slice(&body).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["text"], "Món ăn này dở quá");
    assert_eq!(records[0]["sentiment"], "NEGATIVE");
    assert!(records[0]["id"].is_i64());

    let (_, body) = send(&app, get("/api/history")).await;
    let records: Vec<Value> = serde_json::from_slice(&body).unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_short_text_is_bad_request() {
    let app = router_with_builtin();
    let (status, body) = send(&app, post_sentiment(r#"{"text": "vui"}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"]["message"], "Câu quá ngắn! Hãy nhập tối thiểu 4 ký tự.");
    assert_eq!(json["error"]["type"], "invalid_request_error");
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = router_with_builtin();
    let (status, _) = send(&app, post_sentiment(r#"{"message": "thiếu trường text"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_history_limit_bounds() {
    let app = router_with_builtin();

    for uri in ["/api/history?limit=0", "/api/history?limit=201", "/api/history?limit=-3"] {
        let (status, _) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }

    let (status, _) = send(&app, get("/api/history?limit=200")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, get("/api/history?limit=abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_clear_history_is_idempotent() {
    let model = Arc::new(MockModel::new("neutral", 0.9));
    let app = build_router(app_state(in_memory_service(model, 50)), &[]);
    send(&app, post_sentiment(r#"{"text": "Bình thường"}"#)).await;

    for _ in 0..2 {
        let request = Request::builder()
            .method(Method::DELETE)
            .uri("/api/history")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());
    }

    let (_, body) = send(&app, get("/api/history")).await;
    let records: Vec<Value> = serde_json::from_slice(&body).unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_degraded_response_carries_warning() {
    let app = build_router(app_state(in_memory_service(Arc::new(FailingModel), 50)), &[]);
    let (status, body) = send(&app, post_sentiment(r#"{"text": "Bình thường thôi"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    let response: SentimentResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(response.sentiment.as_str(), "NEUTRAL");
    assert!(response.warning.is_some());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = router_with_builtin();
    let (status, _) = send(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_path_serves_web_ui() {
    let app = router_with_builtin();
    let (status, body) = send(&app, get("/lich-su")).await;

    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("<html"));
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let service = in_memory_service(Arc::new(LexiconModel::new().unwrap()), 50);
    let app = build_router(
        app_state(service),
        &["http://localhost:5173".to_string()],
    );

    let request = Request::builder()
        .uri("/api/health")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:5173"
    );
}
