//! REST surface tests driven through the router with `oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use sitelens::{ExtractConfig, Extractor, NoiseRules};
use sitelens_server::{router, AppState};
use tower::ServiceExt;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app(request_timeout: Duration) -> axum::Router {
    let extractor = Extractor::static_only(ExtractConfig::default(), NoiseRules::builtin().clone());
    router(Arc::new(AppState {
        extractor,
        request_timeout,
    }))
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn scrape_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/scrape")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_browser_availability() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, json) = send(app(Duration::from_secs(5)), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({"status": "ok", "browser": false}));
}

#[tokio::test]
async fn test_healthz_alias() {
    let request = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let (status, json) = send(app(Duration::from_secs(5)), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_scrape_returns_wrapped_result() {
    let server = MockServer::start().await;
    let text = "Plenty of readable words in this article body. ".repeat(15);
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<html><head><title>Story</title></head><body><article><h1>Story</h1><p>{text}</p></article></body></html>"
        )))
        .mount(&server)
        .await;

    let body = serde_json::json!({ "url": server.uri() }).to_string();
    let (status, json) = send(app(Duration::from_secs(10)), scrape_request(&body)).await;

    assert_eq!(status, StatusCode::OK);
    let result = &json["result"];
    assert_eq!(result["meta"]["title"], "Story");
    assert_eq!(result["sections"][0]["type"], "section");
    assert_eq!(result["sections"][0]["label"], "Story");
    assert_eq!(result["interactions"], serde_json::json!({"clicks": [], "scrolls": 0, "pages": []}));
    assert!(result["scrapedAt"].as_str().unwrap().ends_with('Z'));
    assert!(result["errors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_scrape_rejects_malformed_url() {
    let (status, json) = send(
        app(Duration::from_secs(5)),
        scrape_request(r#"{"url":"notaurl"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "malformed_input");
}

#[tokio::test]
async fn test_scrape_rejects_malformed_body() {
    let (status, json) = send(app(Duration::from_secs(5)), scrape_request(r#"{"link":1}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "malformed_input");
}

#[tokio::test]
async fn test_scrape_times_out_with_504() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let body = serde_json::json!({ "url": server.uri() }).to_string();
    let (status, json) = send(app(Duration::from_millis(100)), scrape_request(&body)).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json["error"]["code"], "timeout");
    assert!(json.get("result").is_none());
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let request = Request::builder()
        .uri("/health")
        .header("origin", "https://somewhere.test")
        .body(Body::empty())
        .unwrap();
    let response = app(Duration::from_secs(5)).oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}
