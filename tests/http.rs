//! Router tests that need no reachable database.
//! The pool is created lazily against a closed port.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use gen_api::{app, db, AppConfig, AppState};
use serde_json::{json, Value};
use std::collections::HashMap;
use tower::ServiceExt;

fn test_app() -> Router {
    let vars: HashMap<String, String> = [
        ("DATABASE_URL", "postgres://nobody@127.0.0.1:1/none"),
        ("DB_MIN_CONNECTIONS", "0"),
        ("DB_ACQUIRE_TIMEOUT_SECS", "1"),
        ("BODY_LIMIT_BYTES", "1024"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    let config = AppConfig::from_vars(&vars).expect("config");
    let pool = db::connect_lazy(&config).expect("lazy pool");
    app(AppState::new(pool, config.db_schema.clone()), &config)
}

async fn send(method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = test_app().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_is_ok() {
    let (status, body) = send(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = send(Method::GET, "/version", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "gen-api");
}

#[tokio::test]
async fn ready_reports_unreachable_database() {
    let (status, body) = send(Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "unavailable");
}

#[tokio::test]
async fn body_rejections_keep_their_status() {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/items/products")
        .body(Body::from(r#"{"data":[{"name":"x"}]}"#))
        .unwrap();
    let resp = test_app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "unsupported_media_type");

    let big = json!({"data": [{"name": "x".repeat(4096)}]});
    let (status, body) = send(Method::POST, "/api/v1/items/products", Some(big)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "payload_too_large");
}

#[tokio::test]
async fn invalid_table_name_is_422() {
    let (status, body) = send(Method::POST, "/api/v1/items/1products", Some(json!({"data": [{"name": "x"}]}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "invalid_identifier");

    let long = "t".repeat(64);
    let (status, _) = send(Method::GET, &format!("/api/v1/items/{}", long), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn malformed_body_is_400() {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/items/products")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = test_app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "bad_request");

    let (status, _) = send(Method::POST, "/api/v1/items/products", Some(json!({"rows": []}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_payloads_are_422() {
    let (status, body) = send(Method::POST, "/api/v1/items/products", Some(json!({"data": []}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_input");

    let (status, _) = send(Method::PUT, "/api/v1/items/products/1", Some(json!({"data": {}}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn non_positive_ids_are_422() {
    for uri in ["/api/v1/items/products/0", "/api/v1/items/products/-5"] {
        let (status, body) = send(Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", uri);
        assert_eq!(body["error"], "invalid_id");
    }
    let (status, _) = send(Method::DELETE, "/api/v1/items/products/a.b", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn bad_sort_is_422() {
    let (status, body) = send(Method::GET, "/api/v1/items/products?sort=sideways", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_input");

    let (status, _) = send(Method::GET, "/api/v1/items/products?order_by=price%3Bdrop", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
