//! End-to-end tests for the assembled router.
//!
//! These drive the same router the binary serves, via tower's oneshot, so
//! they run without binding a port.

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use lab_info_service::api::{create_router, AppState};
use lab_info_service::config::{Config, Profile};
use lab_info_service::health::HealthRegistry;
use lab_info_service::metrics;

fn test_config(profile: Profile, data_dir: PathBuf) -> Config {
    Config {
        app_name: "lab-info-service".to_string(),
        app_version: "2.0.0-test".to_string(),
        build_number: "42".to_string(),
        build_id: "jenkins-42".to_string(),
        git_commit: "0123456789abcdef".to_string(),
        vcs_ref: None,
        build_date: "2024-01-01".to_string(),
        base_image: "debian:bookworm-slim".to_string(),
        environment: Some("testing".to_string()),
        app_env: None,
        port: 5000,
        data_dir,
        service_profile: profile,
        rust_log: "info".to_string(),
    }
}

fn test_app(profile: Profile) -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let prometheus = metrics::init_metrics("2.0.0-test", "42").unwrap();
    let config = test_config(profile, dir.path().to_path_buf());
    let state = AppState::new(config, HealthRegistry::with_defaults(), prometheus);
    (create_router(state), dir)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post_json(app: Router, uri: &str, body: Body) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn home_returns_app_info_with_required_fields() {
    let (app, _dir) = test_app(Profile::Core);

    let (status, body) = get(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], "2.0.0-test");
    assert!(!body["hostname"].as_str().unwrap().is_empty());
    assert!(!body["timestamp"].as_str().unwrap().is_empty());
    assert_eq!(body["build"]["number"], "42");
    assert_eq!(body["build"]["commit"], "0123456");
    assert_eq!(body["environment"], "testing");
}

#[tokio::test]
async fn home_responds_with_json_content_type() {
    let (app, _dir) = test_app(Profile::Core);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.starts_with("application/json"));
}

#[tokio::test]
async fn echo_reflects_the_request_body() {
    let (app, _dir) = test_app(Profile::Core);

    let (status, body) = post_json(app, "/echo", Body::from(r#"{"a":1}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["echo"], json!({"a": 1}));
    assert!(!body["received_at"].as_str().unwrap().is_empty());
    assert!(!body["processed_by"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn echo_with_empty_body_returns_empty_object() {
    let (app, _dir) = test_app(Profile::Core);

    let (status, body) = post_json(app, "/echo", Body::empty()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["echo"], json!({}));
}

#[tokio::test]
async fn echo_is_also_mounted_under_api_v1() {
    let (app, _dir) = test_app(Profile::Core);

    let (status, body) = post_json(app, "/api/v1/echo", Body::from(r#"{"b":2}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["echo"], json!({"b": 2}));
}

#[tokio::test]
async fn echo_rejects_malformed_json_with_400() {
    let (app, _dir) = test_app(Profile::Core);

    let (status, body) = post_json(app, "/echo", Body::from("{nope")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");
    assert_eq!(body["status_code"], 400);
}

#[tokio::test]
async fn env_dump_never_contains_sensitive_keys() {
    std::env::set_var("LAB_TEST_API_TOKEN", "hunter2");
    std::env::set_var("LAB_TEST_PLAIN", "visible");
    let (app, _dir) = test_app(Profile::Core);

    let (status, body) = get(app, "/env").await;

    assert_eq!(status, StatusCode::OK);
    let vars = body["environment_variables"].as_object().unwrap();
    assert!(vars.contains_key("LAB_TEST_PLAIN"));
    for key in vars.keys() {
        let upper = key.to_uppercase();
        for marker in ["SECRET", "PASSWORD", "KEY", "TOKEN"] {
            assert!(!upper.contains(marker), "sensitive key leaked: {key}");
        }
    }
    assert!(body["total_vars"].as_u64().unwrap() >= vars.len() as u64);
}

#[tokio::test]
async fn metrics_exposition_contains_prometheus_markers() {
    let (app, _dir) = test_app(Profile::Core);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.starts_with("text/plain"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(text.contains("# HELP"));
    assert!(text.contains("# TYPE"));
    assert!(
        text.lines()
            .any(|line| line.starts_with("app_info{") && line.ends_with(" 1")),
        "missing app_info sample in:\n{text}"
    );
}

#[tokio::test]
async fn build_info_reports_build_and_runtime_details() {
    let (app, _dir) = test_app(Profile::Core);

    let (status, body) = get(app, "/build-info").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["build"]["base_image"], "debian:bookworm-slim");
    assert_eq!(body["build"]["commit"], "0123456789abcdef");
    assert!(!body["runtime"]["hostname"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn api_status_catalogs_the_mounted_routes() {
    let (app, _dir) = test_app(Profile::Storage);

    let (status, body) = get(app, "/api/v1/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["api_version"], "v1");
    assert_eq!(body["status"], "operational");
    let paths: Vec<&str> = body["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    for expected in ["/", "/health", "/ready", "/metrics", "/counter", "/write", "/read"] {
        assert!(paths.contains(&expected), "missing {expected}");
    }
}

#[tokio::test]
async fn counter_increments_across_sequential_requests() {
    let (app, _dir) = test_app(Profile::Storage);

    let (status, body) = get(app.clone(), "/counter").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (_, body) = get(app.clone(), "/counter").await;
    assert_eq!(body["count"], 2);

    let (_, body) = get(app, "/counter").await;
    assert_eq!(body["count"], 3);
}

#[tokio::test]
async fn write_then_read_lists_the_new_file() {
    let (app, _dir) = test_app(Profile::Storage);

    let (status, body) =
        post_json(app.clone(), "/write", Body::from(r#"{"message":"hello"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"], json!({"message": "hello"}));
    assert!(body["file"].as_str().unwrap().ends_with(".json"));

    let (status, body) = get(app, "/read").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert!(body["files"][0]["name"]
        .as_str()
        .unwrap()
        .starts_with("data_"));
}

#[tokio::test]
async fn write_with_empty_body_uses_the_default_payload() {
    let (app, _dir) = test_app(Profile::Storage);

    let (status, body) = post_json(app, "/write", Body::empty()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"message": "test"}));
}

#[tokio::test]
async fn unknown_route_returns_structured_404() {
    let (app, _dir) = test_app(Profile::Core);

    let (status, body) = get(app, "/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["status_code"], 404);
    assert!(body["message"].as_str().unwrap().contains("/nope"));
}
