//! Integration tests for health checks and request IDs.

use axum::http::{Method, StatusCode};

use stockpile_integration_tests::TestApp;
use stockpile_server::db::StoreOperation;

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let res = app.get("/health").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, serde_json::Value::String("ok".to_owned()));
}

#[tokio::test]
async fn test_readiness_follows_store() {
    let app = TestApp::new();
    assert_eq!(app.get("/health/ready").await.status, StatusCode::OK);

    app.store().fail_on(StoreOperation::Ping);
    assert_eq!(
        app.get("/health/ready").await.status,
        StatusCode::SERVICE_UNAVAILABLE
    );

    app.store().clear_failure(StoreOperation::Ping);
    assert_eq!(app.get("/health/ready").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route() {
    let app = TestApp::new();
    assert_eq!(app.get("/nope").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_generated_or_reused() {
    let app = TestApp::new();

    let res = app.get("/health").await;
    let generated = res.request_id.unwrap_or_default();
    assert_eq!(generated.len(), 36, "{generated}");

    let res = app
        .send_with(
            Method::GET,
            "/health",
            None,
            None,
            &[("x-request-id", "edge-7f3a.1")],
        )
        .await;
    assert_eq!(res.request_id.as_deref(), Some("edge-7f3a.1"));

    let res = app
        .send_with(
            Method::GET,
            "/health",
            None,
            None,
            &[("x-request-id", "bad id with spaces")],
        )
        .await;
    assert_ne!(res.request_id.as_deref(), Some("bad id with spaces"));
}
