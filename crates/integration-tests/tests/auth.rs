//! Integration tests for registration and session login.

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use stockpile_integration_tests::TestApp;
use stockpile_server::db::StoreOperation;

fn registration(email: &str, user_name: &str) -> Value {
    json!({
        "email": email,
        "userName": user_name,
        "password": "correct horse battery",
        "firstName": "Ana",
        "lastName": "Lima",
    })
}

#[tokio::test]
async fn test_register_creates_user() {
    let app = TestApp::new();

    let res = app
        .post("/auth/register", &registration("Ana@Example.com", "ana"))
        .await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.message(), Some("User created successfully"));
    assert_eq!(res.body["user"]["email"], "ana@example.com");
    assert_eq!(res.body["user"]["userName"], "ana");
    assert!(res.body["user"].get("password").is_none());
    assert!(res.body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_then_username() {
    let app = TestApp::new();
    app.post("/auth/register", &registration("ana@example.com", "ana"))
        .await;

    let res = app
        .post("/auth/register", &registration("ana@example.com", "ana"))
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.message(), Some("User with given email already exists!"));

    let res = app
        .post("/auth/register", &registration("other@example.com", "ana"))
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(
        res.message(),
        Some("User with given username already exists!")
    );
}

#[tokio::test]
async fn test_register_validation() {
    let app = TestApp::new();

    let res = app
        .post("/auth/register", &registration("not-an-email", "ana"))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let mut weak = registration("ana@example.com", "ana");
    weak["password"] = json!("short");
    let res = app.post("/auth/register", &weak).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .post("/auth/register", &json!({ "email": "ana@example.com" }))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_store_failure() {
    let app = TestApp::new();
    app.store().fail_on(StoreOperation::InsertUser);

    let res = app
        .post("/auth/register", &registration("ana@example.com", "ana"))
        .await;

    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.message(), Some("Internal Server Error"));
}

#[tokio::test]
async fn test_login_session_lifecycle() {
    let app = TestApp::new();
    app.post("/auth/register", &registration("ana@example.com", "ana"))
        .await;

    let res = app.get("/auth/me").await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app
        .post(
            "/auth/login",
            &json!({ "email": "ANA@example.com", "password": "correct horse battery" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.message(), Some("Logged in successfully"));
    let cookie = res.cookie.unwrap_or_default();
    assert!(cookie.starts_with("stockpile_session="), "{cookie}");

    let res = app.request(Method::GET, "/auth/me", Some(&cookie)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["userName"], "ana");

    let res = app.request(Method::POST, "/auth/logout", Some(&cookie)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.message(), Some("Logged out."));

    let res = app.request(Method::GET, "/auth/me", Some(&cookie)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = TestApp::new();
    app.post("/auth/register", &registration("ana@example.com", "ana"))
        .await;

    let res = app
        .post(
            "/auth/login",
            &json!({ "email": "ana@example.com", "password": "wrong password" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.message(), Some("Invalid email or password"));
    assert!(res.cookie.is_none());

    let res = app
        .post(
            "/auth/login",
            &json!({ "email": "nobody@example.com", "password": "correct horse battery" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.message(), Some("Invalid email or password"));
}
