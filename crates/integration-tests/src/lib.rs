//! Integration tests for Stockpile.
//!
//! Tests drive the full router (sessions, CORS, request IDs, tracing) in
//! process against the in-memory record store, so no database or running
//! server is required.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p stockpile-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `products` - Product CRUD and company back-reference integrity
//! - `companies` - Company CRUD and delete protection
//! - `auth` - Registration, login sessions, logout

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

use stockpile_server::config::ServerConfig;
use stockpile_server::db::MemoryStore;
use stockpile_server::routes;
use stockpile_server::state::AppState;

/// Largest response body the helpers will buffer.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// A response reduced to what the tests assert on.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    /// `name=value` of the session cookie, if one was set.
    pub cookie: Option<String>,
    /// The echoed `x-request-id` header.
    pub request_id: Option<String>,
}

impl TestResponse {
    /// The `message` field of an error or status body.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }
}

/// An application instance backed by a fresh in-memory store.
pub struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// Build the full application with empty stores.
    ///
    /// # Panics
    ///
    /// Panics if the fixed test configuration fails to parse.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn new() -> Self {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/stockpile_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 5000,
            base_url: Url::parse("http://localhost:5000").unwrap(),
            cors_origins: Vec::new(),
            sentry_dsn: None,
            sentry_environment: None,
        };

        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(config, store.clone());
        let router = routes::app(state, tower_sessions::MemoryStore::default());

        Self { router, store }
    }

    /// The backing store, for failure injection and direct inspection.
    #[must_use]
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Send a request without a body.
    pub async fn request(&self, method: Method, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(method, uri, None, cookie).await
    }

    /// Send a request with a JSON body.
    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        body: &Value,
        cookie: Option<&str>,
    ) -> TestResponse {
        self.send(method, uri, Some(body.to_string()), cookie).await
    }

    /// `GET` without a session.
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    /// `POST` a JSON body without a session.
    pub async fn post(&self, uri: &str, body: &Value) -> TestResponse {
        self.json(Method::POST, uri, body, None).await
    }

    /// `PATCH` a JSON body without a session.
    pub async fn patch(&self, uri: &str, body: &Value) -> TestResponse {
        self.json(Method::PATCH, uri, body, None).await
    }

    /// `DELETE` without a session.
    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    /// Create a company and return its ID.
    ///
    /// # Panics
    ///
    /// Panics if creation does not return 201 with a numeric ID.
    pub async fn create_company(&self, name: &str) -> i64 {
        let res = self
            .post("/companies", &serde_json::json!({ "name": name }))
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
        id_of(&res.body)
    }

    /// Create a product owned by `company` and return its ID.
    ///
    /// # Panics
    ///
    /// Panics if creation does not return 201 with a numeric ID.
    pub async fn create_product(&self, name: &str, company: i64) -> i64 {
        let res = self
            .post(
                "/products",
                &serde_json::json!({
                    "name": name,
                    "category": "Parts",
                    "quantity": 5,
                    "unit": "pcs",
                    "company": company,
                }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
        id_of(&res.body)
    }

    /// The product IDs listed on a company, in list order.
    ///
    /// # Panics
    ///
    /// Panics if the company cannot be fetched.
    pub async fn company_products(&self, company: i64) -> Vec<i64> {
        let res = self.get(&format!("/companies/{company}")).await;
        assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
        res.body
            .get("products")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default()
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<String>,
        cookie: Option<&str>,
    ) -> TestResponse {
        self.send_with(method, uri, body, cookie, &[]).await
    }

    /// Send a request with extra headers.
    #[allow(clippy::unwrap_used)]
    pub async fn send_with(
        &self,
        method: Method,
        uri: &str,
        body: Option<String>,
        cookie: Option<&str>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = builder
            .body(body.map_or_else(Body::empty, Body::from))
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_owned);
        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let bytes = to_bytes(response.into_body(), MAX_BODY_BYTES).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            body,
            cookie,
            request_id,
        }
    }
}

/// The numeric `id` field of a JSON object.
///
/// # Panics
///
/// Panics if `id` is missing or not an integer.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn id_of(body: &Value) -> i64 {
    body.get("id").and_then(Value::as_i64).unwrap()
}
