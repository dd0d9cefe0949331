//! Integration tests for company endpoints.

use axum::http::StatusCode;
use serde_json::json;

use stockpile_integration_tests::{TestApp, id_of};
use stockpile_server::db::StoreOperation;

#[tokio::test]
async fn test_create_and_show_company() {
    let app = TestApp::new();

    let res = app
        .post(
            "/companies",
            &json!({ "name": "  Acme  ", "description": "Anvils and rockets" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["name"], "Acme");
    assert_eq!(res.body["products"], json!([]));

    let id = id_of(&res.body);
    let res = app.get(&format!("/companies/{id}")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["description"], "Anvils and rockets");
}

#[tokio::test]
async fn test_create_company_requires_name() {
    let app = TestApp::new();

    let res = app.post("/companies", &json!({ "description": "x" })).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.message(), Some("name is required"));

    let res = app.post("/companies", &json!({ "name": "   " })).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_companies() {
    let app = TestApp::new();
    app.create_company("Acme").await;
    app.create_company("Globex").await;

    let res = app.get("/companies").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_update_company_keeps_products() {
    let app = TestApp::new();
    let company = app.create_company("Acme").await;
    let product = app.create_product("Widget", company).await;

    let res = app
        .patch(&format!("/companies/{company}"), &json!({ "name": "Acme Corp" }))
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["name"], "Acme Corp");
    assert_eq!(res.body["products"], json!([product]));
}

#[tokio::test]
async fn test_missing_company() {
    let app = TestApp::new();

    let res = app.get("/companies/12").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.message(), Some("Company not found!"));

    let res = app.patch("/companies/12", &json!({ "name": "x" })).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.delete("/companies/abc").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_company_with_products_conflicts() {
    let app = TestApp::new();
    let company = app.create_company("Acme").await;
    let product = app.create_product("Widget", company).await;

    let res = app.delete(&format!("/companies/{company}")).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(
        res.message(),
        Some("Company still has products and cannot be deleted.")
    );

    // Once its products are gone the company can be removed.
    app.delete(&format!("/products/{product}")).await;
    let res = app.delete(&format!("/companies/{company}")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.message(), Some("Company deleted."));
    assert_eq!(
        app.get(&format!("/companies/{company}")).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_delete_company_with_stale_product_reference() {
    let app = TestApp::new();
    let from = app.create_company("Acme").await;
    let to = app.create_company("Globex").await;
    let product = app.create_product("Widget", from).await;

    app.store().fail_on(StoreOperation::UpdateProduct);
    let res = app
        .patch(&format!("/products/{product}"), &json!({ "company": to }))
        .await;
    app.store().clear_failure(StoreOperation::UpdateProduct);
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);

    app.delete(&format!("/products/{product}")).await;
    assert_eq!(app.get("/products/total").await.body, json!(0));
    assert_eq!(app.company_products(to).await, vec![product]);

    // No product points at `to`, so the leftover list entry does not block it.
    let res = app.delete(&format!("/companies/{to}")).await;
    assert_eq!(res.status, StatusCode::OK);
    let res = app.delete(&format!("/companies/{from}")).await;
    assert_eq!(res.status, StatusCode::OK);
}
