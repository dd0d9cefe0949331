//! Product route handlers.
//!
//! Every write goes through the [`IntegrityMaintainer`] so the owning
//! company's back-reference list follows the product.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde_json::{Value, json};
use tracing::instrument;

use stockpile_core::ProductId;

use crate::error::{AppError, Result};
use crate::models::{Product, ProductPayload, ProductWithCompany};
use crate::services::{Catalog, IntegrityMaintainer, InventoryError, ListProductsParams};
use crate::state::AppState;

/// An unparseable ID cannot match any product.
fn product_id(raw: &str) -> Result<ProductId> {
    raw.parse::<ProductId>()
        .map_err(|_| AppError::from(InventoryError::ProductNotFound(ProductId::new(0))))
}

/// List products.
///
/// GET /products?skip&limit&search&sort&companyId
#[instrument(skip(state, params))]
pub async fn index(
    State(state): State<AppState>,
    params: std::result::Result<Query<ListProductsParams>, QueryRejection>,
) -> Result<Json<Vec<ProductWithCompany>>> {
    let Query(params) = params?;
    let products = Catalog::new(state.store()).list(params).await?;
    Ok(Json(products))
}

/// Count all products.
///
/// GET /products/total
pub async fn total(State(state): State<AppState>) -> Result<Json<i64>> {
    let count = Catalog::new(state.store()).count().await?;
    Ok(Json(count))
}

/// Show one product with its company.
///
/// GET /products/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductWithCompany>> {
    let id = product_id(&id)?;
    let product = Catalog::new(state.store()).get(id).await?;
    Ok(Json(product))
}

/// Create a product and list it on its company.
///
/// POST /products
#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ProductPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>)> {
    let Json(payload) = payload?;
    let input = payload.into_new_product()?;

    let product = IntegrityMaintainer::new(state.store()).on_create(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Partially update a product, moving it between companies if `company` changes.
///
/// PATCH /products/{id}
#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<ProductPayload>, JsonRejection>,
) -> Result<Json<Product>> {
    let id = product_id(&id)?;
    let Json(payload) = payload?;
    let changes = payload.into_changes()?;

    let product = IntegrityMaintainer::new(state.store())
        .on_update(id, changes)
        .await?;
    Ok(Json(product))
}

/// Delete a product and remove it from its company.
///
/// DELETE /products/{id}
#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = product_id(&id)?;
    IntegrityMaintainer::new(state.store()).on_delete(id).await?;
    Ok(Json(json!({ "message": "Product deleted." })))
}
