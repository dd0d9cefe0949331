//! Company route handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::{Value, json};
use tracing::instrument;

use stockpile_core::CompanyId;

use crate::error::{AppError, Result};
use crate::models::{Company, CompanyPayload};
use crate::services::{CompanyService, InventoryError};
use crate::state::AppState;

fn company_id(raw: &str) -> Result<CompanyId> {
    raw.parse::<CompanyId>()
        .map_err(|_| AppError::from(InventoryError::CompanyNotFound(CompanyId::new(0))))
}

/// GET /companies
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Company>>> {
    let companies = CompanyService::new(state.store()).list().await?;
    Ok(Json(companies))
}

/// GET /companies/{id}
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Company>> {
    let id = company_id(&id)?;
    let company = CompanyService::new(state.store()).get(id).await?;
    Ok(Json(company))
}

/// POST /companies
#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CompanyPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Company>)> {
    let Json(payload) = payload?;
    let input = payload.into_new_company()?;

    let company = CompanyService::new(state.store()).create(input).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

/// PATCH /companies/{id}
#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<CompanyPayload>, JsonRejection>,
) -> Result<Json<Company>> {
    let id = company_id(&id)?;
    let Json(payload) = payload?;
    let changes = payload.into_changes()?;

    let company = CompanyService::new(state.store()).update(id, changes).await?;
    Ok(Json(company))
}

/// DELETE /companies/{id}
///
/// Refused with 409 while the company still owns products.
#[instrument(skip(state))]
pub async fn destroy(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>> {
    let id = company_id(&id)?;
    CompanyService::new(state.store()).delete(id).await?;
    Ok(Json(json!({ "message": "Company deleted." })))
}
