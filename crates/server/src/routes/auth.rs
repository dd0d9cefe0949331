//! Authentication route handlers.
//!
//! Login stores a [`CurrentUser`] in the server-side session; logout flushes
//! it. Clients only ever hold the session cookie.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Serialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::{AuthError, AuthService, LoginPayload, RegisterPayload};
use crate::state::AppState;

/// Response body for register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub message: &'static str,
}

/// Register a new user.
///
/// POST /auth/register
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let Json(payload) = payload?;
    let user = AuthService::new(state.store()).register(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user,
            message: "User created successfully",
        }),
    ))
}

/// Log in with email and password.
///
/// POST /auth/login
#[instrument(skip(state, session, payload))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    payload: std::result::Result<Json<LoginPayload>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(payload) = payload?;
    let user = AuthService::new(state.store()).login(payload).await?;

    set_current_user(&session, &CurrentUser::from(&user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user = %user.id, "user logged in");

    Ok(Json(AuthResponse {
        user,
        message: "Logged in successfully",
    }))
}

/// Log out, deleting the session.
///
/// POST /auth/logout
pub async fn logout(OptionalAuth(current): OptionalAuth, session: Session) -> Result<Json<Value>> {
    clear_current_user(&session).await?;
    if let Some(current) = current {
        tracing::info!(user = %current.id, "user logged out");
    }
    clear_sentry_user();
    Ok(Json(json!({ "message": "Logged out." })))
}

/// The logged-in user.
///
/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<User>> {
    let user = AuthService::new(state.store())
        .get_user(current.id)
        .await
        .map_err(|e| match e {
            AuthError::UserNotFound => AppError::Unauthorized("Not logged in".to_owned()),
            other => other.into(),
        })?;
    Ok(Json(user))
}
