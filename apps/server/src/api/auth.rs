//! `/auth`: registration, login and the caller's profile.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use orderdesk_core::validation::{validate_email, validate_optional_text, validate_password};
use orderdesk_core::UserProfile;

use crate::auth::{hash_password, verify_password, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default, alias = "first_name")]
    pub first_name: Option<String>,
    #[serde(default, alias = "last_name")]
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: UserProfile,
}

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    validate_email(&req.email)?;
    validate_password(&req.password)?;
    validate_optional_text("firstName", req.first_name.as_deref())?;
    validate_optional_text("lastName", req.last_name.as_deref())?;

    let password_hash = hash_password(&req.password)?;
    let user = state
        .db
        .users()
        .create(
            &req.email,
            &password_hash,
            req.first_name.as_deref().map(str::trim).filter(|s| !s.is_empty()),
            req.last_name.as_deref().map(str::trim).filter(|s| !s.is_empty()),
        )
        .await?;

    let access_token = state.jwt.generate_access_token(&user.id, &user.email)?;
    info!(user_id = %user.id, email = %user.email, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            access_token,
            user: user.profile(),
        }),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let invalid = || ApiError::unauthorized("Invalid email or password");

    let user = state
        .db
        .users()
        .find_by_email(&req.email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(invalid());
    }
    if !user.is_active {
        return Err(ApiError::unauthorized("Account is disabled"));
    }

    let access_token = state.jwt.generate_access_token(&user.id, &user.email)?;
    info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        access_token,
        user: user.profile(),
    }))
}

/// GET /auth/profile
pub async fn profile(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<UserProfile>> {
    let user = state
        .db
        .users()
        .get_by_id(&caller.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;

    Ok(Json(user.profile()))
}
