//! `/recipients`

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use orderdesk_core::input::{NewRecipient, RecipientPatch};
use orderdesk_core::{CoreError, Recipient};

use crate::error::ApiResult;
use crate::AppState;

pub async fn list(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Recipient>>> {
    Ok(Json(state.db.recipients().list().await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Recipient>> {
    let recipient = state
        .db
        .recipients()
        .get_by_id(&id)
        .await?
        .ok_or(CoreError::RecipientNotFound(id))?;

    Ok(Json(recipient))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewRecipient>,
) -> ApiResult<(StatusCode, Json<Recipient>)> {
    let recipient = state.db.recipients().create(&input).await?;
    Ok((StatusCode::CREATED, Json(recipient)))
}

/// An empty string clears an optional contact field.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<RecipientPatch>,
) -> ApiResult<Json<Recipient>> {
    Ok(Json(state.db.recipients().update(&id, &patch).await?))
}

/// Refused while any order references the recipient.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.recipients().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
