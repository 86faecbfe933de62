//! `/orders`: the order lifecycle.
//!
//! ```text
//! POST   /orders               create draft (priced from the catalog)
//! PATCH  /orders/{id}          edit draft
//! PATCH  /orders/{id}/confirm  draft → confirmed
//! PATCH  /orders/{id}/cancel   draft|confirmed → cancelled
//! DELETE /orders/{id}          any state; receipts and their files go too
//! ```

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use orderdesk_core::input::{NewOrder, OrderPatch};
use orderdesk_core::{Order, OrderDetails, OrderStatus, Page, DEFAULT_PAGE_LIMIT};

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<OrderStatus>,
}

/// GET /orders?offset&limit&status
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListOrdersQuery>,
) -> ApiResult<Json<Page<OrderDetails>>> {
    let page = state
        .db
        .orders()
        .find_all(
            query.offset.unwrap_or(0),
            query.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
            query.status,
        )
        .await?;

    Ok(Json(page))
}

/// GET /orders/{id}
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderDetails>> {
    Ok(Json(state.db.orders().find_one(&id).await?))
}

/// POST /orders
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewOrder>,
) -> ApiResult<(StatusCode, Json<OrderDetails>)> {
    let order = state.db.orders().create(&input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// PATCH /orders/{id}
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<OrderPatch>,
) -> ApiResult<Json<OrderDetails>> {
    Ok(Json(state.db.orders().update(&id, &patch).await?))
}

/// PATCH /orders/{id}/confirm
pub async fn confirm(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.db.orders().confirm(&id).await?))
}

/// PATCH /orders/{id}/cancel
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.db.orders().cancel(&id).await?))
}

/// DELETE /orders/{id}
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.receipts.delete_files_for_order(&id).await;
    state.db.orders().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
