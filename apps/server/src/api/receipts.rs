//! `/receipts`: generation, download, printing and maintenance.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use orderdesk_core::{Receipt, ReceiptDetails, ReceiptSummary, ReceiptVariant};

use crate::error::{ApiError, ApiResult};
use crate::printing::PrintOutcome;
use crate::AppState;

async fn generate(
    state: &AppState,
    order_id: &str,
    variant: ReceiptVariant,
) -> ApiResult<(StatusCode, Json<Receipt>)> {
    let receipt = state.receipts.generate(order_id, variant).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// POST /receipts/orders/{order_id}/receipt
pub async fn generate_default(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> ApiResult<(StatusCode, Json<Receipt>)> {
    generate(&state, &order_id, ReceiptVariant::Default).await
}

/// POST /receipts/orders/{order_id}/receipt/compact
pub async fn generate_compact(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> ApiResult<(StatusCode, Json<Receipt>)> {
    generate(&state, &order_id, ReceiptVariant::Compact).await
}

/// POST /receipts/orders/{order_id}/receipt/standard
pub async fn generate_standard(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> ApiResult<(StatusCode, Json<Receipt>)> {
    generate(&state, &order_id, ReceiptVariant::Standard).await
}

/// GET /receipts
pub async fn list(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<ReceiptSummary>>> {
    Ok(Json(state.receipts.list().await?))
}

/// GET /receipts/{id}
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReceiptDetails>> {
    Ok(Json(state.receipts.details(&id).await?))
}

/// GET /receipts/{id}/pdf
pub async fn pdf(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<Response> {
    let pdf = state.receipts.pdf(&id).await?;

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", pdf.filename))
        .map_err(|_| ApiError::internal("Invalid receipt file name"))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (header::PRAGMA, HeaderValue::from_static("no-cache")),
        ],
        pdf.bytes,
    )
        .into_response())
}

/// GET /receipts/printers
pub async fn printers(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.receipts.printers().await)
}

#[derive(Debug, Default, Deserialize)]
pub struct PrintQuery {
    pub printer: Option<String>,
}

/// POST /receipts/{id}/print?printer=
pub async fn print(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<PrintQuery>,
) -> ApiResult<Json<PrintOutcome>> {
    Ok(Json(state.receipts.print(&id, query.printer.as_deref()).await?))
}

/// POST /receipts/{id}/regenerate
pub async fn regenerate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Receipt>> {
    Ok(Json(state.receipts.regenerate(&id).await?))
}

/// POST /receipts/{id}/void
pub async fn void(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Receipt>> {
    Ok(Json(state.receipts.void(&id).await?))
}
