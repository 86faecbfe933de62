//! `/reports/revenue`: margin revenue over confirmed orders.
//!
//! Every endpoint takes optional `from` / `to` RFC 3339 bounds on the order's
//! creation time.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;

use orderdesk_core::{ProductRevenue, RecipientRevenue, TotalRevenue};
use orderdesk_db::ReportRange;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

fn check_range(range: &ReportRange) -> ApiResult<()> {
    match (range.from, range.to) {
        (Some(from), Some(to)) if from > to => Err(ApiError::validation("'from' must not be after 'to'")),
        _ => Ok(()),
    }
}

/// GET /reports/revenue/products
pub async fn revenue_by_product(
    State(state): State<Arc<AppState>>,
    Query(range): Query<ReportRange>,
) -> ApiResult<Json<Vec<ProductRevenue>>> {
    check_range(&range)?;
    Ok(Json(state.db.reports().revenue_by_product(range).await?))
}

/// GET /reports/revenue/recipients
pub async fn revenue_by_recipient(
    State(state): State<Arc<AppState>>,
    Query(range): Query<ReportRange>,
) -> ApiResult<Json<Vec<RecipientRevenue>>> {
    check_range(&range)?;
    Ok(Json(state.db.reports().revenue_by_recipient(range).await?))
}

/// GET /reports/revenue/total
pub async fn total_revenue(
    State(state): State<Arc<AppState>>,
    Query(range): Query<ReportRange>,
) -> ApiResult<Json<TotalRevenue>> {
    check_range(&range)?;
    Ok(Json(state.db.reports().total_revenue(range).await?))
}
