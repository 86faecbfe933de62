//! Health check endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::AppState;

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let database = state.db.health_check().await;

    Json(serde_json::json!({
        "status": if database { "ok" } else { "degraded" },
        "service": "orderdesk",
        "version": env!("CARGO_PKG_VERSION"),
        "database": database,
    }))
}

/// Browsers ask for it on every visit.
pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}
