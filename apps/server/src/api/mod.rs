//! HTTP routes.

pub mod auth;
pub mod health;
pub mod orders;
pub mod products;
pub mod recipients;
pub mod receipts;
pub mod reports;
pub mod settings;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, Uri};
use axum::routing::{get, patch, post};
use axum::{middleware, Router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::error::{error_envelope, ApiError};
use crate::AppState;

/// Create the combined router
pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.body_limit_bytes;
    let prefix = state.config.route_prefix();

    // Public (no auth)
    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    // Bearer token, plus x-api-key when configured
    let protected = Router::new()
        .route("/auth/profile", get(auth::profile))
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            get(products::get).patch(products::update).delete(products::delete),
        )
        .route("/recipients", get(recipients::list).post(recipients::create))
        .route(
            "/recipients/{id}",
            get(recipients::get).patch(recipients::update).delete(recipients::delete),
        )
        .route("/orders", get(orders::list).post(orders::create))
        .route(
            "/orders/{id}",
            get(orders::get).patch(orders::update).delete(orders::delete),
        )
        .route("/orders/{id}/confirm", patch(orders::confirm))
        .route("/orders/{id}/cancel", patch(orders::cancel))
        .route("/receipts", get(receipts::list))
        .route("/receipts/printers", get(receipts::printers))
        .route("/receipts/orders/{order_id}/receipt", post(receipts::generate_default))
        .route("/receipts/orders/{order_id}/receipt/compact", post(receipts::generate_compact))
        .route("/receipts/orders/{order_id}/receipt/standard", post(receipts::generate_standard))
        .route("/receipts/{id}", get(receipts::get))
        .route("/receipts/{id}/pdf", get(receipts::pdf))
        .route("/receipts/{id}/print", post(receipts::print))
        .route("/receipts/{id}/regenerate", post(receipts::regenerate))
        .route("/receipts/{id}/void", post(receipts::void))
        .route(
            "/settings/company-name",
            get(settings::company_name).post(settings::update_company_name),
        )
        .route("/settings/logo", get(settings::logo))
        .route("/settings/logo/upload", post(settings::upload_logo))
        .route("/settings/logo/delete", post(settings::delete_logo))
        .route("/reports/revenue/products", get(reports::revenue_by_product))
        .route("/reports/revenue/recipients", get(reports::revenue_by_recipient))
        .route("/reports/revenue/total", get(reports::total_revenue))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let api = public.merge(protected);
    let api = if prefix.is_empty() {
        api
    } else {
        Router::new().nest(&prefix, api)
    };

    Router::new()
        .route("/health", get(health::health_check))
        .route("/favicon.ico", get(health::favicon))
        .merge(api)
        .fallback(not_found)
        .with_state(state.clone())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors_layer(&state.config.cors_origin_list()))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(error_envelope))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}

async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::not_found(format!("Cannot {method} {}", uri.path()))
}
