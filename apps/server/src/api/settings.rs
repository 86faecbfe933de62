//! `/settings`: company name and logo used on receipts.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::services::CompanySettings;
use crate::AppState;

/// Multipart field carrying the logo
const LOGO_FIELD: &str = "logo";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyNameRequest {
    #[serde(default, alias = "company_name")]
    pub company_name: String,
}

#[derive(Debug, Serialize)]
pub struct CompanyNameResponse {
    pub message: &'static str,
    #[serde(flatten)]
    pub settings: CompanySettings,
}

#[derive(Debug, Serialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: &'static str,
}

/// GET /settings/company-name
pub async fn company_name(State(state): State<Arc<AppState>>) -> Json<CompanySettings> {
    Json(state.settings.company().await)
}

/// POST /settings/company-name
pub async fn update_company_name(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompanyNameRequest>,
) -> ApiResult<Json<CompanyNameResponse>> {
    let settings = state.settings.set_company_name(&req.company_name).await?;
    Ok(Json(CompanyNameResponse {
        message: "Company name updated successfully",
        settings,
    }))
}

/// POST /settings/logo/upload (multipart, field `logo`)
pub async fn upload_logo(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<serde_json::Value>> {
    let mut upload: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Multipart error: {e}")))?
    {
        if field.name() != Some(LOGO_FIELD) {
            continue;
        }
        let original_name = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Read error: {e}")))?;
        upload = Some((original_name, data.to_vec()));
        break;
    }

    let (original_name, data) = upload.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
    let info = state.settings.save_logo(data).await?;

    Ok(Json(serde_json::json!({
        "message": "Logo uploaded successfully",
        "filename": info.filename,
        "originalName": original_name,
        "size": info.size,
        "width": info.width,
        "height": info.height,
    })))
}

/// GET /settings/logo
pub async fn logo(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let bytes = state
        .settings
        .logo()
        .await?
        .ok_or_else(|| ApiError::not_found("Logo not found"))?;

    Ok(([(header::CONTENT_TYPE, HeaderValue::from_static("image/png"))], bytes).into_response())
}

/// POST /settings/logo/delete
pub async fn delete_logo(State(state): State<Arc<AppState>>) -> ApiResult<Json<ActionResult>> {
    let deleted = state.settings.delete_logo().await?;
    Ok(Json(ActionResult {
        success: deleted,
        message: if deleted {
            "Logo deleted successfully"
        } else {
            "Logo not found"
        },
    }))
}
