//! # API Error Types
//!
//! Every failure leaves the server in one envelope:
//!
//! ```text
//! {
//!   "error": { "code": "NOT_FOUND", "message": "Order not found: 42", "details": {...} },
//!   "timestamp": "2026-03-01T12:00:00.000Z",
//!   "path": "/api/v1/orders/42"
//! }
//! ```
//!
//! Handlers return [`ApiError`]. Its `IntoResponse` sets the status and
//! parks the error in the response extensions; [`error_envelope`] then
//! writes the body, since only the middleware knows the request path.
//! Rejections produced by axum itself (bad JSON, wrong content type, body too
//! large) are caught by the same middleware.

use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use orderdesk_core::{CoreError, ErrorKind, ValidationError};
use orderdesk_db::DbError;

use crate::pdf::PdfError;

// =============================================================================
// Error Codes
// =============================================================================

/// Machine-readable error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    BadRequest,
    ValidationError,
    Conflict,
    Unauthorized,
    PayloadTooLarge,
    UnsupportedMediaType,
    DatabaseError,
    Internal,
}

impl ErrorCode {
    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::BadRequest | ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::NOT_FOUND => ErrorCode::NotFound,
            StatusCode::CONFLICT => ErrorCode::Conflict,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorCode::Unauthorized,
            StatusCode::PAYLOAD_TOO_LARGE => ErrorCode::PayloadTooLarge,
            StatusCode::UNSUPPORTED_MEDIA_TYPE => ErrorCode::UnsupportedMediaType,
            StatusCode::UNPROCESSABLE_ENTITY => ErrorCode::ValidationError,
            s if s.is_client_error() => ErrorCode::BadRequest,
            _ => ErrorCode::Internal,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_value(self) {
            Ok(Value::String(s)) => f.write_str(&s),
            _ => write!(f, "{self:?}"),
        }
    }
}

// =============================================================================
// ApiError
// =============================================================================

/// The error every handler returns.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<Value>,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.http_status()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match err.kind() {
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::BadRequest => ErrorCode::BadRequest,
            ErrorKind::Conflict => ErrorCode::Conflict,
            ErrorKind::Validation => ErrorCode::ValidationError,
        };
        let api = ApiError::new(code, err.to_string());
        match &err {
            CoreError::Validation(v) => api.with_details(serde_json::json!({ "reason": v.to_string() })),
            CoreError::InvalidOrderStatus { current_status, .. } => {
                api.with_details(serde_json::json!({ "status": current_status }))
            }
            _ => api,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        CoreError::Validation(err).into()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => core.into(),
            DbError::NotFound { entity, id } => {
                ApiError::not_found(format!("{entity} not found: {id}"))
            }
            DbError::UniqueViolation { field, value } => {
                ApiError::conflict(format!("Duplicate {field}: '{value}' already exists"))
                    .with_details(serde_json::json!({ "field": field }))
            }
            DbError::ForeignKeyViolation { message } => ApiError::bad_request(message),
            DbError::Busy(message) => {
                tracing::warn!(error = %message, "Database busy");
                ApiError::conflict("Database is busy, retry the request")
            }
            other => {
                tracing::error!(error = %other, "Database error");
                ApiError::new(ErrorCode::DatabaseError, "Database error")
            }
        }
    }
}

impl From<PdfError> for ApiError {
    fn from(err: PdfError) -> Self {
        tracing::error!(error = %err, "PDF rendering failed");
        ApiError::internal("Failed to render receipt PDF")
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        tracing::error!(error = %err, "File system error");
        ApiError::internal("Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status().is_server_error() {
            tracing::error!(code = %self.code, message = %self.message, "Request failed");
        } else {
            tracing::debug!(code = %self.code, message = %self.message, "Request rejected");
        }

        let mut response = self.status().into_response();
        response.extensions_mut().insert(self);
        response
    }
}

// =============================================================================
// Envelope Middleware
// =============================================================================

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: ErrorCode,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Value>,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
    timestamp: String,
    path: &'a str,
}

/// Writes the error envelope for [`ApiError`] responses and for any other
/// 4xx/5xx response produced by axum's extractors or fallback.
pub async fn error_envelope(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let error = match response.extensions_mut().remove::<ApiError>() {
        Some(error) => error,
        None => {
            let bytes = axum::body::to_bytes(std::mem::replace(response.body_mut(), Body::empty()), 64 * 1024)
                .await
                .unwrap_or_default();
            let message = String::from_utf8_lossy(&bytes).trim().to_string();
            let message = if message.is_empty() {
                status.canonical_reason().unwrap_or("Error").to_string()
            } else {
                message
            };
            ApiError::new(ErrorCode::from_status(status), message)
        }
    };

    let envelope = ErrorEnvelope {
        error: ErrorBody {
            code: error.code,
            message: &error.message,
            details: error.details.as_ref(),
        },
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        path: &path,
    };

    let mut enveloped = (status, Json(envelope)).into_response();
    for (name, value) in response.headers() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            enveloped.headers_mut().insert(name.clone(), value.clone());
        }
    }
    enveloped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_serialize_screaming_snake_case() {
        assert_eq!(ErrorCode::NotFound.to_string(), "NOT_FOUND");
        assert_eq!(ErrorCode::ValidationError.to_string(), "VALIDATION_ERROR");
        assert_eq!(ErrorCode::UnsupportedMediaType.to_string(), "UNSUPPORTED_MEDIA_TYPE");
    }

    #[test]
    fn test_core_errors_map_to_codes() {
        let err: ApiError = CoreError::ReceiptExists("o-1".into()).into();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ApiError = CoreError::OrderAlreadyCancelled.into();
        assert_eq!(err.code, ErrorCode::BadRequest);
        assert_eq!(err.message, "Order already cancelled");

        let err: ApiError = CoreError::OrderNotFound("o-1".into()).into();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_db_errors_map_to_codes() {
        let err: ApiError = DbError::Domain(CoreError::ProductsNotFound).into();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err: ApiError = DbError::UniqueViolation {
            field: "users.email".into(),
            value: "a@b.c".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::Conflict);

        let err: ApiError = DbError::Busy("database is locked".into()).into();
        assert_eq!(err.code, ErrorCode::Conflict);

        let err: ApiError = DbError::PoolExhausted.into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.message, "Database error");
    }

    #[test]
    fn test_status_fallback_codes() {
        assert_eq!(ErrorCode::from_status(StatusCode::UNPROCESSABLE_ENTITY), ErrorCode::ValidationError);
        assert_eq!(ErrorCode::from_status(StatusCode::METHOD_NOT_ALLOWED), ErrorCode::BadRequest);
        assert_eq!(ErrorCode::from_status(StatusCode::BAD_GATEWAY), ErrorCode::Internal);
    }
}
