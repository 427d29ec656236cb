//! JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use roomie_core::LedgerError;
use roomie_shared::AppError;

/// Error returned by handlers.
///
/// Renders as `{ "error": code, "message": text }`. Server-side failures are
/// logged and answered with a generic message.
#[derive(Debug)]
pub struct ApiError {
    code: &'static str,
    inner: AppError,
}

impl ApiError {
    /// A 400 with a caller-facing message.
    #[must_use]
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            inner: AppError::Validation(message.into()),
        }
    }

    /// The HTTP status of this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.inner.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self {
            code: err.error_code(),
            inner: err.into(),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self {
            code: err.error_code(),
            inner: err,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.inner.is_client_error() {
            self.inner.to_string()
        } else {
            error!(error = %self.inner, code = self.code, "Request failed");
            "An error occurred".to_string()
        };

        (
            status,
            Json(json!({
                "error": self.code,
                "message": message,
            })),
        )
            .into_response()
    }
}
