//! Universal error handling for the API

use aide::OperationOutput;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common_types::ErrorResponse;

use crate::issuer::IssuerError;

/// Application error type: a status code plus the `{ "error": ... }` body
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    inner: ErrorResponse,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            inner: ErrorResponse { error: msg.into() },
        }
    }

    /// HTTP status of the error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code, used for logging
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// Message returned to the caller
    #[must_use]
    pub fn message(&self) -> &str {
        &self.inner.error
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error based on status code
        match self.status.as_u16() {
            400..=499 => tracing::warn!("Client error: {} - {}", self.code, self.inner.error),
            500..=599 => tracing::error!("Server error: {} - {}", self.code, self.inner.error),
            _ => {}
        }

        (self.status, Json(self.inner)).into_response()
    }
}

/// Convert issuer errors to application errors
impl From<IssuerError> for AppError {
    fn from(err: IssuerError) -> Self {
        match &err {
            IssuerError::ConfigurationError(msg) => {
                tracing::error!("Configuration error: {msg}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "configuration_error",
                    msg.clone(),
                )
            }
            IssuerError::InvalidPayload(msg) => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_payload", msg.clone())
            }
            IssuerError::InvalidMonth => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_month", err.to_string())
            }
            IssuerError::Unauthorized => {
                Self::new(StatusCode::UNAUTHORIZED, "unauthorized", err.to_string())
            }
            IssuerError::IssuerInternalError(detail) => {
                tracing::error!("Issuer internal error: {detail}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    err.to_string(),
                )
            }
        }
    }
}

impl OperationOutput for AppError {
    type Inner = ErrorResponse;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<ErrorResponse>::operation_response(ctx, operation)
    }
}
