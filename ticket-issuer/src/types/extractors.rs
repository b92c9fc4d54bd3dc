//! Custom extractors for request parsing

use std::convert::Infallible;

use aide::operation::OperationInput;
use aide::OperationOutput;
use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
    Json,
};
use common_types::UploadRequest;
use serde_json::Value;

use crate::issuer::IssuerError;
use crate::types::error::AppError;

const INVALID_JSON_MESSAGE: &str = "Invalid JSON payload.";

/// Upload request body
///
/// An empty body is read as `{}`. Anything that is not a JSON object with
/// correctly typed fields is rejected as an invalid payload.
pub struct UploadRequestJson(pub UploadRequest);

impl UploadRequestJson {
    /// Parses a raw request body
    ///
    /// # Errors
    ///
    /// Returns `IssuerError::InvalidPayload` when the body is not a valid upload request
    pub fn parse(body: &[u8]) -> Result<UploadRequest, IssuerError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(UploadRequest::default());
        }

        let invalid = |err: &dyn std::fmt::Display| {
            tracing::debug!("Rejected upload request body: {err}");
            IssuerError::InvalidPayload(INVALID_JSON_MESSAGE.to_string())
        };

        // Derived struct deserializers also accept arrays; only objects are requests
        let value: Value = serde_json::from_slice(body).map_err(|err| invalid(&err))?;
        if !value.is_object() {
            return Err(invalid(&"body is not a JSON object"));
        }

        serde_json::from_value(value).map_err(|err| invalid(&err))
    }
}

impl<S> FromRequest<S> for UploadRequestJson
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state).await.map_err(|err| {
            tracing::debug!("Failed to read request body: {err}");
            AppError::from(IssuerError::InvalidPayload(INVALID_JSON_MESSAGE.to_string()))
        })?;

        Ok(Self(Self::parse(&body)?))
    }
}

impl OperationInput for UploadRequestJson {
    fn operation_input(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) {
        // Same wire shape as Json<UploadRequest>
        Json::<UploadRequest>::operation_input(ctx, operation);
    }

    fn inferred_early_responses(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Vec<(Option<u16>, aide::openapi::Response)> {
        AppError::inferred_responses(ctx, operation)
    }
}

/// Token from an `Authorization: Bearer <token>` header, if any
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BearerToken(pub Option<String>);

impl BearerToken {
    /// Extracts the token from a raw `Authorization` header value
    #[must_use]
    pub fn from_header_value(value: &str) -> Self {
        Self(
            value
                .strip_prefix("Bearer ")
                .map(|token| token.trim().to_string()),
        )
    }
}

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(Self::from_header_value)
            .unwrap_or_default())
    }
}

impl OperationInput for BearerToken {}
