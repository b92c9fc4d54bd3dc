//! Error types for ticket issuing

use thiserror::Error;

use crate::media_storage::BucketError;

/// Errors returned while validating a request or issuing a ticket
#[derive(Error, Debug)]
pub enum IssuerError {
    /// Required server configuration is missing
    #[error("{0}")]
    ConfigurationError(String),

    /// Request body could not be parsed or violates a field constraint
    #[error("{0}")]
    InvalidPayload(String),

    /// Month missing or not on the allow-list
    #[error("Month is required and must match an allowed value.")]
    InvalidMonth,

    /// Bearer token missing or wrong while a shared secret is configured
    #[error("Unauthorized")]
    Unauthorized,

    /// Credential generation failed; the detail is logged, never returned
    #[error("Failed to create upload URL.")]
    IssuerInternalError(String),
}

impl From<BucketError> for IssuerError {
    fn from(error: BucketError) -> Self {
        Self::IssuerInternalError(error.to_string())
    }
}
