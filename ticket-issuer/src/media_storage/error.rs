//! Error types for bucket operations

use aws_credential_types::provider::error::CredentialsError;
use thiserror::Error;

/// Result type for bucket operations
pub type BucketResult<T> = Result<T, BucketError>;

/// Errors that can occur while producing presigned POST credentials
#[derive(Error, Debug)]
pub enum BucketError {
    /// No credentials provider could be resolved from the AWS configuration
    #[error("Credentials provider not configured")]
    MissingCredentialsProvider,

    /// The credentials provider failed to produce credentials
    #[error("Failed to load AWS credentials: {0}")]
    CredentialsError(String),

    /// Policy serialization or HMAC signing failed
    #[error("Failed to sign POST policy: {0}")]
    SigningError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<CredentialsError> for BucketError {
    fn from(error: CredentialsError) -> Self {
        Self::CredentialsError(error.to_string())
    }
}

impl From<serde_json::Error> for BucketError {
    fn from(error: serde_json::Error) -> Self {
        Self::SigningError(error.to_string())
    }
}
