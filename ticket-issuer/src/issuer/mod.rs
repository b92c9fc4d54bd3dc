//! Upload ticket issuing: request validation, object key derivation and signing

mod clock;
mod error;
mod filename;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use common_types::{
    truncate_chars, TicketMetadata, UploadRequest, UploadTicket, MAX_NOTES_CHARS,
    MAX_PHOTOGRAPHER_CHARS,
};
use tracing::instrument;

pub use clock::{Clock, SystemClock};
pub use error::IssuerError;
pub use filename::{normalize_filename, FALLBACK_FILENAME};

use crate::media_storage::{PostPolicy, PostPolicySigner};
use crate::types::IssuerConfig;

/// Lifetime of every presigned POST (15 minutes)
pub const PRESIGNED_POST_EXPIRY_SECS: u64 = 15 * 60;

/// Content type signed into the policy when the client sends none
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Stateless credential factory for direct uploads
pub struct TicketIssuer {
    config: Arc<IssuerConfig>,
    signer: Arc<dyn PostPolicySigner>,
    clock: Arc<dyn Clock>,
}

impl TicketIssuer {
    /// Creates a new ticket issuer
    ///
    /// # Arguments
    ///
    /// * `config` - Issuer configuration, read once at startup
    /// * `signer` - Produces the presigned POST for a validated request
    /// * `clock` - Time source for object keys and policy expiry
    #[must_use]
    pub fn new(
        config: Arc<IssuerConfig>,
        signer: Arc<dyn PostPolicySigner>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            signer,
            clock,
        }
    }

    /// Configuration this issuer validates against
    #[must_use]
    pub fn config(&self) -> &IssuerConfig {
        &self.config
    }

    /// Validates an upload request and returns write credentials for a single object
    ///
    /// Checks run in order: bucket configured, month allowed, bearer token,
    /// declared size. Nothing is signed unless every check passes.
    ///
    /// # Errors
    ///
    /// - `IssuerError::ConfigurationError` - no bucket configured
    /// - `IssuerError::InvalidMonth` - month missing or not allowed
    /// - `IssuerError::Unauthorized` - shared secret configured and token missing or wrong
    /// - `IssuerError::InvalidPayload` - declared size above the ceiling
    /// - `IssuerError::IssuerInternalError` - signing failed
    #[instrument(skip(self, request, bearer_token), fields(month = %request.month))]
    pub async fn issue(
        &self,
        request: UploadRequest,
        bearer_token: Option<&str>,
    ) -> Result<UploadTicket, IssuerError> {
        let bucket = self.config.bucket_name.as_deref().ok_or_else(|| {
            IssuerError::ConfigurationError("Missing BUCKET_NAME environment variable.".to_string())
        })?;

        let month = request.month.trim().to_lowercase();
        if !self.config.is_month_allowed(&month) {
            return Err(IssuerError::InvalidMonth);
        }

        if !self.is_authorized(bearer_token) {
            return Err(IssuerError::Unauthorized);
        }

        if request
            .size
            .is_some_and(|size| size > self.config.max_file_bytes)
        {
            return Err(IssuerError::InvalidPayload(
                "File exceeds the maximum upload size.".to_string(),
            ));
        }

        let now = self.clock.now();
        let key = object_key(&month, now, &normalize_filename(&request.filename));
        let content_type = request
            .content_type
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let policy = PostPolicy {
            bucket: bucket.to_string(),
            key: key.clone(),
            content_type,
            max_content_length: self.config.max_file_bytes,
            expires_in: Duration::from_secs(PRESIGNED_POST_EXPIRY_SECS),
        };

        let presigned = self.signer.presign_post(&policy, now).await.map_err(|e| {
            tracing::error!("Failed to create presigned post for {key}: {e}");
            IssuerError::from(e)
        })?;

        tracing::info!(key = %key, expires_at = %presigned.expires_at, "Issued upload ticket");

        Ok(UploadTicket {
            upload_url: presigned.url,
            fields: presigned.fields,
            file_url: public_url(&self.config, bucket, &key),
            key,
            metadata: TicketMetadata {
                notes: truncate_chars(request.notes.as_deref().unwrap_or_default(), MAX_NOTES_CHARS),
                photographer: truncate_chars(
                    request.photographer.as_deref().unwrap_or_default(),
                    MAX_PHOTOGRAPHER_CHARS,
                ),
                month,
            },
        })
    }

    fn is_authorized(&self, bearer_token: Option<&str>) -> bool {
        match &self.config.auth_shared_secret {
            None => true,
            Some(secret) => bearer_token
                .is_some_and(|token| constant_time_eq(token.as_bytes(), secret.as_bytes())),
        }
    }
}

/// Object key for an upload: `{month}/{unix_millis}-{normalized_filename}`
#[must_use]
pub fn object_key(month: &str, now: DateTime<Utc>, normalized_filename: &str) -> String {
    format!("{month}/{}-{normalized_filename}", now.timestamp_millis())
}

/// Public URL an object will be served from
///
/// Uses the configured public base URL when present, otherwise the
/// virtual-hosted S3 URL of the bucket.
#[must_use]
pub fn public_url(config: &IssuerConfig, bucket: &str, key: &str) -> String {
    match &config.public_base_url {
        Some(base) => format!("{}/{key}", base.trim_end_matches('/')),
        None => format!("https://{bucket}.s3.{}.amazonaws.com/{key}", config.region),
    }
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
