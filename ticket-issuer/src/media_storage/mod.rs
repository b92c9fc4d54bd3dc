//! S3 presigned POST generation
mod error;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;

pub use error::{BucketError, BucketResult};

type HmacSha256 = Hmac<Sha256>;

const SIGNING_ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SIGNING_SERVICE: &str = "s3";

/// Conditions a browser-style form upload must satisfy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostPolicy {
    /// Target bucket
    pub bucket: String,
    /// Exact object key the upload is scoped to
    pub key: String,
    /// Content type the client will send
    pub content_type: String,
    /// Upper bound of the `content-length-range` condition
    pub max_content_length: u64,
    /// Lifetime of the policy
    pub expires_in: Duration,
}

/// Presigned POST with expiration information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedPost {
    /// Form POST target
    pub url: String,
    /// Form fields to replay verbatim, before the `file` part
    pub fields: BTreeMap<String, String>,
    /// UTC timestamp when the policy expires
    pub expires_at: DateTime<Utc>,
}

/// Static key material used for SigV4 signing
#[derive(Clone)]
pub struct SigningCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &self.session_token.as_ref().map(|_| "** redacted **"))
            .finish()
    }
}

/// Produces write credentials for a single object
#[async_trait]
pub trait PostPolicySigner: Send + Sync {
    /// Signs `policy` as of `now`
    ///
    /// # Errors
    ///
    /// Returns `BucketError` if credentials cannot be loaded or signing fails
    async fn presign_post(&self, policy: &PostPolicy, now: DateTime<Utc>)
        -> BucketResult<PresignedPost>;
}

/// Signs S3 POST policies with credentials resolved from the AWS config chain
pub struct S3PostPolicySigner {
    credentials_provider: SharedCredentialsProvider,
    region: String,
    endpoint_url: Option<String>,
}

impl S3PostPolicySigner {
    /// Creates a new signer
    ///
    /// # Arguments
    ///
    /// * `credentials_provider` - Provider used to load credentials on every request
    /// * `region` - Region the bucket lives in
    /// * `endpoint_url` - Optional endpoint override (`LocalStack`), uses path-style URLs when set
    #[must_use]
    pub const fn new(
        credentials_provider: SharedCredentialsProvider,
        region: String,
        endpoint_url: Option<String>,
    ) -> Self {
        Self {
            credentials_provider,
            region,
            endpoint_url,
        }
    }

    /// Builds a signer from a loaded AWS SDK configuration
    ///
    /// # Errors
    ///
    /// Returns `BucketError::MissingCredentialsProvider` when the config has no credentials provider
    /// Returns `BucketError::ConfigError` when the config has no region
    pub fn from_sdk_config(
        config: &aws_config::SdkConfig,
        endpoint_url: Option<String>,
    ) -> BucketResult<Self> {
        let credentials_provider = config
            .credentials_provider()
            .ok_or(BucketError::MissingCredentialsProvider)?;
        let region = config
            .region()
            .ok_or_else(|| BucketError::ConfigError("AWS region is not set".to_string()))?
            .to_string();

        Ok(Self::new(credentials_provider, region, endpoint_url))
    }

    /// Form POST target for `bucket`
    #[must_use]
    pub fn upload_url(&self, bucket: &str) -> String {
        match &self.endpoint_url {
            Some(endpoint) => format!("{}/{bucket}", endpoint.trim_end_matches('/')),
            None => format!("https://{bucket}.s3.{}.amazonaws.com/", self.region),
        }
    }
}

#[async_trait]
impl PostPolicySigner for S3PostPolicySigner {
    async fn presign_post(
        &self,
        policy: &PostPolicy,
        now: DateTime<Utc>,
    ) -> BucketResult<PresignedPost> {
        let credentials = self.credentials_provider.provide_credentials().await?;
        let signing_credentials = SigningCredentials {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().map(ToString::to_string),
        };

        let fields = sign_post_policy(&signing_credentials, &self.region, policy, now)?;

        tracing::debug!(key = %policy.key, "Signed POST policy");

        Ok(PresignedPost {
            url: self.upload_url(&policy.bucket),
            fields,
            expires_at: now + policy.expires_in,
        })
    }
}

/// Builds and signs the POST policy document, returning the form fields
///
/// # Errors
///
/// Returns `BucketError::SigningError` if the policy cannot be serialized or signed
pub fn sign_post_policy(
    credentials: &SigningCredentials,
    region: &str,
    policy: &PostPolicy,
    now: DateTime<Utc>,
) -> BucketResult<BTreeMap<String, String>> {
    let date_stamp = now.format("%Y%m%d").to_string();
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let credential_scope = format!(
        "{}/{date_stamp}/{region}/{SIGNING_SERVICE}/aws4_request",
        credentials.access_key_id
    );
    let expiration = (now + policy.expires_in)
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string();

    let mut conditions: Vec<Value> = vec![
        json!({ "bucket": policy.bucket }),
        json!({ "key": policy.key }),
        json!({ "Content-Type": policy.content_type }),
        json!(["content-length-range", 0, policy.max_content_length]),
        json!(["starts-with", "$Content-Type", ""]),
        json!({ "x-amz-algorithm": SIGNING_ALGORITHM }),
        json!({ "x-amz-credential": credential_scope }),
        json!({ "x-amz-date": amz_date }),
    ];
    if let Some(token) = &credentials.session_token {
        conditions.push(json!({ "x-amz-security-token": token }));
    }

    let document = json!({
        "expiration": expiration,
        "conditions": conditions,
    });
    let encoded_policy = STANDARD.encode(serde_json::to_vec(&document)?);

    let signing_key = derive_signing_key(&credentials.secret_access_key, &date_stamp, region)?;
    let signature = hex::encode(hmac_sha256(&signing_key, encoded_policy.as_bytes())?);

    let mut fields = BTreeMap::from([
        ("bucket".to_string(), policy.bucket.clone()),
        ("key".to_string(), policy.key.clone()),
        ("Content-Type".to_string(), policy.content_type.clone()),
        ("X-Amz-Algorithm".to_string(), SIGNING_ALGORITHM.to_string()),
        ("X-Amz-Credential".to_string(), credential_scope),
        ("X-Amz-Date".to_string(), amz_date),
        ("Policy".to_string(), encoded_policy),
        ("X-Amz-Signature".to_string(), signature),
    ]);
    if let Some(token) = &credentials.session_token {
        fields.insert("X-Amz-Security-Token".to_string(), token.clone());
    }

    Ok(fields)
}

fn derive_signing_key(secret: &str, date_stamp: &str, region: &str) -> BucketResult<Vec<u8>> {
    let date_key = hmac_sha256(format!("AWS4{secret}").as_bytes(), date_stamp.as_bytes())?;
    let region_key = hmac_sha256(&date_key, region.as_bytes())?;
    let service_key = hmac_sha256(&region_key, SIGNING_SERVICE.as_bytes())?;
    hmac_sha256(&service_key, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> BucketResult<Vec<u8>> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| BucketError::SigningError(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
