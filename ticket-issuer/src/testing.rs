//! Test doubles for the issuer's clock and signer

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::issuer::Clock;
use crate::media_storage::{BucketError, BucketResult, PostPolicy, PostPolicySigner, PresignedPost};

/// Clock frozen at a given instant, advanced manually
#[derive(Debug)]
pub struct FixedClock {
    millis: AtomicI64,
}

impl FixedClock {
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    pub fn advance_millis(&self, millis: i64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.millis.load(Ordering::SeqCst))
            .single()
            .unwrap_or_default()
    }
}

/// Signer that records every policy and returns predictable fields
#[derive(Debug)]
pub struct StubPostPolicySigner {
    upload_url: String,
    fail: bool,
    calls: AtomicUsize,
    policies: Mutex<Vec<PostPolicy>>,
}

impl Default for StubPostPolicySigner {
    fn default() -> Self {
        Self::with_upload_url("https://photobook-uploads.s3.us-east-1.amazonaws.com/")
    }
}

impl StubPostPolicySigner {
    /// Stub whose tickets point at `upload_url`
    #[must_use]
    pub fn with_upload_url(upload_url: impl Into<String>) -> Self {
        Self {
            upload_url: upload_url.into(),
            fail: false,
            calls: AtomicUsize::new(0),
            policies: Mutex::new(Vec::new()),
        }
    }

    /// Stub that fails every signing attempt
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Number of signing attempts
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Most recently signed policy
    pub fn last_policy(&self) -> Option<PostPolicy> {
        self.policies
            .lock()
            .ok()
            .and_then(|policies| policies.last().cloned())
    }
}

#[async_trait]
impl PostPolicySigner for StubPostPolicySigner {
    async fn presign_post(
        &self,
        policy: &PostPolicy,
        now: DateTime<Utc>,
    ) -> BucketResult<PresignedPost> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut policies) = self.policies.lock() {
            policies.push(policy.clone());
        }

        if self.fail {
            return Err(BucketError::CredentialsError(
                "no credentials in stub".to_string(),
            ));
        }

        Ok(PresignedPost {
            url: self.upload_url.clone(),
            fields: BTreeMap::from([
                ("key".to_string(), policy.key.clone()),
                ("Content-Type".to_string(), policy.content_type.clone()),
                ("Policy".to_string(), "c3R1Yi1wb2xpY3k=".to_string()),
                ("X-Amz-Signature".to_string(), "0".repeat(64)),
            ]),
            expires_at: now + policy.expires_in,
        })
    }
}
