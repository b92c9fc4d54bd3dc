//! Issuer configuration, read once at startup

use std::env;

use common_types::Month;

/// Region used when `AWS_REGION` is not set
pub const DEFAULT_REGION: &str = "us-east-1";
/// Upload ceiling used when `MAX_FILE_BYTES` is missing or invalid (25 MiB)
pub const DEFAULT_MAX_FILE_BYTES: u64 = 25 * 1024 * 1024;
/// Origins allowed when `ALLOWED_ORIGINS` is not set
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:4000";

/// Everything the ticket issuer needs to validate a request and sign a policy
#[derive(Clone, PartialEq, Eq)]
pub struct IssuerConfig {
    /// Region the bucket lives in
    pub region: String,
    /// Target bucket; requests fail with a configuration error when unset
    pub bucket_name: Option<String>,
    /// Base URL the uploaded objects are served from
    pub public_base_url: Option<String>,
    /// Lower-cased month names uploads may be filed under
    pub allowed_months: Vec<String>,
    /// Upper bound for the `content-length-range` condition
    pub max_file_bytes: u64,
    /// Origins reflected in CORS responses
    pub allowed_origins: Vec<String>,
    /// Shared secret expected as bearer token, auth is disabled when unset
    pub auth_shared_secret: Option<String>,
}

impl IssuerConfig {
    /// Reads the configuration from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let allowed_months = non_empty("ALLOWED_MONTHS").map_or_else(
            || Month::all().map(|month| month.to_string()).collect(),
            |value| parse_list(&value, true),
        );

        let max_file_bytes = non_empty("MAX_FILE_BYTES")
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_MAX_FILE_BYTES);

        let allowed_origins = parse_list(
            &non_empty("ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string()),
            false,
        );

        Self {
            region: non_empty("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            bucket_name: non_empty("BUCKET_NAME"),
            public_base_url: non_empty("PUBLIC_BASE_URL"),
            allowed_months,
            max_file_bytes,
            allowed_origins,
            auth_shared_secret: non_empty("AUTH_SHARED_SECRET"),
        }
    }

    /// Whether `month` (already lower-cased) is on the allow-list
    #[must_use]
    pub fn is_month_allowed(&self, month: &str) -> bool {
        !month.is_empty() && self.allowed_months.iter().any(|allowed| allowed == month)
    }

    /// Origin to send back in `Access-Control-Allow-Origin`
    ///
    /// Reflects the request origin when it is allow-listed (or the list
    /// contains `*`), otherwise falls back to the first configured origin.
    #[must_use]
    pub fn cors_origin(&self, request_origin: Option<&str>) -> String {
        let wildcard = self.allowed_origins.iter().any(|origin| origin == "*");

        match request_origin {
            Some(origin)
                if wildcard || self.allowed_origins.iter().any(|allowed| allowed == origin) =>
            {
                origin.to_string()
            }
            _ => self
                .allowed_origins
                .first()
                .cloned()
                .unwrap_or_else(|| "*".to_string()),
        }
    }
}

impl std::fmt::Debug for IssuerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuerConfig")
            .field("region", &self.region)
            .field("bucket_name", &self.bucket_name)
            .field("public_base_url", &self.public_base_url)
            .field("allowed_months", &self.allowed_months)
            .field("max_file_bytes", &self.max_file_bytes)
            .field("allowed_origins", &self.allowed_origins)
            .field(
                "auth_shared_secret",
                &self.auth_shared_secret.as_ref().map(|_| "** redacted **"),
            )
            .finish()
    }
}

fn parse_list(value: &str, lowercase: bool) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            if lowercase {
                item.to_lowercase()
            } else {
                item.to_string()
            }
        })
        .collect()
}
