use std::time::Duration;

/// Upload ceiling applied before any network call (100 MiB)
pub const DEFAULT_MAX_FILE_BYTES: u64 = 100 * 1024 * 1024;
/// Maximum number of files kept from one selection
pub const DEFAULT_MAX_FILES: usize = 20;
/// Per-request timeout for every HTTP call
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Endpoints and limits the uploader runs with
#[derive(Clone)]
pub struct UploaderConfig {
    /// Ticket issuer endpoint
    pub create_endpoint: String,
    /// Confirmation endpoint, confirmation is skipped when unset
    pub confirm_endpoint: Option<String>,
    /// Token sent as bearer auth and forwarded in request bodies
    pub upload_token: Option<String>,
    pub max_file_bytes: u64,
    pub timeout: Duration,
}

impl UploaderConfig {
    #[must_use]
    pub fn new(create_endpoint: impl Into<String>) -> Self {
        Self {
            create_endpoint: create_endpoint.into(),
            confirm_endpoint: None,
            upload_token: None,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_confirm_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.confirm_endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub fn with_upload_token(mut self, token: impl Into<String>) -> Self {
        self.upload_token = Some(token.into());
        self
    }
}

impl std::fmt::Debug for UploaderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploaderConfig")
            .field("create_endpoint", &self.create_endpoint)
            .field("confirm_endpoint", &self.confirm_endpoint)
            .field(
                "upload_token",
                &self.upload_token.as_ref().map(|_| "** redacted **"),
            )
            .field("max_file_bytes", &self.max_file_bytes)
            .field("timeout", &self.timeout)
            .finish()
    }
}
