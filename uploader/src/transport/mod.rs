mod http;

use async_trait::async_trait;
use common_types::{ConfirmRequest, UploadRequest, UploadTicket};

pub use self::http::HttpTransport;

use crate::error::UploadError;
use crate::file::SelectedFile;

/// Network operations the orchestrator performs for one file
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Asks the ticket issuer for write credentials
    async fn request_ticket(&self, request: &UploadRequest) -> Result<UploadTicket, UploadError>;

    /// Writes the file to object storage using the ticket's form fields
    async fn write_object(
        &self,
        ticket: &UploadTicket,
        file: &SelectedFile,
        content_type: &str,
    ) -> Result<(), UploadError>;

    /// Reports a completed write
    async fn confirm(&self, request: &ConfirmRequest) -> Result<(), UploadError>;

    /// Whether `confirm` has anywhere to go
    fn has_confirm_endpoint(&self) -> bool;
}
