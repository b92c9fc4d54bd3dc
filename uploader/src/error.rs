use thiserror::Error;

use crate::orchestrator::EntryState;

/// Failure of one file's upload, attached to its entry
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    /// File rejected locally before any network call
    #[error("{0}")]
    Validation(String),

    /// Ticket endpoint unreachable or answered with an error
    #[error("{0}")]
    TicketRequest(String),

    /// Direct write to object storage failed
    #[error("{}", storage_write_message(.status, .body))]
    StorageWrite { status: Option<u16>, body: String },

    /// Confirmation endpoint unreachable or answered with an error
    #[error("{0}")]
    Confirmation(String),
}

impl UploadError {
    /// Whether a retry of the entry can succeed without changing the file
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::TicketRequest(_) | Self::StorageWrite { .. })
    }
}

fn storage_write_message(status: &Option<u16>, body: &str) -> String {
    match (status, body.is_empty()) {
        (Some(status), true) => format!("Upload to storage failed with status {status}."),
        (Some(status), false) => format!("Upload to storage failed with status {status}: {body}"),
        (None, _) => format!("Upload to storage failed: {body}"),
    }
}

/// Misuse of the orchestrator API
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("Select at least one photo or video to upload.")]
    EmptySelection,

    #[error("No file at position {0}")]
    NoSuchEntry(usize),

    #[error("File at position {0} cannot be retried")]
    NotRetryable(usize),

    #[error("Invalid transition from {from:?} to {to:?}")]
    InvalidTransition { from: EntryState, to: EntryState },
}
