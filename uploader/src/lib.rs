//! Photobook uploader
//!
//! Drives selected files through ticket request, direct storage write and
//! confirmation, one file at a time, tracking the state of every entry.

#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

/// Uploader configuration
pub mod config;

/// Upload and orchestrator errors
pub mod error;

/// Selected files and their bodies
pub mod file;

/// Per-file state machine and batch driver
pub mod orchestrator;

/// Network seam: ticket, storage write and confirmation
pub mod transport;

pub use error::{OrchestratorError, UploadError};
pub use file::{FileBody, SelectedFile};
pub use orchestrator::{
    validate_file, BatchMetadata, BatchReport, BatchStatus, EntrySnapshot, EntryState, FileEntry,
    NoopListener, ProgressListener, TracingListener, UploadOrchestrator, UploadPolicy,
};
pub use transport::{HttpTransport, UploadTransport};
