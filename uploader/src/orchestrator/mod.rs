//! Upload orchestration: one state machine per selected file
//!
//! Every entry goes `Idle -> Requesting -> Uploading -> Confirming -> Success`,
//! or drops to `Error` from any unfinished step. Files are processed strictly
//! one after another so progress events arrive in a deterministic order.

mod entry;
mod progress;
mod validation;

use std::sync::Arc;

use common_types::{ConfirmRequest, Month, UploadRequest, UploadTicket};
use serde::Serialize;
use tracing::instrument;

pub use entry::{EntryState, FileEntry};
pub use progress::{NoopListener, ProgressListener, TracingListener};
pub use validation::{
    format_bytes, validate_file, UploadPolicy, ACCEPTED_IMAGE_TYPES, ACCEPTED_VIDEO_TYPES,
};

use crate::error::{OrchestratorError, UploadError};
use crate::file::SelectedFile;
use crate::transport::UploadTransport;

/// Form values shared by every file in a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchMetadata {
    pub month: Month,
    pub photographer: String,
    pub notes: String,
    pub upload_token: Option<String>,
}

impl BatchMetadata {
    #[must_use]
    pub const fn new(month: Month) -> Self {
        Self {
            month,
            photographer: String::new(),
            notes: String::new(),
            upload_token: None,
        }
    }
}

/// Outcome of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchStatus {
    AllSucceeded,
    PartialFailure,
    AllFailed,
}

/// Point-in-time copy of one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySnapshot {
    pub name: String,
    pub state: EntryState,
    pub status_text: String,
    pub error_message: Option<String>,
    pub retryable: bool,
    pub object_key: Option<String>,
    pub public_url: Option<String>,
    pub warning: Option<String>,
}

impl From<&FileEntry> for EntrySnapshot {
    fn from(entry: &FileEntry) -> Self {
        Self {
            name: entry.file().name.clone(),
            state: entry.state(),
            status_text: entry.status_text(),
            error_message: entry.error_message(),
            retryable: entry.is_retryable(),
            object_key: entry.object_key().map(ToString::to_string),
            public_url: entry.public_url().map(ToString::to_string),
            warning: entry.warning().map(ToString::to_string),
        }
    }
}

/// Batch status plus every entry as it stood when the batch finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub status: BatchStatus,
    pub entries: Vec<EntrySnapshot>,
}

impl BatchReport {
    fn from_entries(entries: &[FileEntry]) -> Self {
        let entries: Vec<EntrySnapshot> = entries.iter().map(EntrySnapshot::from).collect();
        let succeeded = entries
            .iter()
            .filter(|entry| entry.state == EntryState::Success)
            .count();

        let status = if succeeded == entries.len() {
            BatchStatus::AllSucceeded
        } else if succeeded == 0 {
            BatchStatus::AllFailed
        } else {
            BatchStatus::PartialFailure
        };

        Self { status, entries }
    }

    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.state == EntryState::Success)
            .count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.entries.len() - self.succeeded()
    }

    /// `N uploaded, M failed`
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} uploaded, {} failed", self.succeeded(), self.failed())
    }
}

/// Owns the current selection and drives it through the upload steps
pub struct UploadOrchestrator<T: UploadTransport> {
    transport: T,
    policy: UploadPolicy,
    listener: Arc<dyn ProgressListener>,
    entries: Vec<FileEntry>,
}

impl<T: UploadTransport> UploadOrchestrator<T> {
    #[must_use]
    pub fn new(transport: T, policy: UploadPolicy) -> Self {
        Self {
            transport,
            policy,
            listener: Arc::new(NoopListener),
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn ProgressListener>) -> Self {
        self.listener = listener;
        self
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Replaces the selection, keeping at most `max_files` files
    ///
    /// Returns the number of files kept.
    pub fn select(&mut self, files: Vec<SelectedFile>) -> usize {
        let total = files.len();
        self.entries = files
            .into_iter()
            .take(self.policy.max_files)
            .map(FileEntry::new)
            .collect();

        if total > self.entries.len() {
            tracing::warn!(
                "Selected {total} files, only the first {} are kept",
                self.entries.len()
            );
        }

        for (index, entry) in self.entries.iter().enumerate() {
            self.listener.on_state_change(
                index,
                &entry.file.name,
                entry.state,
                &entry.status_text(),
            );
        }
        self.entries.len()
    }

    /// Drops the selection
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Indices of entries that failed with a retryable error
    pub fn retry_eligible(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_retryable())
            .map(|(index, _)| index)
            .collect()
    }

    /// Uploads every idle entry and every entry that failed with a retryable error
    ///
    /// Successful entries and entries rejected by validation are left as they
    /// are. A fully successful batch clears the selection.
    ///
    /// # Errors
    ///
    /// - `OrchestratorError::EmptySelection` - nothing is selected
    /// - `OrchestratorError::InvalidTransition` - internal state machine violation
    #[instrument(skip_all, fields(month = %metadata.month, files = self.entries.len()))]
    pub async fn submit(
        &mut self,
        metadata: &BatchMetadata,
    ) -> Result<BatchReport, OrchestratorError> {
        if self.entries.is_empty() {
            return Err(OrchestratorError::EmptySelection);
        }

        for index in 0..self.entries.len() {
            let entry = &self.entries[index];
            let pending = entry.state == EntryState::Idle || entry.is_retryable();
            if pending {
                self.process_entry(index, metadata).await?;
            }
        }

        Ok(self.finish_batch())
    }

    /// Retries a single entry that failed with a retryable error
    ///
    /// # Errors
    ///
    /// - `OrchestratorError::NoSuchEntry` - index out of range
    /// - `OrchestratorError::NotRetryable` - entry is not in a retryable `Error`
    #[instrument(skip(self, metadata))]
    pub async fn retry(
        &mut self,
        index: usize,
        metadata: &BatchMetadata,
    ) -> Result<BatchReport, OrchestratorError> {
        let entry = self
            .entries
            .get(index)
            .ok_or(OrchestratorError::NoSuchEntry(index))?;
        if !entry.is_retryable() {
            return Err(OrchestratorError::NotRetryable(index));
        }

        self.process_entry(index, metadata).await?;
        Ok(self.finish_batch())
    }

    fn finish_batch(&mut self) -> BatchReport {
        let report = BatchReport::from_entries(&self.entries);
        self.listener
            .on_batch_complete(report.status, &report.summary());

        if report.status == BatchStatus::AllSucceeded {
            self.entries.clear();
        }
        report
    }

    /// Runs one entry through its remaining steps
    ///
    /// Step failures are recorded on the entry; only state machine
    /// violations are returned.
    async fn process_entry(
        &mut self,
        index: usize,
        metadata: &BatchMetadata,
    ) -> Result<(), OrchestratorError> {
        let content_type = match self.resolve_content_type(index) {
            Ok(content_type) => content_type,
            Err(error) => return self.fail(index, error),
        };

        self.set_state(index, EntryState::Requesting)?;
        let request = {
            let file = &self.entries[index].file;
            UploadRequest {
                month: metadata.month.to_string(),
                filename: file.name.clone(),
                content_type: Some(content_type.clone()),
                size: Some(file.size),
                notes: Some(metadata.notes.clone()),
                photographer: Some(metadata.photographer.clone()),
                upload_token: metadata.upload_token.clone(),
            }
        };

        let ticket = match self.transport.request_ticket(&request).await {
            Ok(ticket) => ticket,
            Err(error) => return self.fail(index, error),
        };

        self.set_state(index, EntryState::Uploading)?;
        {
            let entry = &mut self.entries[index];
            entry.object_key = Some(ticket.key.clone());
            entry.public_url = Some(ticket.file_url.clone());
        }

        if let Err(error) = self
            .transport
            .write_object(&ticket, &self.entries[index].file, &content_type)
            .await
        {
            return self.fail(index, error);
        }

        self.set_state(index, EntryState::Confirming)?;
        if self.transport.has_confirm_endpoint() {
            let confirm = confirm_request(&self.entries[index].file, &ticket, &content_type, metadata);
            if let Err(error) = self.transport.confirm(&confirm).await {
                tracing::warn!(key = %ticket.key, "Upload confirmation failed: {error}");
                self.entries[index].warning = Some(error.to_string());
            }
        }

        self.set_state(index, EntryState::Success)
    }

    /// Validates idle entries; entries coming back from `Error` reuse the
    /// content type resolved the first time
    fn resolve_content_type(&mut self, index: usize) -> Result<String, UploadError> {
        let entry = &mut self.entries[index];
        if let Some(content_type) = &entry.content_type {
            return Ok(content_type.clone());
        }

        let content_type = validate_file(&entry.file, &self.policy)?;
        entry.content_type = Some(content_type.clone());
        Ok(content_type)
    }

    fn set_state(&mut self, index: usize, state: EntryState) -> Result<(), OrchestratorError> {
        self.entries[index].transition(state)?;
        self.emit(index);
        Ok(())
    }

    fn fail(&mut self, index: usize, error: UploadError) -> Result<(), OrchestratorError> {
        tracing::debug!(index, retryable = error.is_retryable(), "Upload step failed: {error}");
        self.entries[index].fail(error)?;
        self.emit(index);
        Ok(())
    }

    fn emit(&self, index: usize) {
        let entry = &self.entries[index];
        self.listener.on_state_change(
            index,
            &entry.file.name,
            entry.state,
            &entry.status_text(),
        );
    }
}

fn confirm_request(
    file: &SelectedFile,
    ticket: &UploadTicket,
    content_type: &str,
    metadata: &BatchMetadata,
) -> ConfirmRequest {
    ConfirmRequest {
        filename: file.name.clone(),
        key: ticket.key.clone(),
        content_type: content_type.to_string(),
        size: file.size,
        month: ticket.metadata.month.clone(),
        upload_token: metadata.upload_token.clone(),
        file_url: ticket.file_url.clone(),
    }
}
