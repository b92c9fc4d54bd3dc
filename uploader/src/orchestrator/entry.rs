use serde::Serialize;

use crate::error::{OrchestratorError, UploadError};
use crate::file::SelectedFile;

/// Where a file is in its upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
    Idle,
    Requesting,
    Uploading,
    Confirming,
    Success,
    Error,
}

impl EntryState {
    /// Whether the state machine allows moving from `self` to `next`
    ///
    /// Steps advance strictly in order, any unfinished step may fail, a
    /// failed entry may go back to requesting, and success is terminal.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle | Self::Error, Self::Requesting)
                | (Self::Requesting, Self::Uploading)
                | (Self::Uploading, Self::Confirming)
                | (Self::Confirming, Self::Success)
                | (
                    Self::Idle | Self::Requesting | Self::Uploading | Self::Confirming,
                    Self::Error
                )
        )
    }

    /// Status line shown for states that carry no error
    #[must_use]
    pub const fn status_text(self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::Requesting => "Requesting upload slot…",
            Self::Uploading => "Uploading…",
            Self::Confirming => "Finalizing…",
            Self::Success => "Upload complete",
            Self::Error => "Upload failed",
        }
    }
}

/// One selected file and everything learned while uploading it
#[derive(Debug)]
pub struct FileEntry {
    pub(crate) file: SelectedFile,
    pub(crate) state: EntryState,
    pub(crate) error: Option<UploadError>,
    /// Content type resolved by validation, reused on retry
    pub(crate) content_type: Option<String>,
    pub(crate) object_key: Option<String>,
    pub(crate) public_url: Option<String>,
    pub(crate) warning: Option<String>,
}

impl FileEntry {
    #[must_use]
    pub const fn new(file: SelectedFile) -> Self {
        Self {
            file,
            state: EntryState::Idle,
            error: None,
            content_type: None,
            object_key: None,
            public_url: None,
            warning: None,
        }
    }

    #[must_use]
    pub const fn file(&self) -> &SelectedFile {
        &self.file
    }

    #[must_use]
    pub const fn state(&self) -> EntryState {
        self.state
    }

    #[must_use]
    pub const fn error(&self) -> Option<&UploadError> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Only meaningful in `Error`; false otherwise
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.state == EntryState::Error && self.error.as_ref().is_some_and(UploadError::is_retryable)
    }

    #[must_use]
    pub fn object_key(&self) -> Option<&str> {
        self.object_key.as_deref()
    }

    #[must_use]
    pub fn public_url(&self) -> Option<&str> {
        self.public_url.as_deref()
    }

    /// Confirmation failure recorded on an otherwise successful upload
    #[must_use]
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    #[must_use]
    pub fn status_text(&self) -> String {
        match (&self.state, &self.error) {
            (EntryState::Error, Some(error)) => error.to_string(),
            (state, _) => state.status_text().to_string(),
        }
    }

    /// Moves the entry to `next`
    ///
    /// Leaving `Error` discards the error and whatever the failed attempt
    /// recorded, so a retry never reports a key from an earlier ticket.
    pub(crate) fn transition(&mut self, next: EntryState) -> Result<(), OrchestratorError> {
        if !self.state.can_transition_to(next) {
            return Err(OrchestratorError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        if self.state == EntryState::Error {
            self.error = None;
            self.object_key = None;
            self.public_url = None;
            self.warning = None;
        }
        self.state = next;
        Ok(())
    }

    pub(crate) fn fail(&mut self, error: UploadError) -> Result<(), OrchestratorError> {
        self.transition(EntryState::Error)?;
        self.error = Some(error);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> FileEntry {
        FileEntry::new(SelectedFile::from_bytes("a.jpg", Some("image/jpeg"), vec![1]))
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut entry = entry();
        for state in [
            EntryState::Requesting,
            EntryState::Uploading,
            EntryState::Confirming,
            EntryState::Success,
        ] {
            entry.transition(state).unwrap();
        }
        assert_eq!(entry.state(), EntryState::Success);
        assert_eq!(entry.status_text(), "Upload complete");
    }

    #[test]
    fn test_success_is_terminal() {
        for next in [
            EntryState::Idle,
            EntryState::Requesting,
            EntryState::Uploading,
            EntryState::Confirming,
            EntryState::Error,
        ] {
            assert!(!EntryState::Success.can_transition_to(next), "{next:?}");
        }
    }

    #[test]
    fn test_steps_cannot_be_skipped() {
        let mut entry = entry();
        let result = entry.transition(EntryState::Uploading);

        assert_eq!(
            result,
            Err(OrchestratorError::InvalidTransition {
                from: EntryState::Idle,
                to: EntryState::Uploading,
            })
        );
        assert_eq!(entry.state(), EntryState::Idle);
    }

    #[test]
    fn test_retry_clears_error() {
        let mut entry = entry();
        entry.transition(EntryState::Requesting).unwrap();
        entry
            .fail(UploadError::TicketRequest("Upload endpoint returned 503".to_string()))
            .unwrap();

        assert!(entry.is_retryable());
        assert_eq!(entry.status_text(), "Upload endpoint returned 503");

        entry.transition(EntryState::Requesting).unwrap();
        assert!(entry.error().is_none());
        assert!(!entry.is_retryable());
        assert_eq!(entry.status_text(), "Requesting upload slot…");
    }

    #[test]
    fn test_retry_forgets_previous_ticket() {
        let mut entry = entry();
        entry.transition(EntryState::Requesting).unwrap();
        entry.transition(EntryState::Uploading).unwrap();
        entry.object_key = Some("march/1-a.jpg".to_string());
        entry.public_url = Some("https://cdn.example.com/march/1-a.jpg".to_string());
        entry
            .fail(UploadError::StorageWrite {
                status: Some(500),
                body: "boom".to_string(),
            })
            .unwrap();
        assert_eq!(entry.object_key(), Some("march/1-a.jpg"));

        entry.transition(EntryState::Requesting).unwrap();
        assert!(entry.object_key().is_none());
        assert!(entry.public_url().is_none());
        assert!(entry.warning().is_none());
    }

    #[test]
    fn test_error_cannot_fail_again() {
        let mut entry = entry();
        entry.fail(UploadError::Validation("Unsupported file type.".to_string())).unwrap();

        assert!(!entry.is_retryable());
        assert!(entry.fail(UploadError::Validation("again".to_string())).is_err());
    }
}
