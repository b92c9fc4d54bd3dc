use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common_types::{ConfirmRequest, UploadRequest, UploadTicket};
use ticket_issuer::{
    issuer::TicketIssuer,
    testing::{FixedClock, StubPostPolicySigner},
    types::IssuerConfig,
};
use uploader::{
    BatchStatus, EntryState, ProgressListener, SelectedFile, UploadError, UploadTransport,
};

/// Fixed instant the in-process issuer starts at
pub const NOW_MILLIS: i64 = 1_741_944_413_000;

/// Setup test environment
pub fn setup_test_env() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

/// What the storage side received for one write
#[derive(Debug, Clone)]
pub struct RecordedWrite {
    pub upload_url: String,
    pub fields: Vec<(String, String)>,
    pub file_name: String,
    pub content_type: String,
    pub bytes: usize,
}

/// Transport backed by a real `TicketIssuer` with a stub signer
///
/// Storage writes and confirmations are recorded in memory and can be
/// told to fail.
pub struct MockTransport {
    pub issuer: TicketIssuer,
    pub signer: Arc<StubPostPolicySigner>,
    pub clock: Arc<FixedClock>,
    confirm_enabled: bool,
    ticket_calls: AtomicUsize,
    write_calls: AtomicUsize,
    confirm_calls: AtomicUsize,
    write_failures: Mutex<HashMap<String, u16>>,
    ticket_outages: Mutex<HashSet<String>>,
    fail_confirm: AtomicBool,
    pub writes: Mutex<Vec<RecordedWrite>>,
    pub confirms: Mutex<Vec<ConfirmRequest>>,
}

impl MockTransport {
    /// Issuer with a configured bucket plus the given extra variables
    pub fn new(vars: &[(&str, &str)]) -> Self {
        setup_test_env();

        let mut all_vars: HashMap<String, String> = HashMap::from([(
            "BUCKET_NAME".to_string(),
            "photobook-uploads".to_string(),
        )]);
        for (name, value) in vars {
            all_vars.insert((*name).to_string(), (*value).to_string());
        }
        let config = IssuerConfig::from_lookup(|name| all_vars.get(name).cloned());

        let signer = Arc::new(StubPostPolicySigner::default());
        let clock = Arc::new(FixedClock::from_millis(NOW_MILLIS));
        let issuer = TicketIssuer::new(Arc::new(config), signer.clone(), clock.clone());

        Self {
            issuer,
            signer,
            clock,
            confirm_enabled: true,
            ticket_calls: AtomicUsize::new(0),
            write_calls: AtomicUsize::new(0),
            confirm_calls: AtomicUsize::new(0),
            write_failures: Mutex::new(HashMap::new()),
            ticket_outages: Mutex::new(HashSet::new()),
            fail_confirm: AtomicBool::new(false),
            writes: Mutex::new(Vec::new()),
            confirms: Mutex::new(Vec::new()),
        }
    }

    pub fn without_confirm_endpoint(mut self) -> Self {
        self.confirm_enabled = false;
        self
    }

    /// Next write of `file_name` answers with `status`
    pub fn fail_next_write(&self, file_name: &str, status: u16) {
        self.write_failures
            .lock()
            .unwrap()
            .insert(file_name.to_string(), status);
    }

    /// Next ticket request for `file_name` cannot reach the issuer
    pub fn fail_next_ticket(&self, file_name: &str) {
        self.ticket_outages
            .lock()
            .unwrap()
            .insert(file_name.to_string());
    }

    pub fn fail_confirmations(&self) {
        self.fail_confirm.store(true, Ordering::SeqCst);
    }

    pub fn ticket_calls(&self) -> usize {
        self.ticket_calls.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub fn confirm_calls(&self) -> usize {
        self.confirm_calls.load(Ordering::SeqCst)
    }

    pub fn network_calls(&self) -> usize {
        self.ticket_calls() + self.write_calls() + self.confirm_calls()
    }
}

#[async_trait]
impl UploadTransport for MockTransport {
    async fn request_ticket(&self, request: &UploadRequest) -> Result<UploadTicket, UploadError> {
        self.ticket_calls.fetch_add(1, Ordering::SeqCst);
        if self.ticket_outages.lock().unwrap().remove(&request.filename) {
            return Err(UploadError::TicketRequest(
                "Could not reach the upload endpoint: connection refused".to_string(),
            ));
        }

        let ticket = self
            .issuer
            .issue(request.clone(), request.upload_token.as_deref())
            .await
            .map_err(|e| UploadError::TicketRequest(e.to_string()))?;
        self.clock.advance_millis(1);
        Ok(ticket)
    }

    async fn write_object(
        &self,
        ticket: &UploadTicket,
        file: &SelectedFile,
        content_type: &str,
    ) -> Result<(), UploadError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.write_failures.lock().unwrap().remove(&file.name) {
            return Err(UploadError::StorageWrite {
                status: Some(status),
                body: "InternalError".to_string(),
            });
        }

        let bytes = file.read_bytes().await.unwrap();
        self.writes.lock().unwrap().push(RecordedWrite {
            upload_url: ticket.upload_url.clone(),
            fields: ticket
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            file_name: file.name.clone(),
            content_type: content_type.to_string(),
            bytes: bytes.len(),
        });
        Ok(())
    }

    async fn confirm(&self, request: &ConfirmRequest) -> Result<(), UploadError> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_confirm.load(Ordering::SeqCst) {
            return Err(UploadError::Confirmation(
                "Confirmation endpoint returned 503: unavailable".to_string(),
            ));
        }
        self.confirms.lock().unwrap().push(request.clone());
        Ok(())
    }

    fn has_confirm_endpoint(&self) -> bool {
        self.confirm_enabled
    }
}

/// One recorded progress event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub index: usize,
    pub state: EntryState,
    pub status_text: String,
}

/// Listener that keeps every event for later assertions
#[derive(Debug, Default)]
pub struct RecordingListener {
    pub events: Mutex<Vec<ProgressEvent>>,
    pub summaries: Mutex<Vec<(BatchStatus, String)>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn summaries(&self) -> Vec<(BatchStatus, String)> {
        self.summaries.lock().unwrap().clone()
    }
}

impl ProgressListener for RecordingListener {
    fn on_state_change(&self, index: usize, _name: &str, state: EntryState, status_text: &str) {
        self.events.lock().unwrap().push(ProgressEvent {
            index,
            state,
            status_text: status_text.to_string(),
        });
    }

    fn on_batch_complete(&self, status: BatchStatus, summary: &str) {
        self.summaries
            .lock()
            .unwrap()
            .push((status, summary.to_string()));
    }
}

/// In-memory file of `size` zero bytes
pub fn jpeg(name: &str, size: usize) -> SelectedFile {
    SelectedFile::from_bytes(name, Some("image/jpeg"), vec![0; size])
}
