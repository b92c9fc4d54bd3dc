use super::{BatchStatus, EntryState};

/// Receives every state change in the order it happens
pub trait ProgressListener: Send + Sync {
    fn on_state_change(&self, index: usize, name: &str, state: EntryState, status_text: &str);

    fn on_batch_complete(&self, status: BatchStatus, summary: &str);
}

/// Listener that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl ProgressListener for NoopListener {
    fn on_state_change(&self, _: usize, _: &str, _: EntryState, _: &str) {}

    fn on_batch_complete(&self, _: BatchStatus, _: &str) {}
}

/// Listener that reports progress through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl ProgressListener for TracingListener {
    fn on_state_change(&self, index: usize, name: &str, state: EntryState, status_text: &str) {
        if state == EntryState::Error {
            tracing::warn!(index, file = name, "{status_text}");
        } else {
            tracing::info!(index, file = name, ?state, "{status_text}");
        }
    }

    fn on_batch_complete(&self, status: BatchStatus, summary: &str) {
        tracing::info!(?status, "{summary}");
    }
}
