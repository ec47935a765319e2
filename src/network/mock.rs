//! In-memory transport that records what was sent

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::Transport;
use crate::error::TransportError;
use crate::protocol::{TransportChunk, UpstreamMessage};

/// Records every upstream message as the JSON text a real connection would
/// carry
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<String>>,
    closed: AtomicBool,
    fail_sends: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail
    pub fn set_failing(&self, failing: bool) {
        self.fail_sends.store(failing, Ordering::Release);
    }

    /// JSON text frames sent so far
    pub fn sent_messages(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    /// Sent frames parsed back into chunks at `sample_rate`
    pub fn sent_chunks(&self, sample_rate: u32) -> Vec<TransportChunk> {
        self.sent
            .lock()
            .iter()
            .filter_map(|text| serde_json::from_str::<UpstreamMessage>(text).ok())
            .filter_map(|msg| msg.into_chunk(sample_rate).ok())
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Transport for RecordingTransport {
    fn send_chunk(&self, chunk: TransportChunk) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed("transport closed".to_string()));
        }
        if self.fail_sends.load(Ordering::Acquire) {
            return Err(TransportError::SendFailed("simulated failure".to_string()));
        }
        self.sent
            .lock()
            .push(UpstreamMessage::from_chunk(&chunk).to_json());
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
