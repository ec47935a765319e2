//! Microphone capture
//!
//! The device callback copies every frame into an owned buffer and hands it
//! to a dedicated worker thread through a bounded channel. The worker
//! accumulates a fixed window at the native rate, resamples it to the wire
//! rate, packs it as 16-bit PCM and sends one chunk per window.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::audio::device::InputDevice;
use crate::audio::frame::AudioFrame;
use crate::codec::pcm::downmix_to_mono;
use crate::codec::resample::LinearResampler;
use crate::config::CaptureConfig;
use crate::constants::CAPTURE_QUEUE_FRAMES;
use crate::error::AudioError;
use crate::network::Transport;
use crate::protocol::TransportChunk;

#[derive(Default)]
struct CaptureCounters {
    frames_received: AtomicU64,
    frames_dropped: AtomicU64,
    chunks_emitted: AtomicU64,
    send_failures: AtomicU64,
}

/// Capture statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub frames_received: u64,
    pub frames_dropped: u64,
    pub chunks_emitted: u64,
    pub send_failures: u64,
}

/// Entry point for device callbacks
///
/// Every delivery takes an owned copy before the hand-off, so the device may
/// reuse its buffer as soon as the callback returns. Once the stream is
/// stopped, deliveries are ignored.
#[derive(Clone)]
pub struct FrameSink {
    tx: Sender<Vec<f32>>,
    active: Arc<AtomicBool>,
    counters: Arc<CaptureCounters>,
}

impl FrameSink {
    /// Deliver a mono frame
    pub fn deliver(&self, data: &[f32]) -> bool {
        if !self.is_active() {
            return false;
        }
        self.deliver_owned(data.to_vec())
    }

    /// Deliver an interleaved frame, averaging it down to mono
    pub fn deliver_interleaved(&self, data: &[f32], channels: usize) -> bool {
        if !self.is_active() {
            return false;
        }
        self.deliver_owned(downmix_to_mono(data, channels))
    }

    /// Deliver a frame the caller already owns
    pub fn deliver_owned(&self, frame: Vec<f32>) -> bool {
        if !self.is_active() || frame.is_empty() {
            return false;
        }
        self.counters.frames_received.fetch_add(1, Ordering::Relaxed);
        match self.tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.counters.frames_dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }
}

/// Accumulates native-rate samples into wire-ready chunks
pub struct FrameChunker {
    resampler: LinearResampler,
    window: usize,
    pending: Vec<f32>,
}

impl FrameChunker {
    /// `window` is the number of native-rate samples per chunk
    pub fn new(native_rate: u32, wire_rate: u32, window: usize) -> Self {
        let window = window.max(1);
        Self {
            resampler: LinearResampler::new(native_rate, wire_rate),
            window,
            pending: Vec::with_capacity(window * 2),
        }
    }

    /// Append samples, returning every chunk completed by them
    pub fn push(&mut self, samples: &[f32]) -> Vec<TransportChunk> {
        self.pending.extend_from_slice(samples);

        let complete = self.pending.len() / self.window;
        if complete == 0 {
            return Vec::new();
        }

        let chunks = self
            .pending
            .chunks_exact(self.window)
            .map(|window| self.encode(window))
            .collect();
        self.pending.drain(..complete * self.window);
        chunks
    }

    /// Emit whatever is left as a final, shorter chunk
    pub fn flush(&mut self) -> Option<TransportChunk> {
        if self.pending.is_empty() {
            return None;
        }
        let chunk = self.encode(&self.pending);
        self.pending.clear();
        Some(chunk)
    }

    /// Native-rate samples waiting for the next window
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn window(&self) -> usize {
        self.window
    }

    fn encode(&self, window: &[f32]) -> TransportChunk {
        let wire = self.resampler.process(window);
        TransportChunk::encode(&AudioFrame::from_float(wire, self.resampler.target_rate()))
    }
}

/// Capture from one input device to a transport
pub struct CaptureStream<D: InputDevice> {
    device: D,
    config: CaptureConfig,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    counters: Arc<CaptureCounters>,
}

impl<D: InputDevice> CaptureStream<D> {
    pub fn new(device: D, config: CaptureConfig) -> Self {
        Self {
            device,
            config,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
            counters: Arc::new(CaptureCounters::default()),
        }
    }

    /// Acquire the device and start sending chunks to `transport`.
    ///
    /// Acquisition failure is returned once; nothing is retried.
    pub fn start(&mut self, transport: Arc<dyn Transport>) -> Result<(), AudioError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(AudioError::AlreadyStarted);
        }

        let (tx, rx) = bounded::<Vec<f32>>(CAPTURE_QUEUE_FRAMES);
        let sink = FrameSink {
            tx,
            active: self.running.clone(),
            counters: self.counters.clone(),
        };

        self.running.store(true, Ordering::SeqCst);
        if let Err(e) = self.device.start(sink) {
            self.running.store(false, Ordering::SeqCst);
            return Err(e);
        }

        let native_rate = self.device.sample_rate();
        let chunker = FrameChunker::new(
            native_rate,
            self.config.wire_rate,
            self.config.window_samples(native_rate),
        );
        tracing::info!(
            "Capture started: {} Hz native, {} Hz wire, {} samples per chunk",
            native_rate,
            self.config.wire_rate,
            chunker.window()
        );

        let worker = CaptureWorker {
            rx,
            chunker,
            transport,
            running: self.running.clone(),
            counters: self.counters.clone(),
        };

        let spawned = thread::Builder::new()
            .name("capture-worker".to_string())
            .spawn(move || worker.run());

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                self.device.stop();
                Err(AudioError::StreamError(e.to_string()))
            }
        }
    }

    /// Release the device and wait for the worker to send the final
    /// partial chunk. Idempotent.
    pub fn stop(&mut self) {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        self.device.stop();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        if was_running {
            tracing::info!("Capture stopped: {:?}", self.stats());
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn sample_rate(&self) -> u32 {
        self.device.sample_rate()
    }

    /// Asynchronous device fault, if one occurred
    pub fn check_errors(&mut self) -> Option<AudioError> {
        self.device.poll_error()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn stats(&self) -> CaptureStats {
        CaptureStats {
            frames_received: self.counters.frames_received.load(Ordering::Relaxed),
            frames_dropped: self.counters.frames_dropped.load(Ordering::Relaxed),
            chunks_emitted: self.counters.chunks_emitted.load(Ordering::Relaxed),
            send_failures: self.counters.send_failures.load(Ordering::Relaxed),
        }
    }
}

impl<D: InputDevice> Drop for CaptureStream<D> {
    fn drop(&mut self) {
        self.stop();
    }
}

struct CaptureWorker {
    rx: Receiver<Vec<f32>>,
    chunker: FrameChunker,
    transport: Arc<dyn Transport>,
    running: Arc<AtomicBool>,
    counters: Arc<CaptureCounters>,
}

impl CaptureWorker {
    fn run(mut self) {
        loop {
            match self.rx.recv_timeout(Duration::from_millis(10)) {
                Ok(frame) => self.process(&frame),
                Err(RecvTimeoutError::Timeout) => {
                    if !self.running.load(Ordering::Relaxed) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        // Frames handed off before stop still belong to this session
        while let Ok(frame) = self.rx.try_recv() {
            self.process(&frame);
        }
        if let Some(chunk) = self.chunker.flush() {
            self.send(chunk);
        }
    }

    fn process(&mut self, frame: &[f32]) {
        for chunk in self.chunker.push(frame) {
            self.send(chunk);
        }
    }

    fn send(&self, chunk: TransportChunk) {
        let samples = chunk.sample_count();
        match self.transport.send_chunk(chunk) {
            Ok(()) => {
                let n = self.counters.chunks_emitted.fetch_add(1, Ordering::Relaxed) + 1;
                if n <= 3 || n % 50 == 0 {
                    tracing::debug!("Sent audio chunk #{} ({} samples)", n, samples);
                }
            }
            Err(e) => {
                let failures = self.counters.send_failures.fetch_add(1, Ordering::Relaxed) + 1;
                if failures == 1 {
                    tracing::warn!("Failed to send audio chunk: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::mock::MockInput;
    use crate::network::RecordingTransport;
    use proptest::prelude::*;

    #[test]
    fn test_chunker_emits_full_windows() {
        let mut chunker = FrameChunker::new(48000, 16000, 4800);
        assert!(chunker.push(&[0.0; 4000]).is_empty());
        let chunks = chunker.push(&[0.0; 4000]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].sample_count(), 1600);
        assert_eq!(chunks[0].sample_rate(), 16000);
        assert_eq!(chunker.pending(), 3200);
    }

    #[test]
    fn test_chunker_flush_emits_partial_window() {
        let mut chunker = FrameChunker::new(48000, 16000, 4800);
        chunker.push(&[0.5; 300]);
        let chunk = chunker.flush().unwrap();
        assert_eq!(chunk.sample_count(), 100);
        assert!(chunker.flush().is_none());
    }

    #[test]
    fn test_chunker_encodes_int16() {
        let mut chunker = FrameChunker::new(16000, 16000, 2);
        let chunks = chunker.push(&[0.5, -0.5]);
        assert_eq!(&chunks[0].payload()[..], &[0x00, 0x40, 0x00, 0xC0]);
    }

    #[test]
    fn test_sink_copies_and_downmixes() {
        let (tx, rx) = bounded(4);
        let sink = FrameSink {
            tx,
            active: Arc::new(AtomicBool::new(true)),
            counters: Arc::new(CaptureCounters::default()),
        };
        let mut device_buffer = vec![0.2, 0.4, 0.6, 0.8];
        assert!(sink.deliver_interleaved(&device_buffer, 2));
        // Device reuses its buffer for the next callback
        device_buffer.fill(9.0);
        let frame = rx.try_recv().unwrap();
        assert!((frame[0] - 0.3).abs() < 1e-6);
        assert!((frame[1] - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_sink_drops_when_full_or_inactive() {
        let (tx, _rx) = bounded(1);
        let active = Arc::new(AtomicBool::new(true));
        let counters = Arc::new(CaptureCounters::default());
        let sink = FrameSink {
            tx,
            active: active.clone(),
            counters: counters.clone(),
        };
        assert!(sink.deliver(&[0.1]));
        assert!(!sink.deliver(&[0.1]));
        assert_eq!(counters.frames_dropped.load(Ordering::Relaxed), 1);

        active.store(false, Ordering::Relaxed);
        assert!(!sink.deliver(&[0.1]));
        assert_eq!(counters.frames_received.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_stream_sends_windows_and_final_partial() {
        let (input, handle) = MockInput::new(48000);
        let transport = Arc::new(RecordingTransport::new());
        let config = CaptureConfig {
            chunk_ms: 100,
            ..CaptureConfig::default()
        };
        let mut stream = CaptureStream::new(input, config);
        stream.start(transport.clone()).unwrap();

        for _ in 0..11 {
            assert!(handle.push(&[0.25; 480]));
        }
        stream.stop();

        let chunks = transport.sent_chunks(16000);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].sample_count(), 1600);
        assert_eq!(chunks[1].sample_count(), 160);
        assert_eq!(stream.stats().chunks_emitted, 2);
        assert_eq!(stream.stats().frames_received, 11);
        assert!(!handle.is_started());
    }

    #[test]
    fn test_stream_counts_send_failures() {
        let (input, handle) = MockInput::new(16000);
        let transport = Arc::new(RecordingTransport::new());
        transport.set_failing(true);
        let mut stream = CaptureStream::new(input, CaptureConfig::default());
        stream.start(transport.clone()).unwrap();
        handle.push(&[0.0; 1600]);
        stream.stop();
        assert_eq!(stream.stats().send_failures, 1);
        assert_eq!(stream.stats().chunks_emitted, 0);
    }

    #[test]
    fn test_start_surfaces_acquisition_failure() {
        let (input, _handle) = MockInput::failing(
            48000,
            AudioError::DeviceUnavailable("permission denied".to_string()),
        );
        let mut stream = CaptureStream::new(input, CaptureConfig::default());
        let result = stream.start(Arc::new(RecordingTransport::new()));
        assert!(matches!(result, Err(AudioError::DeviceUnavailable(_))));
        assert!(!stream.is_running());
    }

    proptest! {
        #[test]
        fn chunker_conserves_wire_samples(frames in proptest::collection::vec(1usize..2000, 1..20)) {
            let mut chunker = FrameChunker::new(48000, 16000, 4800);
            let mut total_in = 0usize;
            let mut total_out = 0usize;
            for len in frames {
                total_in += len;
                for chunk in chunker.push(&vec![0.1; len]) {
                    prop_assert_eq!(chunk.sample_count(), 1600);
                    total_out += chunk.sample_count();
                }
            }
            let full = total_in / 4800;
            prop_assert_eq!(total_out, full * 1600);
            prop_assert_eq!(chunker.pending(), total_in - full * 4800);
        }
    }
}
