//! Test doubles for the device seams
//!
//! [`MockInput`] delivers whatever its handle pushes, from the caller's
//! thread, exactly as a device callback would. [`ManualOutput`] holds the
//! renderer so the caller can pull device cycles on demand.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::audio::capture::FrameSink;
use crate::audio::device::{InputDevice, OutputDevice};
use crate::audio::scheduler::PlaybackRenderer;
use crate::error::AudioError;

#[derive(Default)]
struct InputShared {
    sink: Mutex<Option<FrameSink>>,
    fault: Mutex<Option<AudioError>>,
}

/// Scripted microphone
pub struct MockInput {
    sample_rate: u32,
    acquire_error: Option<AudioError>,
    shared: Arc<InputShared>,
}

/// Drives a [`MockInput`] from the test
#[derive(Clone)]
pub struct MockInputHandle {
    shared: Arc<InputShared>,
}

impl MockInput {
    pub fn new(sample_rate: u32) -> (Self, MockInputHandle) {
        Self::build(sample_rate, None)
    }

    /// An input whose acquisition always fails with `error`
    pub fn failing(sample_rate: u32, error: AudioError) -> (Self, MockInputHandle) {
        Self::build(sample_rate, Some(error))
    }

    fn build(sample_rate: u32, acquire_error: Option<AudioError>) -> (Self, MockInputHandle) {
        let shared = Arc::new(InputShared::default());
        (
            Self {
                sample_rate,
                acquire_error,
                shared: shared.clone(),
            },
            MockInputHandle { shared },
        )
    }
}

impl InputDevice for MockInput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn start(&mut self, sink: FrameSink) -> Result<(), AudioError> {
        if let Some(e) = &self.acquire_error {
            return Err(e.clone());
        }
        let mut slot = self.shared.sink.lock();
        if slot.is_some() {
            return Err(AudioError::AlreadyStarted);
        }
        *slot = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        self.shared.sink.lock().take();
    }

    fn poll_error(&mut self) -> Option<AudioError> {
        self.shared.fault.lock().take()
    }
}

impl MockInputHandle {
    /// Deliver one mono frame; false if the device is stopped or the frame
    /// was dropped
    pub fn push(&self, frame: &[f32]) -> bool {
        match self.shared.sink.lock().as_ref() {
            Some(sink) => sink.deliver(frame),
            None => false,
        }
    }

    /// Deliver one interleaved frame
    pub fn push_interleaved(&self, frame: &[f32], channels: usize) -> bool {
        match self.shared.sink.lock().as_ref() {
            Some(sink) => sink.deliver_interleaved(frame, channels),
            None => false,
        }
    }

    pub fn is_started(&self) -> bool {
        self.shared.sink.lock().is_some()
    }

    /// Raise an asynchronous stream fault
    pub fn inject_error(&self, error: AudioError) {
        *self.shared.fault.lock() = Some(error);
    }
}

#[derive(Default)]
struct OutputShared {
    renderer: Mutex<Option<PlaybackRenderer>>,
    fault: Mutex<Option<AudioError>>,
}

/// Speaker pulled by hand
pub struct ManualOutput {
    sample_rate: u32,
    acquire_error: Option<AudioError>,
    shared: Arc<OutputShared>,
}

/// Pulls device cycles from a [`ManualOutput`]
#[derive(Clone)]
pub struct ManualOutputHandle {
    shared: Arc<OutputShared>,
}

impl ManualOutput {
    pub fn new(sample_rate: u32) -> (Self, ManualOutputHandle) {
        Self::build(sample_rate, None)
    }

    pub fn failing(sample_rate: u32, error: AudioError) -> (Self, ManualOutputHandle) {
        Self::build(sample_rate, Some(error))
    }

    fn build(sample_rate: u32, acquire_error: Option<AudioError>) -> (Self, ManualOutputHandle) {
        let shared = Arc::new(OutputShared::default());
        (
            Self {
                sample_rate,
                acquire_error,
                shared: shared.clone(),
            },
            ManualOutputHandle { shared },
        )
    }
}

impl OutputDevice for ManualOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn start(&mut self, renderer: PlaybackRenderer) -> Result<(), AudioError> {
        if let Some(e) = &self.acquire_error {
            return Err(e.clone());
        }
        let mut slot = self.shared.renderer.lock();
        if slot.is_some() {
            return Err(AudioError::AlreadyStarted);
        }
        *slot = Some(renderer);
        Ok(())
    }

    fn stop(&mut self) {
        self.shared.renderer.lock().take();
    }

    fn poll_error(&mut self) -> Option<AudioError> {
        self.shared.fault.lock().take()
    }
}

impl ManualOutputHandle {
    /// Run one device cycle of `frames` mono samples. A stopped device
    /// yields silence.
    pub fn pull(&self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames];
        self.pull_into(&mut out);
        out
    }

    /// Run one device cycle into `out`; returns frames that carried audio
    pub fn pull_into(&self, out: &mut [f32]) -> usize {
        match self.shared.renderer.lock().as_mut() {
            Some(renderer) => renderer.render(out),
            None => {
                out.fill(0.0);
                0
            }
        }
    }

    pub fn is_started(&self) -> bool {
        self.shared.renderer.lock().is_some()
    }

    pub fn inject_error(&self, error: AudioError) {
        *self.shared.fault.lock() = Some(error);
    }
}
