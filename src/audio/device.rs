//! Audio device seams and their cpal implementations
//!
//! The session only sees [`InputDevice`] and [`OutputDevice`]. The cpal
//! versions each run their stream on a dedicated thread, because a
//! `cpal::Stream` is not `Send` on every host.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::audio::capture::FrameSink;
use crate::audio::scheduler::PlaybackRenderer;
use crate::codec::pcm::downmix_to_mono;
use crate::error::AudioError;

/// A microphone-like source of mono frames
pub trait InputDevice: Send {
    /// Native capture rate
    fn sample_rate(&self) -> u32;

    /// Begin delivering frames to `sink`. Fails once, without retry, if the
    /// device cannot be acquired.
    fn start(&mut self, sink: FrameSink) -> Result<(), AudioError>;

    /// Release the device. Idempotent.
    fn stop(&mut self);

    /// Asynchronous stream fault, if one occurred
    fn poll_error(&mut self) -> Option<AudioError> {
        None
    }
}

/// A speaker-like sink that pulls samples from a renderer every callback
pub trait OutputDevice: Send {
    fn sample_rate(&self) -> u32;

    fn start(&mut self, renderer: PlaybackRenderer) -> Result<(), AudioError>;

    fn stop(&mut self);

    fn poll_error(&mut self) -> Option<AudioError> {
        None
    }
}

/// Device description for listings
#[derive(Debug, Clone, Serialize)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub is_input: bool,
    pub is_output: bool,
    pub is_default: bool,
    pub sample_rates: Vec<u32>,
    pub channels: Vec<u16>,
}

/// List all available audio devices
pub fn list_devices() -> Vec<AudioDeviceInfo> {
    let host = cpal::default_host();
    let mut devices: Vec<AudioDeviceInfo> = Vec::new();

    let default_input_name = host.default_input_device().and_then(|d| d.name().ok());
    let default_output_name = host.default_output_device().and_then(|d| d.name().ok());

    if let Ok(input_devices) = host.input_devices() {
        for device in input_devices {
            if let Ok(name) = device.name() {
                let (sample_rates, channels) = get_device_capabilities(&device, true);
                devices.push(AudioDeviceInfo {
                    is_default: default_input_name.as_ref() == Some(&name),
                    name,
                    is_input: true,
                    is_output: false,
                    sample_rates,
                    channels,
                });
            }
        }
    }

    if let Ok(output_devices) = host.output_devices() {
        for device in output_devices {
            if let Ok(name) = device.name() {
                let is_default = default_output_name.as_ref() == Some(&name);
                if let Some(existing) = devices.iter_mut().find(|d| d.name == name) {
                    existing.is_output = true;
                    existing.is_default |= is_default;
                } else {
                    let (sample_rates, channels) = get_device_capabilities(&device, false);
                    devices.push(AudioDeviceInfo {
                        name,
                        is_input: false,
                        is_output: true,
                        is_default,
                        sample_rates,
                        channels,
                    });
                }
            }
        }
    }

    devices
}

fn get_device_capabilities(device: &cpal::Device, is_input: bool) -> (Vec<u32>, Vec<u16>) {
    let configs: Vec<cpal::SupportedStreamConfigRange> = if is_input {
        device
            .supported_input_configs()
            .map(|c| c.collect())
            .unwrap_or_default()
    } else {
        device
            .supported_output_configs()
            .map(|c| c.collect())
            .unwrap_or_default()
    };

    let mut sample_rates = Vec::new();
    let mut channels = Vec::new();
    for config in &configs {
        for rate_val in [16000u32, 24000, 44100, 48000, 96000] {
            let rate = cpal::SampleRate(rate_val);
            if rate >= config.min_sample_rate()
                && rate <= config.max_sample_rate()
                && !sample_rates.contains(&rate_val)
            {
                sample_rates.push(rate_val);
            }
        }
        if !channels.contains(&config.channels()) {
            channels.push(config.channels());
        }
    }

    sample_rates.sort_unstable();
    channels.sort_unstable();
    (sample_rates, channels)
}

fn find_input_device(name: Option<&str>) -> Result<cpal::Device, AudioError> {
    let host = cpal::default_host();
    match name {
        None => host
            .default_input_device()
            .ok_or_else(|| AudioError::DeviceNotFound("No default input device".to_string())),
        Some(name) => host
            .input_devices()
            .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?
            .find(|d| d.name().is_ok_and(|n| n == name))
            .ok_or_else(|| AudioError::DeviceNotFound(name.to_string())),
    }
}

fn find_output_device(name: Option<&str>) -> Result<cpal::Device, AudioError> {
    let host = cpal::default_host();
    match name {
        None => host
            .default_output_device()
            .ok_or_else(|| AudioError::DeviceNotFound("No default output device".to_string())),
        Some(name) => host
            .output_devices()
            .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?
            .find(|d| d.name().is_ok_and(|n| n == name))
            .ok_or_else(|| AudioError::DeviceNotFound(name.to_string())),
    }
}

/// Stream thread shared by input and output
struct StreamThread {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    error_rx: Option<Receiver<AudioError>>,
}

impl StreamThread {
    fn idle() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
            error_rx: None,
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawn a thread that builds a stream with `build`, plays it, and keeps
    /// it alive until stopped. Build or play failures are returned here.
    fn spawn<F>(&mut self, name: String, build: F) -> Result<(), AudioError>
    where
        F: FnOnce(Sender<AudioError>) -> Result<cpal::Stream, AudioError> + Send + 'static,
    {
        if self.is_running() {
            return Err(AudioError::AlreadyStarted);
        }

        let (error_tx, error_rx) = bounded::<AudioError>(16);
        let (ready_tx, ready_rx) = bounded::<Result<(), AudioError>>(1);
        self.error_rx = Some(error_rx);

        let running = self.running.clone();
        running.store(true, Ordering::SeqCst);

        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || {
                let stream = match build(error_tx) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(AudioError::StreamError(e.to_string())));
                    return;
                }
                let _ = ready_tx.send(Ok(()));

                while running.load(Ordering::Relaxed) {
                    thread::sleep(Duration::from_millis(10));
                }
                // Stream is dropped here, releasing the device
            })
            .map_err(|e| AudioError::StreamError(e.to_string()))?;

        let ready = ready_rx
            .recv()
            .unwrap_or_else(|_| Err(AudioError::StreamError("stream thread exited".to_string())));

        match ready {
            Ok(()) => {
                self.handle = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                let _ = handle.join();
                Err(e)
            }
        }
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn poll_error(&self) -> Option<AudioError> {
        self.error_rx.as_ref().and_then(|rx| rx.try_recv().ok())
    }
}

/// cpal-backed microphone
pub struct CpalInput {
    device: Option<cpal::Device>,
    name: String,
    config: StreamConfig,
    sample_format: SampleFormat,
    thread: StreamThread,
}

impl CpalInput {
    /// Open by name, or the default input when `name` is `None`
    pub fn open(name: Option<&str>) -> Result<Self, AudioError> {
        let device = find_input_device(name)?;
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let default_config = device
            .default_input_config()
            .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;

        Ok(Self {
            device: Some(device),
            name: device_name,
            sample_format: default_config.sample_format(),
            config: default_config.config(),
            thread: StreamThread::idle(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }
}

impl InputDevice for CpalInput {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn start(&mut self, sink: FrameSink) -> Result<(), AudioError> {
        let device = self
            .device
            .take()
            .ok_or_else(|| AudioError::DeviceUnavailable(self.name.clone()))?;
        let config = self.config.clone();
        let format = self.sample_format;

        tracing::info!(
            "Opening input '{}' at {} Hz, {} channel(s), {:?}",
            self.name,
            config.sample_rate.0,
            config.channels,
            format
        );

        self.thread.spawn("capture-input".to_string(), move |error_tx| {
            match format {
                SampleFormat::F32 => build_input::<f32>(&device, &config, sink, error_tx),
                SampleFormat::I16 => build_input::<i16>(&device, &config, sink, error_tx),
                SampleFormat::U16 => build_input::<u16>(&device, &config, sink, error_tx),
                other => Err(AudioError::UnsupportedFormat(format!("{:?}", other))),
            }
        })
    }

    fn stop(&mut self) {
        self.thread.stop();
    }

    fn poll_error(&mut self) -> Option<AudioError> {
        self.thread.poll_error()
    }
}

fn build_input<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    sink: FrameSink,
    error_tx: Sender<AudioError>,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels as usize;
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                // The host reuses `data` on the next callback, so copy now
                let owned: Vec<f32> = data.iter().map(|s| s.to_sample::<f32>()).collect();
                if channels > 1 {
                    sink.deliver_owned(downmix_to_mono(&owned, channels));
                } else {
                    sink.deliver_owned(owned);
                }
            },
            move |err| {
                let _ = error_tx.try_send(AudioError::StreamError(err.to_string()));
            },
            None,
        )
        .map_err(|e| AudioError::CpalError(e.to_string()))
}

/// cpal-backed speaker
pub struct CpalOutput {
    device: Option<cpal::Device>,
    name: String,
    config: StreamConfig,
    sample_format: SampleFormat,
    thread: StreamThread,
}

impl CpalOutput {
    pub fn open(name: Option<&str>) -> Result<Self, AudioError> {
        let device = find_output_device(name)?;
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let default_config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;

        Ok(Self {
            device: Some(device),
            name: device_name,
            sample_format: default_config.sample_format(),
            config: default_config.config(),
            thread: StreamThread::idle(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl OutputDevice for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn start(&mut self, renderer: PlaybackRenderer) -> Result<(), AudioError> {
        let device = self
            .device
            .take()
            .ok_or_else(|| AudioError::DeviceUnavailable(self.name.clone()))?;
        let config = self.config.clone();
        let format = self.sample_format;

        tracing::info!(
            "Opening output '{}' at {} Hz, {} channel(s), {:?}",
            self.name,
            config.sample_rate.0,
            config.channels,
            format
        );

        self.thread.spawn("playback-output".to_string(), move |error_tx| {
            match format {
                SampleFormat::F32 => build_output_f32(&device, &config, renderer, error_tx),
                SampleFormat::I16 => build_output::<i16>(&device, &config, renderer, error_tx),
                SampleFormat::U16 => build_output::<u16>(&device, &config, renderer, error_tx),
                other => Err(AudioError::UnsupportedFormat(format!("{:?}", other))),
            }
        })
    }

    fn stop(&mut self) {
        self.thread.stop();
    }

    fn poll_error(&mut self) -> Option<AudioError> {
        self.thread.poll_error()
    }
}

fn build_output_f32(
    device: &cpal::Device,
    config: &StreamConfig,
    mut renderer: PlaybackRenderer,
    error_tx: Sender<AudioError>,
) -> Result<cpal::Stream, AudioError> {
    let channels = config.channels as usize;
    device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                renderer.render_interleaved(data, channels);
            },
            move |err| {
                let _ = error_tx.try_send(AudioError::StreamError(err.to_string()));
            },
            None,
        )
        .map_err(|e| AudioError::CpalError(e.to_string()))
}

/// Integer output formats render through a scratch buffer sized up front
fn build_output<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut renderer: PlaybackRenderer,
    error_tx: Sender<AudioError>,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let initial = match config.buffer_size {
        cpal::BufferSize::Fixed(frames) => frames as usize * channels,
        cpal::BufferSize::Default => 8192 * channels,
    };
    let mut scratch = vec![0.0f32; initial];

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                if scratch.len() < data.len() {
                    scratch.resize(data.len(), 0.0);
                }
                let buf = &mut scratch[..data.len()];
                renderer.render_interleaved(buf, channels);
                for (out, &s) in data.iter_mut().zip(buf.iter()) {
                    *out = T::from_sample(s);
                }
            },
            move |err| {
                let _ = error_tx.try_send(AudioError::StreamError(err.to_string()));
            },
            None,
        )
        .map_err(|e| AudioError::CpalError(e.to_string()))
}
