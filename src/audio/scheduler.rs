//! Playback scheduling
//!
//! [`playback_channel`] splits playback into a [`PlaybackScheduler`], driven
//! by network arrivals, and a [`PlaybackRenderer`], driven by the output
//! device callback. Two strategies sit behind that pair:
//!
//! - **Ring buffer**: decoded samples are appended to a [`playback_ring`]
//!   and the renderer drains exactly what each callback asks for.
//! - **Clock scheduled**: each chunk gets a start time on the device clock
//!   (frames rendered so far) from a [`ScheduleClock`], and the renderer
//!   plays every chunk whose window overlaps the current callback.
//!
//! Interruption discards everything not yet played in either mode. The
//! renderer path takes no locks, logs nothing and does not allocate.

use crossbeam::queue::ArrayQueue;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::audio::buffer::{playback_ring, RingReader, RingWriter};
use crate::codec::resample;
use crate::config::PlaybackConfig;
use crate::error::CodecError;
use crate::protocol::TransportChunk;

/// Chunks in flight between scheduler and renderer (clock mode)
const PENDING_CHUNKS: usize = 1024;

/// Chunks the renderer keeps active at once (clock mode)
const ACTIVE_CHUNKS: usize = 256;

/// How decoded audio is handed to the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStrategy {
    #[default]
    RingBuffer,
    ClockScheduled,
}

/// Next-chunk start time on the output device's frame clock
///
/// A run starts `lead_in` frames after the current device time. While the
/// run lasts, each chunk starts exactly where the previous one ended. Once
/// the device clock passes the end of the run, or after [`reset`], the next
/// chunk starts a new run.
///
/// [`reset`]: ScheduleClock::reset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleClock {
    next_start: Option<u64>,
    lead_in: u64,
}

impl ScheduleClock {
    pub fn new(lead_in: u64) -> Self {
        Self {
            next_start: None,
            lead_in,
        }
    }

    /// Reserve `duration` frames; returns the start frame
    pub fn schedule(&mut self, now: u64, duration: u64) -> u64 {
        let start = match self.next_start {
            Some(end) if end >= now => end,
            _ => now + self.lead_in,
        };
        self.next_start = Some(start + duration);
        start
    }

    /// Forget the current run
    pub fn reset(&mut self) {
        self.next_start = None;
    }

    /// End of the current run, if any
    pub fn next_start(&self) -> Option<u64> {
        self.next_start
    }

    pub fn lead_in(&self) -> u64 {
        self.lead_in
    }
}

/// Where a chunk landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enqueued {
    /// Frames handed to the renderer side
    pub frames: usize,
    /// Start frame on the device clock (clock mode only)
    pub start: Option<u64>,
}

/// Scheduler statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub chunks_scheduled: u64,
    pub chunks_dropped: u64,
    pub interruptions: u64,
    pub overflowed_samples: u64,
    pub underruns: usize,
}

struct ScheduledChunk {
    start: u64,
    samples: Vec<f32>,
    epoch: u64,
}

impl ScheduledChunk {
    fn end(&self) -> u64 {
        self.start + self.samples.len() as u64
    }
}

struct ClockShared {
    pending: ArrayQueue<ScheduledChunk>,
    /// Played-out buffers handed back so they are freed off the device thread
    spent: ArrayQueue<Vec<f32>>,
    epoch: AtomicU64,
    now: AtomicU64,
}

enum ProducerSide {
    Ring(RingWriter),
    Clock {
        shared: Arc<ClockShared>,
        clock: ScheduleClock,
    },
}

enum RenderSide {
    Ring(RingReader),
    Clock(ClockRenderer),
}

/// Create a connected scheduler/renderer pair for a device running at
/// `output_rate`.
pub fn playback_channel(
    config: &PlaybackConfig,
    output_rate: u32,
) -> (PlaybackScheduler, PlaybackRenderer) {
    let active = Arc::new(AtomicBool::new(true));
    let frames_per_ms = f64::from(output_rate) / 1000.0;

    let (producer, render) = match config.strategy {
        PlaybackStrategy::RingBuffer => {
            let capacity = (f64::from(config.buffer_seconds) * f64::from(output_rate)) as usize;
            let (writer, reader) = playback_ring(capacity);
            (ProducerSide::Ring(writer), RenderSide::Ring(reader))
        }
        PlaybackStrategy::ClockScheduled => {
            let shared = Arc::new(ClockShared {
                pending: ArrayQueue::new(PENDING_CHUNKS),
                spent: ArrayQueue::new(PENDING_CHUNKS),
                epoch: AtomicU64::new(0),
                now: AtomicU64::new(0),
            });
            let lead_in = (f64::from(config.lead_in_ms) * frames_per_ms).round() as u64;
            (
                ProducerSide::Clock {
                    shared: shared.clone(),
                    clock: ScheduleClock::new(lead_in),
                },
                RenderSide::Clock(ClockRenderer {
                    shared,
                    active: VecDeque::with_capacity(ACTIVE_CHUNKS),
                    now: 0,
                    lag: 0,
                    epoch: 0,
                }),
            )
        }
    };

    let scheduler = PlaybackScheduler {
        side: producer,
        output_rate,
        active: active.clone(),
        stats: SchedulerStats::default(),
    };

    let renderer = PlaybackRenderer {
        side: render,
        active,
        last_sample: 0.0,
        ramp_len: (f64::from(config.declick_ms) * frames_per_ms).round() as usize,
        ramp_pos: 0,
        ramp_from: 0.0,
    };

    (scheduler, renderer)
}

/// Network-side half of playback
pub struct PlaybackScheduler {
    side: ProducerSide,
    output_rate: u32,
    active: Arc<AtomicBool>,
    stats: SchedulerStats,
}

impl PlaybackScheduler {
    /// Decode a downstream chunk, convert it to the device rate and enqueue it
    pub fn schedule_chunk(&mut self, chunk: &TransportChunk) -> Result<Enqueued, CodecError> {
        let frame = chunk.decode()?;
        let rate = frame.sample_rate();
        let samples = resample::resample(&frame.into_float(), rate, self.output_rate);
        Ok(self.enqueue(samples))
    }

    /// Enqueue samples that are already at the device rate
    pub fn enqueue(&mut self, samples: Vec<f32>) -> Enqueued {
        let frames = samples.len();
        match &mut self.side {
            ProducerSide::Ring(writer) => {
                writer.write(&samples);
                self.stats.chunks_scheduled += 1;
                Enqueued {
                    frames,
                    start: None,
                }
            }
            ProducerSide::Clock { shared, clock } => {
                while shared.spent.pop().is_some() {}

                let now = shared.now.load(Ordering::Acquire);
                let epoch = shared.epoch.load(Ordering::Relaxed);
                let reserved = *clock;
                let start = clock.schedule(now, frames as u64);
                let chunk = ScheduledChunk {
                    start,
                    samples,
                    epoch,
                };

                match shared.pending.push(chunk) {
                    Ok(()) => {
                        self.stats.chunks_scheduled += 1;
                        Enqueued {
                            frames,
                            start: Some(start),
                        }
                    }
                    Err(_) => {
                        // Renderer is not draining; hand the reserved span back
                        // so later chunks stay behind the ones already queued
                        *clock = reserved;
                        self.stats.chunks_dropped += 1;
                        tracing::warn!("Playback queue full, dropping {} frames", frames);
                        Enqueued {
                            frames: 0,
                            start: None,
                        }
                    }
                }
            }
        }
    }

    /// Discard all audio that has not been played yet
    pub fn interrupt(&mut self) {
        match &mut self.side {
            ProducerSide::Ring(writer) => writer.clear(),
            ProducerSide::Clock { shared, clock } => {
                shared.epoch.fetch_add(1, Ordering::AcqRel);
                clock.reset();
            }
        }
        self.stats.interruptions += 1;
    }

    /// Silence the renderer permanently and discard pending audio
    pub fn shutdown(&mut self) {
        self.active.store(false, Ordering::Release);
        self.interrupt();
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Frames still waiting to be rendered
    pub fn pending_frames(&self) -> usize {
        match &self.side {
            ProducerSide::Ring(writer) => writer.available(),
            ProducerSide::Clock { shared, clock } => {
                let now = shared.now.load(Ordering::Acquire);
                clock
                    .next_start()
                    .map_or(0, |end| end.saturating_sub(now) as usize)
            }
        }
    }

    /// True when nothing is buffered or scheduled past the device clock
    pub fn is_idle(&self) -> bool {
        self.pending_frames() == 0
    }

    /// Current schedule clock in frames (clock mode), if known.
    ///
    /// This is the device clock minus any time the renderer held the
    /// schedule back for a chunk that arrived late.
    pub fn device_time(&self) -> Option<u64> {
        match &self.side {
            ProducerSide::Ring(_) => None,
            ProducerSide::Clock { shared, .. } => Some(shared.now.load(Ordering::Acquire)),
        }
    }

    pub fn strategy(&self) -> PlaybackStrategy {
        match self.side {
            ProducerSide::Ring(_) => PlaybackStrategy::RingBuffer,
            ProducerSide::Clock { .. } => PlaybackStrategy::ClockScheduled,
        }
    }

    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    pub fn stats(&self) -> SchedulerStats {
        let mut stats = self.stats.clone();
        if let ProducerSide::Ring(writer) = &self.side {
            stats.overflowed_samples = writer.overflow_count();
            stats.underruns = writer.underrun_count();
        }
        stats
    }
}

/// Device-side half of playback
pub struct PlaybackRenderer {
    side: RenderSide,
    active: Arc<AtomicBool>,
    last_sample: f32,
    ramp_len: usize,
    ramp_pos: usize,
    ramp_from: f32,
}

impl PlaybackRenderer {
    /// Fill `out` with the next mono samples.
    ///
    /// Returns the number of frames that carried audio; the rest is silence.
    pub fn render(&mut self, out: &mut [f32]) -> usize {
        if !self.active.load(Ordering::Acquire) {
            out.fill(0.0);
            self.last_sample = 0.0;
            self.ramp_pos = self.ramp_len;
            return 0;
        }

        let (frames, flushed) = match &mut self.side {
            RenderSide::Ring(reader) => {
                let n = reader.drain_into(out);
                (n, reader.take_flush())
            }
            RenderSide::Clock(clock) => clock.render(out),
        };

        if flushed && self.last_sample != 0.0 && self.ramp_len > 0 {
            self.ramp_from = self.last_sample;
            self.ramp_pos = 0;
        }

        for sample in out.iter_mut() {
            if self.ramp_pos >= self.ramp_len {
                break;
            }
            self.ramp_pos += 1;
            let remaining = 1.0 - self.ramp_pos as f32 / self.ramp_len as f32;
            *sample += self.ramp_from * remaining;
        }

        if let Some(&last) = out.last() {
            self.last_sample = last;
        }
        frames
    }

    /// Fill an interleaved buffer, duplicating mono into every channel
    pub fn render_interleaved(&mut self, out: &mut [f32], channels: usize) -> usize {
        if channels <= 1 {
            return self.render(out);
        }

        let frames = out.len() / channels;
        let produced = self.render(&mut out[..frames]);

        // Expand in place from the back so no sample is overwritten early
        for i in (0..frames).rev() {
            let s = out[i];
            out[i * channels..(i + 1) * channels].fill(s);
        }
        out[frames * channels..].fill(0.0);
        produced
    }
}

struct ClockRenderer {
    shared: Arc<ClockShared>,
    active: VecDeque<ScheduledChunk>,
    /// Device frames rendered so far
    now: u64,
    /// Device clock minus schedule clock
    lag: u64,
    epoch: u64,
}

impl ClockRenderer {
    fn render(&mut self, out: &mut [f32]) -> (usize, bool) {
        out.fill(0.0);

        let epoch = self.shared.epoch.load(Ordering::Acquire);
        let flushed = epoch != self.epoch;
        if flushed {
            self.epoch = epoch;
            while let Some(chunk) = self.active.pop_front() {
                self.retire(chunk);
            }
        }

        while self.active.len() < ACTIVE_CHUNKS {
            match self.shared.pending.pop() {
                Some(chunk) if chunk.epoch < epoch => self.retire(chunk),
                Some(chunk) => {
                    // A chunk whose start already went by was reserved against
                    // a stale clock. Everything before it in the run has played
                    // out, so hold the schedule clock back until it starts.
                    let schedule_now = self.now - self.lag;
                    if chunk.start < schedule_now {
                        self.lag += schedule_now - chunk.start;
                    }
                    self.active.push_back(chunk);
                }
                None => break,
            }
        }

        let window_start = self.now - self.lag;
        let window_end = window_start + out.len() as u64;
        let mut covered = 0usize;

        for chunk in self.active.iter() {
            if chunk.epoch < epoch {
                continue;
            }
            let from = chunk.start.max(window_start);
            let to = chunk.end().min(window_end);
            if from >= to {
                continue;
            }
            let src = &chunk.samples[(from - chunk.start) as usize..(to - chunk.start) as usize];
            let dst = &mut out[(from - window_start) as usize..(to - window_start) as usize];
            for (d, s) in dst.iter_mut().zip(src) {
                *d += *s;
            }
            covered += (to - from) as usize;
        }

        while self
            .active
            .front()
            .is_some_and(|c| c.end() <= window_end || c.epoch < epoch)
        {
            if let Some(chunk) = self.active.pop_front() {
                self.retire(chunk);
            }
        }

        self.now += out.len() as u64;
        self.shared.now.store(window_end, Ordering::Release);
        (covered.min(out.len()), flushed)
    }

    fn retire(&self, chunk: ScheduledChunk) {
        // A full return queue means the buffer is freed here instead
        let _ = self.shared.spent.push(chunk.samples);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(strategy: PlaybackStrategy) -> PlaybackConfig {
        PlaybackConfig {
            strategy,
            buffer_seconds: 1.0,
            lead_in_ms: 50,
            declick_ms: 0,
            ..PlaybackConfig::default()
        }
    }

    #[test]
    fn test_schedule_clock_back_to_back() {
        let mut clock = ScheduleClock::new(50);
        let a = clock.schedule(1000, 400);
        assert_eq!(a, 1050);
        let b = clock.schedule(1000, 400);
        assert_eq!(b, a + 400);
        // Clock advanced but still inside the run
        let c = clock.schedule(1600, 100);
        assert_eq!(c, b + 400);
    }

    #[test]
    fn test_schedule_clock_reset_restarts_with_lead_in() {
        let mut clock = ScheduleClock::new(50);
        clock.schedule(0, 400);
        clock.reset();
        assert_eq!(clock.schedule(120, 400), 170);
    }

    #[test]
    fn test_schedule_clock_starved_run_restarts() {
        let mut clock = ScheduleClock::new(50);
        let a = clock.schedule(0, 100);
        assert_eq!(a, 50);
        // Device passed the end of the run at 150
        assert_eq!(clock.schedule(500, 100), 550);
    }

    #[test]
    fn test_ring_strategy_plays_in_order() {
        let (mut scheduler, mut renderer) =
            playback_channel(&config(PlaybackStrategy::RingBuffer), 24000);
        scheduler.enqueue(vec![0.1, 0.2]);
        scheduler.enqueue(vec![0.3]);
        assert_eq!(scheduler.pending_frames(), 3);

        let mut out = [0.0; 4];
        assert_eq!(renderer.render(&mut out), 3);
        assert_eq!(out, [0.1, 0.2, 0.3, 0.0]);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_ring_strategy_interrupt_discards() {
        let (mut scheduler, mut renderer) =
            playback_channel(&config(PlaybackStrategy::RingBuffer), 24000);
        scheduler.enqueue(vec![0.5; 100]);
        scheduler.interrupt();
        scheduler.enqueue(vec![0.25; 10]);

        let mut out = [0.0; 20];
        assert_eq!(renderer.render(&mut out), 10);
        assert!(out[..10].iter().all(|&s| s == 0.25));
        assert!(out[10..].iter().all(|&s| s == 0.0));
        assert_eq!(scheduler.stats().interruptions, 1);
    }

    #[test]
    fn test_clock_strategy_gapless() {
        let (mut scheduler, mut renderer) =
            playback_channel(&config(PlaybackStrategy::ClockScheduled), 1000);
        // 50 ms lead-in at 1 kHz = 50 frames
        let a = scheduler.enqueue(vec![0.5; 30]);
        let b = scheduler.enqueue(vec![-0.5; 30]);
        assert_eq!(a.start, Some(50));
        assert_eq!(b.start, Some(80));

        let mut out = vec![0.0; 120];
        assert_eq!(renderer.render(&mut out), 60);
        assert!(out[..50].iter().all(|&s| s == 0.0));
        assert!(out[50..80].iter().all(|&s| s == 0.5));
        assert!(out[80..110].iter().all(|&s| s == -0.5));
        assert!(out[110..].iter().all(|&s| s == 0.0));
        assert_eq!(scheduler.device_time(), Some(120));
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_clock_strategy_spans_callbacks() {
        let (mut scheduler, mut renderer) =
            playback_channel(&config(PlaybackStrategy::ClockScheduled), 1000);
        let samples: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        scheduler.enqueue(samples.clone());

        let mut played = Vec::new();
        let mut out = [0.0; 16];
        for _ in 0..10 {
            renderer.render(&mut out);
            played.extend_from_slice(&out);
        }
        assert_eq!(&played[50..150], &samples[..]);
    }

    #[test]
    fn test_clock_strategy_interrupt_cancels_and_resets() {
        let (mut scheduler, mut renderer) =
            playback_channel(&config(PlaybackStrategy::ClockScheduled), 1000);
        scheduler.enqueue(vec![0.5; 200]);

        let mut out = [0.0; 60];
        renderer.render(&mut out);
        assert_eq!(&out[50..], &[0.5; 10]);

        scheduler.interrupt();
        let next = scheduler.enqueue(vec![0.25; 10]);
        assert_eq!(next.start, Some(60 + 50));

        let mut out = [0.0; 100];
        renderer.render(&mut out);
        assert!(out[..50].iter().all(|&s| s == 0.0));
        assert!(out[50..60].iter().all(|&s| s == 0.25));
        assert!(out[60..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_clock_strategy_full_queue_keeps_run_order() {
        let (mut scheduler, mut renderer) =
            playback_channel(&config(PlaybackStrategy::ClockScheduled), 1000);
        for _ in 0..PENDING_CHUNKS {
            scheduler.enqueue(vec![0.5; 10]);
        }
        let last_end = 50 + 10 * PENDING_CHUNKS as u64;
        assert_eq!(scheduler.enqueue(vec![0.9; 10]).frames, 0);
        assert_eq!(scheduler.stats().chunks_dropped, 1);

        let mut played = vec![0.0; 1];
        renderer.render(&mut played);

        let next = scheduler.enqueue(vec![-0.25; 10]);
        assert_eq!(next.start, Some(last_end));

        let mut out = [0.0; 100];
        for _ in 0..105 {
            renderer.render(&mut out);
            played.extend_from_slice(&out);
        }
        let end = last_end as usize;
        assert!(played[50..end].iter().all(|&s| s == 0.5));
        assert!(played[end..end + 10].iter().all(|&s| s == -0.25));
        assert!(played[end + 10..].iter().all(|&s| s == 0.0));
    }

    /// Queue a chunk with an explicit start, as a scheduler holding a stale
    /// clock reading would
    fn push_at(scheduler: &PlaybackScheduler, start: u64, samples: Vec<f32>) {
        let ProducerSide::Clock { shared, .. } = &scheduler.side else {
            panic!("clock strategy expected");
        };
        let epoch = shared.epoch.load(Ordering::Relaxed);
        assert!(shared
            .pending
            .push(ScheduledChunk {
                start,
                samples,
                epoch,
            })
            .is_ok());
    }

    #[test]
    fn test_clock_strategy_late_chunk_plays_whole() {
        let (mut scheduler, mut renderer) =
            playback_channel(&config(PlaybackStrategy::ClockScheduled), 1000);
        assert_eq!(scheduler.enqueue(vec![0.5; 30]).start, Some(50));

        let mut out = vec![0.0; 90];
        renderer.render(&mut out);
        assert!(out[50..80].iter().all(|&s| s == 0.5));

        // Run continues at 80, but the device already passed 90
        push_at(&scheduler, 80, vec![0.25; 20]);
        push_at(&scheduler, 100, vec![-0.25; 20]);

        let mut out = vec![0.0; 60];
        assert_eq!(renderer.render(&mut out), 40);
        assert!(out[..20].iter().all(|&s| s == 0.25));
        assert!(out[20..40].iter().all(|&s| s == -0.25));
        assert!(out[40..].iter().all(|&s| s == 0.0));
        // Schedule clock held back by the 10 frames the chunk was late
        assert_eq!(scheduler.device_time(), Some(140));
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_clock_strategy_interleaved_render_and_enqueue() {
        let (mut scheduler, mut renderer) =
            playback_channel(&config(PlaybackStrategy::ClockScheduled), 1000);
        let samples: Vec<f32> = (1..=400).map(|i| i as f32 / 1000.0).collect();

        let mut played = Vec::new();
        let mut out = [0.0; 16];
        for chunk in samples.chunks(40) {
            scheduler.enqueue(chunk.to_vec());
            renderer.render(&mut out);
            played.extend_from_slice(&out);
        }
        for _ in 0..20 {
            renderer.render(&mut out);
            played.extend_from_slice(&out);
        }

        let heard: Vec<f32> = played.into_iter().filter(|&s| s != 0.0).collect();
        assert_eq!(heard, samples);
    }

    #[test]
    fn test_schedule_chunk_resamples_to_device_rate() {
        let (mut scheduler, mut renderer) =
            playback_channel(&config(PlaybackStrategy::RingBuffer), 48000);
        let frame = crate::audio::frame::AudioFrame::from_int16(vec![16384; 240], 24000);
        let chunk = TransportChunk::encode(&frame);

        let enqueued = scheduler.schedule_chunk(&chunk).unwrap();
        assert_eq!(enqueued.frames, 480);
        let mut out = vec![0.0; 480];
        assert_eq!(renderer.render(&mut out), 480);
        assert!(out.iter().all(|&s| s == 0.5));
    }

    #[test]
    fn test_declick_ramp_after_interrupt() {
        let mut cfg = config(PlaybackStrategy::RingBuffer);
        cfg.declick_ms = 4;
        let (mut scheduler, mut renderer) = playback_channel(&cfg, 1000);
        scheduler.enqueue(vec![0.8; 100]);

        let mut out = [0.0; 10];
        renderer.render(&mut out);
        scheduler.interrupt();

        let mut out = [0.0; 8];
        assert_eq!(renderer.render(&mut out), 0);
        assert!((out[0] - 0.6).abs() < 1e-6);
        assert!((out[1] - 0.4).abs() < 1e-6);
        assert!((out[2] - 0.2).abs() < 1e-6);
        assert!(out[3..].iter().all(|&s| s.abs() < 1e-6));
    }

    #[test]
    fn test_shutdown_silences_renderer() {
        let (mut scheduler, mut renderer) =
            playback_channel(&config(PlaybackStrategy::RingBuffer), 1000);
        scheduler.enqueue(vec![0.5; 10]);
        scheduler.shutdown();
        scheduler.enqueue(vec![0.5; 10]);

        let mut out = [1.0; 10];
        assert_eq!(renderer.render(&mut out), 0);
        assert_eq!(out, [0.0; 10]);
        assert!(!scheduler.is_active());
    }

    #[test]
    fn test_render_interleaved_duplicates_channels() {
        let (mut scheduler, mut renderer) =
            playback_channel(&config(PlaybackStrategy::RingBuffer), 1000);
        scheduler.enqueue(vec![0.1, 0.2, 0.3]);

        let mut out = [9.0; 7];
        assert_eq!(renderer.render_interleaved(&mut out, 2), 3);
        assert_eq!(out, [0.1, 0.1, 0.2, 0.2, 0.3, 0.3, 0.0]);
    }
}
