//! Audio subsystem module

pub mod buffer;
pub mod capture;
pub mod device;
pub mod frame;
pub mod mock;
pub mod scheduler;

pub use buffer::{playback_ring, RingReader, RingWriter};
pub use capture::{CaptureStats, CaptureStream, FrameChunker, FrameSink};
pub use device::{list_devices, AudioDeviceInfo, CpalInput, CpalOutput, InputDevice, OutputDevice};
pub use frame::{AudioFrame, SampleEncoding, Samples};
pub use scheduler::{
    playback_channel, Enqueued, PlaybackRenderer, PlaybackScheduler, PlaybackStrategy,
    ScheduleClock, SchedulerStats,
};
