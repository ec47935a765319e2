//! PCM sample format and sample rate conversion
//!
//! Both halves are stateless: every call converts one buffer on its own.

pub mod pcm;
pub mod resample;

pub use pcm::{downmix_to_mono, f32_to_i16, i16_to_f32, to_float, to_int16};
pub use resample::{resample, LinearResampler};
