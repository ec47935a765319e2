//! Mono PCM frames with a declared rate and encoding

use crate::codec::pcm::{f32_to_i16, i16_to_f32};

/// Sample storage of a frame
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    /// 16-bit signed integer PCM
    Int16(Vec<i16>),
    /// Normalized float PCM in [-1.0, 1.0]
    Float(Vec<f32>),
}

/// Declared sample encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    Int16,
    Float,
}

/// An ordered run of mono samples
///
/// Rate and encoding are fixed at construction. Conversions return new frames.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    samples: Samples,
    sample_rate: u32,
}

impl AudioFrame {
    pub fn from_float(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: Samples::Float(samples),
            sample_rate,
        }
    }

    pub fn from_int16(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples: Samples::Int16(samples),
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Always 1
    pub fn channels(&self) -> u16 {
        1
    }

    pub fn encoding(&self) -> SampleEncoding {
        match self.samples {
            Samples::Int16(_) => SampleEncoding::Int16,
            Samples::Float(_) => SampleEncoding::Float,
        }
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    pub fn len(&self) -> usize {
        match &self.samples {
            Samples::Int16(s) => s.len(),
            Samples::Float(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frame duration in microseconds
    pub fn duration_us(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.len() as u64 * 1_000_000) / u64::from(self.sample_rate)
    }

    /// Consume the frame, yielding float samples
    pub fn into_float(self) -> Vec<f32> {
        match self.samples {
            Samples::Float(s) => s,
            Samples::Int16(s) => s.into_iter().map(i16_to_f32).collect(),
        }
    }

    /// Consume the frame, yielding 16-bit samples
    pub fn into_int16(self) -> Vec<i16> {
        match self.samples {
            Samples::Int16(s) => s,
            Samples::Float(s) => s.into_iter().map(f32_to_i16).collect(),
        }
    }
}
