//! 16-bit PCM sample format conversion
//!
//! Float samples live in the closed interval [-1.0, 1.0]. Scaling into
//! integers is asymmetric (32768 below zero, 32767 above) so that both ends of
//! the float range map onto representable values without overflow.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::CodecError;

/// Bytes per 16-bit sample
pub const BYTES_PER_SAMPLE: usize = 2;

/// Convert one float sample to i16, clamping out-of-range input
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    // NaN has no meaningful amplitude
    let s = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
    if s < 0.0 {
        (s * 32768.0).round() as i16
    } else {
        (s * 32767.0).round() as i16
    }
}

/// Convert one i16 sample to float
#[inline]
pub fn i16_to_f32(sample: i16) -> f32 {
    f32::from(sample) / 32768.0
}

/// Encode float samples as 16-bit signed little-endian PCM bytes
pub fn to_int16(samples: &[f32]) -> Bytes {
    let mut out = BytesMut::with_capacity(samples.len() * BYTES_PER_SAMPLE);
    for &s in samples {
        out.put_i16_le(f32_to_i16(s));
    }
    out.freeze()
}

/// Decode 16-bit signed little-endian PCM bytes into float samples
///
/// Odd-length buffers are a decoding fault.
pub fn to_float(bytes: &[u8]) -> Result<Vec<f32>, CodecError> {
    if bytes.len() % BYTES_PER_SAMPLE != 0 {
        return Err(CodecError::OddLength(bytes.len()));
    }

    Ok(bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|pair| i16_to_f32(i16::from_le_bytes([pair[0], pair[1]])))
        .collect())
}

/// Average interleaved multi-channel samples down to mono
///
/// A trailing incomplete frame is ignored.
pub fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }

    let scale = 1.0 / channels as f32;
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}
