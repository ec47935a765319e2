//! Sample rate conversion.
//!
//! Linear interpolation, computed independently for every chunk. Phase is not
//! carried across chunk boundaries, so a stream resampled chunk by chunk can
//! show a sub-sample discontinuity at each boundary. That is a known
//! limitation of this converter, acceptable for speech.

/// Output length for converting `input_len` samples between rates.
///
/// A zero rate on either side yields no output.
#[inline]
pub fn output_len(input_len: usize, source_rate: u32, target_rate: u32) -> usize {
    if source_rate == target_rate {
        return input_len;
    }
    if source_rate == 0 || target_rate == 0 {
        return 0;
    }
    (input_len as f64 * f64::from(target_rate) / f64::from(source_rate)).round() as usize
}

/// Resample mono `samples` from `source_rate` to `target_rate`.
///
/// Equal rates return the input unchanged.
pub fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate {
        return samples.to_vec();
    }

    let mut output = vec![0.0; output_len(samples.len(), source_rate, target_rate)];
    resample_into(samples, source_rate, target_rate, &mut output);
    output
}

/// Resample into a caller-provided buffer.
///
/// Fills every slot of `output` by treating it as the target-rate rendition
/// of `samples`; pass a buffer of [`output_len`] samples for the canonical
/// length. Source rate 0 or an empty input produce silence.
pub fn resample_into(samples: &[f32], source_rate: u32, target_rate: u32, output: &mut [f32]) {
    if samples.is_empty() || source_rate == 0 || target_rate == 0 {
        output.fill(0.0);
        return;
    }

    if source_rate == target_rate {
        let n = output.len().min(samples.len());
        output[..n].copy_from_slice(&samples[..n]);
        output[n..].fill(0.0);
        return;
    }

    let step = f64::from(source_rate) / f64::from(target_rate);
    let last = samples.len() - 1;

    for (i, out) in output.iter_mut().enumerate() {
        let pos = i as f64 * step;
        let lo = (pos.floor() as usize).min(last);
        let hi = (lo + 1).min(last);
        let frac = (pos - lo as f64) as f32;
        *out = samples[lo] + (samples[hi] - samples[lo]) * frac.clamp(0.0, 1.0);
    }
}

/// A fixed-pair converter, handy where one direction is used repeatedly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearResampler {
    source_rate: u32,
    target_rate: u32,
}

impl LinearResampler {
    pub fn new(source_rate: u32, target_rate: u32) -> Self {
        Self {
            source_rate,
            target_rate,
        }
    }

    pub fn source_rate(&self) -> u32 {
        self.source_rate
    }

    pub fn target_rate(&self) -> u32 {
        self.target_rate
    }

    /// True when conversion is the identity
    pub fn is_passthrough(&self) -> bool {
        self.source_rate == self.target_rate
    }

    pub fn process(&self, samples: &[f32]) -> Vec<f32> {
        resample(samples, self.source_rate, self.target_rate)
    }

    pub fn output_len(&self, input_len: usize) -> usize {
        output_len(input_len, self.source_rate, self.target_rate)
    }
}
