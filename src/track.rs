//! Audio-buffer abstraction the condenser folds over.
//!
//! The condenser only ever needs three capabilities from an audio buffer:
//! - length in milliseconds
//! - slicing by a millisecond range
//! - appending another buffer with a crossfade blend at the join
//!
//! Anything that satisfies [`Track`] can be condensed, which keeps the
//! algorithm decoupled from any specific codec or buffer layout. [`PcmTrack`]
//! is the concrete implementation the rest of the crate uses: mono `f32`
//! samples at a fixed sample rate, the same shape the decode pipeline emits.

/// The capability set the condenser requires.
pub trait Track: Sized {
    /// Total duration in milliseconds.
    fn len_ms(&self) -> u64;

    /// Copy out the `[start_ms, end_ms)` range.
    ///
    /// Out-of-bounds ranges clamp to the track (subtitle timestamps can
    /// legitimately overrun the audio by a little due to encoding rounding),
    /// and negative offsets clamp to zero. An inverted range yields an empty
    /// track.
    fn slice_ms(&self, start_ms: i64, end_ms: i64) -> Self;

    /// Append `other`, blending the last `fade_ms` of `self` with the first
    /// `fade_ms` of `other`.
    ///
    /// A fade longer than either side is clamped down (degrading to a plain
    /// concatenation at 0), never an error.
    fn append_crossfade(&mut self, other: &Self, fade_ms: u64);
}

/// Mono PCM audio: `f32` samples in `[-1.0, 1.0]` at a fixed sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmTrack {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl PcmTrack {
    /// Wrap raw mono samples. `sample_rate` must be non-zero.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        debug_assert!(sample_rate > 0, "sample rate must be non-zero");
        Self {
            samples,
            sample_rate,
        }
    }

    /// An empty track at the given sample rate.
    pub fn empty(sample_rate: u32) -> Self {
        Self::new(Vec::new(), sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Convert milliseconds → number of samples at this track's rate.
    ///
    /// We round to the nearest sample so durations are stable across rates.
    fn ms_to_samples(&self, ms: u64) -> usize {
        ((ms as f64 / 1000.0) * self.sample_rate as f64).round() as usize
    }
}

impl Track for PcmTrack {
    fn len_ms(&self) -> u64 {
        ((self.samples.len() as f64 / self.sample_rate as f64) * 1000.0).round() as u64
    }

    fn slice_ms(&self, start_ms: i64, end_ms: i64) -> Self {
        let len = self.samples.len();

        // Negative offsets clamp to the start of the track rather than
        // wrapping around.
        let start = if start_ms <= 0 {
            0
        } else {
            self.ms_to_samples(start_ms as u64).min(len)
        };

        let end = if end_ms <= 0 {
            0
        } else {
            self.ms_to_samples(end_ms as u64).min(len)
        };

        let end = end.max(start);
        Self::new(self.samples[start..end].to_vec(), self.sample_rate)
    }

    fn append_crossfade(&mut self, other: &Self, fade_ms: u64) {
        debug_assert_eq!(
            self.sample_rate, other.sample_rate,
            "cannot append tracks with different sample rates"
        );

        let fade = self
            .ms_to_samples(fade_ms)
            .min(self.samples.len())
            .min(other.samples.len());

        if fade == 0 {
            self.samples.extend_from_slice(&other.samples);
            return;
        }

        // Linear equal-gain blend over the overlap. The ramp never reaches a
        // pure 0 or 1 inside the window, so both sides contribute at every
        // blended sample.
        let tail_start = self.samples.len() - fade;
        for i in 0..fade {
            let t = (i + 1) as f32 / (fade + 1) as f32;
            let a = self.samples[tail_start + i];
            let b = other.samples[i];
            self.samples[tail_start + i] = a * (1.0 - t) + b * t;
        }

        self.samples.extend_from_slice(&other.samples[fade..]);
    }
}
