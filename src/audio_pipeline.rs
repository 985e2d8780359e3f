//! PCM normalization: downmix decoded audio to mono, optionally resample.
//!
//! Two consumers with different needs share this pipeline:
//! - the transcriber wants mono at whisper's fixed 16 kHz
//! - the condenser wants mono at the source rate, untouched
//!
//! Construct with `Some(rate)` to resample, `None` to keep whatever the
//! container provides. `finalize()` must be called at end-of-stream to flush
//! any remaining resampler input.

use anyhow::{Context, Result, anyhow, bail};
use rubato::{Resampler, SincFixedIn, WindowFunction};
use symphonia::core::audio::{AudioBufferRef, SampleBuffer};

/// A small stateful pipeline that converts decoded audio into mono `f32`.
pub struct AudioPipeline {
    /// Desired output rate; `None` means "keep the source rate".
    target_rate: Option<u32>,

    // Scratch buffer used to copy decoded PCM into an interleaved `Vec<f32>`.
    sample_buf_f32: Option<SampleBuffer<f32>>,

    // Lazily initialized resampler (only needed when the source sample rate
    // differs from the target).
    resampler: Option<SincFixedIn<f32>>,

    // Accumulator for mono source samples before feeding full blocks into rubato.
    mono_src_acc: Vec<f32>,
}

impl AudioPipeline {
    pub fn new(target_rate: Option<u32>) -> Self {
        Self {
            target_rate,
            sample_buf_f32: None,
            resampler: None,
            mono_src_acc: Vec::new(),
        }
    }

    /// Push a decoded Symphonia buffer through the pipeline.
    ///
    /// The `emit` callback receives mono `f32` samples at the output rate.
    pub fn push_decoded(
        &mut self,
        decoded: &AudioBufferRef<'_>,
        mut emit: impl FnMut(&[f32]) -> Result<()>,
    ) -> Result<()> {
        let (interleaved, src_rate, channels) = self.to_interleaved_f32(decoded)?;
        let mono_src = downmix_to_mono(&interleaved, channels);

        match self.target_rate {
            // Slow path: resample to the requested rate.
            Some(target) if target != src_rate => {
                self.ensure_resampler(src_rate, target)?;
                self.push_through_resampler(&mono_src, &mut emit)
            }

            // Fast path: already at the output rate (or no target requested).
            _ => emit(&mono_src),
        }
    }

    /// Flush remaining buffered samples at end-of-stream.
    ///
    /// If resampling was never needed, this is a no-op.
    pub fn finalize(&mut self, mut emit: impl FnMut(&[f32]) -> Result<()>) -> Result<()> {
        let Some(rs) = self.resampler.as_mut() else {
            return Ok(());
        };

        if self.mono_src_acc.is_empty() {
            return Ok(());
        }

        // rubato expects exact block sizes; pad the remainder with zeros.
        let in_max = rs.input_frames_max();
        let rem = self.mono_src_acc.len() % in_max;
        if rem != 0 {
            self.mono_src_acc
                .resize(self.mono_src_acc.len() + (in_max - rem), 0.0);
        }

        while !self.mono_src_acc.is_empty() {
            let block: Vec<f32> = self.mono_src_acc.drain(..in_max).collect();
            let out = rs
                .process(&[block], None)
                .map_err(|e| anyhow!(e))
                .context("resampler process failed")?;
            emit(&out[0])?;
        }

        Ok(())
    }

    fn ensure_resampler(&mut self, src_rate: u32, target_rate: u32) -> Result<()> {
        if self.resampler.is_some() {
            return Ok(());
        }

        // How many source frames we feed rubato per `process()` call.
        // Tradeoff: larger chunks = better throughput; smaller chunks = lower latency.
        let in_chunk_src_frames = 2048;

        let rs = SincFixedIn::<f32>::new(
            target_rate as f64 / src_rate as f64,
            2.0,
            rubato::SincInterpolationParameters {
                sinc_len: 256,
                f_cutoff: 0.95,
                interpolation: rubato::SincInterpolationType::Linear,
                oversampling_factor: 256,
                window: WindowFunction::BlackmanHarris2,
            },
            in_chunk_src_frames,
            1, // mono
        )
        .map_err(|e| anyhow!(e))
        .context("failed to init resampler")?;

        self.resampler = Some(rs);
        Ok(())
    }

    fn push_through_resampler(
        &mut self,
        mono_src: &[f32],
        emit: &mut impl FnMut(&[f32]) -> Result<()>,
    ) -> Result<()> {
        self.mono_src_acc.extend_from_slice(mono_src);

        loop {
            let rs = self
                .resampler
                .as_mut()
                .ok_or_else(|| anyhow!("resampler not initialized"))?;
            let in_max = rs.input_frames_max();

            if self.mono_src_acc.len() < in_max {
                break;
            }

            let block: Vec<f32> = self.mono_src_acc.drain(..in_max).collect();
            let out = rs
                .process(&[block], None)
                .map_err(|e| anyhow!(e))
                .context("resampler process failed")?;
            emit(&out[0])?;
        }

        Ok(())
    }

    fn to_interleaved_f32(&mut self, decoded: &AudioBufferRef<'_>) -> Result<(Vec<f32>, u32, usize)> {
        if self.sample_buf_f32.is_none() {
            let spec = *decoded.spec();
            let duration = decoded.capacity() as u64;
            self.sample_buf_f32 = Some(SampleBuffer::<f32>::new(duration, spec));
        }

        let buf = self
            .sample_buf_f32
            .as_mut()
            .ok_or_else(|| anyhow!("sample buffer not initialized"))?;

        // Copy decoded PCM into our interleaved scratch buffer.
        buf.copy_interleaved_ref(decoded.clone());

        let src_rate = decoded.spec().rate;
        let channels = decoded.spec().channels.count();
        if channels == 0 {
            bail!("decoded audio had zero channels");
        }

        Ok((buf.samples().to_vec(), src_rate, channels))
    }
}

/// Downmix interleaved samples into mono by averaging channels.
///
/// Policy: equal-weight average across channels (simple, predictable).
fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }

    let frames = interleaved.len() / channels;
    let mut mono = Vec::with_capacity(frames);

    for f in 0..frames {
        let base = f * channels;
        let mut acc = 0.0;
        for c in 0..channels {
            acc += interleaved[base + c];
        }
        mono.push(acc / channels as f32);
    }

    mono
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_is_noop_without_resampler() -> anyhow::Result<()> {
        let mut pipeline = AudioPipeline::new(None);
        pipeline.finalize(|_| Ok(()))?;
        Ok(())
    }

    #[test]
    fn downmix_to_mono_single_channel_is_identity() {
        let input = vec![0.0, 1.0, -1.0];
        let mono = downmix_to_mono(&input, 1);
        assert_eq!(mono, input);
    }

    #[test]
    fn downmix_to_mono_averages_channels() {
        // Two frames of stereo: (L=1, R=3), (L=-1, R=1) => mono: 2, 0
        let interleaved = vec![1.0, 3.0, -1.0, 1.0];
        let mono = downmix_to_mono(&interleaved, 2);
        assert_eq!(mono, vec![2.0, 0.0]);
    }

    #[test]
    fn resampler_errors_when_uninitialized() {
        let mut pipeline = AudioPipeline::new(Some(16_000));
        let err = pipeline
            .push_through_resampler(&[0.0; 4096], &mut |_| Ok(()))
            .unwrap_err();
        assert!(err.to_string().contains("resampler not initialized"));
    }

    #[test]
    fn resample_path_emits_and_finalize_flushes_remainder() -> anyhow::Result<()> {
        let mut pipeline = AudioPipeline::new(Some(16_000));
        pipeline.ensure_resampler(8_000, 16_000)?;
        pipeline.ensure_resampler(8_000, 16_000)?; // idempotent

        let in_max = pipeline
            .resampler
            .as_ref()
            .expect("resampler initialized")
            .input_frames_max();

        // Enough samples to force multiple full blocks plus a remainder that
        // `finalize()` flushes.
        let mono_src = vec![0.0; (in_max * 2) + 7];

        let mut emitted_samples = 0usize;
        pipeline.push_through_resampler(&mono_src, &mut |chunk| {
            emitted_samples += chunk.len();
            Ok(())
        })?;

        // We expect the remainder to be smaller than one full rubato input block.
        assert!(pipeline.mono_src_acc.len() < in_max);

        pipeline.finalize(|chunk| {
            emitted_samples += chunk.len();
            Ok(())
        })?;

        assert!(emitted_samples > 0);
        Ok(())
    }
}
