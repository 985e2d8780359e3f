use std::path::Path;

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};

use crate::track::PcmTrack;

/// Write a mono track to disk as 16-bit PCM WAV.
///
/// Why WAV:
/// - hound writes it natively, with no external encoder process
/// - lossless, so the condensed output is only ever re-encoded by choice
pub fn write_track(path: &Path, track: &PcmTrack) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: track.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("failed to create WAV file: {}", path.display()))?;

    for &sample in track.samples() {
        // Clamp before quantizing; decoded floats can overshoot [-1, 1]
        // slightly, and crossfade sums can too.
        let pcm = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(pcm)?;
    }

    writer
        .finalize()
        .with_context(|| format!("failed to finalize WAV file: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_readable_mono_wav() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.wav");

        let track = PcmTrack::new(vec![0.0, 0.5, -0.5, 1.0, -1.0], 44_100);
        write_track(&path, &track)?;

        let mut reader = hound::WavReader::open(&path)?;
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 44_100);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.samples::<i16>().collect::<Result<_, _>>()?;
        assert_eq!(samples.len(), 5);
        assert_eq!(samples[0], 0);
        assert_eq!(samples[3], i16::MAX);
        Ok(())
    }

    #[test]
    fn clamps_overshooting_samples() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("hot.wav");

        let track = PcmTrack::new(vec![1.7, -1.7], 16_000);
        write_track(&path, &track)?;

        let mut reader = hound::WavReader::open(&path)?;
        let samples: Vec<i16> = reader.samples::<i16>().collect::<Result<_, _>>()?;
        assert_eq!(samples, vec![i16::MAX, -i16::MAX]);
        Ok(())
    }
}
