//! Extract the audio track out of a downloaded video file.
//!
//! Symphonia handles the containers yt-dlp typically produces (webm, mkv),
//! so no external ffmpeg binary is involved: probe the container, pick the
//! first decodable audio track, and run packets through the normalization
//! pipeline into one contiguous mono buffer.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet};
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::audio_pipeline::AudioPipeline;
use crate::track::PcmTrack;

/// Decode the audio track of `video` into mono PCM.
///
/// `target_sample_rate`:
/// - `Some(rate)`: resample to `rate` (the transcriber wants 16 kHz)
/// - `None`: keep the source rate (the condenser works on the original audio)
///
/// Track selection policy: the first track that looks decodable (codec !=
/// NULL) and has a known sample rate.
pub fn decode_audio_track(video: &Path, target_sample_rate: Option<u32>) -> Result<PcmTrack> {
    let file = File::open(video)
        .with_context(|| format!("failed to open video file: {}", video.display()))?;

    let mss_opts = MediaSourceStreamOptions {
        // Symphonia expects a power-of-two buffer > 32KiB for good probing behavior.
        buffer_len: 256 * 1024,
    };
    let mss = MediaSourceStream::new(Box::new(file), mss_opts);

    // The extension hint improves probe accuracy for ambiguous containers.
    let mut hint = Hint::new();
    if let Some(ext) = video.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| anyhow!(e))
        .with_context(|| format!("failed to probe container: {}", video.display()))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL && t.codec_params.sample_rate.is_some())
        .cloned()
        .ok_or_else(|| anyhow!("no audio track found in {}", video.display()))?;

    let src_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| anyhow!("audio track has no sample rate"))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &Default::default())
        .map_err(|e| anyhow!(e))
        .context("failed to create decoder for audio track")?;

    let mut pipeline = AudioPipeline::new(target_sample_rate);
    let mut samples = Vec::<f32>::new();

    loop {
        let Some(packet) = next_packet(&mut format)? else {
            break;
        };

        // Ignore packets from non-audio tracks (video, subtitles).
        if packet.track_id() != track.id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => pipeline.push_decoded(&decoded, |chunk| {
                samples.extend_from_slice(chunk);
                Ok(())
            })?,

            // Recoverable: corrupted frame, but decoding can continue.
            Err(SymphoniaError::DecodeError(_)) => continue,

            // Treat IO errors as graceful end-of-stream.
            Err(SymphoniaError::IoError(_)) => break,

            // Anything else is considered fatal.
            Err(e) => return Err(anyhow!(e)).context("decoder failure"),
        }
    }

    // Flush any buffered resampler tail.
    pipeline
        .finalize(|chunk| {
            samples.extend_from_slice(chunk);
            Ok(())
        })
        .context("audio pipeline failed during finalize")?;

    Ok(PcmTrack::new(
        samples,
        target_sample_rate.unwrap_or(src_rate),
    ))
}

/// Read the next packet, treating IO errors as "end of stream".
fn next_packet(format: &mut Box<dyn FormatReader>) -> Result<Option<Packet>> {
    match format.next_packet() {
        Ok(p) => Ok(Some(p)),
        Err(SymphoniaError::IoError(_)) => Ok(None),
        Err(e) => Err(anyhow!(e)).context("failed reading packet"),
    }
}
