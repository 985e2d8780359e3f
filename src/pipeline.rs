//! High-level per-directory orchestration.
//!
//! The intended flow:
//! - download videos into a working directory (see [`crate::download`])
//! - for each video: make sure subtitles exist, generating them with whisper
//!   when they don't
//! - condense the audio into `{stem}.condensed.wav`
//!
//! Each video is processed fully, to completion, before the next one;
//! downloads, subtitles, and condensed audio for different videos are never
//! interleaved. Steps whose output already exists are skipped, so an
//! interrupted run picks up where it left off.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};

use crate::condenser::{Interval, condense};
use crate::extract::decode_audio_track;
use crate::opts::Opts;
use crate::segment_encoder::SegmentEncoder;
use crate::srt_encoder::SrtEncoder;
use crate::subtitles::{self, Cue};
use crate::track::Track;
use crate::transcribe::{Transcriber, WHISPER_SAMPLE_RATE};
use crate::wav::write_track;

/// Video container extensions we pick up from the working directory.
const VIDEO_EXTENSIONS: [&str; 2] = ["webm", "mkv"];

/// The per-directory processing pipeline.
///
/// Owns the long-lived whisper context so the model is loaded once and reused
/// across every video in the run.
pub struct Pipeline {
    transcriber: Transcriber,
    opts: Opts,
}

impl Pipeline {
    /// Load the whisper model and build a pipeline.
    pub fn new(model_path: impl AsRef<str>, opts: Opts) -> Result<Self> {
        let transcriber = Transcriber::new(model_path.as_ref())?;
        Ok(Self { transcriber, opts })
    }

    /// Process every video in `dir`.
    pub fn process_directory(&self, dir: &Path) -> Result<()> {
        let videos = list_videos(dir)?;
        if videos.is_empty() {
            warn!(dir = %dir.display(), "no videos found");
            return Ok(());
        }

        for (i, video) in videos.iter().enumerate() {
            info!(video = %video.display(), "processing {}/{}", i + 1, videos.len());
            self.process_video(dir, video)
                .with_context(|| format!("failed to process {}", video.display()))?;
        }

        Ok(())
    }

    /// Process a single video: subtitles first, then condensed audio.
    pub fn process_video(&self, dir: &Path, video: &Path) -> Result<()> {
        let stem = video
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| anyhow!("video file has no usable name: {}", video.display()))?;

        let subs_path = match subtitles::find_subtitles(dir, stem, &self.opts.language) {
            Some(path) => {
                info!(subs = %path.display(), "subtitles exist, skipping generation");
                path
            }
            None => self.generate_subtitles(dir, video, stem)?,
        };

        if self.opts.skip_audio {
            return Ok(());
        }

        let condensed_path = dir.join(format!("{stem}.condensed.wav"));
        if condensed_path.exists() {
            info!(out = %condensed_path.display(), "condensed audio exists, skipping");
            return Ok(());
        }

        self.condense_video(video, &subs_path, &condensed_path)
    }

    fn generate_subtitles(&self, dir: &Path, video: &Path, stem: &str) -> Result<PathBuf> {
        info!(video = %video.display(), "generating subtitles");

        let audio = decode_audio_track(video, Some(WHISPER_SAMPLE_RATE))?;
        let cues = self
            .transcriber
            .transcribe(audio.samples(), Some(&self.opts.language))?;

        let path = dir.join(format!("{stem}.{}.srt", self.opts.language));
        write_srt(&path, &cues)?;

        info!(subs = %path.display(), cues = cues.len(), "wrote subtitles");
        Ok(path)
    }

    fn condense_video(&self, video: &Path, subs_path: &Path, out: &Path) -> Result<()> {
        let cues = subtitles::load_cues(subs_path)
            .with_context(|| format!("failed to load subtitles: {}", subs_path.display()))?;
        if cues.is_empty() {
            warn!(subs = %subs_path.display(), "subtitle file has no cues");
        }

        // Native sample rate: the condensed output keeps the source quality.
        let track = decode_audio_track(video, None)?;
        let intervals: Vec<Interval> = cues.iter().map(Cue::interval).collect();

        let condensed = condense(&track, &intervals, &self.opts.condenser);
        write_track(out, &condensed)?;

        info!(
            out = %out.display(),
            condensed_ms = condensed.len_ms(),
            source_ms = track.len_ms(),
            "wrote condensed audio"
        );
        Ok(())
    }
}

fn write_srt(path: &Path, cues: &[Cue]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;

    let mut encoder = SrtEncoder::new(BufWriter::new(file));
    for cue in cues {
        encoder.write_cue(cue)?;
    }
    encoder.close()?;
    Ok(())
}

/// List the video files in `dir`, sorted for a deterministic processing order.
fn list_videos(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read directory {}", dir.display()))?;

    let mut videos = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
            continue;
        };
        if VIDEO_EXTENSIONS.iter().any(|v| ext.eq_ignore_ascii_case(v)) {
            videos.push(path);
        }
    }

    videos.sort();
    Ok(videos)
}
