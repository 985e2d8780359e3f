//! `condense` — condensed-audio generation for language immersion.
//!
//! This crate provides:
//! - The segment condenser: trim an audio track down to its speech intervals
//!   and stitch the pieces together with crossfades
//! - Subtitle loading (SRT/WebVTT) and generation (whisper.cpp)
//! - Audio extraction from downloaded video containers
//! - A yt-dlp wrapper and a per-directory processing pipeline
//!
//! The library is designed so the condenser core stays a pure, testable fold
//! over `(track, intervals)`; everything around it is orchestration.

// The condenser core and the audio-buffer abstraction it folds over.
pub mod condenser;
pub mod track;

// Subtitle data structures, parsing, and encoding.
pub mod segment_encoder;
pub mod srt_encoder;
pub mod subtitles;

// Audio extraction and normalization.
pub mod audio_pipeline;
pub mod extract;
pub mod wav;

// Transcription (whisper.cpp) for videos without subtitles.
pub mod transcribe;

// Orchestration: downloading and the per-directory pipeline.
pub mod download;
pub mod opts;
pub mod pipeline;

pub mod error;
pub use error::{Error, Result};

// Logging configuration (only for binaries; the library just emits `tracing` events).
#[cfg(feature = "logging")]
pub mod logging;
