//! Whisper-based transcription for videos that ship without subtitles.
//!
//! We load the model once (expensive) and reuse the context across videos.
//! The output is the same `Cue` shape the subtitle parser produces, so the
//! condenser never knows whether its intervals came from a downloaded file or
//! from ASR.

use std::os::raw::{c_char, c_void};
use std::sync::Once;

use anyhow::{Context, Result};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::subtitles::Cue;

/// The sample rate whisper.cpp expects: mono 16 kHz.
pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// A loaded whisper.cpp model.
pub struct Transcriber {
    ctx: WhisperContext,
}

impl Transcriber {
    /// Load a whisper.cpp model from disk.
    pub fn new(model_path: &str) -> Result<Self> {
        // Whisper can be very chatty; keep it quiet so the pipeline fully
        // controls stdout/stderr. Idempotent.
        init_whisper_logging();

        let ctx_params = WhisperContextParameters::default();
        let ctx = WhisperContext::new_with_params(model_path, ctx_params)
            .with_context(|| format!("failed to load model from path: {model_path}"))?;

        Ok(Self { ctx })
    }

    /// Transcribe mono 16 kHz samples into ordered cues.
    ///
    /// `language` is a hint (e.g. `"ja"`); `None` lets whisper auto-detect.
    pub fn transcribe(&self, samples: &[f32], language: Option<&str>) -> Result<Vec<Cue>> {
        let mut params = FullParams::new(SamplingStrategy::BeamSearch {
            beam_size: 5,
            patience: 1.0,
        });

        params.set_n_threads(num_cpus::get() as i32);
        params.set_translate(false);
        params.set_language(language);
        params.set_no_context(true);
        params.set_single_segment(false);
        params.set_print_progress(false);
        params.set_print_special(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        let mut state = self
            .ctx
            .create_state()
            .context("failed to create whisper state")?;

        state
            .full(params, samples)
            .context("failed to run whisper full()")?;

        let mut cues = Vec::new();
        for segment in state.as_iter() {
            // Whisper timestamps are in centiseconds (10ms units).
            let start_ms = segment.start_timestamp().max(0) as u64 * 10;
            let end_ms = segment.end_timestamp().max(0) as u64 * 10;

            let text = segment
                .to_str()
                .context("failed to get segment text")?
                .trim()
                .to_owned();

            cues.push(Cue {
                start_ms,
                end_ms,
                text,
            });
        }

        Ok(cues)
    }
}

/// A no-op log callback used to silence logs emitted by whisper.cpp.
unsafe extern "C" fn whisper_log_callback(
    _level: u32,
    _c_msg: *const c_char,
    _user_data: *mut c_void,
) {
    // Intentionally left empty.
}

/// Ensure whisper logging is configured exactly once for the lifetime of the process.
fn init_whisper_logging() {
    static INIT: Once = Once::new();

    INIT.call_once(|| unsafe {
        whisper_rs::set_log_callback(Some(whisper_log_callback), std::ptr::null_mut());
    });
}
