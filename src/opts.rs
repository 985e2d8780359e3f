use crate::condenser::CondenserConfig;

/// Options that control a processing run.
///
/// This struct represents *library-level configuration*, not CLI flags
/// directly. The CLI is responsible for mapping user input into this type so
/// that other frontends (tests, batch jobs) can construct options
/// programmatically.
#[derive(Debug, Clone)]
pub struct Opts {
    /// Subtitle/transcription language code (e.g. `"ja"`).
    ///
    /// Used both to locate downloaded subtitle files (`{stem}.{lang}.srt`)
    /// and as the whisper language hint.
    pub language: String,

    /// Prefer subtitles shipped with the video over generating them.
    ///
    /// This is consumed at download time (`--write-subs`); during processing,
    /// existing subtitle files always win regardless of this flag.
    pub take_subs: bool,

    /// Skip the condensing step entirely (download/transcribe only).
    pub skip_audio: bool,

    /// Condenser tuning (padding and crossfade durations).
    pub condenser: CondenserConfig,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            language: "ja".to_string(),
            take_subs: false,
            skip_audio: false,
            condenser: CondenserConfig::default(),
        }
    }
}
