use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use condense::condenser::CondenserConfig;
use condense::download::{self, DownloadOptions};
use condense::logging;
use condense::opts::Opts;
use condense::pipeline::Pipeline;

fn main() -> Result<()> {
    logging::init();
    let params = Params::parse();

    if !params.path.exists() {
        fs::create_dir_all(&params.path)?;
    }

    let opts = Opts {
        language: params.language,
        take_subs: params.take_subs,
        skip_audio: params.skip_audio,
        condenser: CondenserConfig {
            offset_ms: params.offset_ms,
            fade_ms: params.fade_ms,
        },
    };

    if let Some(link) = params.link.as_deref() {
        let entries = download::probe(link)?;
        for entry in &entries {
            tracing::info!(id = %entry.id, title = %entry.title, "queued");
        }

        download::download(
            link,
            &params.path,
            &DownloadOptions {
                write_subs: opts.take_subs,
                sub_lang: opts.language.clone(),
            },
        )?;
    }

    let pipeline = Pipeline::new(&params.model, opts)?;
    pipeline.process_directory(&params.path)?;

    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "condense")]
#[command(about = "Download videos, obtain subtitles, and generate condensed speech-only audio")]
struct Params {
    /// Link to a video or playlist to download before processing.
    #[arg(long = "link")]
    link: Option<String>,

    /// Working directory for videos, subtitles, and condensed audio.
    #[arg(short = 'p', long = "path")]
    path: PathBuf,

    /// Path to a whisper.cpp model, used when subtitles are missing.
    #[arg(short = 'm', long = "model")]
    model: String,

    /// Download subtitles from the video instead of always generating them.
    #[arg(long = "take-subs", default_value_t = false)]
    take_subs: bool,

    /// Skip the audio condensing step.
    #[arg(long = "skip-audio", default_value_t = false)]
    skip_audio: bool,

    /// Subtitle/transcription language.
    #[arg(short = 'l', long = "language", default_value = "ja")]
    language: String,

    /// Padding added before and after each subtitle interval, in milliseconds.
    #[arg(long = "offset-ms", default_value_t = 200)]
    offset_ms: i64,

    /// Crossfade duration between condensed segments, in milliseconds.
    #[arg(long = "fade-ms", default_value_t = 75)]
    fade_ms: u64,
}
