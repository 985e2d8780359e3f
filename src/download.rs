//! Thin wrapper around the `yt-dlp` binary.
//!
//! Downloading is an external collaborator: we shell out, inherit its
//! progress output, and fail loudly on a non-zero exit. Nothing here retries
//! or masks failures; a broken download should stop the run.

use std::path::Path;
use std::process::Command;

use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};

/// Options for a download run.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Ask yt-dlp to also download subtitles for `sub_lang`.
    pub write_subs: bool,

    /// Subtitle language code passed to `--sub-langs`.
    pub sub_lang: String,
}

/// Metadata yt-dlp reports per entry with `--dump-json`. We only keep the
/// fields the pipeline logs.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoEntry {
    pub id: String,
    pub title: String,
}

/// Download a video or playlist into `output_dir`.
pub fn download(link: &str, output_dir: &Path, opts: &DownloadOptions) -> Result<()> {
    let mut cmd = Command::new("yt-dlp");
    cmd.arg("--yes-playlist");

    if opts.write_subs {
        cmd.args(["--sub-langs", &opts.sub_lang])
            .args(["--write-subs", "--sub-format", "srt"]);
    }

    cmd.arg("--paths").arg(output_dir).arg(link);

    info!(link, dir = %output_dir.display(), "downloading with yt-dlp");

    let status = cmd.status()?;
    if !status.success() {
        return Err(Error::Download { status });
    }

    Ok(())
}

/// Resolve a link (video or playlist) into its entries without downloading.
///
/// yt-dlp prints one JSON object per line with `--dump-json`.
pub fn probe(link: &str) -> Result<Vec<VideoEntry>> {
    let output = Command::new("yt-dlp")
        .args(["--dump-json", "--no-download", "--yes-playlist"])
        .arg(link)
        .output()?;

    if !output.status.success() {
        return Err(Error::Download {
            status: output.status,
        });
    }

    let stdout = std::str::from_utf8(&output.stdout)?;

    let mut entries = Vec::new();
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(line)?);
    }

    Ok(entries)
}
