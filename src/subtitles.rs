//! Subtitle cues: the source of speech intervals.
//!
//! yt-dlp's downloaded subtitle format is inconsistent (SRT or WebVTT
//! depending on the source), so we parse both into the same `Cue` shape.
//! Parsing is deliberately line-oriented and tolerant: cue numbers, `NOTE`
//! blocks, and WebVTT cue settings are ignored, and only the timing lines and
//! their text matter. Cues are returned in file order, never re-sorted; the
//! condenser relies on the file already being ordered by start time.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::condenser::Interval;
use crate::error::{Error, Result};

/// One subtitle line: a speech time range and its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cue {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

impl Cue {
    /// The speech interval this cue marks, text dropped.
    pub fn interval(&self) -> Interval {
        Interval::new(self.start_ms, self.end_ms)
    }
}

/// Subtitle extensions we accept, in lookup order.
const SUBTITLE_EXTENSIONS: [&str; 2] = ["vtt", "srt"];

/// Find `{stem}.{lang}.vtt` or `{stem}.{lang}.srt` in `dir`.
pub fn find_subtitles(dir: &Path, stem: &str, lang: &str) -> Option<PathBuf> {
    SUBTITLE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{stem}.{lang}.{ext}")))
        .find(|candidate| candidate.is_file())
}

/// Load cues from a subtitle file, dispatching on the extension.
pub fn load_cues(path: &Path) -> Result<Vec<Cue>> {
    let reader = BufReader::new(File::open(path)?);
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("srt") => parse_srt(reader),
        _ => parse_vtt(reader),
    }
}

/// Parse WebVTT. The `WEBVTT` header is required; everything after it goes
/// through the shared cue-block reader.
pub fn parse_vtt<R: BufRead>(reader: R) -> Result<Vec<Cue>> {
    let mut lines = reader.lines();

    match lines.next() {
        Some(first) => {
            let first = first?;
            // Tolerate a UTF-8 BOM; yt-dlp sometimes writes one.
            if !first.trim_start_matches('\u{feff}').starts_with("WEBVTT") {
                return Err(Error::Subtitle("missing WEBVTT header".into()));
            }
        }
        None => return Ok(Vec::new()),
    }

    parse_cue_blocks(lines)
}

/// Parse SubRip. SRT has no header; cue numbers are ignored by the shared
/// cue-block reader.
pub fn parse_srt<R: BufRead>(reader: R) -> Result<Vec<Cue>> {
    parse_cue_blocks(reader.lines())
}

fn parse_cue_blocks(lines: impl Iterator<Item = std::io::Result<String>>) -> Result<Vec<Cue>> {
    let mut cues = Vec::new();
    let mut timing: Option<(u64, u64)> = None;
    let mut text = String::new();

    for line in lines {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            // A blank line ends the current cue.
            flush_cue(&mut cues, &mut timing, &mut text);
        } else if trimmed.contains("-->") {
            // A timing line while a cue is still open also closes it; some
            // generators omit the blank separator.
            flush_cue(&mut cues, &mut timing, &mut text);
            timing = Some(parse_time_range(trimmed)?);
        } else if timing.is_some() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(trimmed);
        }
        // Anything else (cue numbers, NOTE/STYLE blocks, stray metadata) is
        // ignored.
    }

    flush_cue(&mut cues, &mut timing, &mut text);
    Ok(cues)
}

fn flush_cue(cues: &mut Vec<Cue>, timing: &mut Option<(u64, u64)>, text: &mut String) {
    if let Some((start_ms, end_ms)) = timing.take() {
        // Cues without text mark nothing worth keeping.
        if !text.is_empty() {
            cues.push(Cue {
                start_ms,
                end_ms,
                text: std::mem::take(text),
            });
        }
    }
    text.clear();
}

/// Parse `start --> end`, tolerating trailing WebVTT cue settings
/// (`align:start position:0%` and friends).
fn parse_time_range(line: &str) -> Result<(u64, u64)> {
    let mut parts = line.splitn(2, "-->");

    let start = parts
        .next()
        .ok_or_else(|| Error::Subtitle(format!("bad timing line: {line}")))?;
    let end = parts
        .next()
        .ok_or_else(|| Error::Subtitle(format!("bad timing line: {line}")))?;

    let end = end
        .split_whitespace()
        .next()
        .ok_or_else(|| Error::Subtitle(format!("bad timing line: {line}")))?;

    Ok((parse_timestamp(start.trim())?, parse_timestamp(end)?))
}

/// Parse `HH:MM:SS.mmm` into milliseconds.
///
/// Accepted variations:
/// - the hours field may be missing (`MM:SS.mmm`, WebVTT allows it)
/// - the millisecond separator may be `,` (SRT) or `.` (WebVTT)
fn parse_timestamp(ts: &str) -> Result<u64> {
    let bad = || Error::Subtitle(format!("bad timestamp: {ts}"));

    let fields: Vec<&str> = ts.split(':').collect();
    let (hours, minutes, seconds_field) = match fields.as_slice() {
        [h, m, s] => (parse_field(h).ok_or_else(bad)?, *m, *s),
        [m, s] => (0, *m, *s),
        _ => return Err(bad()),
    };

    let minutes = parse_field(minutes).ok_or_else(bad)?;

    let mut seconds_parts = seconds_field.splitn(2, ['.', ',']);
    let seconds = seconds_parts.next().and_then(parse_field).ok_or_else(bad)?;
    let millis = match seconds_parts.next() {
        Some(ms) => parse_field(ms).ok_or_else(bad)?,
        None => 0,
    };

    Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
}

fn parse_field(field: &str) -> Option<u64> {
    field.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_srt_blocks() -> Result<()> {
        let srt = "\
1
00:00:01,000 --> 00:00:02,500
first line

2
00:00:03,000 --> 00:00:04,000
second line
continued
";
        let cues = parse_srt(Cursor::new(srt))?;
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0], Cue {
            start_ms: 1_000,
            end_ms: 2_500,
            text: "first line".into(),
        });
        assert_eq!(cues[1].text, "second line\ncontinued");
        assert_eq!(cues[1].start_ms, 3_000);
        Ok(())
    }

    #[test]
    fn parses_vtt_with_settings_and_ids() -> Result<()> {
        let vtt = "\
WEBVTT

intro
00:01.000 --> 00:02.000 align:start position:0%
hello

00:01:00.000 --> 00:01:01.500
later
";
        let cues = parse_vtt(Cursor::new(vtt))?;
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].start_ms, 1_000);
        assert_eq!(cues[0].end_ms, 2_000);
        assert_eq!(cues[1].start_ms, 60_000);
        assert_eq!(cues[1].end_ms, 61_500);
        Ok(())
    }

    #[test]
    fn vtt_without_header_is_rejected() {
        let err = parse_vtt(Cursor::new("00:01.000 --> 00:02.000\nhi\n")).unwrap_err();
        assert!(err.to_string().contains("WEBVTT"));
    }

    #[test]
    fn vtt_tolerates_bom() -> Result<()> {
        let vtt = "\u{feff}WEBVTT\n\n00:01.000 --> 00:02.000\nhi\n";
        let cues = parse_vtt(Cursor::new(vtt))?;
        assert_eq!(cues.len(), 1);
        Ok(())
    }

    #[test]
    fn cues_without_text_are_dropped() -> Result<()> {
        let srt = "1\n00:00:01,000 --> 00:00:02,000\n\n2\n00:00:03,000 --> 00:00:04,000\nkept\n";
        let cues = parse_srt(Cursor::new(srt))?;
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "kept");
        Ok(())
    }

    #[test]
    fn file_order_is_preserved_verbatim() -> Result<()> {
        // Out-of-order files stay out of order; ordering is the producer's
        // contract, not ours.
        let srt = "\
1
00:00:05,000 --> 00:00:06,000
b

2
00:00:01,000 --> 00:00:02,000
a
";
        let cues = parse_srt(Cursor::new(srt))?;
        assert_eq!(cues[0].start_ms, 5_000);
        assert_eq!(cues[1].start_ms, 1_000);
        Ok(())
    }

    #[test]
    fn bad_timestamp_is_a_subtitle_error() {
        let srt = "1\n00:00:xx,000 --> 00:00:02,000\noops\n";
        let err = parse_srt(Cursor::new(srt)).unwrap_err();
        assert!(matches!(err, Error::Subtitle(_)));
    }

    #[test]
    fn finds_vtt_before_srt() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("video.ja.srt"), "")?;
        std::fs::write(dir.path().join("video.ja.vtt"), "WEBVTT\n")?;

        let found = find_subtitles(dir.path(), "video", "ja").expect("subtitles exist");
        assert_eq!(found.extension().and_then(|e| e.to_str()), Some("vtt"));
        assert!(find_subtitles(dir.path(), "video", "en").is_none());
        Ok(())
    }

    #[test]
    fn cue_interval_drops_text() {
        let cue = Cue {
            start_ms: 10,
            end_ms: 20,
            text: "x".into(),
        };
        assert_eq!(cue.interval(), Interval::new(10, 20));
    }
}
