use crate::Result;
use crate::subtitles::Cue;

/// Streaming subtitle encoder.
///
/// Encoders write cues as they are produced (important when transcription is
/// slow) and finalize on `close`.
pub trait SegmentEncoder {
    fn write_cue(&mut self, cue: &Cue) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}
