//! The segment condenser.
//!
//! Given an audio track and an ordered sequence of subtitle-derived speech
//! intervals, produce one track containing only the speech regions, joined
//! with crossfades so adjacent clips don't pop at the seam.
//!
//! The algorithm is a single sequential fold: per interval we pad, merge with
//! the previous region when the padded ranges (nearly) touch, slice, and
//! append with a crossfade. Intervals must already be sorted ascending by
//! start; that is the caller's responsibility and we never re-sort.

use tracing::debug;

use crate::track::Track;

/// A half-open speech time range `[start_ms, end_ms)`, typically one
/// subtitle line. Input intervals may be adjacent or overlapping once padded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl Interval {
    pub fn new(start_ms: u64, end_ms: u64) -> Self {
        Self { start_ms, end_ms }
    }
}

/// Condenser tuning.
///
/// The defaults are the values the original tool settled on by ear; they are
/// configuration here so callers can override them while keeping behavior
/// reproducible.
#[derive(Debug, Clone, Copy)]
pub struct CondenserConfig {
    /// Padding added before and after each interval, in milliseconds.
    pub offset_ms: i64,

    /// Crossfade duration at each join, in milliseconds.
    pub fade_ms: u64,
}

impl Default for CondenserConfig {
    fn default() -> Self {
        Self {
            offset_ms: 200,
            fade_ms: 75,
        }
    }
}

/// Condense `source` down to the padded speech intervals.
///
/// Properties:
/// - Append-only: output segments appear in input order, never reordered.
/// - An empty interval list yields an empty track.
/// - Slices past the track bounds clamp instead of failing.
/// - A segment shorter than the crossfade window is dropped, so no crossfade
///   is ever applied to a segment it wouldn't fit in.
pub fn condense<T: Track>(source: &T, intervals: &[Interval], config: &CondenserConfig) -> T {
    // An empty slice of the source gives us an empty accumulator of the same
    // underlying format.
    let mut output = source.slice_ms(0, 0);
    let mut prev_end: i64 = 0;

    for sub in intervals {
        let mut fade = config.fade_ms as i64;

        // Nothing to blend into yet: the accumulator is empty (first
        // interval) or shorter than the fade window.
        if fade > output.len_ms() as i64 {
            fade = 0;
        }

        let mut start = sub.start_ms as i64 - config.offset_ms;
        let end = sub.end_ms as i64 + config.offset_ms;

        // When the padded ranges overlap, continue straight from the previous
        // region so the shared audio isn't played twice. The comparison is
        // padded by `fade` on *both* sides, so two segments separated by less
        // than 2*fade merge even though they don't strictly overlap; the
        // original tool tuned this by ear and we keep the comparison exactly.
        if start - fade < prev_end + fade {
            start = prev_end;
        }

        let segment = source.slice_ms(start, end);

        // Too short to crossfade safely; dropped, not an error.
        if fade >= segment.len_ms() as i64 {
            debug!(
                start_ms = start,
                end_ms = end,
                fade_ms = fade,
                "segment shorter than the crossfade window, skipping"
            );
            continue;
        }

        output.append_crossfade(&segment, fade as u64);
        prev_end = end;
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::PcmTrack;

    // 1 kHz keeps one sample per millisecond so durations are exact.
    const RATE: u32 = 1_000;

    fn source(len_ms: usize) -> PcmTrack {
        let samples: Vec<f32> = (0..len_ms).map(|i| i as f32).collect();
        PcmTrack::new(samples, RATE)
    }

    #[test]
    fn empty_interval_list_yields_empty_track() {
        let track = source(5_000);
        let out = condense(&track, &[], &CondenserConfig::default());
        assert!(out.is_empty());
        assert_eq!(out.sample_rate(), RATE);
    }

    #[test]
    fn single_interval_is_padded_but_not_faded() {
        let track = source(5_000);
        let config = CondenserConfig::default();
        let out = condense(&track, &[Interval::new(1_000, 2_000)], &config);

        // (2000 + 200) - (1000 - 200): no fade on the first append.
        assert_eq!(out.len_ms(), 1_200);
        // First sample comes from the padded start.
        assert_eq!(out.samples()[0], 800.0);
    }

    #[test]
    fn default_config_matches_original_tuning() {
        let config = CondenserConfig::default();
        assert_eq!(config.offset_ms, 200);
        assert_eq!(config.fade_ms, 75);
    }

    #[test]
    fn overlapping_padded_intervals_collapse_into_one_region() {
        let track = source(5_000);
        let config = CondenserConfig::default();
        let intervals = [Interval::new(0, 1_000), Interval::new(1_100, 2_000)];
        let out = condense(&track, &intervals, &config);

        // Union span [0, 2200) minus one 75ms crossfade overlap; padded spans
        // are not double-counted.
        assert_eq!(out.len_ms(), 2_200 - 75);
    }

    #[test]
    fn merge_rule_triggers_on_near_touching_ranges() {
        // Gap of 100ms between padded ranges, smaller than 2*fade (150ms):
        // the ranges do not overlap, but the padded comparison merges them
        // anyway. Kept intentionally.
        let track = source(10_000);
        let config = CondenserConfig {
            offset_ms: 0,
            fade_ms: 75,
        };
        let intervals = [Interval::new(0, 2_000), Interval::new(2_100, 3_000)];
        let out = condense(&track, &intervals, &config);

        // Second segment is forced to start at prev_end (2000), so nothing
        // between 2000 and 2100 is dropped.
        assert_eq!(out.len_ms(), 3_000 - 75);
    }

    #[test]
    fn segment_shorter_than_fade_contributes_nothing() {
        let track = source(10_000);
        let config = CondenserConfig {
            offset_ms: 0,
            fade_ms: 75,
        };
        // The second interval pads out to a 40ms span, shorter than the fade.
        let intervals = [Interval::new(0, 1_000), Interval::new(3_000, 3_040)];
        let out = condense(&track, &intervals, &config);
        assert_eq!(out.len_ms(), 1_000);
    }

    #[test]
    fn skipped_segment_does_not_advance_prev_end() {
        let track = source(10_000);
        let config = CondenserConfig {
            offset_ms: 0,
            fade_ms: 75,
        };
        let intervals = [
            Interval::new(0, 1_000),
            // Skipped: 40ms span.
            Interval::new(3_000, 3_040),
            // Compared against prev_end = 1000, not 3040, so it does not merge.
            Interval::new(3_050, 4_000),
        ];
        let out = condense(&track, &intervals, &config);
        // 1000 + 950 - 75; a merge against 3040 would have given 1885.
        assert_eq!(out.len_ms(), 1_875);
    }

    #[test]
    fn interval_past_track_end_clamps_instead_of_failing() {
        let track = source(5_000);
        let config = CondenserConfig::default();
        let out = condense(&track, &[Interval::new(4_900, 6_000)], &config);

        // start = 4700, end clamps to 5000.
        assert_eq!(out.len_ms(), 300);
    }

    #[test]
    fn output_is_monotonic_in_source_position() {
        // Source samples encode their own position, so a monotonically
        // non-decreasing output proves no temporal reordering and no
        // duplicate playback across merges and crossfades.
        let track = source(10_000);
        let config = CondenserConfig::default();
        let intervals = [
            Interval::new(500, 1_500),
            Interval::new(1_600, 2_500),
            Interval::new(4_000, 5_000),
            Interval::new(7_000, 8_000),
        ];
        let out = condense(&track, &intervals, &config);

        for pair in out.samples().windows(2) {
            assert!(
                pair[1] >= pair[0],
                "output went backwards: {} -> {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn source_track_is_not_mutated() {
        let track = source(5_000);
        let before = track.clone();
        let _ = condense(
            &track,
            &[Interval::new(0, 1_000), Interval::new(2_000, 3_000)],
            &CondenserConfig::default(),
        );
        assert_eq!(track, before);
    }
}
