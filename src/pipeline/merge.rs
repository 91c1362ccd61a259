//! Reconciling window-local timestamps into one timeline.

use crate::media::TimeWindow;
use crate::stt::Segment;

/// Accumulates per-window segments into a single ordered sequence.
///
/// Local times are clamped to `[0, window.length]` before offsetting, so
/// windows pushed in order yield a timeline sorted by start time.
#[derive(Debug, Default)]
pub struct TimelineMerger {
    segments: Vec<Segment>,
}

impl TimelineMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset one window's segments by its start and append them.
    pub fn push_window(&mut self, window: &TimeWindow, local: Vec<Segment>) {
        let first = self.segments.len();
        for segment in local {
            let start = clamp_local(segment.start_seconds, window.length_seconds);
            let end = clamp_local(segment.end_seconds, window.length_seconds).max(start);
            self.segments.push(Segment {
                start_seconds: window.start_seconds + start,
                end_seconds: window.start_seconds + end,
                text: segment.text,
            });
        }
        // Engines occasionally emit segments out of order within one call.
        self.segments[first..]
            .sort_by(|a, b| a.start_seconds.total_cmp(&b.start_seconds));
    }

    pub fn finish(self) -> Vec<Segment> {
        self.segments
    }
}

fn clamp_local(seconds: f64, length: f64) -> f64 {
    if seconds.is_nan() {
        return 0.0;
    }
    seconds.clamp(0.0, length.max(0.0))
}

/// Merge windows and their local segment sequences in window order.
pub fn merge_windows<I>(windows: I) -> Vec<Segment>
where
    I: IntoIterator<Item = (TimeWindow, Vec<Segment>)>,
{
    let mut merger = TimelineMerger::new();
    for (window, local) in windows {
        merger.push_window(&window, local);
    }
    merger.finish()
}
