//! Fixed-window planning over a media timeline.

/// A time slice of a source file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub index: usize,
    pub start_seconds: f64,
    pub length_seconds: f64,
}

impl TimeWindow {
    pub fn end_seconds(&self) -> f64 {
        self.start_seconds + self.length_seconds
    }
}

/// Lazy sequence of non-overlapping windows covering `[0, total)`.
///
/// The last window is shortened to end exactly at `total`.
#[derive(Debug, Clone)]
pub struct WindowPlan {
    total_seconds: f64,
    window_seconds: f64,
    next: usize,
    count: usize,
}

impl WindowPlan {
    /// Number of windows in the whole plan, independent of iteration progress.
    pub fn window_count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Iterator for WindowPlan {
    type Item = TimeWindow;

    fn next(&mut self) -> Option<TimeWindow> {
        if self.next >= self.count {
            return None;
        }
        let index = self.next;
        self.next += 1;

        let start_seconds = index as f64 * self.window_seconds;
        let length_seconds = self.window_seconds.min(self.total_seconds - start_seconds);
        Some(TimeWindow {
            index,
            start_seconds,
            length_seconds,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for WindowPlan {}

const SLIVER_SECONDS: f64 = 1e-9;

/// Plan `ceil(total / window)` windows.
///
/// Yields nothing when either value is non-positive or not finite; the
/// caller then transcribes the whole file in one call.
pub fn plan(total_seconds: f64, window_seconds: f64) -> WindowPlan {
    let usable = total_seconds.is_finite()
        && window_seconds.is_finite()
        && total_seconds > 0.0
        && window_seconds > 0.0;

    let mut count = if usable {
        (total_seconds / window_seconds).ceil() as usize
    } else {
        0
    };
    // Division rounding can add a sliver window past the end (0.9 / 0.3 > 3).
    if count > 0 && (count - 1) as f64 * window_seconds >= total_seconds - SLIVER_SECONDS {
        count -= 1;
    }

    WindowPlan {
        total_seconds,
        window_seconds,
        next: 0,
        count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covers(total: f64, window: f64) {
        let windows: Vec<_> = plan(total, window).collect();
        assert_eq!(windows.len(), (total / window).ceil() as usize);

        let mut cursor = 0.0;
        for (i, w) in windows.iter().enumerate() {
            assert_eq!(w.index, i);
            assert!((w.start_seconds - cursor).abs() < 1e-9, "gap before window {}", i);
            assert!(w.length_seconds > 0.0);
            assert!(w.length_seconds <= window + 1e-9);
            cursor = w.end_seconds();
        }
        assert!((cursor - total).abs() < 1e-9, "plan ends at {} not {}", cursor, total);
    }

    #[test]
    fn test_short_file_gets_one_clamped_window() {
        let windows: Vec<_> = plan(30.0, 60.0).collect();
        assert_eq!(
            windows,
            vec![TimeWindow {
                index: 0,
                start_seconds: 0.0,
                length_seconds: 30.0
            }]
        );
    }

    #[test]
    fn test_ninety_seconds_in_sixty_second_windows() {
        let windows: Vec<_> = plan(90.0, 60.0).collect();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].start_seconds, 0.0);
        assert_eq!(windows[0].length_seconds, 60.0);
        assert_eq!(windows[1].start_seconds, 60.0);
        assert_eq!(windows[1].length_seconds, 30.0);
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_window() {
        let windows: Vec<_> = plan(120.0, 60.0).collect();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].end_seconds(), 120.0);
    }

    #[test]
    fn test_plans_cover_total_exactly() {
        for (total, window) in [
            (1.0, 60.0),
            (59.999, 60.0),
            (60.001, 60.0),
            (3601.5, 60.0),
            (10.0, 0.3),
            (7.25, 2.5),
        ] {
            assert_covers(total, window);
        }
    }

    #[test]
    fn test_rounding_does_not_add_sliver_window() {
        let windows: Vec<_> = plan(0.9, 0.3).collect();
        assert_eq!(windows.len(), 3);
        assert!((windows[2].end_seconds() - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_inputs_yield_empty_plan() {
        assert!(plan(0.0, 60.0).is_empty());
        assert!(plan(-5.0, 60.0).is_empty());
        assert!(plan(f64::NAN, 60.0).is_empty());
        assert!(plan(f64::INFINITY, 60.0).is_empty());
        assert!(plan(30.0, 0.0).is_empty());
        assert!(plan(30.0, -1.0).is_empty());
        assert_eq!(plan(0.0, 60.0).count(), 0);
    }

    #[test]
    fn test_plan_is_exact_size() {
        let mut windows = plan(150.0, 60.0);
        assert_eq!(windows.len(), 3);
        windows.next();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows.window_count(), 3);
    }
}
