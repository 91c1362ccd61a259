//! Throughput-based estimate of the time left in a batch.

use std::time::Duration;

/// Completions needed before an estimate is offered.
const MIN_SAMPLES: usize = 2;

/// Wall time spent and media processed for one finished file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThroughputSample {
    pub wall_seconds: f64,
    pub media_seconds: f64,
}

/// Lifetime cumulative average of wall seconds per media second.
#[derive(Debug, Clone, Default)]
pub struct EtaEstimator {
    total_wall: f64,
    total_media: f64,
    samples: usize,
}

impl EtaEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed file.
    pub fn update(&mut self, sample: ThroughputSample) {
        self.total_wall += sample.wall_seconds.max(0.0);
        self.total_media += sample.media_seconds.max(0.0);
        self.samples += 1;
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Wall seconds per media second, once enough data exists.
    pub fn rate(&self) -> Option<f64> {
        (self.samples >= MIN_SAMPLES && self.total_media > 0.0)
            .then(|| self.total_wall / self.total_media)
    }

    /// Projected wall time for `remaining_media_seconds` of unprocessed media.
    pub fn estimate(&self, remaining_media_seconds: f64) -> Option<Duration> {
        let rate = self.rate()?;
        let seconds = (remaining_media_seconds.max(0.0) * rate).max(0.0);
        Duration::try_from_secs_f64(seconds).ok()
    }
}

/// Render seconds as `HH:MM:SS`.
pub fn format_hms(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}
