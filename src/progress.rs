//! Percentage and time-remaining accounting.
use crate::event::Progress;

use std::time::Duration;
use tokio::time::Instant;

/// Highest percentage reported before the block list is committed.
pub(crate) const MAX_UNCOMMITTED_PERCENT: f64 = 99.99;

/// Round to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Estimate the seconds remaining to send `total - done` bytes at the
/// throughput observed so far.
///
/// `None` when no throughput can be computed yet, e.g. nothing has been sent
/// or no time has elapsed.
pub(crate) fn estimate_remaining(done: u64, total: u64, elapsed: Duration) -> Option<u64> {
    let rate = done as f64 / elapsed.as_secs_f64();
    if !rate.is_finite() || rate <= 0.0 {
        return None;
    }
    let secs = total.saturating_sub(done) as f64 / rate;
    secs.is_finite().then(|| secs.round() as u64)
}

/// Tracks when an upload started and computes its progress from the bytes
/// acknowledged.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Meter {
    started_at: Instant,
    total: u64,
}

impl Meter {
    pub(crate) fn new(started_at: Instant, total: u64) -> Self {
        Self { started_at, total }
    }

    /// Progress of a chunked upload with `done` bytes acknowledged.
    pub(crate) fn block_progress(&self, done: u64) -> Progress {
        let percent = if self.total == 0 {
            0.0
        } else {
            round2(done as f64 / self.total as f64 * 100.0)
        };
        let estimated = estimate_remaining(done, self.total, self.started_at.elapsed());
        Progress::new(percent.min(MAX_UNCOMMITTED_PERCENT), estimated)
    }

    /// Progress of a single-request upload with `sent` bytes written to the
    /// request body, as whole numbers.
    pub(crate) fn request_progress(&self, sent: u64) -> Progress {
        let fraction = if self.total == 0 {
            1.0
        } else {
            sent as f64 / self.total as f64
        };
        let estimated = estimate_remaining(sent, self.total, self.started_at.elapsed());
        Progress::new((fraction * 100.0).round(), estimated)
    }
}
