use std::time::Instant;

/// Snapshot of the transfer currently (or last) in flight.
///
/// `bytes_sent` is cumulative within one transfer and resets to zero when
/// the next transfer starts; `bytes_per_second` is derived from elapsed
/// wall time since that transfer began.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UploadStats {
    pub bytes_sent: u64,
    pub bytes_per_second: f64,
}

/// Mutable stats state behind the coordinator lock.
///
/// Written only by the progress hook while a transfer is active; read by
/// producers through a synchronized snapshot.
pub(crate) struct StatsTracker {
    stats: UploadStats,
    started_at: Instant,
}

impl StatsTracker {
    pub(crate) fn new() -> Self {
        Self {
            stats: UploadStats::default(),
            started_at: Instant::now(),
        }
    }

    /// Zeroes the counters and restamps the transfer start time.
    pub(crate) fn reset(&mut self) {
        self.stats = UploadStats::default();
        self.started_at = Instant::now();
    }

    /// Records the cumulative byte count reported by the transport.
    pub(crate) fn record(&mut self, bytes_sent: u64) {
        self.stats.bytes_sent = bytes_sent;
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.stats.bytes_per_second = bytes_sent as f64 / elapsed;
        }
    }

    pub(crate) fn snapshot(&self) -> UploadStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn new_tracker_is_zeroed() {
        let tracker = StatsTracker::new();
        assert_eq!(tracker.snapshot(), UploadStats::default());
    }

    #[test]
    fn record_updates_bytes_and_speed() {
        let mut tracker = StatsTracker::new();
        std::thread::sleep(Duration::from_millis(10));
        tracker.record(1000);
        let stats = tracker.snapshot();
        assert_eq!(stats.bytes_sent, 1000);
        assert!(stats.bytes_per_second > 0.0);
    }

    #[test]
    fn record_is_cumulative_not_additive() {
        let mut tracker = StatsTracker::new();
        tracker.record(500);
        tracker.record(800);
        assert_eq!(tracker.snapshot().bytes_sent, 800);
    }

    #[test]
    fn reset_clears_previous_transfer() {
        let mut tracker = StatsTracker::new();
        tracker.record(4096);
        tracker.reset();
        assert_eq!(tracker.snapshot(), UploadStats::default());
    }
}
