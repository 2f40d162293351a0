//! Usage analytics sinks.

use stash_core::ports::Tracker;
use std::time::Duration;

/// Tracker that records nothing, for tests and callers that opt out.
pub struct NoopTracker;

impl Tracker for NoopTracker {
    fn keys_evaluated(&self, _count: usize) {}
    fn archive_downloaded(&self, _elapsed: Duration, _size_bytes: u64) {}
    fn archive_extracted(&self, _elapsed: Duration) {}
}

/// Tracker that emits event counters through the tracing pipeline, where the
/// hosting system's log collector picks them up.
pub struct LogTracker;

impl Tracker for LogTracker {
    fn keys_evaluated(&self, count: usize) {
        tracing::info!(
            target: "stash::analytics",
            event = "restore_keys_evaluated",
            key_count = count,
        );
    }

    fn archive_downloaded(&self, elapsed: Duration, size_bytes: u64) {
        tracing::info!(
            target: "stash::analytics",
            event = "restore_archive_downloaded",
            download_time_s = elapsed.as_secs(),
            download_size_bytes = size_bytes,
        );
    }

    fn archive_extracted(&self, elapsed: Duration) {
        tracing::info!(
            target: "stash::analytics",
            event = "restore_archive_extracted",
            extraction_time_s = elapsed.as_secs(),
        );
    }
}
