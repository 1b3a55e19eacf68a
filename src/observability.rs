//! Observability: tracing setup and runner metrics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Install the global fmt subscriber.
///
/// Filtering follows `RUST_LOG`, falling back to `info`. Output goes to
/// stderr so command output on stdout stays machine-readable.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Counters recorded by [`BoundedRunner`](crate::runner::BoundedRunner)
#[derive(Debug, Default)]
pub struct RunMetrics {
    items_dispatched: AtomicU64,
    items_succeeded: AtomicU64,
    items_failed: AtomicU64,
    peak_in_flight: AtomicUsize,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item_dispatched(&self, in_flight: usize) {
        self.items_dispatched.fetch_add(1, Ordering::Relaxed);
        self.peak_in_flight.fetch_max(in_flight, Ordering::Relaxed);
        tracing::trace!(counter = "items_dispatched", in_flight, "Metric incremented");
    }

    pub fn item_settled(&self, success: bool) {
        if success {
            self.items_succeeded.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(counter = "items_succeeded", "Metric incremented");
        } else {
            self.items_failed.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(counter = "items_failed", "Metric incremented");
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            items_dispatched: self.items_dispatched.load(Ordering::Relaxed),
            items_succeeded: self.items_succeeded.load(Ordering::Relaxed),
            items_failed: self.items_failed.load(Ordering::Relaxed),
            peak_in_flight: self.peak_in_flight.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub items_dispatched: u64,
    pub items_succeeded: u64,
    pub items_failed: u64,
    pub peak_in_flight: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_tracks_maximum() {
        let metrics = RunMetrics::new();
        metrics.item_dispatched(1);
        metrics.item_dispatched(3);
        metrics.item_dispatched(2);
        metrics.item_settled(true);
        metrics.item_settled(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.items_dispatched, 3);
        assert_eq!(snapshot.peak_in_flight, 3);
        assert_eq!(snapshot.items_succeeded, 1);
        assert_eq!(snapshot.items_failed, 1);
    }
}
