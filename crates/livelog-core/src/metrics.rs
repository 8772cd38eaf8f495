//! Lightweight counters exposed for logging and the debug surface.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time counters for a [`crate::Stream`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    /// Total bytes appended by the producer so far.
    pub bytes_ingested: u64,
    /// Total bytes written out across all observers so far.
    pub bytes_delivered: u64,
    /// Number of observers currently registered.
    pub active_observers: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Metrics {
    bytes_ingested: AtomicU64,
    bytes_delivered: AtomicU64,
    active_observers: AtomicU64,
}

impl Metrics {
    pub(crate) fn record_append(&self, n: u64) {
        self.bytes_ingested.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn record_delivered(&self, n: u64) {
        self.bytes_delivered.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn observer_attached(&self) {
        self.active_observers.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn observer_detached(&self) {
        self.active_observers.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            bytes_ingested: self.bytes_ingested.load(Ordering::Relaxed),
            bytes_delivered: self.bytes_delivered.load(Ordering::Relaxed),
            active_observers: self.active_observers.load(Ordering::Relaxed),
        }
    }
}
