//! Delivery counters for background sends

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters shared by a sink and its pool workers
#[derive(Debug, Default)]
pub struct DeliveryMetrics {
    queued: AtomicUsize,
    posted: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

impl DeliveryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jobs waiting in the pool queue, as last observed
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::Relaxed)
    }

    pub fn set_queued(&self, len: usize) {
        self.queued.store(len, Ordering::Relaxed);
    }

    /// Requests answered with 200 OK
    pub fn posted(&self) -> u64 {
        self.posted.load(Ordering::Relaxed)
    }

    pub fn record_posted(&self) {
        self.posted.fetch_add(1, Ordering::Relaxed);
    }

    /// Requests that errored or got another status
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Jobs rejected by a full queue
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DeliverySnapshot {
        DeliverySnapshot {
            queued: self.queued(),
            posted: self.posted(),
            failed: self.failed(),
            dropped: self.dropped(),
        }
    }
}

/// Point-in-time copy of [`DeliveryMetrics`] for reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliverySnapshot {
    pub queued: usize,
    pub posted: u64,
    pub failed: u64,
    pub dropped: u64,
}

impl std::fmt::Display for DeliverySnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "posted={} failed={} dropped={}",
            self.posted, self.failed, self.dropped
        )
    }
}
