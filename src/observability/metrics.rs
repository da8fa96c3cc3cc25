//! Metrics registry for dynamap
//!
//! - Counters only (no gauges, no histograms)
//! - Monotonic increase
//! - Thread-safe but lock-minimal

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics registry containing all conversion and scan counters
///
/// # Thread Safety
///
/// All counters use atomic operations for thread-safe increments.
/// Uses Relaxed ordering for minimal overhead (eventual consistency is fine for metrics).
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Objects converted to items
    items_marshalled: AtomicU64,
    /// Items converted to objects
    items_unmarshalled: AtomicU64,
    /// Field model cache hits
    cache_hits: AtomicU64,
    /// Field model cache misses (resolutions)
    cache_misses: AtomicU64,
    /// Parallel scan batches completed
    scan_batches: AtomicU64,
    /// Scan pages received
    scan_pages: AtomicU64,
    /// Segment requests that failed
    scan_segment_failures: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Conversion metrics

    pub fn increment_items_marshalled(&self) {
        self.items_marshalled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_items_unmarshalled(&self) {
        self.items_unmarshalled.fetch_add(1, Ordering::Relaxed);
    }

    // Cache metrics

    pub fn increment_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cache_misses(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Get field model cache hits
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// Get field model cache misses
    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    // Scan metrics

    pub fn increment_scan_batches(&self) {
        self.scan_batches.fetch_add(1, Ordering::Relaxed);
    }

    /// Add scan pages received in a batch
    pub fn add_scan_pages(&self, pages: u64) {
        self.scan_pages.fetch_add(pages, Ordering::Relaxed);
    }

    pub fn increment_scan_segment_failures(&self) {
        self.scan_segment_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            items_marshalled: self.items_marshalled.load(Ordering::Relaxed),
            items_unmarshalled: self.items_unmarshalled.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            scan_batches: self.scan_batches.load(Ordering::Relaxed),
            scan_pages: self.scan_pages.load(Ordering::Relaxed),
            scan_segment_failures: self.scan_segment_failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub items_marshalled: u64,
    pub items_unmarshalled: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub scan_batches: u64,
    pub scan_pages: u64,
    pub scan_segment_failures: u64,
}
