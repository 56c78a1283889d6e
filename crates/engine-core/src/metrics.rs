//! Shared import counters, updated with atomic adds from writer tasks.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

#[derive(Debug, Default)]
struct InnerMetrics {
    records_processed: AtomicU64,
    batches_processed: AtomicU64,
    retry_count: AtomicU64,
}

#[derive(Debug, Clone, Default)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub records_processed: u64,
    pub batches_processed: u64,
    pub retry_count: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_records(&self, count: u64) {
        self.inner
            .records_processed
            .fetch_add(count, Ordering::Relaxed);
    }

    /// Bumps the batch counter and returns the new total.
    pub fn increment_batches(&self, count: u64) -> u64 {
        self.inner
            .batches_processed
            .fetch_add(count, Ordering::Relaxed)
            + count
    }

    pub fn increment_retries(&self, count: u64) {
        self.inner.retry_count.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_processed: self.inner.records_processed.load(Ordering::Relaxed),
            batches_processed: self.inner.batches_processed.load(Ordering::Relaxed),
            retry_count: self.inner.retry_count.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_across_clones() {
        let metrics = Metrics::new();
        let clone = metrics.clone();

        metrics.increment_records(25);
        clone.increment_records(10);
        assert_eq!(clone.increment_batches(1), 1);
        assert_eq!(metrics.increment_batches(1), 2);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.records_processed, 35);
        assert_eq!(snapshot.batches_processed, 2);
        assert_eq!(snapshot.retry_count, 0);
    }
}
