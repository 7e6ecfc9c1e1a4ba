//! ABOUTME: Counters, gauges, and latency histograms for orchestration telemetry
//! ABOUTME: Mirrors the metric primitives the agent runtime reports through

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A monotonically increasing counter.
#[derive(Debug, Clone)]
pub struct Counter {
    value: Arc<AtomicU64>,
}

impl Counter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            value: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn inc(&self) {
        self.inc_by(1);
    }

    pub fn inc_by(&self, amount: u64) {
        self.value.fetch_add(amount, Ordering::Relaxed);
    }

    #[must_use]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

/// A value that can move up or down, e.g. `tokens_remaining`.
#[derive(Debug, Clone)]
pub struct Gauge {
    bits: Arc<AtomicU64>,
}

impl Gauge {
    #[must_use]
    pub fn new(initial: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(initial.to_bits())),
        }
    }

    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    #[must_use]
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

/// A latency histogram tracking p50/p95 per agent, per §4.1 step 8
/// ("agent latencies (p50/p95)"). Samples are kept in a bounded ring so
/// percentile queries stay O(1) space regardless of query volume.
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    samples: Arc<parking_lot::Mutex<Vec<u64>>>,
    capacity: usize,
}

impl LatencyHistogram {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Arc::new(parking_lot::Mutex::new(Vec::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn record(&self, latency_ms: u64) {
        let mut samples = self.samples.lock();
        if samples.len() == self.capacity {
            samples.remove(0);
        }
        samples.push(latency_ms);
    }

    /// Compute the given percentile (`0.0..=1.0`) over recorded samples.
    /// Returns `0` if no samples have been recorded yet.
    #[must_use]
    pub fn percentile(&self, p: f64) -> u64 {
        let mut samples = self.samples.lock().clone();
        if samples.is_empty() {
            return 0;
        }
        samples.sort_unstable();
        let idx = ((samples.len() as f64 - 1.0) * p.clamp(0.0, 1.0)).round() as usize;
        samples[idx]
    }

    #[must_use]
    pub fn p50(&self) -> u64 {
        self.percentile(0.50)
    }

    #[must_use]
    pub fn p95(&self) -> u64 {
        self.percentile(0.95)
    }
}

/// Snapshot of metrics for one agent, exported into `ResponseMetrics`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentMetricsSnapshot {
    pub tokens_in: u64,
    pub tokens_out: u64,
    pub latency_p50_ms: u64,
    pub latency_p95_ms: u64,
    pub invocations: u64,
    pub failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_accumulates() {
        let c = Counter::new();
        c.inc();
        c.inc_by(4);
        assert_eq!(c.get(), 5);
    }

    #[test]
    fn histogram_percentiles_are_monotonic() {
        let h = LatencyHistogram::new(100);
        for ms in [10, 20, 30, 40, 50] {
            h.record(ms);
        }
        assert!(h.p50() <= h.p95());
        assert_eq!(h.p95(), 50);
    }

    #[test]
    fn histogram_evicts_oldest_beyond_capacity() {
        let h = LatencyHistogram::new(2);
        h.record(1);
        h.record(2);
        h.record(3);
        // Only the last 2 samples should remain: 2 and 3.
        assert_eq!(h.percentile(0.0), 2);
        assert_eq!(h.percentile(1.0), 3);
    }
}
