//! ABOUTME: Per-query metrics registry aggregating agent-level counters into `ResponseMetrics`

use crate::metrics::{AgentMetricsSnapshot, Counter, LatencyHistogram};
use autoresearch_core::types::{AgentResult, AgentStatus, ResponseMetrics};
use dashmap::DashMap;
use std::sync::Arc;

/// Per-query, per-agent metrics bookkeeping. One instance is created per
/// query (never process-global, matching the circuit breaker's scoping
/// rule in §5) and handed to `ResponseMetrics::from` at the end of the
/// run.
#[derive(Debug, Clone, Default)]
pub struct MetricsRegistry {
    tokens_in: Arc<DashMap<String, Counter>>,
    tokens_out: Arc<DashMap<String, Counter>>,
    latencies: Arc<DashMap<String, LatencyHistogram>>,
    invocations: Arc<DashMap<String, Counter>>,
    failures: Arc<DashMap<String, Counter>>,
    routing_decisions: Arc<parking_lot::Mutex<Vec<String>>>,
    routing_cost_savings: Arc<parking_lot::Mutex<f64>>,
    cycles_run: Arc<std::sync::atomic::AtomicU64>,
}

impl MetricsRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one `AgentResult`, updating every per-agent counter it
    /// implies.
    pub fn record_agent_result(&self, result: &AgentResult) {
        self.tokens_in
            .entry(result.agent_name.clone())
            .or_insert_with(Counter::new)
            .inc_by(result.tokens_in);
        self.tokens_out
            .entry(result.agent_name.clone())
            .or_insert_with(Counter::new)
            .inc_by(result.tokens_out);
        self.latencies
            .entry(result.agent_name.clone())
            .or_insert_with(|| LatencyHistogram::new(256))
            .record(result.latency_ms);
        self.invocations
            .entry(result.agent_name.clone())
            .or_insert_with(Counter::new)
            .inc();
        if result.status == AgentStatus::Failed {
            self.failures
                .entry(result.agent_name.clone())
                .or_insert_with(Counter::new)
                .inc();
        }
    }

    pub fn record_cycle_completed(&self) {
        self.cycles_run
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }

    pub fn record_routing_decision(&self, description: impl Into<String>, cost_savings: f64) {
        self.routing_decisions.lock().push(description.into());
        *self.routing_cost_savings.lock() += cost_savings;
    }

    #[must_use]
    pub fn snapshot_for_agent(&self, agent: &str) -> AgentMetricsSnapshot {
        AgentMetricsSnapshot {
            tokens_in: self.tokens_in.get(agent).map_or(0, |c| c.get()),
            tokens_out: self.tokens_out.get(agent).map_or(0, |c| c.get()),
            latency_p50_ms: self.latencies.get(agent).map_or(0, |h| h.p50()),
            latency_p95_ms: self.latencies.get(agent).map_or(0, |h| h.p95()),
            invocations: self.invocations.get(agent).map_or(0, |c| c.get()),
            failures: self.failures.get(agent).map_or(0, |c| c.get()),
        }
    }

    /// Fold everything recorded so far into a `ResponseMetrics`. Cheap
    /// enough to call multiple times (e.g. once for a partial response
    /// on budget exhaustion, once at final synthesis).
    #[must_use]
    pub fn to_response_metrics(&self) -> ResponseMetrics {
        let mut metrics = ResponseMetrics::default();
        for entry in self.tokens_in.iter() {
            metrics.tokens_in += entry.value().get();
            metrics
                .tokens_by_agent
                .insert(entry.key().clone(), entry.value().get());
        }
        for entry in self.tokens_out.iter() {
            metrics.tokens_out += entry.value().get();
        }
        for entry in self.latencies.iter() {
            metrics
                .agent_latency_p95_ms
                .insert(entry.key().clone(), entry.value().p95());
        }
        metrics.model_routing_decisions = self.routing_decisions.lock().clone();
        metrics.model_routing_cost_savings = *self.routing_cost_savings.lock();
        metrics.cycles_run = self.cycles_run.load(std::sync::atomic::Ordering::Relaxed);
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoresearch_core::types::AgentResult;

    #[test]
    fn records_tokens_per_agent() {
        let registry = MetricsRegistry::new();
        let mut result = AgentResult::ok("synthesizer", 0);
        result.tokens_in = 10;
        result.tokens_out = 20;
        result.latency_ms = 42;
        registry.record_agent_result(&result);

        let snapshot = registry.snapshot_for_agent("synthesizer");
        assert_eq!(snapshot.tokens_in, 10);
        assert_eq!(snapshot.tokens_out, 20);
        assert_eq!(snapshot.invocations, 1);

        let response = registry.to_response_metrics();
        assert_eq!(response.tokens_in, 10);
        assert_eq!(*response.tokens_by_agent.get("synthesizer").unwrap(), 10);
    }
}
