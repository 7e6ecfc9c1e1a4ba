//! ABOUTME: Metrics, tracing, and latency percentile tracking for the orchestration core
//! ABOUTME: Consumed by the agent runtime, orchestrator, and router to populate `ResponseMetrics`

pub mod events;
pub mod metrics;
pub mod registry;

pub use events::{
    log_agent_result, log_budget_exhausted, log_circuit_breaker_tripped, log_gate_decision,
    log_retry_attempt, log_routing_degraded, log_state_transition,
};
pub use metrics::{AgentMetricsSnapshot, Counter, Gauge, LatencyHistogram};
pub use registry::MetricsRegistry;
