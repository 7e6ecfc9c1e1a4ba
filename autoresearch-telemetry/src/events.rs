//! ABOUTME: Structured tracing helpers for the query lifecycle state machine
//! ABOUTME: Every emitted event carries the query_id so logs correlate across components

use autoresearch_core::types::{AgentResult, GateDecision};
use tracing::{info, warn};

/// Emit a structured event for a state machine transition (§4.1): `Init →
/// (ScoutPass)? → GateDecision → Debate* → Synthesize → Audit → (Hedge)? →
/// Done`.
pub fn log_state_transition(query_id: &str, from: &str, to: &str) {
    info!(query_id, from, to, "query state transition");
}

pub fn log_gate_decision(query_id: &str, decision: &GateDecision) {
    info!(
        query_id,
        action = ?decision.action,
        max_cycles = decision.max_cycles,
        rationale = %decision.rationale,
        "gate decision evaluated"
    );
}

pub fn log_agent_result(query_id: &str, result: &AgentResult) {
    match result.status {
        autoresearch_core::types::AgentStatus::Failed
        | autoresearch_core::types::AgentStatus::Timeout => {
            warn!(
                query_id,
                agent = %result.agent_name,
                cycle = result.cycle,
                status = ?result.status,
                error = ?result.error,
                "agent execution did not complete cleanly"
            );
        }
        _ => {
            info!(
                query_id,
                agent = %result.agent_name,
                cycle = result.cycle,
                status = ?result.status,
                latency_ms = result.latency_ms,
                "agent execution completed"
            );
        }
    }
}

/// A transient agent failure is about to be retried (§4.1, §4.5). `strategy`
/// names the recovery strategy applied (currently always
/// `retry_with_backoff`) so Seed Scenario-style log scraping can find it by
/// name rather than inferring it from `AgentStatus::Retried` alone.
pub fn log_retry_attempt(query_id: &str, agent: &str, strategy: &str, attempt: u32, delay_ms: u64) {
    info!(query_id, agent, strategy, attempt, delay_ms, "retrying agent after transient failure");
}

pub fn log_budget_exhausted(query_id: &str, reason: &str) {
    warn!(query_id, reason, "cycle budget exhausted; returning partial synthesis");
}

pub fn log_circuit_breaker_tripped(query_id: &str, agent: &str) {
    warn!(query_id, agent, "circuit breaker opened; agent skipped for remainder of query");
}

/// No model satisfied both the per-agent cost share and latency budget
/// (§4.8): the router fell back to the cheapest eligible model anyway.
pub fn log_routing_degraded(agent_role: &str, model: &str) {
    warn!(agent_role, model, "no model met cost and latency budget; routing degraded to cheapest eligible");
}
