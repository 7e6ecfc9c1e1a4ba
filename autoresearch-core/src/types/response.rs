//! ABOUTME: `QueryResponse` — the stable wire contract returned to orchestrating shells

use super::audit::AuditRecord;
use super::ids::ClaimId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fixed set of substrings that must never appear inside `answer` (§4.6
/// step 4, §8). Warnings referencing unsupported claims belong only in
/// `warnings`.
pub const WARNING_PREFIXES: &[&str] = &[
    "[UNVERIFIED]",
    "[UNSUPPORTED]",
    "Warning:",
    "⚠",
    "[NEEDS REVIEW]",
];

#[must_use]
pub fn answer_is_clean(answer: &str) -> bool {
    !WARNING_PREFIXES.iter().any(|p| answer.contains(p))
}

/// One entry in the structured `reasoning` trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningEntry {
    pub agent: String,
    pub cycle: u64,
    pub content: String,
    pub claim_refs: Vec<ClaimId>,
}

/// A structured warning, kept out of `answer` entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    pub code: String,
    pub message: String,
    pub claim_id: Option<ClaimId>,
}

/// Telemetry attached to a response (§6.2).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseMetrics {
    pub tokens_in: u64,
    pub tokens_out: u64,
    pub tokens_by_agent: HashMap<String, u64>,
    pub agent_latency_p95_ms: HashMap<String, u64>,
    pub model_routing_decisions: Vec<String>,
    pub model_routing_cost_savings: f64,
    pub cycles_run: u64,
    pub gate_signals: Option<super::scout::GateSignals>,
    pub scout_samples: u32,
    pub cache_hit: bool,
    pub partial: bool,
    pub ack_timeout: bool,
}

/// Optional layered presentation of the answer at increasing depth.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepthSections {
    pub tldr: Option<String>,
    pub findings: Option<String>,
    pub claims: Option<String>,
    pub trace: Option<String>,
    pub full: Option<String>,
}

/// The stable wire contract returned from `run_query` (§6.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query_id: String,
    pub answer: String,
    pub reasoning: Vec<ReasoningEntry>,
    pub claim_audits: Vec<AuditRecord>,
    pub metrics: ResponseMetrics,
    pub warnings: Vec<Warning>,
    pub depth_sections: Option<DepthSections>,
}

impl QueryResponse {
    /// Construct-time invariant check: panics only in debug assertions
    /// during tests, since this is an internal contract the orchestrator
    /// itself must never violate (§8: "R.answer contains no substring
    /// from a fixed set of warning prefixes").
    #[must_use]
    pub fn is_answer_clean(&self) -> bool {
        answer_is_clean(&self.answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_prefixes_are_detected() {
        assert!(!answer_is_clean("Warning: this is shaky"));
        assert!(answer_is_clean("Paris is the capital of France."));
    }
}
