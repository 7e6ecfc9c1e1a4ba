//! ABOUTME: Immutable configuration snapshot captured at query submit time
//! ABOUTME: The orchestrator never reads global/mutable config at runtime; it only ever sees this

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reasoning mode requested for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReasoningMode {
    /// Single Synthesizer pass, no debate.
    Direct,
    /// Full dialectical thesis/antithesis/synthesis loop.
    Dialectical,
    /// Single-agent chain-of-thought loop, still cycle-scheduled.
    ChainOfThought,
    /// Run the scout pass first; gate policy decides exit vs. escalate.
    Auto,
}

/// Gate policy thresholds (§4.3). Defaults mirror the documented values;
/// any field a caller sets explicitly overrides scout-computed signals —
/// scout signals are never re-interpreted once a threshold is overridden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateThresholds {
    pub retrieval_overlap_min: f64,
    pub claim_conflict_max: f64,
    pub multi_hop_required_allowed: bool,
    pub graph_contradiction_allowed: bool,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            retrieval_overlap_min: 0.6,
            claim_conflict_max: 0.2,
            multi_hop_required_allowed: false,
            graph_contradiction_allowed: false,
        }
    }
}

/// Hedging strategy applied to unsupported claim text (§4.6 step 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HedgeMode {
    /// Prefix the unsupported sentence with a disclaimer.
    Prefix,
    /// Annotate the unsupported sentence inline.
    Inline,
    /// Record the warning in the side-channel only; leave text untouched.
    None,
}

/// Policy governing the claim auditor (§4.6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditPolicy {
    pub max_retry_results: usize,
    pub max_rounds: u32,
    pub supported_threshold: f64,
    pub unsupported_threshold: f64,
    pub hedge_mode: HedgeMode,
    pub require_human_ack: bool,
    pub operator_timeout_s: u64,
}

impl Default for AuditPolicy {
    fn default() -> Self {
        Self {
            max_retry_results: 5,
            max_rounds: 2,
            supported_threshold: 0.75,
            unsupported_threshold: 0.3,
            hedge_mode: HedgeMode::Prefix,
            require_human_ack: false,
            operator_timeout_s: 30,
        }
    }
}

/// Routing policy consumed by the model router (§4.8).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingPolicy {
    pub default_model: String,
    pub cost_budget: Option<f64>,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self {
            default_model: "default".to_string(),
            cost_budget: None,
        }
    }
}

/// Retrieval score blend weights (§4.7 step 4). Must sum to 1.0; validated
/// at config load time by the orchestrating shell, not here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetrievalWeights {
    pub bm25: f64,
    pub semantic: f64,
    pub credibility: f64,
}

impl Default for RetrievalWeights {
    fn default() -> Self {
        Self {
            bm25: 0.4,
            semantic: 0.4,
            credibility: 0.2,
        }
    }
}

impl RetrievalWeights {
    /// `true` if the three weights are non-negative and sum to 1.0 within
    /// floating point tolerance.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let sum = self.bm25 + self.semantic + self.credibility;
        self.bm25 >= 0.0
            && self.semantic >= 0.0
            && self.credibility >= 0.0
            && (sum - 1.0).abs() < 1e-9
    }
}

/// Budget ceilings for one query. `None` means unbounded for that
/// dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetLimits {
    pub tokens: Option<u64>,
    pub time_ms: Option<u64>,
}

/// Immutable snapshot of everything the orchestrator needs to run one
/// query. Constructed once by the caller (the design note in §9 replaces
/// "monkey-patched config objects" with this explicit value); the
/// orchestrator never mutates it and never reads ambient/global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub reasoning_mode: ReasoningMode,
    pub loops: u32,
    pub agent_roster: Vec<String>,
    pub primus_start: usize,
    pub budget: BudgetLimits,
    pub gate_thresholds: GateThresholds,
    pub gate_thresholds_overridden: bool,
    pub audit_policy: AuditPolicy,
    pub routing_policy: RoutingPolicy,
    pub retrieval_weights: RetrievalWeights,
    pub agent_timeout: Duration,
    pub cycle_timeout: Duration,
    pub query_timeout: Option<Duration>,
    pub max_retry_attempts: u32,
    pub retry_base_delay: Duration,
    pub breaker_failure_threshold: u32,
    pub breaker_open_cycles: u32,
}

impl ConfigSnapshot {
    /// Validate the parts of the snapshot the orchestrator's public
    /// contract (§4.1) documents as fatal `ConfigError` conditions:
    /// an empty roster or a sub-1 loop count.
    ///
    /// # Errors
    /// Returns `Err` describing the first invalid field found.
    pub fn validate(&self) -> Result<(), String> {
        if self.agent_roster.is_empty() {
            return Err("agent roster must not be empty".to_string());
        }
        if self.loops == 0 {
            return Err("loops must be >= 1".to_string());
        }
        if self.primus_start >= self.agent_roster.len() {
            return Err("primus_start out of bounds for agent roster".to_string());
        }
        if !self.retrieval_weights.is_valid() {
            return Err("retrieval weights must be non-negative and sum to 1.0".to_string());
        }
        Ok(())
    }
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self {
            reasoning_mode: ReasoningMode::Auto,
            loops: 2,
            agent_roster: vec!["synthesizer".to_string()],
            primus_start: 0,
            budget: BudgetLimits {
                tokens: None,
                time_ms: None,
            },
            gate_thresholds: GateThresholds::default(),
            gate_thresholds_overridden: false,
            audit_policy: AuditPolicy::default(),
            routing_policy: RoutingPolicy::default(),
            retrieval_weights: RetrievalWeights::default(),
            agent_timeout: Duration::from_secs(30),
            cycle_timeout: Duration::from_secs(120),
            query_timeout: None,
            max_retry_attempts: 3,
            retry_base_delay: Duration::from_millis(200),
            breaker_failure_threshold: 3,
            breaker_open_cycles: 1,
        }
    }
}
