//! ABOUTME: `ModelRouter` — per-agent/per-model cost and latency tracking plus model selection (§4.8)

use crate::model_profile::ModelProfile;
use autoresearch_core::types::RoutingPolicy;
use autoresearch_telemetry::{log_routing_degraded, Counter, LatencyHistogram, MetricsRegistry};
use dashmap::DashMap;
use parking_lot::Mutex;

/// Result of one `select_model` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSelection {
    pub model: String,
    /// `true` if no model satisfied both the cost share and latency
    /// budget and the router fell back to the cheapest eligible model
    /// (§4.8: "emit a `routing_degraded` event").
    pub degraded: bool,
}

/// Per-agent and per-model usage accounting plus model selection.
///
/// Mirrors the scoping rule used elsewhere in the orchestration core
/// (circuit breakers, `MetricsRegistry`): one instance per query, never
/// process-global, so budgets never leak across unrelated queries.
pub struct ModelRouter {
    profiles: Vec<ModelProfile>,
    policy: RoutingPolicy,
    metrics: MetricsRegistry,
    agent_tokens: DashMap<String, Counter>,
    agent_cost: DashMap<String, Mutex<f64>>,
    model_tokens: DashMap<String, Counter>,
    model_cost: DashMap<String, Mutex<f64>>,
    model_latency: DashMap<String, LatencyHistogram>,
    cost_spent_total: Mutex<f64>,
}

impl ModelRouter {
    #[must_use]
    pub fn new(profiles: Vec<ModelProfile>, policy: RoutingPolicy) -> Self {
        Self {
            profiles,
            policy,
            metrics: MetricsRegistry::new(),
            agent_tokens: DashMap::new(),
            agent_cost: DashMap::new(),
            model_tokens: DashMap::new(),
            model_cost: DashMap::new(),
            model_latency: DashMap::new(),
            cost_spent_total: Mutex::new(0.0),
        }
    }

    #[must_use]
    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Select the cheapest model whose estimated cost fits the share of
    /// the remaining budget allotted to this invocation, and whose
    /// observed p95 latency fits `latency_budget_ms` (a model with no
    /// observations yet is assumed eligible). Falls back to the cheapest
    /// model overall, marked `degraded`, if nothing qualifies.
    pub fn select_model(
        &self,
        agent_role: &str,
        estimated_tokens: u64,
        agents_remaining: usize,
        latency_budget_ms: u64,
    ) -> ModelSelection {
        let per_agent_budget = self.remaining_cost_budget().map(|remaining| {
            remaining / (agents_remaining.max(1) as f64)
        });

        let mut eligible: Vec<&ModelProfile> = self
            .profiles
            .iter()
            .filter(|profile| {
                let estimated_cost = estimated_tokens as f64 * profile.price_per_token;
                let cost_ok = per_agent_budget.map_or(true, |budget| estimated_cost <= budget);
                let observed_p95 = self.model_latency.get(&profile.name).map(|h| h.p95());
                let latency_ok = observed_p95.map_or(true, |p95| p95 == 0 || p95 <= latency_budget_ms);
                cost_ok && latency_ok
            })
            .collect();
        eligible.sort_by(|a, b| a.price_per_token.total_cmp(&b.price_per_token));

        if let Some(chosen) = eligible.first() {
            let savings = self.cost_savings_vs_default(estimated_tokens, chosen);
            self.metrics
                .record_routing_decision(format!("{agent_role} -> {}", chosen.name), savings);
            return ModelSelection {
                model: chosen.name.clone(),
                degraded: false,
            };
        }

        let fallback = self
            .profiles
            .iter()
            .min_by(|a, b| a.price_per_token.total_cmp(&b.price_per_token))
            .map_or_else(|| self.policy.default_model.clone(), |p| p.name.clone());
        log_routing_degraded(agent_role, &fallback);
        self.metrics
            .record_routing_decision(format!("{agent_role} -> {fallback} (degraded)"), 0.0);
        ModelSelection {
            model: fallback,
            degraded: true,
        }
    }

    /// Record actual usage after an `LLMAdapter` call completes, feeding
    /// both the per-agent and per-model accounting used by subsequent
    /// `select_model` calls.
    pub fn record_usage(&self, agent: &str, model: &str, tokens: u64, latency_ms: u64) {
        let price = self
            .profiles
            .iter()
            .find(|p| p.name == model)
            .map_or(0.0, |p| p.price_per_token);
        let cost = tokens as f64 * price;

        self.agent_tokens.entry(agent.to_string()).or_insert_with(Counter::new).inc_by(tokens);
        *self.agent_cost.entry(agent.to_string()).or_insert_with(|| Mutex::new(0.0)).lock() += cost;
        self.model_tokens.entry(model.to_string()).or_insert_with(Counter::new).inc_by(tokens);
        *self.model_cost.entry(model.to_string()).or_insert_with(|| Mutex::new(0.0)).lock() += cost;
        self.model_latency
            .entry(model.to_string())
            .or_insert_with(|| LatencyHistogram::new(256))
            .record(latency_ms);
        *self.cost_spent_total.lock() += cost;
    }

    #[must_use]
    pub fn tokens_used_by_agent(&self, agent: &str) -> u64 {
        self.agent_tokens.get(agent).map_or(0, |c| c.get())
    }

    #[must_use]
    pub fn cost_spent_by_agent(&self, agent: &str) -> f64 {
        self.agent_cost.get(agent).map_or(0.0, |c| *c.lock())
    }

    #[must_use]
    pub fn latency_p95_by_model(&self, model: &str) -> u64 {
        self.model_latency.get(model).map_or(0, |h| h.p95())
    }

    fn remaining_cost_budget(&self) -> Option<f64> {
        self.policy
            .cost_budget
            .map(|budget| (budget - *self.cost_spent_total.lock()).max(0.0))
    }

    fn cost_savings_vs_default(&self, estimated_tokens: u64, chosen: &ModelProfile) -> f64 {
        let default_price = self
            .profiles
            .iter()
            .find(|p| p.name == self.policy.default_model)
            .map_or(chosen.price_per_token, |p| p.price_per_token);
        let baseline_cost = estimated_tokens as f64 * default_price;
        let chosen_cost = estimated_tokens as f64 * chosen.price_per_token;
        (baseline_cost - chosen_cost).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(default_model: &str, cost_budget: Option<f64>) -> RoutingPolicy {
        RoutingPolicy {
            default_model: default_model.to_string(),
            cost_budget,
        }
    }

    #[test]
    fn selects_cheapest_model_within_budget() {
        let profiles = vec![
            ModelProfile::new("expensive", 0.01),
            ModelProfile::new("cheap", 0.001),
        ];
        let router = ModelRouter::new(profiles, policy("expensive", Some(10.0)));
        let selection = router.select_model("synthesizer", 1000, 1, 10_000);
        assert_eq!(selection.model, "cheap");
        assert!(!selection.degraded);
    }

    #[test]
    fn falls_back_to_cheapest_eligible_and_marks_degraded_when_budget_too_tight() {
        let profiles = vec![ModelProfile::new("only-model", 1.0)];
        let router = ModelRouter::new(profiles, policy("only-model", Some(0.01)));
        let selection = router.select_model("synthesizer", 1000, 1, 10_000);
        assert_eq!(selection.model, "only-model");
        assert!(selection.degraded);
    }

    #[test]
    fn cost_savings_recorded_against_the_default_model_baseline() {
        let profiles = vec![
            ModelProfile::new("default", 0.01),
            ModelProfile::new("cheap", 0.001),
        ];
        let router = ModelRouter::new(profiles, policy("default", None));
        router.select_model("synthesizer", 1000, 1, 10_000);
        let response = router.metrics().to_response_metrics();
        assert!(response.model_routing_cost_savings > 0.0);
        assert_eq!(response.model_routing_decisions.len(), 1);
    }

    #[test]
    fn record_usage_accumulates_tokens_and_cost_per_agent_and_model() {
        let profiles = vec![ModelProfile::new("m1", 0.002)];
        let router = ModelRouter::new(profiles, policy("m1", None));
        router.record_usage("synthesizer", "m1", 100, 50);
        router.record_usage("synthesizer", "m1", 50, 70);
        assert_eq!(router.tokens_used_by_agent("synthesizer"), 150);
        assert!((router.cost_spent_by_agent("synthesizer") - 0.3).abs() < 1e-9);
        assert_eq!(router.latency_p95_by_model("m1"), 70);
    }
}
