//! ABOUTME: Cycle scheduler (§4.1) — `Init -> (ScoutPass)? -> GateDecision -> Debate* -> Synthesize`
//! ABOUTME: `-> Audit -> (Hedge)? -> Done`, the orchestration core's top-level state machine

use crate::audit::{apply_hedging, ClaimAuditor};
use crate::planner::{build_task_graph_from_plan, ready_tasks};
use crate::scout::run_scout_pass;
use autoresearch_agents::{execute_with_retry, AgentContext, AgentRole, CircuitBreakerManager, RoleAgent};
use autoresearch_core::error::Result;
use autoresearch_core::traits::{GenerationParams, LLMAdapter};
use autoresearch_core::types::{
    AuditRecord, AuditStatus, ClaimType, CycleBudget, GateAction, GateDecision, GateSignals, Query,
    QueryResponse, QueryState, ReActMetadata, ReActStep, ReasoningEntry, ReasoningMode, ScoutResult,
    TaskNode, Warning,
};
use autoresearch_retrieval::HybridRetrievalMerger;
use autoresearch_router::ModelRouter;
use autoresearch_telemetry::{log_budget_exhausted, log_gate_decision, log_state_transition, MetricsRegistry};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Drives one query through the cycle state machine. Every piece of
/// mutable per-query bookkeeping (`QueryState`, `CircuitBreakerManager`,
/// `MetricsRegistry`) is created fresh inside `run_query`, matching the
/// scoping rule documented on `CircuitBreaker` and `MetricsRegistry`:
/// never process-global, so concurrent queries never share budgets or
/// breaker state (§5).
pub struct Orchestrator {
    llm: Arc<dyn LLMAdapter>,
    merger: Arc<HybridRetrievalMerger>,
    router: Arc<ModelRouter>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(llm: Arc<dyn LLMAdapter>, merger: Arc<HybridRetrievalMerger>, router: Arc<ModelRouter>) -> Self {
        Self { llm, merger, router }
    }

    /// Run the full cycle state machine for `query`, producing the stable
    /// `QueryResponse` wire contract (§6.2).
    ///
    /// # Errors
    /// Propagates only the scout pass's retrieval/generation errors — an
    /// `Auto`-mode query that can't even complete its scout pass aborts
    /// outright, since there is nothing to fall back to. Every later stage
    /// absorbs agent and retrieval failures into `AgentResult`/degraded
    /// retrieval rather than failing the whole query.
    pub async fn run_query(&self, query: &Query) -> Result<QueryResponse> {
        self.run_query_cancellable(query, &CancellationToken::new()).await
    }

    /// Same as `run_query`, but cooperatively cancellable (§5, §6.2).
    /// `token` is checked at the top of every cycle, before each agent
    /// invocation, and before each audit round; a cancellation observed
    /// at any of those checkpoints short-circuits the remainder of the
    /// query and returns `CoreError::Cancelled` without persisting
    /// partial results.
    ///
    /// # Errors
    /// In addition to `run_query`'s errors, returns `CoreError::Cancelled`
    /// if `token` is cancelled before the query reaches synthesis.
    pub async fn run_query_cancellable(&self, query: &Query, token: &CancellationToken) -> Result<QueryResponse> {
        let query_id = query.query_id.to_string();
        let metrics = MetricsRegistry::new();
        let mut budget = CycleBudget::new(query.config.budget.tokens, query.config.budget.time_ms, query.config.loops);
        let breakers = CircuitBreakerManager::new(query.config.breaker_failure_threshold, query.config.breaker_open_cycles);
        let mut state = QueryState::new(query.config.audit_policy.clone());
        let mut reasoning = Vec::new();

        log_state_transition(&query_id, "init", "scout_or_gate");
        let (gate, scout) = self.run_gate(query).await?;
        log_gate_decision(&query_id, &gate);
        let scout_cache_hit = scout.as_ref().map(|s| s.cache_hit).unwrap_or(false);

        let mut partial = false;
        if gate.action == GateAction::Exit {
            let draft = scout.map(|s| s.draft_answer).unwrap_or_default();
            reasoning.push(ReasoningEntry {
                agent: "scout".to_string(),
                cycle: 0,
                content: draft.clone(),
                claim_refs: Vec::new(),
            });
            state.final_answer = Some(draft);
        } else {
            log_state_transition(&query_id, "gate_decision", "debate");
            partial = self
                .run_debate(query, &mut state, &mut budget, &breakers, &metrics, gate.max_cycles, &mut reasoning, token)
                .await?;
            log_state_transition(&query_id, "debate", "synthesize");
            if state.final_answer.is_none() {
                state.final_answer = Some(synthesize(&state));
            }
        }

        log_state_transition(&query_id, "synthesize", "audit");
        let (audits, audit_cache_hit) = self.run_audit(&state, token).await?;
        log_state_transition(&query_id, "audit", "hedge_or_done");

        let draft_answer = state.final_answer.clone().unwrap_or_default();
        let (answer, mut warnings) = apply_hedging(&draft_answer, state.claims(), &audits, query.config.audit_policy.hedge_mode);
        let mut ack_timeout = false;
        if query.config.audit_policy.require_human_ack && audits.iter().any(|a| a.status == AuditStatus::Unsupported) {
            ack_timeout = wait_for_operator_ack(query.config.audit_policy.operator_timeout_s, token).await?;
            warnings.push(Warning {
                code: "needs_human_ack".to_string(),
                message: format!(
                    "operator acknowledgement required within {}s before this answer is released; proceeding with hedged output after timeout",
                    query.config.audit_policy.operator_timeout_s
                ),
                claim_id: None,
            });
        }
        log_state_transition(&query_id, "hedge_or_done", "done");

        let mut response_metrics = metrics.to_response_metrics();
        let router_metrics = self.router.metrics().to_response_metrics();
        response_metrics.model_routing_decisions = router_metrics.model_routing_decisions;
        response_metrics.model_routing_cost_savings = router_metrics.model_routing_cost_savings;
        response_metrics.gate_signals = Some(gate.signals);
        response_metrics.scout_samples = u32::from(matches!(query.config.reasoning_mode, ReasoningMode::Auto));
        response_metrics.partial = partial;
        response_metrics.ack_timeout = ack_timeout;
        response_metrics.cache_hit = scout_cache_hit || audit_cache_hit;

        Ok(QueryResponse {
            query_id,
            answer,
            reasoning,
            claim_audits: audits,
            metrics: response_metrics,
            warnings,
            depth_sections: None,
        })
    }

    /// Run the scout pass and evaluate the gate policy when the query is
    /// in `Auto` mode; otherwise always debate for `config.loops` cycles
    /// (§4.2, §4.3). `Direct`/`Dialectical`/`ChainOfThought` encode their
    /// distinct scheduling behavior through `agent_roster` rather than a
    /// branch here: a `Direct` query simply carries a single-agent roster.
    async fn run_gate(&self, query: &Query) -> Result<(GateDecision, Option<ScoutResult>)> {
        if matches!(query.config.reasoning_mode, ReasoningMode::Auto) {
            let latency_budget_ms = query.config.agent_timeout.as_millis() as u64;
            let selection = self.router.select_model("scout", 500, 1, latency_budget_ms);
            let scout = run_scout_pass(&*self.llm, &self.merger, query.text(), &query.config.retrieval_weights, &selection.model, 5).await?;
            self.router.record_usage("scout", &selection.model, 500, 0);
            let decision = GateDecision::evaluate(scout.signals, &query.config.gate_thresholds, query.config.loops);
            Ok((decision, Some(scout)))
        } else {
            Ok((
                GateDecision {
                    action: GateAction::Debate,
                    max_cycles: query.config.loops,
                    rationale: "reasoning mode always runs the debate loop".to_string(),
                    thresholds_used: query.config.gate_thresholds.clone(),
                    signals: GateSignals {
                        retrieval_overlap: 0.0,
                        claim_conflict: 0.0,
                        multi_hop_required: false,
                        graph_contradiction: false,
                    },
                },
                None,
            ))
        }
    }

    /// Schedule up to `max_cycles` cycles of the configured roster,
    /// rotating the starting agent by `primus_start + cycle offset`
    /// (§4.1 step 5, §4.4). Returns `Ok(true)` if the budget was
    /// exhausted before the loop converged (a partial synthesis), or
    /// `Err(CoreError::Cancelled)` if `token` was cancelled at a cycle or
    /// agent checkpoint (§5).
    #[allow(clippy::too_many_arguments)]
    async fn run_debate(
        &self,
        query: &Query,
        state: &mut QueryState,
        budget: &mut CycleBudget,
        breakers: &CircuitBreakerManager,
        metrics: &MetricsRegistry,
        max_cycles: u32,
        reasoning: &mut Vec<ReasoningEntry>,
        token: &CancellationToken,
    ) -> Result<bool> {
        let roster = &query.config.agent_roster;
        let mut completed_tasks: HashSet<String> = HashSet::new();

        for _ in 0..max_cycles {
            if token.is_cancelled() {
                return Err(autoresearch_core::error::CoreError::Cancelled);
            }
            if budget.is_exhausted() {
                log_budget_exhausted(&query.query_id.to_string(), "cycle budget exhausted before convergence");
                return Ok(true);
            }
            state.advance_cycle();
            let cycle = state.cycle;
            let cycle_started = Instant::now();
            let mut cycle_tokens = 0u64;

            for offset in 0..roster.len() {
                if token.is_cancelled() {
                    return Err(autoresearch_core::error::CoreError::Cancelled);
                }
                let idx = (query.config.primus_start + offset) % roster.len();
                let role_name = &roster[idx];
                let Some(role) = AgentRole::from_str(role_name) else {
                    continue;
                };
                let agent_name = format!("{role_name}-{idx}");
                let breaker = breakers.get_or_create(&agent_name);

                let task: Option<TaskNode> = if role == AgentRole::Planner {
                    None
                } else {
                    state
                        .task_graph
                        .as_ref()
                        .and_then(|graph| ready_tasks(graph, &completed_tasks).first().map(|n| (*n).clone()))
                };

                let agents_remaining = roster.len() - offset;
                let latency_budget_ms = query.config.agent_timeout.as_millis() as u64;
                let selection = self.router.select_model(role_name, 300, agents_remaining, latency_budget_ms);
                let agent = RoleAgent::new(agent_name.clone(), role, Arc::clone(&self.llm));
                let ctx = AgentContext {
                    query_id: query.query_id.to_string(),
                    query_text: query.text(),
                    cycle,
                    task: task.as_ref(),
                    prior_claims: state.claims(),
                    model: selection.model.clone(),
                    params: GenerationParams::default(),
                };
                let (result, claims, sources, text) =
                    execute_with_retry(&agent, &breaker, &ctx, query.config.max_retry_attempts, query.config.retry_base_delay).await;

                self.router
                    .record_usage(&agent_name, &selection.model, result.tokens_in + result.tokens_out, result.latency_ms);
                metrics.record_agent_result(&result);
                cycle_tokens += result.tokens_in + result.tokens_out;

                if role == AgentRole::Planner && !text.trim().is_empty() {
                    let (graph, _repairs) = build_task_graph_from_plan(&text);
                    state.task_graph = Some(graph);
                }

                let claim_refs = claims.iter().map(|c| c.claim_id).collect();
                let content = if text.is_empty() {
                    format!("{} claim(s) added", claims.len())
                } else {
                    text
                };
                reasoning.push(ReasoningEntry {
                    agent: agent_name.clone(),
                    cycle,
                    content,
                    claim_refs,
                });

                state.react_log.push(ReActStep {
                    thought: format!("scheduled {role_name} for cycle {cycle}"),
                    action: "execute_agent".to_string(),
                    tool: task.as_ref().map(|t| t.id.clone()),
                    metadata: ReActMetadata {
                        scheduler_candidates: vec![agent_name.clone()],
                        unlock_events: Vec::new(),
                        affinity_delta: HashMap::new(),
                    },
                });

                if let Some(t) = &task {
                    completed_tasks.insert(t.id.clone());
                }

                state.update(result, claims, sources);
            }

            budget.consume(cycle_tokens, cycle_started.elapsed());
            metrics.record_cycle_completed();
            budget.consume_cycle();
            if state.should_stop() {
                return Ok(false);
            }
        }
        Ok(false)
    }

    /// Audit every accumulated claim (§4.6). A claim the auditor itself
    /// fails to reach (retrieval/generation error) is simply omitted from
    /// `claim_audits` rather than aborting the whole query — an
    /// un-auditable claim degrades the response, it doesn't kill it.
    /// Checked before each claim's audit round (§5); a cancellation mid
    /// pass returns `CoreError::Cancelled` with whatever audits already
    /// completed discarded, matching "partial results are not persisted
    /// unless explicitly committed".
    async fn run_audit(&self, state: &QueryState, token: &CancellationToken) -> Result<(Vec<AuditRecord>, bool)> {
        let auditor = ClaimAuditor::new(&*self.llm, &self.merger, &state.audit_policy);
        let mut audits = Vec::with_capacity(state.claims().len());
        let mut cache_hit = false;
        for claim in state.claims() {
            if token.is_cancelled() {
                return Err(autoresearch_core::error::CoreError::Cancelled);
            }
            if let Ok((record, round_hit)) = auditor.audit(claim).await {
                cache_hit |= round_hit;
                audits.push(record);
            }
        }
        Ok((audits, cache_hit))
    }
}

/// Block for up to `timeout_s` seconds for an operator acknowledgement
/// (§4.6 step 5). No interactive ack channel exists in this crate's scope
/// (CLI/HTTP/TUI shells are out of scope, §1), so this always times out
/// and the caller proceeds with the hedged output, recording
/// `ack_timeout=true`. Checked against `token` so a cancelled query
/// doesn't sit out the full timeout.
///
/// # Errors
/// Returns `CoreError::Cancelled` if `token` is cancelled before the
/// timeout elapses.
async fn wait_for_operator_ack(timeout_s: u64, token: &CancellationToken) -> Result<bool> {
    tokio::select! {
        () = tokio::time::sleep(std::time::Duration::from_secs(timeout_s)) => Ok(true),
        () = token.cancelled() => Err(autoresearch_core::error::CoreError::Cancelled),
    }
}

/// Deterministic fallback synthesis when the debate loop produced no
/// explicit `final_answer`: join every `Synthesis`-typed claim, or fall
/// back to the last claim recorded if none of the roster produced one.
fn synthesize(state: &QueryState) -> String {
    let synthesis: Vec<&str> = state
        .claims()
        .iter()
        .filter(|c| c.claim_type == ClaimType::Synthesis)
        .map(|c| c.text.as_str())
        .collect();
    if synthesis.is_empty() {
        state.claims().last().map(|c| c.text.clone()).unwrap_or_default()
    } else {
        synthesis.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use autoresearch_core::traits::{GenerationResult, RawResult, SearchBackend};
    use autoresearch_core::types::{AuditPolicy, ConfigSnapshot, HedgeMode, RoutingPolicy};
    use autoresearch_router::ModelProfile;
    use autoresearch_storage::{RamBudgetConfig, StorageCoordinator};
    use std::collections::HashMap as StdHashMap;

    struct StubLlm;

    #[async_trait]
    impl LLMAdapter for StubLlm {
        async fn generate(&self, prompt: &str, model: &str, _params: &GenerationParams) -> Result<GenerationResult> {
            let text = if prompt.contains("You decompose the query") {
                "find the capital\nconfirm the population".to_string()
            } else {
                "Paris is the capital of France.".to_string()
            };
            Ok(GenerationResult {
                text,
                tokens_in: 20,
                tokens_out: 10,
                latency_ms: 5,
                model_used: model.to_string(),
            })
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0])
        }

        async fn entailment(&self, _claim: &str, _evidence: &str) -> Result<f64> {
            Ok(0.9)
        }
    }

    struct StubBackend;

    #[async_trait]
    impl SearchBackend for StubBackend {
        fn name(&self) -> &str {
            "web"
        }

        async fn search(&self, _canonical_query: &str, _top_k: usize) -> Result<Vec<RawResult>> {
            Ok(vec![RawResult {
                url: "https://example.com/paris".to_string(),
                title: "Paris".to_string(),
                snippet: "Paris is the capital of France".to_string(),
                meta: StdHashMap::new(),
            }])
        }
    }

    fn orchestrator() -> Orchestrator {
        let storage = Arc::new(StorageCoordinator::new(RamBudgetConfig::default(), false));
        let backend: Arc<dyn SearchBackend> = Arc::new(StubBackend);
        let merger = Arc::new(HybridRetrievalMerger::new(storage, vec![backend]));
        let router = Arc::new(ModelRouter::new(
            vec![ModelProfile::new("test-model", 0.0001)],
            RoutingPolicy {
                default_model: "test-model".to_string(),
                cost_budget: None,
            },
        ));
        Orchestrator::new(Arc::new(StubLlm), merger, router)
    }

    fn direct_query(text: &str) -> Query {
        let config = ConfigSnapshot {
            reasoning_mode: ReasoningMode::Direct,
            loops: 1,
            agent_roster: vec!["synthesizer".to_string()],
            audit_policy: AuditPolicy {
                hedge_mode: HedgeMode::Prefix,
                ..AuditPolicy::default()
            },
            ..ConfigSnapshot::default()
        };
        Query::new(text, config).unwrap()
    }

    #[tokio::test]
    async fn direct_mode_runs_one_cycle_and_produces_a_clean_answer() {
        let orchestrator = orchestrator();
        let query = direct_query("what is the capital of france");
        let response = orchestrator.run_query(&query).await.unwrap();
        assert!(response.is_answer_clean());
        assert!(!response.answer.is_empty());
        assert_eq!(response.metrics.cycles_run, 1);
        assert!(!response.metrics.partial);
    }

    #[tokio::test]
    async fn auto_mode_exits_early_when_scout_signals_are_within_threshold() {
        let config = ConfigSnapshot {
            reasoning_mode: ReasoningMode::Auto,
            loops: 3,
            agent_roster: vec!["synthesizer".to_string(), "contrarian".to_string()],
            ..ConfigSnapshot::default()
        };
        let query = Query::new("capital of france", config).unwrap();
        let orchestrator = orchestrator();
        let response = orchestrator.run_query(&query).await.unwrap();
        assert_eq!(response.metrics.scout_samples, 1);
        assert_eq!(response.metrics.cycles_run, 0);
    }

    #[tokio::test]
    async fn planner_role_builds_a_task_graph_consumed_by_later_agents() {
        let config = ConfigSnapshot {
            reasoning_mode: ReasoningMode::Dialectical,
            loops: 2,
            agent_roster: vec!["planner".to_string(), "researcher".to_string()],
            ..ConfigSnapshot::default()
        };
        let query = Query::new("multi-part question", config).unwrap();
        let orchestrator = orchestrator();
        let response = orchestrator.run_query(&query).await.unwrap();
        assert!(response
            .reasoning
            .iter()
            .any(|entry| entry.agent.starts_with("planner") && entry.content.contains("find the capital")));
    }

    #[tokio::test]
    async fn budget_exhaustion_marks_the_response_partial() {
        // `researcher` only ever produces `Evidence` claims, so
        // `QueryState::should_stop` (which looks for a `Synthesis` claim)
        // never trips — the loop keeps running until the budget does.
        let config = ConfigSnapshot {
            reasoning_mode: ReasoningMode::Dialectical,
            loops: 5,
            agent_roster: vec!["researcher".to_string()],
            budget: autoresearch_core::types::BudgetLimits {
                tokens: Some(10),
                time_ms: None,
            },
            ..ConfigSnapshot::default()
        };
        let query = Query::new("capital of france", config).unwrap();
        let orchestrator = orchestrator();
        let response = orchestrator.run_query(&query).await.unwrap();
        assert!(response.metrics.partial);
    }

    #[tokio::test]
    async fn a_pre_cancelled_token_short_circuits_the_debate_loop() {
        let config = ConfigSnapshot {
            reasoning_mode: ReasoningMode::Dialectical,
            loops: 3,
            agent_roster: vec!["synthesizer".to_string()],
            ..ConfigSnapshot::default()
        };
        let query = Query::new("capital of france", config).unwrap();
        let orchestrator = orchestrator();
        let token = CancellationToken::new();
        token.cancel();
        let err = orchestrator.run_query_cancellable(&query, &token).await.unwrap_err();
        assert!(matches!(err, autoresearch_core::error::CoreError::Cancelled));
    }
}
