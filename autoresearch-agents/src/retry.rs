//! ABOUTME: Retry-with-backoff wrapper around `Agent::execute`, folding outcomes into `AgentResult`
//! ABOUTME: Only `CoreError::is_transient` failures are retried; everything else trips the breaker

use crate::agent::Agent;
use crate::circuit_breaker::CircuitBreaker;
use crate::context::AgentContext;
use autoresearch_core::error::CoreError;
use autoresearch_core::types::{AgentResult, AgentStatus, Claim, Source};
use autoresearch_telemetry::{log_agent_result, log_retry_attempt};
use rand::Rng;
use std::time::Duration;

/// Exponential backoff from `base_delay`, jittered by up to ±20% (§4.1:
/// "base 200 ms, jitter ±20%") so retries from multiple agents don't
/// synchronize into thundering-herd bursts.
fn jittered_backoff(base_delay: Duration, attempt: u32) -> Duration {
    let exponential = base_delay.saturating_mul(1u32 << (attempt - 1).min(16));
    let jitter_fraction = rand::thread_rng().gen_range(-0.2..=0.2);
    let jittered_nanos = (exponential.as_nanos() as f64) * (1.0 + jitter_fraction);
    Duration::from_nanos(jittered_nanos.max(0.0) as u64)
}

/// Run `agent` against `ctx`, retrying transient failures up to
/// `max_attempts` times with exponential backoff from `base_delay`
/// (§4.5). Returns the folded `AgentResult`, any claims/sources produced,
/// and the raw generated text (empty on failure) — the orchestrator needs
/// the latter both for the reasoning trace and to parse a `Planner`
/// agent's draft into a task graph, since `Planner` produces no claims.
/// Never propagates an error: failures are represented in the result so
/// the caller can continue scheduling the rest of the roster.
pub async fn execute_with_retry(
    agent: &dyn Agent,
    breaker: &CircuitBreaker,
    ctx: &AgentContext<'_>,
    max_attempts: u32,
    base_delay: Duration,
) -> (AgentResult, Vec<Claim>, Vec<Source>, String) {
    if !breaker.can_execute(ctx.cycle) {
        let err = CoreError::AgentFailure {
            agent: agent.name().to_string(),
            message: "circuit breaker open".to_string(),
        };
        let result = AgentResult::failed(agent.name(), ctx.cycle, &err);
        log_agent_result(&ctx.query_id, &result);
        return (result, Vec::new(), Vec::new(), String::new());
    }

    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match agent.execute(ctx).await {
            Ok(outcome) => {
                breaker.record_success();
                let mut result = AgentResult::ok(agent.name(), ctx.cycle);
                result.claims_added = outcome.claims.len() as u32;
                result.sources_added = outcome.sources.len() as u32;
                result.tokens_in = outcome.generation.tokens_in;
                result.tokens_out = outcome.generation.tokens_out;
                result.latency_ms = outcome.generation.latency_ms;
                result.model_selected = Some(outcome.generation.model_used.clone());
                if attempt > 1 {
                    result.status = AgentStatus::Retried;
                }
                log_agent_result(&ctx.query_id, &result);
                return (result, outcome.claims, outcome.sources, outcome.generation.text);
            }
            Err(err) => {
                if err.is_transient() && attempt < max_attempts {
                    let backoff = jittered_backoff(base_delay, attempt);
                    log_retry_attempt(&ctx.query_id, agent.name(), "retry_with_backoff", attempt, backoff.as_millis() as u64);
                    tokio::time::sleep(backoff).await;
                    continue;
                }
                breaker.record_failure(ctx.cycle, &ctx.query_id);
                let result = AgentResult::failed(agent.name(), ctx.cycle, &err);
                log_agent_result(&ctx.query_id, &result);
                return (result, Vec::new(), Vec::new(), String::new());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::AgentRole;
    use async_trait::async_trait;
    use autoresearch_core::error::Result;
    use autoresearch_core::traits::GenerationParams;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct FlakyAgent {
        name: String,
        failures_before_success: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Agent for FlakyAgent {
        fn name(&self) -> &str {
            &self.name
        }

        fn role(&self) -> AgentRole {
            AgentRole::Researcher
        }

        async fn execute(&self, _ctx: &AgentContext<'_>) -> Result<crate::agent::AgentOutcome> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                return Err(CoreError::transient("temporary upstream error"));
            }
            Ok(crate::agent::AgentOutcome {
                claims: Vec::new(),
                sources: Vec::new(),
                generation: autoresearch_core::traits::GenerationResult {
                    text: String::new(),
                    tokens_in: 1,
                    tokens_out: 1,
                    latency_ms: 1,
                    model_used: "test".to_string(),
                },
            })
        }
    }

    fn ctx() -> AgentContext<'static> {
        AgentContext {
            query_id: "test-query".to_string(),
            query_text: "q",
            cycle: 0,
            task: None,
            prior_claims: &[],
            model: "test".to_string(),
            params: GenerationParams::default(),
        }
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let agent = FlakyAgent {
            name: "researcher-1".to_string(),
            failures_before_success: 2,
            calls: AtomicU32::new(0),
        };
        let breaker = CircuitBreaker::new("researcher-1", 5, 1);
        let (result, _, _, _) = execute_with_retry(&agent, &breaker, &ctx(), 5, Duration::from_millis(1)).await;
        assert_eq!(result.status, AgentStatus::Retried);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts_and_trips_breaker_counter() {
        let agent = FlakyAgent {
            name: "researcher-1".to_string(),
            failures_before_success: 10,
            calls: AtomicU32::new(0),
        };
        let breaker = CircuitBreaker::new("researcher-1", 1, 1);
        let (result, _, _, _) = execute_with_retry(&agent, &breaker, &ctx(), 2, Duration::from_millis(1)).await;
        assert_eq!(result.status, AgentStatus::Failed);
        assert_eq!(breaker.state(), crate::circuit_breaker::BreakerState::Open);
    }

    #[tokio::test]
    async fn open_breaker_short_circuits_without_invoking_the_agent() {
        let agent = FlakyAgent {
            name: "researcher-1".to_string(),
            failures_before_success: 0,
            calls: AtomicU32::new(0),
        };
        let breaker = CircuitBreaker::new("researcher-1", 1, 100);
        breaker.record_failure(0, "test-query");
        let (result, _, _, _) = execute_with_retry(&agent, &breaker, &ctx(), 3, Duration::from_millis(1)).await;
        assert_eq!(result.status, AgentStatus::Failed);
        assert_eq!(agent.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn non_transient_failure_is_not_retried() {
        struct AlwaysConfigError;
        #[async_trait]
        impl Agent for AlwaysConfigError {
            fn name(&self) -> &str {
                "bad-agent"
            }
            fn role(&self) -> AgentRole {
                AgentRole::Synthesizer
            }
            async fn execute(&self, _ctx: &AgentContext<'_>) -> Result<crate::agent::AgentOutcome> {
                Err(CoreError::config("bad roster entry"))
            }
        }
        let breaker = CircuitBreaker::new("bad-agent", 5, 1);
        let (result, _, _, _) = execute_with_retry(&AlwaysConfigError, &breaker, &ctx(), 5, Duration::from_millis(1)).await;
        assert_eq!(result.status, AgentStatus::Failed);
    }
}
