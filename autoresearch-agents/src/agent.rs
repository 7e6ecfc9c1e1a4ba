//! ABOUTME: `Agent` trait and `RoleAgent` — one `LLMAdapter`-backed implementation for every role

use crate::context::AgentContext;
use crate::role::AgentRole;
use async_trait::async_trait;
use autoresearch_core::error::Result;
use autoresearch_core::traits::{GenerationResult, LLMAdapter};
use autoresearch_core::types::{Claim, Source};
use std::sync::Arc;

/// What one agent invocation produced, before it is folded into
/// `QueryState` by the caller.
pub struct AgentOutcome {
    pub claims: Vec<Claim>,
    pub sources: Vec<Source>,
    pub generation: GenerationResult,
}

/// The capability the orchestrator schedules once per agent per cycle.
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;
    fn role(&self) -> AgentRole;

    /// # Errors
    /// Propagates whatever `LLMAdapter::generate` returns; the caller
    /// (`retry::execute_with_retry`) is responsible for retry and circuit
    /// breaker bookkeeping, not the agent itself.
    async fn execute(&self, ctx: &AgentContext<'_>) -> Result<AgentOutcome>;
}

/// A role-driven agent backed by one `LLMAdapter`. Every concrete role in
/// the roster (§2) is an instance of this type rather than a bespoke
/// struct: the roles differ only in prompt framing and which claim type
/// their output is split into (`AgentRole::primary_claim_type`).
pub struct RoleAgent {
    name: String,
    role: AgentRole,
    llm: Arc<dyn LLMAdapter>,
}

impl RoleAgent {
    #[must_use]
    pub fn new(name: impl Into<String>, role: AgentRole, llm: Arc<dyn LLMAdapter>) -> Self {
        Self {
            name: name.into(),
            role,
            llm,
        }
    }

    fn build_prompt(&self, ctx: &AgentContext<'_>) -> String {
        let mut prompt = String::new();
        prompt.push_str(self.role.system_prompt_preamble());
        prompt.push_str("\n\nQuery: ");
        prompt.push_str(ctx.query_text);
        if let Some(task) = ctx.task {
            prompt.push_str("\nCurrent task: ");
            prompt.push_str(&task.question);
        }
        if !ctx.prior_claims.is_empty() {
            prompt.push_str("\nKnown claims:\n");
            for claim in ctx.prior_claims {
                prompt.push_str("- ");
                prompt.push_str(&claim.text);
                prompt.push('\n');
            }
        }
        prompt
    }
}

#[async_trait]
impl Agent for RoleAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> AgentRole {
        self.role
    }

    async fn execute(&self, ctx: &AgentContext<'_>) -> Result<AgentOutcome> {
        let prompt = self.build_prompt(ctx);
        let generation = self.llm.generate(&prompt, &ctx.model, &ctx.params).await?;
        let claims = match self.role.primary_claim_type() {
            Some(claim_type) => split_into_claims(&generation.text, claim_type, &self.name, ctx.cycle),
            None => Vec::new(),
        };
        Ok(AgentOutcome {
            claims,
            sources: Vec::new(),
            generation,
        })
    }
}

/// Deterministic claim splitter (§4.6 step 1): break generated text on
/// sentence boundaries and blank lines, discard empty segments.
fn split_into_claims(
    text: &str,
    claim_type: autoresearch_core::types::ClaimType,
    agent_name: &str,
    cycle: u64,
) -> Vec<Claim> {
    text.split(['\n', '.'])
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| Claim::new(segment, claim_type, agent_name, cycle))
        .collect()
}
