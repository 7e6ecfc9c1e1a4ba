//! ABOUTME: `AgentContext` — read-only view of query state handed to one agent invocation

use autoresearch_core::traits::GenerationParams;
use autoresearch_core::types::{Claim, TaskNode};

/// Everything one `Agent::execute` call needs, borrowed from the
/// orchestrator's `QueryState` for the duration of the call. Agents never
/// mutate `QueryState` directly (§9): they return claims/sources and let
/// the caller fold them in via `QueryState::update`.
pub struct AgentContext<'a> {
    pub query_id: String,
    pub query_text: &'a str,
    pub cycle: u64,
    pub task: Option<&'a TaskNode>,
    pub prior_claims: &'a [Claim],
    pub model: String,
    pub params: GenerationParams,
}
