//! ABOUTME: `AgentRole` — the dialectical roles a `RoleAgent` can be instantiated as (§2)

use autoresearch_core::types::ClaimType;
use serde::{Deserialize, Serialize};

/// The roster of agent roles the orchestrator may schedule. Concrete
/// behavior differs only in system-prompt framing and which claim types
/// it is expected to produce; all roles share one `Agent` implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Produces the thesis/synthesis claim from accumulated evidence.
    Synthesizer,
    /// Argues the antithesis: surfaces counter-evidence and weaknesses.
    Contrarian,
    /// Verifies specific factual claims against retrieved sources.
    FactChecker,
    /// Issues retrieval queries and turns results into evidence claims.
    Researcher,
    /// Critiques the current synthesis for gaps and unsupported leaps.
    Critic,
    /// Condenses accumulated claims into a shorter brief.
    Summarizer,
    /// Produces and repairs the task graph (§4.4).
    Planner,
    /// Arbitrates between conflicting claims from other roles.
    Moderator,
    /// A narrow-domain specialist selected by the planner's tool affinity.
    DomainSpecialist,
    /// Represents injected user clarifications/preferences mid-query.
    UserAgent,
}

impl AgentRole {
    /// Stable name used for circuit breaker keys, metrics, and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Synthesizer => "synthesizer",
            Self::Contrarian => "contrarian",
            Self::FactChecker => "fact_checker",
            Self::Researcher => "researcher",
            Self::Critic => "critic",
            Self::Summarizer => "summarizer",
            Self::Planner => "planner",
            Self::Moderator => "moderator",
            Self::DomainSpecialist => "domain_specialist",
            Self::UserAgent => "user_agent",
        }
    }

    /// System-prompt framing for this role. Concrete wording is a
    /// starting point for callers to extend with query-specific context;
    /// it is not itself part of the externally observable contract.
    #[must_use]
    pub const fn system_prompt_preamble(self) -> &'static str {
        match self {
            Self::Synthesizer => {
                "You synthesize a candidate answer from the accumulated claims and sources. \
                 State only what the evidence supports."
            }
            Self::Contrarian => {
                "You argue the antithesis. Find counter-evidence and weaknesses in the current \
                 synthesis."
            }
            Self::FactChecker => {
                "You verify specific factual claims against retrieved sources. Be precise about \
                 what is and isn't supported."
            }
            Self::Researcher => {
                "You issue retrieval queries to fill gaps in the evidence and turn results into \
                 evidence claims."
            }
            Self::Critic => "You critique the current synthesis for gaps, contradictions, and unsupported leaps.",
            Self::Summarizer => "You condense the accumulated claims into a shorter brief without losing support.",
            Self::Planner => "You decompose the query into a task graph of sub-questions with exit criteria.",
            Self::Moderator => "You arbitrate between conflicting claims from other agents and pick a resolution.",
            Self::DomainSpecialist => "You answer from narrow domain expertise relevant to the current task.",
            Self::UserAgent => "You represent clarifications or preferences the user injected mid-query.",
        }
    }

    /// Parse a roster entry (`ConfigSnapshot::agent_roster`) back into its
    /// role. Roster entries are validated at config load time by the
    /// orchestrating shell, not here, so an unknown name yields `None`
    /// rather than an error.
    #[must_use]
    pub fn from_str(name: &str) -> Option<Self> {
        match name {
            "synthesizer" => Some(Self::Synthesizer),
            "contrarian" => Some(Self::Contrarian),
            "fact_checker" => Some(Self::FactChecker),
            "researcher" => Some(Self::Researcher),
            "critic" => Some(Self::Critic),
            "summarizer" => Some(Self::Summarizer),
            "planner" => Some(Self::Planner),
            "moderator" => Some(Self::Moderator),
            "domain_specialist" => Some(Self::DomainSpecialist),
            "user_agent" => Some(Self::UserAgent),
            _ => None,
        }
    }

    /// The claim type a generation from this role is split into. `None`
    /// for `Planner`, which produces a `TaskGraph` rather than claims.
    #[must_use]
    pub const fn primary_claim_type(self) -> Option<ClaimType> {
        match self {
            Self::Synthesizer | Self::Summarizer | Self::Moderator => Some(ClaimType::Synthesis),
            Self::Contrarian | Self::Critic => Some(ClaimType::Antithesis),
            Self::FactChecker | Self::UserAgent => Some(ClaimType::Fact),
            Self::Researcher | Self::DomainSpecialist => Some(ClaimType::Evidence),
            Self::Planner => None,
        }
    }
}
