//! ABOUTME: `Claim` entity — immutable once persisted; edits create a superseding claim

use super::audit::AuditRecord;
use super::ids::ClaimId;
use serde::{Deserialize, Serialize};

/// The dialectical role of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    Thesis,
    Antithesis,
    Synthesis,
    Evidence,
    Fact,
}

/// A unit of reasoning output. Immutable once persisted: `update_claim`
/// (§4.9) never mutates a `Claim` in place, it creates a new one linked
/// via `supersedes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub claim_id: ClaimId,
    pub text: String,
    pub claim_type: ClaimType,
    pub created_by_agent: String,
    pub cycle_created: u64,
    pub sources: Vec<String>,
    pub embedding: Option<Vec<f32>>,
    pub audit: Option<AuditRecord>,
    pub supersedes: Option<ClaimId>,
}

impl Claim {
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        claim_type: ClaimType,
        created_by_agent: impl Into<String>,
        cycle_created: u64,
    ) -> Self {
        Self {
            claim_id: ClaimId::new(),
            text: text.into(),
            claim_type,
            created_by_agent: created_by_agent.into(),
            cycle_created,
            sources: Vec::new(),
            embedding: None,
            audit: None,
            supersedes: None,
        }
    }

    /// Key used for deduplication on insert into `QueryState`: normalized
    /// text plus claim type, per §4.6 `QueryState.update`.
    #[must_use]
    pub fn dedup_key(&self) -> (String, ClaimType) {
        (super::query::canonicalize(&self.text), self.claim_type)
    }

    /// Produce a new `Claim` that supersedes this one, carrying the patch
    /// text forward. The original `claim_id` is never reused.
    #[must_use]
    pub fn superseded_by(&self, new_text: impl Into<String>, cycle: u64) -> Self {
        let mut next = Self::new(new_text, self.claim_type, self.created_by_agent.clone(), cycle);
        next.sources = self.sources.clone();
        next.supersedes = Some(self.claim_id);
        next
    }
}
