//! ABOUTME: Claim auditor (§4.6) — per-claim entailment verification, hedging, and warning synthesis

use autoresearch_core::error::Result;
use autoresearch_core::traits::LLMAdapter;
use autoresearch_core::types::{
    AuditPolicy, AuditRecord, AuditStatus, Claim, RetrievalWeights, SourceRef, Warning,
};
use autoresearch_retrieval::HybridRetrievalMerger;

/// Audits one claim against retrieved evidence, retrying with a fresh
/// retrieval round when the entailment score lands in `NeedsReview` and
/// rounds remain (§4.6 steps 2-3).
pub struct ClaimAuditor<'a> {
    llm: &'a dyn LLMAdapter,
    merger: &'a HybridRetrievalMerger,
    policy: &'a AuditPolicy,
}

impl<'a> ClaimAuditor<'a> {
    #[must_use]
    pub fn new(llm: &'a dyn LLMAdapter, merger: &'a HybridRetrievalMerger, policy: &'a AuditPolicy) -> Self {
        Self { llm, merger, policy }
    }

    /// Audit `claim`, escalating through up to `policy.max_rounds` retrieval
    /// rounds while the verdict remains `Unsupported`. Returns the verdict
    /// plus whether any retrieval round in this audit was served from
    /// cache (§6.2 `metrics.cache_hit`).
    ///
    /// # Errors
    /// Propagates retrieval errors from the hybrid merger and generation
    /// errors from the entailment call.
    pub async fn audit(&self, claim: &Claim) -> Result<(AuditRecord, bool)> {
        let weights = RetrievalWeights::default();
        let mut retry_count = 0u32;
        let mut cache_hit = false;
        loop {
            let (retrieved, round_hit) = self
                .merger
                .external_lookup(&claim.text, &weights, self.policy.max_retry_results, None, false)
                .await?;
            cache_hit |= round_hit;
            let evidence_text = retrieved
                .iter()
                .map(|d| d.snippet.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            let score = self.llm.entailment(&claim.text, &evidence_text).await?;
            let status = AuditRecord::classify(score, self.policy.supported_threshold, self.policy.unsupported_threshold);

            if status != AuditStatus::Unsupported || retry_count >= self.policy.max_rounds {
                let sources = retrieved
                    .into_iter()
                    .take(3)
                    .map(|d| SourceRef {
                        canonical_url: d.canonical_url,
                        entailment_contribution: score,
                    })
                    .collect();
                return Ok((
                    AuditRecord {
                        claim_id: claim.claim_id,
                        status,
                        entailment_score: score,
                        stability_score: score,
                        sources,
                        retry_count,
                        notes: Vec::new(),
                    },
                    cache_hit,
                ));
            }
            retry_count += 1;
        }
    }
}

/// Apply the configured hedge strategy to `answer` for every unsupported
/// claim in `audits`, returning the (possibly modified) answer plus a
/// side-channel warning list. Supported sentences are left byte-identical
/// (§4.6 step 4); `answer` must never gain any `WARNING_PREFIXES`
/// substring, so hedges read as plain qualifiers rather than banners.
#[must_use]
pub fn apply_hedging(
    answer: &str,
    claims: &[Claim],
    audits: &[AuditRecord],
    mode: autoresearch_core::types::HedgeMode,
) -> (String, Vec<Warning>) {
    use autoresearch_core::types::HedgeMode;

    let mut warnings = Vec::new();
    let mut hedged = answer.to_string();

    for audit in audits {
        if audit.status != AuditStatus::Unsupported {
            continue;
        }
        let Some(claim) = claims.iter().find(|c| c.claim_id == audit.claim_id) else {
            continue;
        };
        warnings.push(Warning {
            code: "unsupported_claim".to_string(),
            message: format!("claim not supported by evidence: {}", claim.text),
            claim_id: Some(claim.claim_id),
        });

        match mode {
            HedgeMode::Prefix => {
                if let Some(pos) = hedged.find(claim.text.as_str()) {
                    let annotated = format!("possibly, {}", claim.text);
                    hedged.replace_range(pos..pos + claim.text.len(), &annotated);
                }
            }
            HedgeMode::Inline => {
                if let Some(pos) = hedged.find(claim.text.as_str()) {
                    let annotated = format!("{} (unverified)", claim.text);
                    hedged.replace_range(pos..pos + claim.text.len(), &annotated);
                }
            }
            HedgeMode::None => {}
        }
    }

    (hedged, warnings)
}
