//! ABOUTME: `AuditRecord` — the per-claim entailment verdict produced by the claim auditor

use super::ids::ClaimId;
use serde::{Deserialize, Serialize};

/// Per-claim verification status (§3, §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Supported,
    NeedsReview,
    Unsupported,
}

/// A reference to a `Claim`'s top supporting source, kept lightweight so
/// `AuditRecord` doesn't need to own the full `Source`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    pub canonical_url: String,
    pub entailment_contribution: f64,
}

/// The result of auditing one claim against retrieved evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub claim_id: ClaimId,
    pub status: AuditStatus,
    pub entailment_score: f64,
    pub stability_score: f64,
    pub sources: Vec<SourceRef>,
    pub retry_count: u32,
    pub notes: Vec<String>,
}

impl AuditRecord {
    /// Classify an entailment score against the configured thresholds
    /// (§4.6 step 3). `t_s` is the supported floor, `t_u` the unsupported
    /// ceiling; everything strictly between is `NeedsReview`.
    #[must_use]
    pub fn classify(entailment_score: f64, t_s: f64, t_u: f64) -> AuditStatus {
        if entailment_score >= t_s {
            AuditStatus::Supported
        } else if entailment_score <= t_u {
            AuditStatus::Unsupported
        } else {
            AuditStatus::NeedsReview
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_boundaries() {
        assert_eq!(AuditRecord::classify(0.75, 0.75, 0.3), AuditStatus::Supported);
        assert_eq!(AuditRecord::classify(0.3, 0.75, 0.3), AuditStatus::Unsupported);
        assert_eq!(AuditRecord::classify(0.5, 0.75, 0.3), AuditStatus::NeedsReview);
    }
}
