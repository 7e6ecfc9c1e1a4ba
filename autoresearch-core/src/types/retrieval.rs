//! ABOUTME: `RetrievalDocument` and `CacheKey` — the hybrid merger's unit of output and cache identity

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::source::StorageStage;

/// Per-component and blended scores for one retrieved document, quantized
/// to a 10⁻⁶ grid (§4.7 step 5) so ordering is deterministic
/// across platforms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub bm25: f64,
    pub semantic: f64,
    pub credibility: f64,
    pub blended: f64,
}

const QUANTUM: f64 = 1e-6;

/// Quantize a score to the documented 10⁻⁶ grid.
#[must_use]
pub fn quantize(score: f64) -> f64 {
    (score / QUANTUM).round() * QUANTUM
}

impl ScoreComponents {
    #[must_use]
    pub fn quantized(bm25: f64, semantic: f64, credibility: f64, blended: f64) -> Self {
        Self {
            bm25: quantize(bm25),
            semantic: quantize(semantic),
            credibility: quantize(credibility),
            blended: quantize(blended),
        }
    }
}

/// A ranked retrieval result exposed to the scheduler by the hybrid
/// merger (§3, §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalDocument {
    pub canonical_url: String,
    pub title: String,
    pub snippet: String,
    pub backend_name: String,
    pub scores: ScoreComponents,
    pub original_index: usize,
    pub storage_sources: BTreeSet<StorageStage>,
}

impl RetrievalDocument {
    /// The documented tie-break key (§4.7 step 6): ascending
    /// `(backend_name, canonical_url, title, original_index)`.
    #[must_use]
    fn tie_break_key(&self) -> (&str, &str, &str, usize) {
        (&self.backend_name, &self.canonical_url, &self.title, self.original_index)
    }

    /// Total ordering used to sort a batch of documents: descending
    /// blended score, then the documented ascending tie-break key.
    #[must_use]
    pub fn ranking_cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .scores
            .blended
            .partial_cmp(&self.scores.blended)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| self.tie_break_key().cmp(&other.tie_break_key()))
    }
}

/// Sort a batch of documents per the documented ranking rule, in place.
pub fn sort_documents(docs: &mut [RetrievalDocument]) {
    docs.sort_by(RetrievalDocument::ranking_cmp);
}
