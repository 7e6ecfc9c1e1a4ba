//! ABOUTME: Score blending formula for the hybrid retrieval merger (§4.7 step 4)

use autoresearch_core::types::RetrievalWeights;

/// `s = w_b·BM25 + w_s·((sem + vec)/2 if vec else sem) + w_c·cred`.
///
/// `vec_score` is `None` when the vector index is unavailable (degraded
/// mode, §4.7 "Guarantees") — the semantic term then falls back to
/// `sem_score` alone.
#[must_use]
pub fn blend(weights: &RetrievalWeights, bm25: f64, sem_score: f64, vec_score: Option<f64>, credibility: f64) -> f64 {
    let semantic_term = vec_score.map_or(sem_score, |v| (sem_score + v) / 2.0);
    weights.bm25 * bm25 + weights.semantic * semantic_term + weights.credibility * credibility
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_without_vector_uses_semantic_alone() {
        let weights = RetrievalWeights {
            bm25: 0.5,
            semantic: 0.5,
            credibility: 0.0,
        };
        assert!((blend(&weights, 1.0, 0.5, None, 0.0) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn blend_with_vector_averages_semantic_and_vector() {
        let weights = RetrievalWeights {
            bm25: 0.0,
            semantic: 1.0,
            credibility: 0.0,
        };
        assert!((blend(&weights, 0.0, 1.0, Some(0.0), 0.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn single_nonzero_weight_fully_determines_score() {
        let weights = RetrievalWeights {
            bm25: 1.0,
            semantic: 0.0,
            credibility: 0.0,
        };
        assert_eq!(blend(&weights, 0.7, 0.9, Some(0.9), 0.9), 0.7);
    }
}
