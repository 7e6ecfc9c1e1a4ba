//! ABOUTME: Scout pass (§4.2) — one cheap draft pass whose signals feed the gate policy

use autoresearch_core::error::Result;
use autoresearch_core::traits::{GenerationParams, LLMAdapter};
use autoresearch_core::types::{GateSignals, RetrievalWeights, ScoutResult};
use autoresearch_retrieval::HybridRetrievalMerger;

/// Run the scout pass: a single cheap retrieval + generation round whose
/// output the gate policy (`autoresearch_core::types::GateDecision`)
/// consumes to decide whether the query needs the full debate loop.
///
/// # Errors
/// Propagates retrieval errors from the hybrid merger and generation
/// errors from `llm`.
pub async fn run_scout_pass(
    llm: &dyn LLMAdapter,
    merger: &HybridRetrievalMerger,
    query_text: &str,
    weights: &RetrievalWeights,
    model: &str,
    top_k: usize,
) -> Result<ScoutResult> {
    let (docs, cache_hit) = merger.external_lookup(query_text, weights, top_k, None, false).await?;

    let evidence = docs
        .iter()
        .map(|d| format!("- {}", d.snippet))
        .collect::<Vec<_>>()
        .join("\n");
    let prompt = format!("Produce a brief draft answer to: {query_text}\n\nTop evidence:\n{evidence}");
    let generation = llm.generate(&prompt, model, &GenerationParams::default()).await?;

    let strong_hits = docs.iter().filter(|d| d.scores.blended >= 0.5).count();
    let retrieval_overlap = if docs.is_empty() {
        0.0
    } else {
        strong_hits as f64 / docs.len() as f64
    };
    // No contrarian pass has run yet during the scout, so there is no
    // second opinion to conflict with.
    let claim_conflict = 0.0;
    let multi_hop_required = query_text.split_whitespace().count() > 12;
    let graph_contradiction = false;

    Ok(ScoutResult {
        draft_answer: generation.text,
        retrieval_bundle: docs,
        cache_hit,
        signals: GateSignals {
            retrieval_overlap,
            claim_conflict,
            multi_hop_required,
            graph_contradiction,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use autoresearch_core::traits::{GenerationResult, RawResult, SearchBackend};
    use autoresearch_storage::{RamBudgetConfig, StorageCoordinator};
    use std::collections::HashMap;
    use std::sync::Arc;

    struct StubLlm;

    #[async_trait]
    impl LLMAdapter for StubLlm {
        async fn generate(&self, _prompt: &str, model: &str, _params: &GenerationParams) -> Result<GenerationResult> {
            Ok(GenerationResult {
                text: "draft answer".to_string(),
                tokens_in: 10,
                tokens_out: 5,
                latency_ms: 5,
                model_used: model.to_string(),
            })
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0])
        }

        async fn entailment(&self, _claim: &str, _evidence: &str) -> Result<f64> {
            Ok(1.0)
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
                url: "https://example.com/a".to_string(),
                title: "A".to_string(),
                snippet: "capital of france is paris".to_string(),
                meta: HashMap::new(),
            }])
        }
    }

    #[tokio::test]
    async fn scout_pass_produces_a_draft_and_signals() {
        let storage = Arc::new(StorageCoordinator::new(RamBudgetConfig::default(), false));
        let backend: Arc<dyn SearchBackend> = Arc::new(StubBackend);
        let merger = HybridRetrievalMerger::new(storage, vec![backend]);
        let result = run_scout_pass(&StubLlm, &merger, "capital of france", &RetrievalWeights::default(), "test-model", 5)
            .await
            .unwrap();
        assert_eq!(result.draft_answer, "draft answer");
        assert!(!result.retrieval_bundle.is_empty());
        assert!(!result.signals.multi_hop_required);
    }

    #[tokio::test]
    async fn long_queries_are_flagged_multi_hop() {
        let storage = Arc::new(StorageCoordinator::new(RamBudgetConfig::default(), false));
        let merger = HybridRetrievalMerger::new(storage, Vec::new());
        let query = "word ".repeat(13);
        let result = run_scout_pass(&StubLlm, &merger, query.trim(), &RetrievalWeights::default(), "test-model", 5)
            .await
            .unwrap();
        assert!(result.signals.multi_hop_required);
    }
}
