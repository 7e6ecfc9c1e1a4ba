//! ABOUTME: Hybrid retrieval merger — fans out to live search backends and storage hydration,
//! ABOUTME: blends and quantizes scores, and resolves the result through the retrieval cache (§4.7)

use crate::blend::blend;
use crate::cache::RetrievalCache;
use autoresearch_core::error::Result;
use autoresearch_core::traits::SearchBackend;
use autoresearch_core::types::query::canonicalize;
use autoresearch_core::types::{
    canonicalize_url, sort_documents, CacheKey, Claim, ClaimType, RetrievalDocument,
    RetrievalWeights, ScoreComponents, StorageStage,
};
use autoresearch_storage::StorageCoordinator;
use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Accumulates per-component scores for one document across every stage
/// that surfaced it, so a claim reachable via both BM25 and the vector
/// index contributes one entry, not two (§4.7 step 3: "each doc is tagged
/// with every stage that surfaced it").
struct DocAccumulator {
    title: String,
    snippet: String,
    backend_name: String,
    original_index: usize,
    bm25: f64,
    semantic: f64,
    vector: Option<f64>,
    credibility: f64,
    stages: BTreeSet<StorageStage>,
}

impl DocAccumulator {
    fn new(title: String, snippet: String, backend_name: String, original_index: usize) -> Self {
        Self {
            title,
            snippet,
            backend_name,
            original_index,
            bm25: 0.0,
            semantic: 0.0,
            vector: None,
            credibility: 0.0,
            stages: BTreeSet::new(),
        }
    }
}

/// Fraction of `terms` present in `text`, case-insensitive. The same
/// surrogate BM25 the storage coordinator uses over resident claims
/// (`StorageCoordinator::bm25_search`), applied here to live backend
/// hits so every stage contributes a comparable signal.
fn term_overlap(text: &str, terms: &[String]) -> f64 {
    if terms.is_empty() {
        return 0.0;
    }
    let lower = text.to_lowercase();
    let hits = terms.iter().filter(|t| lower.contains(t.as_str())).count();
    hits as f64 / terms.len() as f64
}

fn claim_title(text: &str) -> String {
    const MAX: usize = 80;
    if text.len() <= MAX {
        text.to_string()
    } else {
        format!("{}…", &text[..MAX])
    }
}

/// Where a persisted claim's canonical URL comes from when it has no
/// recorded source: a synthetic `claim://` URL keyed on its id, so it
/// still sorts and dedupes deterministically.
fn claim_url(claim: &Claim) -> String {
    let raw = claim
        .sources
        .first()
        .cloned()
        .unwrap_or_else(|| format!("claim://{}", claim.claim_id));
    canonicalize_url(&raw)
}

/// Merges a storage-hydrated claim hit into the accumulator map, taking
/// the max of each score component if the claim was already reached by
/// another stage.
fn merge_claim_hit(
    acc: &mut HashMap<String, DocAccumulator>,
    claim: &Claim,
    bm25: f64,
    semantic: f64,
    vector: Option<f64>,
    stage: StorageStage,
    next_index: &mut usize,
) {
    let url = claim_url(claim);
    let entry = acc.entry(url).or_insert_with(|| {
        let index = *next_index;
        *next_index += 1;
        DocAccumulator::new(claim_title(&claim.text), claim.text.clone(), "storage".to_string(), index)
    });
    entry.stages.insert(stage);
    entry.bm25 = entry.bm25.max(bm25);
    entry.semantic = entry.semantic.max(semantic);
    if let Some(v) = vector {
        entry.vector = Some(entry.vector.map_or(v, |existing| existing.max(v)));
    }
    entry.credibility = entry.credibility.max(0.6);
}

/// Fans out to every configured `SearchBackend` plus the storage
/// coordinator's BM25/vector/ontology hydration stages, blends the
/// result through `blend::blend`, and coalesces concurrent lookups for
/// the same `CacheKey` through `RetrievalCache` (§4.7, §5).
pub struct HybridRetrievalMerger {
    storage: Arc<StorageCoordinator>,
    cache: RetrievalCache,
    backends: Vec<Arc<dyn SearchBackend>>,
}

impl HybridRetrievalMerger {
    #[must_use]
    pub fn new(storage: Arc<StorageCoordinator>, backends: Vec<Arc<dyn SearchBackend>>) -> Self {
        Self {
            storage,
            cache: RetrievalCache::new(),
            backends,
        }
    }

    /// Run one hybrid retrieval pass for `query_text`, returning up to
    /// `top_k` documents ordered per `RetrievalDocument::ranking_cmp`,
    /// plus whether this lookup's `CacheKey` (including any whitespace/
    /// case/backend-order alias that canonicalizes to it, §3) was already
    /// resolved before this call (§4.7 step 7, §6.2 `metrics.cache_hit`).
    /// A second caller racing on the same effective query coalesces onto
    /// the first caller's in-flight computation (§5).
    ///
    /// # Errors
    /// Propagates the first storage error encountered while persisting
    /// freshly retrieved live results back to the coordinator.
    pub async fn external_lookup(
        &self,
        query_text: &str,
        weights: &RetrievalWeights,
        top_k: usize,
        embedding: Option<&[f32]>,
        hybrid: bool,
    ) -> Result<(Vec<RetrievalDocument>, bool)> {
        let canonical = canonicalize(query_text);
        let backend_names: Vec<String> = self.backends.iter().map(|b| b.name().to_string()).collect();
        let key = CacheKey::new(&canonical, backend_names, hybrid, embedding.map(|e| e.len() as u32), top_k);
        let cache_hit = self.cache.peek(&key).is_some();
        let slot = self.cache.slot(&key);
        let docs = slot
            .get_or_try_init(|| self.compute(&canonical, weights, top_k, embedding))
            .await?
            .clone();
        Ok((docs, cache_hit))
    }

    async fn compute(
        &self,
        canonical: &str,
        weights: &RetrievalWeights,
        top_k: usize,
        embedding: Option<&[f32]>,
    ) -> Result<Vec<RetrievalDocument>> {
        let terms: Vec<String> = canonical.split_whitespace().map(str::to_string).collect();
        let mut acc: HashMap<String, DocAccumulator> = HashMap::new();
        let mut next_index = 0usize;

        // Step 1: fan out to every live search backend concurrently.
        let live = join_all(self.backends.iter().map(|backend| {
            let backend = Arc::clone(backend);
            let query = canonical.to_string();
            async move { (backend.name().to_string(), backend.search(&query, top_k).await) }
        }))
        .await;

        for (backend_name, result) in live {
            match result {
                Ok(raw_results) => {
                    for raw in raw_results {
                        let url = canonicalize_url(&raw.url);
                        let score = term_overlap(&format!("{} {}", raw.title, raw.snippet), &terms);
                        let entry = acc.entry(url).or_insert_with(|| {
                            let index = next_index;
                            next_index += 1;
                            DocAccumulator::new(raw.title.clone(), raw.snippet.clone(), backend_name.clone(), index)
                        });
                        entry.stages.insert(StorageStage::Live);
                        entry.bm25 = entry.bm25.max(score);
                        entry.semantic = entry.semantic.max(score);
                        entry.credibility = entry.credibility.max(0.5);
                    }
                }
                Err(err) => {
                    tracing::warn!(backend = %backend_name, error = ?err, "search backend failed; continuing in degraded mode");
                }
            }
        }

        // Step 2: BM25 over the resident in-memory graph.
        for (claim_id, score) in self.storage.bm25_search(canonical, top_k) {
            if let Some(claim) = self.storage.get_claim(&claim_id) {
                merge_claim_hit(&mut acc, &claim, score, score, None, StorageStage::Bm25, &mut next_index);
            }
        }

        // Step 3: vector search, only when an embedding was supplied —
        // the vector index is otherwise treated as unavailable (degraded
        // mode, §4.7 "Guarantees").
        if let Some(embedding) = embedding {
            for hit in self.storage.vector_search(embedding, top_k) {
                if let Some(claim) = self.storage.get_claim(&hit.claim_id) {
                    merge_claim_hit(
                        &mut acc,
                        &claim,
                        0.0,
                        hit.similarity,
                        Some(hit.similarity),
                        StorageStage::Vector,
                        &mut next_index,
                    );
                }
            }
        }

        // Step 4: ontology CONTAINS filter over the RDF quad store.
        for claim_id in self.storage.ontology_query(canonical) {
            if let Some(claim) = self.storage.get_claim(&claim_id) {
                merge_claim_hit(&mut acc, &claim, 0.0, 0.0, None, StorageStage::Ontology, &mut next_index);
            }
        }

        // Step 5 + 6: blend, quantize, and sort.
        let mut docs: Vec<RetrievalDocument> = acc
            .into_iter()
            .map(|(url, a)| {
                let blended = blend(weights, a.bm25, a.semantic, a.vector, a.credibility);
                RetrievalDocument {
                    canonical_url: url,
                    title: a.title,
                    snippet: a.snippet,
                    backend_name: a.backend_name,
                    scores: ScoreComponents::quantized(a.bm25, a.semantic, a.credibility, blended),
                    original_index: a.original_index,
                    storage_sources: a.stages,
                }
            })
            .collect();
        sort_documents(&mut docs);
        docs.truncate(top_k);

        // Step 7: persist freshly seen live-only documents as evidence
        // claims so a later query's BM25/vector stages can find them.
        for doc in &docs {
            if doc.storage_sources.contains(&StorageStage::Live) && !doc.storage_sources.contains(&StorageStage::Bm25) {
                let mut claim = Claim::new(doc.snippet.clone(), ClaimType::Evidence, doc.backend_name.clone(), 0);
                claim.sources = vec![doc.canonical_url.clone()];
                self.storage.persist_claim_durable(claim, Vec::new()).await?;
            }
        }

        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use autoresearch_core::traits::RawResult;
    use autoresearch_storage::RamBudgetConfig;
    use std::collections::HashMap as StdHashMap;

    struct StubBackend {
        name: &'static str,
        results: Vec<RawResult>,
    }

    #[async_trait]
    impl SearchBackend for StubBackend {
        fn name(&self) -> &str {
            self.name
        }

        async fn search(&self, _canonical_query: &str, _top_k: usize) -> Result<Vec<RawResult>> {
            Ok(self.results.clone())
        }
    }

    fn result(url: &str, title: &str, snippet: &str) -> RawResult {
        RawResult {
            url: url.to_string(),
            title: title.to_string(),
            snippet: snippet.to_string(),
            meta: StdHashMap::new(),
        }
    }

    fn merger(backends: Vec<Arc<dyn SearchBackend>>) -> HybridRetrievalMerger {
        let storage = Arc::new(StorageCoordinator::new(RamBudgetConfig::default(), true));
        HybridRetrievalMerger::new(storage, backends)
    }

    #[tokio::test]
    async fn returns_live_backend_results_tagged_with_the_live_stage() {
        let backend: Arc<dyn SearchBackend> = Arc::new(StubBackend {
            name: "web",
            results: vec![result("https://Example.com/Paris", "Paris", "Paris is the capital of France")],
        });
        let merger = merger(vec![backend]);
        let weights = RetrievalWeights::default();
        let (docs, cache_hit) = merger
            .external_lookup("capital of france", &weights, 5, None, false)
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].canonical_url, "https://example.com/Paris");
        assert!(docs[0].storage_sources.contains(&StorageStage::Live));
        assert!(!cache_hit);
    }

    #[tokio::test]
    async fn second_lookup_for_the_same_key_is_served_from_cache() {
        let backend: Arc<dyn SearchBackend> = Arc::new(StubBackend {
            name: "web",
            results: vec![result("https://example.com/a", "A", "some snippet about france")],
        });
        let merger = merger(vec![backend]);
        let weights = RetrievalWeights::default();
        let (first, first_hit) = merger.external_lookup("france", &weights, 5, None, false).await.unwrap();
        let (second, second_hit) = merger.external_lookup("  France  ", &weights, 5, None, false).await.unwrap();
        assert_eq!(first.len(), second.len());
        assert_eq!(first[0].canonical_url, second[0].canonical_url);
        assert!(!first_hit);
        assert!(second_hit);
    }

    #[tokio::test]
    async fn a_failing_backend_does_not_abort_the_whole_lookup() {
        struct FailingBackend;
        #[async_trait]
        impl SearchBackend for FailingBackend {
            fn name(&self) -> &str {
                "flaky"
            }

            async fn search(&self, _canonical_query: &str, _top_k: usize) -> Result<Vec<RawResult>> {
                Err(autoresearch_core::error::CoreError::transient("upstream timed out"))
            }
        }
        let ok: Arc<dyn SearchBackend> = Arc::new(StubBackend {
            name: "web",
            results: vec![result("https://example.com/b", "B", "still works")],
        });
        let merger = merger(vec![Arc::new(FailingBackend), ok]);
        let weights = RetrievalWeights::default();
        let (docs, _) = merger.external_lookup("still works", &weights, 5, None, false).await.unwrap();
        assert_eq!(docs.len(), 1);
    }
}
