//! ABOUTME: `StorageCoordinator` — persists claims, enforces RAM budget, answers vector search
//! ABOUTME: Guards every graph mutation with a process-wide re-entrant lock (§4.9, §5)

use crate::columnar::ColumnarStore;
use crate::graph::{EvictionPolicy, GraphNode, InMemoryGraph};
use crate::rdf::{Quad, RdfStore};
use autoresearch_core::error::{CoreError, Result};
use autoresearch_core::traits::{StorageBackend, StorageRow};
use autoresearch_core::types::{Claim, ClaimId};
use autoresearch_telemetry::events::log_budget_exhausted;
use parking_lot::{ReentrantMutex, RwLock};
use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// RAM budget enforcement knobs (§4.9).
#[derive(Debug, Clone, Copy)]
pub struct RamBudgetConfig {
    /// Soft ceiling on resident bytes.
    pub budget_bytes: u64,
    /// Hysteresis fraction: eviction targets `budget * (1 - delta)`, so a
    /// single persist doesn't immediately trigger another eviction.
    pub delta: f64,
    /// Minimum number of resident nodes preserved regardless of budget.
    pub resident_floor: usize,
    pub eviction_policy: EvictionPolicy,
}

impl Default for RamBudgetConfig {
    fn default() -> Self {
        Self {
            budget_bytes: 64 * 1024 * 1024,
            delta: 0.1,
            resident_floor: 2,
            eviction_policy: EvictionPolicy::Lru,
        }
    }
}

/// A vector search hit.
#[derive(Debug, Clone)]
pub struct VectorHit {
    pub claim_id: ClaimId,
    pub similarity: f64,
}

/// Coordinates the in-memory graph, columnar overflow, and RDF quad
/// store behind one re-entrant lock. One instance is shared across a
/// process; independent queries may persist/evict concurrently (§5),
/// each serialized through this lock.
pub struct StorageCoordinator {
    lock: ReentrantMutex<RefCell<InMemoryGraph>>,
    columnar: ColumnarStore,
    rdf: RdfStore,
    budget: RwLock<RamBudgetConfig>,
    vector_index_enabled: AtomicBool,
    initialized: AtomicBool,
    backend: Option<Arc<dyn StorageBackend>>,
}

impl StorageCoordinator {
    #[must_use]
    pub fn new(budget: RamBudgetConfig, vector_index_enabled: bool) -> Self {
        Self {
            lock: ReentrantMutex::new(RefCell::new(InMemoryGraph::new())),
            columnar: ColumnarStore::new(),
            rdf: RdfStore::new(),
            budget: RwLock::new(budget),
            vector_index_enabled: AtomicBool::new(vector_index_enabled),
            initialized: AtomicBool::new(false),
            backend: None,
        }
    }

    /// Same as `new`, additionally durably persisting every claim through
    /// `backend` (§6.1) in parallel with the in-process graph/columnar/RDF
    /// tiers. The external engine is a write-through mirror, not a
    /// replacement: reads (`get_claim`, `vector_search`, `bm25_search`)
    /// still serve from the in-process tiers.
    #[must_use]
    pub fn with_backend(budget: RamBudgetConfig, vector_index_enabled: bool, backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend: Some(backend),
            ..Self::new(budget, vector_index_enabled)
        }
    }

    /// Idempotent schema setup. Running twice is a no-op the second time.
    pub fn initialize(&self) {
        self.initialized.store(true, Ordering::SeqCst);
    }

    /// Same as `persist_claim`, additionally write-through persisting to
    /// the pluggable `StorageBackend` (§6.1) when one is configured. The
    /// in-process tiers are updated first; a backend failure is
    /// propagated without rolling back the in-process write, since the
    /// resident graph/columnar/RDF tiers remain the source of truth for
    /// this process.
    ///
    /// # Errors
    /// Returns whatever `persist_claim` returns, or `CoreError::Storage`
    /// if the configured backend's `persist` call fails.
    pub async fn persist_claim_durable(&self, claim: Claim, quads: Vec<Quad>) -> Result<()> {
        if let Some(backend) = &self.backend {
            let row = StorageRow {
                table: "claims".to_string(),
                key: claim.claim_id.to_string(),
                payload: serde_json::to_value(&claim).map_err(|e| CoreError::Storage {
                    message: format!("failed to serialize claim for durable storage: {e}"),
                })?,
            };
            backend.persist(vec![row]).await?;
        }
        self.persist_claim(claim, quads)
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// `persist_claim(claim)` (§4.9): add to the in-memory graph, write
    /// through to the columnar store and RDF quads, then enforce the RAM
    /// budget. `persist → read → persist` of the same claim is a no-op
    /// after the first: re-persisting an already-resident claim_id only
    /// refreshes its LRU position.
    pub fn persist_claim(&self, claim: Claim, quads: Vec<Quad>) -> Result<()> {
        let guard = self.lock.lock();
        let mut graph = guard.borrow_mut();
        let id = claim.claim_id;
        let score = claim.audit.as_ref().map_or(0.5, |a| a.entailment_score);
        graph.insert(id, GraphNode { claim: claim.clone(), score });
        drop(graph);
        drop(guard);

        self.columnar.insert(claim);
        if !quads.is_empty() {
            self.rdf.add_quads(id, quads);
        }
        self.enforce_ram_budget()
    }

    /// `enforce_ram_budget()` (§4.9): while resident bytes exceed
    /// `budget * (1 - delta)` and the resident floor hasn't been reached,
    /// evict one node per the configured policy, ensuring it is present
    /// in the columnar store before dropping it from the graph.
    ///
    /// # Errors
    /// Returns `CoreError::Fatal` only if the graph reports a candidate
    /// that can no longer be found (an internal invariant violation).
    pub fn enforce_ram_budget(&self) -> Result<()> {
        let budget = *self.budget.read();
        let target = (budget.budget_bytes as f64 * (1.0 - budget.delta)) as u64;

        loop {
            let guard = self.lock.lock();
            let mut graph = guard.borrow_mut();
            if graph.len() <= budget.resident_floor || graph.total_bytes() <= target {
                return Ok(());
            }
            let Some(candidate) = graph.eviction_candidate(budget.eviction_policy) else {
                return Ok(());
            };
            let Some(node) = graph.remove(&candidate) else {
                return Err(CoreError::Fatal {
                    message: "eviction candidate vanished from graph".to_string(),
                });
            };
            drop(graph);
            drop(guard);

            if !self.columnar.contains(&candidate) {
                self.columnar.insert(node.claim);
            }
            log_budget_exhausted("storage", "ram budget exceeded; evicted one resident node");
        }
    }

    /// `vector_search(embedding, k)` (§4.9): nearest-k by cosine
    /// similarity over resident and overflowed claims with an embedding.
    /// Returns an empty result if the vector index is disabled.
    #[must_use]
    pub fn vector_search(&self, embedding: &[f32], k: usize) -> Vec<VectorHit> {
        if !self.vector_index_enabled.load(Ordering::SeqCst) {
            return Vec::new();
        }
        let guard = self.lock.lock();
        let graph = guard.borrow();
        let mut hits: Vec<VectorHit> = graph
            .iter()
            .filter_map(|(id, node)| {
                node.claim
                    .embedding
                    .as_ref()
                    .map(|e| VectorHit {
                        claim_id: *id,
                        similarity: cosine_similarity(embedding, e),
                    })
            })
            .collect();
        drop(graph);
        drop(guard);
        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.claim_id.to_string().cmp(&b.claim_id.to_string()))
        });
        hits.truncate(k);
        hits
    }

    /// BM25-ish term-overlap score over resident and overflowed claim
    /// text, feeding the hybrid merger's in-memory-graph BM25 stage
    /// (§4.7 step 3). Score is the fraction of query terms present in
    /// the claim text, case-insensitive.
    #[must_use]
    pub fn bm25_search(&self, text: &str, k: usize) -> Vec<(ClaimId, f64)> {
        let terms: Vec<String> = text
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        if terms.is_empty() {
            return Vec::new();
        }
        let guard = self.lock.lock();
        let graph = guard.borrow();
        let mut scored: Vec<(ClaimId, f64)> = graph
            .iter()
            .map(|(id, node)| (*id, term_overlap_score(&node.claim.text, &terms)))
            .filter(|(_, score)| *score > 0.0)
            .collect();
        drop(graph);
        drop(guard);
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.to_string().cmp(&b.0.to_string()))
        });
        scored.truncate(k);
        scored
    }

    /// `update_claim(claim_id, patch)` (§4.9): never mutates in place.
    /// Looks up the current claim (graph first, then columnar overflow)
    /// and persists a new superseding claim.
    ///
    /// # Errors
    /// Returns `CoreError::Storage` if `claim_id` cannot be found in
    /// either the graph or the columnar store.
    pub fn update_claim(&self, claim_id: ClaimId, patch_text: impl Into<String>, cycle: u64) -> Result<Claim> {
        let current = self.get_claim(&claim_id).ok_or_else(|| CoreError::Storage {
            message: format!("claim {claim_id} not found for update"),
        })?;
        let next = current.superseded_by(patch_text, cycle);
        self.persist_claim(next.clone(), Vec::new())?;
        Ok(next)
    }

    /// Look up a claim by id, checking the resident graph before falling
    /// back to the columnar overflow store.
    #[must_use]
    pub fn get_claim(&self, id: &ClaimId) -> Option<Claim> {
        let resident = {
            let guard = self.lock.lock();
            let graph = guard.borrow();
            graph.get(id).map(|n| n.claim.clone())
        };
        resident.or_else(|| self.columnar.get(id))
    }

    #[must_use]
    pub fn resident_count(&self) -> usize {
        let guard = self.lock.lock();
        guard.borrow().len()
    }

    #[must_use]
    pub fn overflow_count(&self) -> usize {
        self.columnar.len()
    }

    #[must_use]
    pub fn ontology_query(&self, text: &str) -> Vec<ClaimId> {
        self.rdf.contains_query(text)
    }
}

fn term_overlap_score(claim_text: &str, query_terms: &[String]) -> f64 {
    let lower = claim_text.to_lowercase();
    let hits = query_terms.iter().filter(|t| lower.contains(t.as_str())).count();
    hits as f64 / query_terms.len() as f64
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        f64::from(dot / (norm_a * norm_b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoresearch_core::types::ClaimType;

    fn claim(text: &str) -> Claim {
        Claim::new(text, ClaimType::Fact, "agent", 0)
    }

    #[test]
    fn initialize_is_idempotent() {
        let coordinator = StorageCoordinator::new(RamBudgetConfig::default(), false);
        coordinator.initialize();
        coordinator.initialize();
        assert!(coordinator.is_initialized());
    }

    #[test]
    fn persist_under_budget_does_not_evict() {
        let coordinator = StorageCoordinator::new(RamBudgetConfig::default(), false);
        coordinator.persist_claim(claim("a"), Vec::new()).unwrap();
        coordinator.persist_claim(claim("b"), Vec::new()).unwrap();
        assert_eq!(coordinator.resident_count(), 2);
        assert_eq!(coordinator.overflow_count(), 0);
    }

    #[test]
    fn resident_floor_is_respected_even_with_tiny_budget() {
        let config = RamBudgetConfig {
            budget_bytes: 0,
            delta: 0.0,
            resident_floor: 2,
            eviction_policy: EvictionPolicy::Lru,
        };
        let coordinator = StorageCoordinator::new(config, false);
        for i in 0..5 {
            coordinator.persist_claim(claim(&format!("claim {i}")), Vec::new()).unwrap();
        }
        assert_eq!(coordinator.resident_count(), 2);
    }

    #[test]
    fn update_claim_creates_superseding_claim_and_keeps_original_in_columnar() {
        let coordinator = StorageCoordinator::new(RamBudgetConfig::default(), false);
        let original = claim("Paris is the capital");
        let original_id = original.claim_id;
        coordinator.persist_claim(original, Vec::new()).unwrap();
        let updated = coordinator
            .update_claim(original_id, "Paris is the capital of France", 1)
            .unwrap();
        assert_eq!(updated.supersedes, Some(original_id));
        assert!(coordinator.columnar.contains(&original_id));
    }

    #[test]
    fn vector_search_empty_when_disabled() {
        let coordinator = StorageCoordinator::new(RamBudgetConfig::default(), false);
        let mut c = claim("a");
        c.embedding = Some(vec![1.0, 0.0]);
        coordinator.persist_claim(c, Vec::new()).unwrap();
        assert!(coordinator.vector_search(&[1.0, 0.0], 5).is_empty());
    }

    #[test]
    fn vector_search_ranks_by_cosine_similarity() {
        let coordinator = StorageCoordinator::new(RamBudgetConfig::default(), true);
        let mut a = claim("a");
        a.embedding = Some(vec![1.0, 0.0]);
        let mut b = claim("b");
        b.embedding = Some(vec![0.0, 1.0]);
        coordinator.persist_claim(a, Vec::new()).unwrap();
        coordinator.persist_claim(b, Vec::new()).unwrap();
        let hits = coordinator.vector_search(&[1.0, 0.0], 2);
        assert_eq!(hits[0].similarity, 1.0);
    }
}
