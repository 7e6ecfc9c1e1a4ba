//! ABOUTME: In-memory claim graph with LRU/score-based eviction under a RAM budget
//! ABOUTME: Grounds the resident working set the storage coordinator enforces a budget over

use autoresearch_core::types::{Claim, ClaimId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// One resident node: a claim plus the bookkeeping eviction needs.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub claim: Claim,
    pub score: f64,
}

impl GraphNode {
    /// A deterministic, storage-model-agnostic estimate of a node's RAM
    /// footprint: text bytes, embedding bytes (4 bytes/float), plus a
    /// fixed per-node overhead for the claim_id/metadata/edges.
    #[must_use]
    pub fn estimated_bytes(&self) -> u64 {
        const OVERHEAD: u64 = 256;
        let text_bytes = self.claim.text.len() as u64;
        let embedding_bytes = self
            .claim
            .embedding
            .as_ref()
            .map_or(0, |e| (e.len() * 4) as u64);
        OVERHEAD + text_bytes + embedding_bytes
    }
}

/// Which node to evict when the RAM budget is exceeded (§4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Evict the least-recently-used node.
    Lru,
    /// Evict the lowest-scoring node; ties broken by ascending claim id
    /// string for determinism.
    Score,
}

/// The resident in-memory graph. Not thread-safe on its own — the
/// `StorageCoordinator` guards every mutation with its process-wide
/// re-entrant lock (§4.9, §5).
#[derive(Debug, Default)]
pub struct InMemoryGraph {
    nodes: HashMap<ClaimId, GraphNode>,
    access_order: VecDeque<ClaimId>,
}

impl InMemoryGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &ClaimId) -> bool {
        self.nodes.contains_key(id)
    }

    #[must_use]
    pub fn get(&self, id: &ClaimId) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// Insert or update a node, touching its LRU position.
    pub fn insert(&mut self, id: ClaimId, node: GraphNode) {
        if self.nodes.insert(id, node).is_none() {
            self.access_order.push_back(id);
        } else {
            self.touch(id);
        }
    }

    /// Mark a node as freshly accessed, moving it to the back of the
    /// eviction queue.
    pub fn touch(&mut self, id: ClaimId) {
        if let Some(pos) = self.access_order.iter().position(|x| *x == id) {
            self.access_order.remove(pos);
            self.access_order.push_back(id);
        }
    }

    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.nodes.values().map(GraphNode::estimated_bytes).sum()
    }

    /// Choose the eviction candidate under the given policy, without
    /// removing it. Returns `None` if the graph is empty.
    #[must_use]
    pub fn eviction_candidate(&self, policy: EvictionPolicy) -> Option<ClaimId> {
        match policy {
            EvictionPolicy::Lru => self.access_order.front().copied(),
            EvictionPolicy::Score => self
                .nodes
                .iter()
                .min_by(|(id_a, a), (id_b, b)| {
                    a.score
                        .partial_cmp(&b.score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| id_a.to_string().cmp(&id_b.to_string()))
                })
                .map(|(id, _)| *id),
        }
    }

    /// Remove a node entirely, returning it if present.
    pub fn remove(&mut self, id: &ClaimId) -> Option<GraphNode> {
        self.access_order.retain(|x| x != id);
        self.nodes.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ClaimId, &GraphNode)> {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoresearch_core::types::ClaimType;

    fn node(text: &str, score: f64) -> (ClaimId, GraphNode) {
        let claim = Claim::new(text, ClaimType::Fact, "agent", 0);
        (claim.claim_id, GraphNode { claim, score })
    }

    #[test]
    fn lru_candidate_is_oldest_inserted() {
        let mut g = InMemoryGraph::new();
        let (id_a, node_a) = node("a", 1.0);
        let (id_b, node_b) = node("b", 1.0);
        g.insert(id_a, node_a);
        g.insert(id_b, node_b);
        assert_eq!(g.eviction_candidate(EvictionPolicy::Lru), Some(id_a));
        g.touch(id_a);
        assert_eq!(g.eviction_candidate(EvictionPolicy::Lru), Some(id_b));
    }

    #[test]
    fn score_candidate_is_lowest_scoring() {
        let mut g = InMemoryGraph::new();
        let (id_a, node_a) = node("a", 0.9);
        let (id_b, node_b) = node("b", 0.1);
        g.insert(id_a, node_a);
        g.insert(id_b, node_b);
        assert_eq!(g.eviction_candidate(EvictionPolicy::Score), Some(id_b));
    }
}
