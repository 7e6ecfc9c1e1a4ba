//! ABOUTME: Columnar overflow store — durable home for claims evicted from the resident graph

use autoresearch_core::types::{Claim, ClaimId};
use dashmap::DashMap;

/// A nodes/edges/embeddings-shaped table, simplified to a keyed claim
/// store. Concrete embedded-columnar engines are external collaborators
/// (§1); this models the write-through target the coordinator persists
/// to regardless of RAM pressure.
#[derive(Debug, Default)]
pub struct ColumnarStore {
    rows: DashMap<ClaimId, Claim>,
}

impl ColumnarStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, claim: Claim) {
        self.rows.insert(claim.claim_id, claim);
    }

    #[must_use]
    pub fn contains(&self, id: &ClaimId) -> bool {
        self.rows.contains_key(id)
    }

    #[must_use]
    pub fn get(&self, id: &ClaimId) -> Option<Claim> {
        self.rows.get(id).map(|r| r.value().clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
