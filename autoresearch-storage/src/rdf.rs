//! ABOUTME: RDF quad store for the ontology stage of the hybrid retrieval merger

use autoresearch_core::types::ClaimId;
use dashmap::DashMap;

/// A minimal subject-predicate-object-graph quad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quad {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

/// Simplified RDF store: quads keyed by the claim they were derived from.
/// A concrete triple store is an external collaborator (§1); this models
/// the write target and the CONTAINS-style substring query the merger's
/// ontology stage uses.
#[derive(Debug, Default)]
pub struct RdfStore {
    quads: DashMap<ClaimId, Vec<Quad>>,
}

impl RdfStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_quads(&self, claim_id: ClaimId, quads: Vec<Quad>) {
        self.quads.entry(claim_id).or_default().extend(quads);
    }

    /// `CONTAINS`-style filter: every claim whose quads mention `text` as
    /// a substring of subject or object.
    #[must_use]
    pub fn contains_query(&self, text: &str) -> Vec<ClaimId> {
        let needle = text.to_lowercase();
        self.quads
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .iter()
                    .any(|q| q.subject.to_lowercase().contains(&needle) || q.object.to_lowercase().contains(&needle))
            })
            .map(|entry| *entry.key())
            .collect()
    }
}
