//! ABOUTME: `StorageBackend` — the narrow capability the storage coordinator persists through

use crate::error::Result;
use async_trait::async_trait;

/// One row to persist: an opaque table name plus a JSON payload. The
/// storage coordinator (outside this crate's scope — see
/// `autoresearch-storage`) decides how rows map onto columnar tables,
/// graph nodes/edges, or RDF quads.
#[derive(Debug, Clone)]
pub struct StorageRow {
    pub table: String,
    pub key: String,
    pub payload: serde_json::Value,
}

/// Whether a backend supports a given optional capability (e.g. vector
/// search), so callers can degrade gracefully instead of erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityFlags {
    pub vector_search: bool,
    pub ontology_query: bool,
}

/// A persistent storage engine (embedded columnar store, RDF store,
/// vector index, ...). Concrete engines are external collaborators, out
/// of scope for this crate (§6.1).
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Idempotent schema setup. Running twice yields the same schema.
    ///
    /// # Errors
    /// Returns `CoreError::Storage` on unrecoverable setup failure.
    async fn initialize(&self) -> Result<()>;

    /// Persist a batch of rows.
    ///
    /// # Errors
    /// Returns `CoreError::Storage`; the storage coordinator retries
    /// writes once before surfacing this.
    async fn persist(&self, rows: Vec<StorageRow>) -> Result<()>;

    /// BM25 full-text query over persisted rows.
    ///
    /// # Errors
    /// Returns `CoreError::Storage`; reads degrade to an empty result
    /// instead of propagating when the caller prefers availability.
    async fn query_bm25(&self, text: &str, k: usize) -> Result<Vec<StorageRow>>;

    /// Nearest-neighbor vector search, or an empty result plus
    /// `capability_flags().vector_search == false` if unsupported.
    ///
    /// # Errors
    /// Returns `CoreError::Storage` on backend failure.
    async fn vector_search(&self, embedding: &[f32], k: usize) -> Result<Vec<StorageRow>>;

    /// Optional ontology/RDF CONTAINS-style query.
    ///
    /// # Errors
    /// Returns `CoreError::Storage` on backend failure.
    async fn ontology_query(&self, text: &str) -> Result<Vec<StorageRow>>;

    /// Tear down the backend, releasing any held resources.
    ///
    /// # Errors
    /// Returns `CoreError::Storage` on failure.
    async fn teardown(&self) -> Result<()>;

    /// Which optional capabilities this backend actually supports.
    fn capability_flags(&self) -> CapabilityFlags;
}
