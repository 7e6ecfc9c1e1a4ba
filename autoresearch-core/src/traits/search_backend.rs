//! ABOUTME: `SearchBackend` — the narrow capability the hybrid merger fans out to

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// One raw hit from a search backend, before canonicalization or ranking.
#[derive(Debug, Clone)]
pub struct RawResult {
    pub url: String,
    pub title: String,
    pub snippet: String,
    pub meta: HashMap<String, String>,
}

/// A raw search capability (web APIs, local files, git, ...). Must be
/// idempotent for identical inputs within its freshness window (§6.1).
/// Concrete backends are external collaborators, out of scope for this
/// crate.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Stable name used for tie-breaking and cache-key composition.
    fn name(&self) -> &str;

    /// Execute a search for `canonical_query`, returning up to `top_k`
    /// raw results.
    ///
    /// # Errors
    /// Returns `CoreError::Transient`, `CoreError::Storage` (mapped from
    /// `Unavailable`), or a config-shaped error for `Unauthorized`.
    async fn search(&self, canonical_query: &str, top_k: usize) -> Result<Vec<RawResult>>;
}
