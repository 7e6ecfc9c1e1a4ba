//! ABOUTME: `CacheKey` — a stable fingerprint identifying one retrieval request

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::query::canonicalize;

/// A stable fingerprint of `(canonical_query, backend_set, hybrid_flag,
/// embedding_dimension, top_k)` (§3). Legacy aliases (e.g. a query that
/// differs only in whitespace/case, or an older backend-set spelling) must
/// resolve to the same canonical key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    canonical_query: String,
    backend_set: Vec<String>,
    hybrid: bool,
    embedding_dimension: Option<u32>,
    top_k: usize,
}

impl CacheKey {
    #[must_use]
    pub fn new(
        query_text: &str,
        backends: impl IntoIterator<Item = impl Into<String>>,
        hybrid: bool,
        embedding_dimension: Option<u32>,
        top_k: usize,
    ) -> Self {
        let mut backend_set: BTreeSet<String> = backends.into_iter().map(Into::into).collect();
        // BTreeSet already sorts; collecting back to Vec keeps the key Hash-friendly.
        let backend_set: Vec<String> = backend_set.drain().collect();
        Self {
            canonical_query: canonicalize(query_text),
            backend_set,
            hybrid,
            embedding_dimension,
            top_k,
        }
    }

    /// Opaque string form suitable for use as a storage row key.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.canonical_query,
            self.backend_set.join(","),
            self.hybrid,
            self.embedding_dimension.map_or_else(|| "-".to_string(), |d| d.to_string()),
            self.top_k
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_and_case_aliases_collapse_to_same_key() {
        let a = CacheKey::new("Hello  World", ["web", "local"], true, Some(384), 10);
        let b = CacheKey::new("hello world", ["local", "web"], true, Some(384), 10);
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn different_top_k_is_a_different_key() {
        let a = CacheKey::new("q", ["web"], false, None, 5);
        let b = CacheKey::new("q", ["web"], false, None, 10);
        assert_ne!(a, b);
    }
}
