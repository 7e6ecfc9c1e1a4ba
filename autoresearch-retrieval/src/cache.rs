//! ABOUTME: Retrieval cache — concurrent readers, per-key writer coalescing over `CacheKey` slots

use autoresearch_core::types::{CacheKey, RetrievalDocument};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// A cache slot that's either still being computed or resolved. Readers
/// that observe an in-flight slot await the same `OnceCell`, so the
/// second writer for a key coalesces onto the first's result rather than
/// issuing a duplicate backend fan-out (§5: "Writers to the same key
/// coalesce").
type Slot = Arc<OnceCell<Vec<RetrievalDocument>>>;

/// Safe for concurrent readers; writers serialize on a per-`CacheKey`
/// slot (§5).
#[derive(Debug, Default)]
pub struct RetrievalCache {
    slots: DashMap<CacheKey, Slot>,
}

impl RetrievalCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the slot for `key`, creating an empty one if absent, and
    /// return it so the caller can either read an already-resolved value
    /// or race to populate it via `OnceCell::get_or_try_init`.
    pub fn slot(&self, key: &CacheKey) -> Slot {
        self.slots
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    #[must_use]
    pub fn peek(&self, key: &CacheKey) -> Option<Vec<RetrievalDocument>> {
        self.slots.get(key).and_then(|s| s.get().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(q: &str) -> CacheKey {
        CacheKey::new(q, ["web"], false, None, 5)
    }

    #[tokio::test]
    async fn second_writer_for_same_key_observes_first_result() {
        let cache = RetrievalCache::new();
        let k = key("hello world");
        let slot = cache.slot(&k);
        slot.get_or_try_init(|| async { Ok::<_, ()>(vec![]) })
            .await
            .unwrap();
        assert!(cache.peek(&k).is_some());
    }

    #[test]
    fn whitespace_and_case_aliases_share_one_slot() {
        // `CacheKey` itself canonicalizes whitespace/case (§3), so a
        // legacy-spelled alias and its canonical form collide onto the
        // same slot without any separate alias bookkeeping here.
        let cache = RetrievalCache::new();
        let canonical = key("hello world");
        let alias = CacheKey::new("Hello  World", ["web"], false, None, 5);
        assert_eq!(canonical, alias);
        assert!(std::ptr::eq(
            cache.slot(&canonical).as_ref(),
            cache.slot(&alias).as_ref()
        ));
    }
}
