//! ABOUTME: `Source` entity — a canonicalized, de-duplicated retrieval origin

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which retrieval stage surfaced a source. Recorded per-source so the
/// hybrid merger's provenance survives into the final answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageStage {
    Vector,
    Bm25,
    Ontology,
    Live,
}

/// Retrieval metadata attached to a `Source`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalMetadata {
    pub backend_name: String,
    pub fetched_at: DateTime<Utc>,
    pub checksum: String,
}

/// A de-duplicated retrieval origin. Equality and ordering for
/// deduplication purposes are defined over `canonical_url` only; title and
/// snippet are display-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    canonical_url: String,
    pub title: String,
    pub snippet: String,
    pub retrieval: RetrievalMetadata,
    pub storage_sources: BTreeSet<StorageStage>,
}

impl Source {
    #[must_use]
    pub fn new(url: &str, title: impl Into<String>, snippet: impl Into<String>, retrieval: RetrievalMetadata) -> Self {
        Self {
            canonical_url: canonicalize_url(url),
            title: title.into(),
            snippet: snippet.into(),
            retrieval,
            storage_sources: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn canonical_url(&self) -> &str {
        &self.canonical_url
    }

    pub fn tag_stage(&mut self, stage: StorageStage) {
        self.storage_sources.insert(stage);
    }
}

/// Normalize a URL for deduplication: lowercase scheme and host, strip
/// the fragment. Query strings and path casing are left alone since many
/// backends are case-sensitive there.
#[must_use]
pub fn canonicalize_url(url: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or(url);
    match without_fragment.split_once("://") {
        Some((scheme, rest)) => {
            let (host_and_port, path_and_query) = match rest.find('/') {
                Some(idx) => (&rest[..idx], &rest[idx..]),
                None => (rest, ""),
            };
            format!(
                "{}://{}{}",
                scheme.to_lowercase(),
                host_and_port.to_lowercase(),
                path_and_query
            )
        }
        None => without_fragment.to_lowercase(),
    }
}
