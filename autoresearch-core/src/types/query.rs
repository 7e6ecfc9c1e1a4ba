//! ABOUTME: The `Query` entity — a user request and its immutable config snapshot

use super::config_snapshot::ConfigSnapshot;
use super::ids::QueryId;
use serde::{Deserialize, Serialize};

/// A user request. Immutable for the duration of the query: created at
/// submit, carried unchanged through every cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub query_id: QueryId,
    text: String,
    canonical_text: String,
    pub config: ConfigSnapshot,
}

impl Query {
    /// Build a `Query` from raw user text and a config snapshot.
    ///
    /// # Errors
    /// Returns `Err` if `text` is empty after trimming, or the config
    /// snapshot fails `ConfigSnapshot::validate`.
    pub fn new(text: impl Into<String>, config: ConfigSnapshot) -> Result<Self, String> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err("query text must not be empty".to_string());
        }
        config.validate()?;
        let canonical_text = canonicalize(&text);
        Ok(Self {
            query_id: QueryId::new(),
            text,
            canonical_text,
            config,
        })
    }

    /// Original text as submitted, preserved for prompts and display.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whitespace-normalized, case-folded text used only for cache keying
    /// and deduplication. Never shown to the user.
    #[must_use]
    pub fn canonical_text(&self) -> &str {
        &self.canonical_text
    }
}

/// Whitespace-normalize and case-fold a query string for cache-key
/// purposes. Collapses runs of whitespace to a single ASCII space and
/// trims the ends; the original text is never replaced by this, only
/// used to derive a key.
#[must_use]
pub fn canonicalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_collapses_whitespace_and_case() {
        assert_eq!(canonicalize("Hello  World"), canonicalize("hello world"));
        assert_eq!(canonicalize("  Hello  World  "), "hello world");
    }

    #[test]
    fn empty_text_rejected() {
        let err = Query::new("   ", ConfigSnapshot::default()).unwrap_err();
        assert!(err.contains("empty"));
    }
}
