//! ABOUTME: Public facade over the orchestration core — wires storage, retrieval, the model
//! ABOUTME: router, and the agent runtime behind `Autoresearch::run_query`, plus config loading

pub mod config;

pub use config::load_config_snapshot;

use autoresearch_core::error::{CoreError, Result};
use autoresearch_core::traits::{LLMAdapter, SearchBackend, StorageBackend};
use autoresearch_core::types::{ConfigSnapshot, Query, QueryResponse, RoutingPolicy};
use autoresearch_orchestrator::Orchestrator;
use autoresearch_retrieval::HybridRetrievalMerger;
use autoresearch_router::{ModelProfile, ModelRouter};
use autoresearch_storage::{RamBudgetConfig, StorageCoordinator};
use dashmap::DashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Whether `cancel` found a live, in-flight query for the given id (§6.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelOutcome {
    pub found: bool,
}

/// One wired-up instance of the orchestration core: storage, retrieval,
/// routing, and the agent runtime behind a single `run_query` entry
/// point. Construct once per process (or per tenant); `run_query` may be
/// called concurrently, since every piece of per-query mutable state
/// lives inside `Orchestrator::run_query` itself, not here. Each
/// in-flight query registers its own `CancellationToken` under its
/// `query_id` for the duration of `run_query`, so `cancel` only ever
/// reaches a query this instance is actively running.
pub struct Autoresearch {
    orchestrator: Orchestrator,
    in_flight: DashMap<String, CancellationToken>,
}

impl Autoresearch {
    /// Wire the orchestration core together from its external
    /// collaborators: an `LLMAdapter`, zero or more live `SearchBackend`s,
    /// the storage coordinator's RAM budget, and the router's model
    /// catalog and policy. `storage_backend` is an optional pluggable
    /// durable store (§6.1); when absent, claims live only in the
    /// in-process graph/columnar/RDF tiers for this process's lifetime.
    #[must_use]
    pub fn new(
        llm: Arc<dyn LLMAdapter>,
        backends: Vec<Arc<dyn SearchBackend>>,
        ram_budget: RamBudgetConfig,
        vector_index_enabled: bool,
        model_profiles: Vec<ModelProfile>,
        routing_policy: RoutingPolicy,
        storage_backend: Option<Arc<dyn StorageBackend>>,
    ) -> Self {
        let storage = Arc::new(match storage_backend {
            Some(backend) => StorageCoordinator::with_backend(ram_budget, vector_index_enabled, backend),
            None => StorageCoordinator::new(ram_budget, vector_index_enabled),
        });
        storage.initialize();
        let merger = Arc::new(HybridRetrievalMerger::new(storage, backends));
        let router = Arc::new(ModelRouter::new(model_profiles, routing_policy));
        Self {
            orchestrator: Orchestrator::new(llm, merger, router),
            in_flight: DashMap::new(),
        }
    }

    /// Submit `text` under `config` and run it to completion (§4.1, §6.2).
    /// Registers a fresh `CancellationToken` under the generated
    /// `query_id` for the duration of the run, so a concurrent `cancel`
    /// call for that id can reach it.
    ///
    /// # Errors
    /// Returns a `CoreError::Config` if `text` is empty or `config` fails
    /// validation, otherwise propagates whatever `Orchestrator::run_query`
    /// surfaces from the scout pass or debate loop, including
    /// `CoreError::Cancelled` if `cancel` was called for this query.
    pub async fn run_query(&self, text: &str, config: ConfigSnapshot) -> Result<QueryResponse> {
        let query = Query::new(text, config).map_err(CoreError::config)?;
        let query_id = query.query_id.to_string();
        let token = CancellationToken::new();
        self.in_flight.insert(query_id.clone(), token.clone());
        let result = self.orchestrator.run_query_cancellable(&query, &token).await;
        self.in_flight.remove(&query_id);
        result
    }

    /// Cancel the in-flight query identified by `query_id`, if any (§6.2).
    /// A `query_id` that has already completed, or was never submitted to
    /// this instance, returns `found: false`.
    pub fn cancel(&self, query_id: &str) -> CancelOutcome {
        match self.in_flight.get(query_id) {
            Some(token) => {
                token.cancel();
                CancelOutcome { found: true }
            }
            None => CancelOutcome { found: false },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use autoresearch_core::traits::{GenerationParams, GenerationResult, RawResult};
    use autoresearch_core::types::ReasoningMode;

    struct StubLlm;

    #[async_trait]
    impl LLMAdapter for StubLlm {
        async fn generate(&self, _prompt: &str, model: &str, _params: &GenerationParams) -> Result<GenerationResult> {
            Ok(GenerationResult {
                text: "Paris is the capital of France.".to_string(),
                tokens_in: 10,
                tokens_out: 8,
                latency_ms: 5,
                model_used: model.to_string(),
            })
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0; 8])
        }

        async fn entailment(&self, _claim: &str, _evidence: &str) -> Result<f64> {
            Ok(0.9)
        }
    }

    struct StubBackend;

    #[async_trait]
    impl SearchBackend for StubBackend {
        fn name(&self) -> &str {
            "stub"
        }

        async fn search(&self, _canonical_query: &str, top_k: usize) -> Result<Vec<RawResult>> {
            Ok(vec![RawResult {
                url: "https://example.com/paris".to_string(),
                title: "Paris".to_string(),
                snippet: "Paris is the capital of France.".to_string(),
                meta: std::collections::HashMap::new(),
            }]
            .into_iter()
            .take(top_k)
            .collect())
        }
    }

    fn engine() -> Autoresearch {
        Autoresearch::new(
            Arc::new(StubLlm),
            vec![Arc::new(StubBackend)],
            RamBudgetConfig::default(),
            false,
            vec![ModelProfile::new("test-model", 0.0001)],
            RoutingPolicy::default(),
            None,
        )
    }

    #[tokio::test]
    async fn run_query_wires_the_full_stack_and_returns_a_clean_answer() {
        let config = ConfigSnapshot {
            reasoning_mode: ReasoningMode::Direct,
            loops: 1,
            agent_roster: vec!["synthesizer".to_string()],
            ..ConfigSnapshot::default()
        };
        let response = engine().run_query("what is the capital of france", config).await.unwrap();
        assert!(response.is_answer_clean());
        assert!(!response.answer.is_empty());
    }

    #[tokio::test]
    async fn empty_query_text_is_rejected_as_a_config_error() {
        let err = engine().run_query("   ", ConfigSnapshot::default()).await.unwrap_err();
        assert!(matches!(err, CoreError::Config { .. }));
    }

    #[test]
    fn cancelling_an_unknown_query_id_reports_not_found() {
        let outcome = engine().cancel("not-a-real-query-id");
        assert!(!outcome.found);
    }

    struct SlowLlm;

    #[async_trait]
    impl LLMAdapter for SlowLlm {
        async fn generate(&self, _prompt: &str, model: &str, _params: &GenerationParams) -> Result<GenerationResult> {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            Ok(GenerationResult {
                text: "Paris is the capital of France.".to_string(),
                tokens_in: 10,
                tokens_out: 8,
                latency_ms: 50,
                model_used: model.to_string(),
            })
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0; 8])
        }

        async fn entailment(&self, _claim: &str, _evidence: &str) -> Result<f64> {
            Ok(0.9)
        }
    }

    #[tokio::test]
    async fn cancelling_an_in_flight_query_short_circuits_it() {
        let engine = Arc::new(Autoresearch::new(
            Arc::new(SlowLlm),
            vec![Arc::new(StubBackend)],
            RamBudgetConfig::default(),
            false,
            vec![ModelProfile::new("test-model", 0.0001)],
            RoutingPolicy::default(),
            None,
        ));
        let config = ConfigSnapshot {
            reasoning_mode: ReasoningMode::Dialectical,
            loops: 10,
            agent_roster: vec!["synthesizer".to_string(), "contrarian".to_string()],
            ..ConfigSnapshot::default()
        };

        let runner = Arc::clone(&engine);
        let handle = tokio::spawn(async move { runner.run_query("capital of france", config).await });

        // Give the first agent call a chance to start, then cancel every
        // in-flight query this instance is tracking (there's only one).
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        let mut found_any = false;
        for entry in engine.in_flight.iter() {
            entry.value().cancel();
            found_any = true;
        }
        assert!(found_any);

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, CoreError::Cancelled));
    }
}
