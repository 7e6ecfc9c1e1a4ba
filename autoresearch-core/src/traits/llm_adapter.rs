//! ABOUTME: `LLMAdapter` — the narrow capability the orchestration core consumes for LLM calls

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Generation parameters passed through to the provider unchanged.
#[derive(Debug, Clone, Default)]
pub struct GenerationParams {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub extra: HashMap<String, String>,
}

/// Result of one `generate` call.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub text: String,
    pub tokens_in: u64,
    pub tokens_out: u64,
    pub latency_ms: u64,
    pub model_used: String,
}

/// The narrow LLM capability consumed by agents, the scout pass, and the
/// claim auditor (§6.1). Provider adapters (OpenAI, Anthropic, local
/// models, ...) are out of scope for this crate and implement this trait
/// elsewhere.
#[async_trait]
pub trait LLMAdapter: Send + Sync {
    /// Generate text from a prompt using the named model.
    ///
    /// # Errors
    /// Returns `CoreError::Transient`/`RateLimited` for retriable
    /// failures, `CoreError::Config` for invalid requests, or
    /// `CoreError::Storage`-adjacent `Fatal`/`AgentFailure` wrapping for
    /// provider unavailability, per the caller's error-mapping policy.
    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        params: &GenerationParams,
    ) -> Result<GenerationResult>;

    /// Embed text into a fixed-dimension vector.
    ///
    /// # Errors
    /// See `generate`.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Score how well `evidence` entails `claim`, in `[0, 1]`.
    ///
    /// # Errors
    /// See `generate`.
    async fn entailment(&self, claim: &str, evidence: &str) -> Result<f64>;
}
