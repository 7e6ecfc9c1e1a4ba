//! ABOUTME: Error taxonomy for the autoresearch orchestration core
//! ABOUTME: Defines `CoreError` and the `Result` alias used across every crate in the workspace

use std::time::Duration;
use thiserror::Error;

/// Comprehensive error taxonomy for the orchestration core.
///
/// Every leaf component (agents, retrieval, storage, router) wraps its own
/// failures into one of these kinds before returning to the orchestrator.
/// The orchestrator is the only place that decides whether a kind is
/// retried, recorded against a circuit breaker, or surfaced to the caller.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid query text, config snapshot, or agent roster. Fatal, surfaced
    /// directly to the caller without retry.
    #[error("configuration error: {message}")]
    Config { message: String, field: Option<String> },

    /// Retriable failure: timeouts, transient network errors, retriable
    /// adapter errors. Retried with exponential backoff by the caller.
    #[error("transient error: {message}")]
    Transient { message: String },

    /// Rate limit from an external collaborator. Retried honoring
    /// `retry_after` when present, otherwise treated as `Transient`.
    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    /// Token, time, or cycle budget exhausted before a usable answer was
    /// reached. Never retried; the orchestrator returns a best-effort
    /// synthesis with `partial=true`.
    #[error("budget exhausted: {message}")]
    BudgetExhausted { message: String },

    /// An agent tripped its circuit breaker. The agent is skipped for the
    /// remainder of the query; recorded on the `AgentResult`.
    #[error("agent failure: {agent} ({message})")]
    AgentFailure { agent: String, message: String },

    /// A storage operation failed. Reads degrade to an empty result plus a
    /// capability flag; writes are retried once by the caller, then
    /// surfaced as this kind.
    #[error("storage error: {message}")]
    Storage { message: String },

    /// The claim auditor could not classify a claim after the configured
    /// retry rounds. Not an error to the caller — hedging is applied
    /// instead — but retained as a kind so callers can distinguish it from
    /// a hard failure in logs and telemetry.
    #[error("audit inconclusive after {rounds} rounds: {message}")]
    AuditInconclusive { rounds: u32, message: String },

    /// Cooperative cancellation observed at a checkpoint.
    #[error("cancelled")]
    Cancelled,

    /// Internal invariant violation. Halts the query; propagates to the
    /// orchestrating shell unchanged.
    #[error("fatal internal error: {message}")]
    Fatal { message: String },
}

impl CoreError {
    /// Construct a `Config` error with no field attribution.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Construct a `Config` error naming the offending field.
    #[must_use]
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Whether the orchestrator's retry-with-backoff strategy applies to
    /// this error kind. Only `Transient` and `RateLimited` are retriable;
    /// everything else either bypasses retry and trips the breaker
    /// directly, or is not agent-scoped at all.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::RateLimited { .. })
    }

    /// Whether this error kind aborts the cycle loop outright (§4.1 step
    /// 5b), as opposed to being recorded as a failed `AgentResult` and
    /// continuing with the remaining roster.
    #[must_use]
    pub const fn is_loop_aborting(&self) -> bool {
        matches!(self, Self::BudgetExhausted { .. } | Self::Fatal { .. })
    }
}

/// Convenience `Result` alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, CoreError>;
