//! ABOUTME: `AgentResult` — the tagged outcome of one agent's execution within a cycle

use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// Outcome of one agent invocation. Replaces exception-driven control flow
/// (§9): agent errors are modeled as this tagged variant at the boundary,
/// never as a panic or propagated exception, with `Fatal` reserved for
/// unrecoverable invariant violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Ok,
    Retried,
    Failed,
    Timeout,
}

/// A lightweight, serializable error kind + message, detached from
/// `CoreError` so `AgentResult` stays `Clone + Serialize` without forcing
/// the same on every error variant's payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub kind: String,
    pub message: String,
}

impl From<&CoreError> for ErrorDescriptor {
    fn from(err: &CoreError) -> Self {
        let kind = match err {
            CoreError::Config { .. } => "ConfigError",
            CoreError::Transient { .. } => "Transient",
            CoreError::RateLimited { .. } => "RateLimited",
            CoreError::BudgetExhausted { .. } => "BudgetExhausted",
            CoreError::AgentFailure { .. } => "AgentFailure",
            CoreError::Storage { .. } => "StorageError",
            CoreError::AuditInconclusive { .. } => "AuditInconclusive",
            CoreError::Cancelled => "Cancelled",
            CoreError::Fatal { .. } => "Fatal",
        };
        Self {
            kind: kind.to_string(),
            message: err.to_string(),
        }
    }
}

/// The result of one agent's execution in one cycle (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    pub agent_name: String,
    pub cycle: u64,
    pub status: AgentStatus,
    pub claims_added: u32,
    pub sources_added: u32,
    pub tokens_in: u64,
    pub tokens_out: u64,
    pub latency_ms: u64,
    pub model_selected: Option<String>,
    pub error: Option<ErrorDescriptor>,
}

impl AgentResult {
    #[must_use]
    pub fn ok(agent_name: impl Into<String>, cycle: u64) -> Self {
        Self {
            agent_name: agent_name.into(),
            cycle,
            status: AgentStatus::Ok,
            claims_added: 0,
            sources_added: 0,
            tokens_in: 0,
            tokens_out: 0,
            latency_ms: 0,
            model_selected: None,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(agent_name: impl Into<String>, cycle: u64, error: &CoreError) -> Self {
        Self {
            agent_name: agent_name.into(),
            cycle,
            status: AgentStatus::Failed,
            claims_added: 0,
            sources_added: 0,
            tokens_in: 0,
            tokens_out: 0,
            latency_ms: 0,
            model_selected: None,
            error: Some(ErrorDescriptor::from(error)),
        }
    }
}
