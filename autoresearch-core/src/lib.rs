//! ABOUTME: Data model, error taxonomy, and capability traits for the autoresearch orchestration core
//! ABOUTME: Foundation layer consumed by the agents, retrieval, storage, router, and orchestrator crates

pub mod error;
pub mod traits;
pub mod types;

pub use error::{CoreError, Result};
pub use traits::{GenerationParams, GenerationResult, LLMAdapter, RawResult, SearchBackend, StorageBackend, StorageRow, CapabilityFlags};
pub use types::{
    AgentResult, AgentStatus, AuditPolicy, AuditRecord, AuditStatus, BudgetLimits, CacheKey,
    Claim, ClaimId, ClaimType, ConfigSnapshot, CycleBudget, DepthSections, GateAction,
    GateDecision, GateSignals, GateThresholds, HedgeMode, Query, QueryId, QueryResponse,
    QueryState, ReActMetadata, ReActStep, ReasoningEntry, ReasoningMode, ResponseMetrics,
    RetrievalDocument, RetrievalWeights, RoutingPolicy, ScoreComponents, ScoutResult, Source,
    SourceRef, StorageStage, TaskGraph, TaskNode, Warning,
};
