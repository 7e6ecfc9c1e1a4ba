//! ABOUTME: Data model types for the autoresearch orchestration core
//! ABOUTME: Query, QueryState, Claim, Source, AuditRecord, TaskGraph and their satellites

pub mod agent_result;
pub mod audit;
pub mod budget;
pub mod cache_key;
pub mod claim;
pub mod config_snapshot;
pub mod ids;
pub mod query;
pub mod query_state;
pub mod react;
pub mod response;
pub mod retrieval;
pub mod scout;
pub mod source;
pub mod task_graph;

pub use agent_result::{AgentResult, AgentStatus, ErrorDescriptor};
pub use audit::{AuditRecord, AuditStatus, SourceRef};
pub use budget::CycleBudget;
pub use cache_key::CacheKey;
pub use claim::{Claim, ClaimType};
pub use config_snapshot::{
    AuditPolicy, BudgetLimits, ConfigSnapshot, GateThresholds, HedgeMode, ReasoningMode,
    RetrievalWeights, RoutingPolicy,
};
pub use ids::{ClaimId, QueryId};
pub use query::Query;
pub use query_state::QueryState;
pub use react::{ReActMetadata, ReActStep};
pub use response::{
    answer_is_clean, DepthSections, QueryResponse, ReasoningEntry, ResponseMetrics, Warning,
    WARNING_PREFIXES,
};
pub use retrieval::{quantize, sort_documents, RetrievalDocument, ScoreComponents};
pub use scout::{GateAction, GateDecision, GateSignals, ScoutResult};
pub use source::{canonicalize_url, RetrievalMetadata, Source, StorageStage};
pub use task_graph::{RepairWarning, TaskGraph, TaskNode};
