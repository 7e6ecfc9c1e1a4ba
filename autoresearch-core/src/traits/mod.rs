//! ABOUTME: Capability traits consumed by the orchestration core from external collaborators

pub mod llm_adapter;
pub mod search_backend;
pub mod storage_backend;

pub use llm_adapter::{GenerationParams, GenerationResult, LLMAdapter};
pub use search_backend::{RawResult, SearchBackend};
pub use storage_backend::{CapabilityFlags, StorageBackend, StorageRow};
