//! ABOUTME: `ReActStep` — one append-only entry in the task coordinator's execution log

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata the task coordinator attaches to every scheduling decision.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReActMetadata {
    pub scheduler_candidates: Vec<String>,
    pub unlock_events: Vec<String>,
    pub affinity_delta: HashMap<String, f64>,
}

/// One entry in the append-only `react_log` (§3, §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReActStep {
    pub thought: String,
    pub action: String,
    pub tool: Option<String>,
    pub metadata: ReActMetadata,
}
