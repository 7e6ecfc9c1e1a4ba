//! ABOUTME: `QueryState` — the append-only scratchpad for one query
//! ABOUTME: Clone deep-copies every field and re-initializes its own synchronization handle

use super::agent_result::AgentResult;
use super::claim::{Claim, ClaimType};
use super::config_snapshot::AuditPolicy;
use super::react::ReActStep;
use super::source::Source;
use super::task_graph::TaskGraph;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// `QueryState` carries an internal synchronization handle because several
/// leaf components (agent runtime, storage coordinator reads) may touch it
/// from concurrent tasks bounded to a single query (§5). The design note
/// in §9 ("lock held across cloning of `QueryState`") requires that a
/// clone never shares this handle with its source: acquire, deep-copy,
/// release, then build a *fresh* lock on the clone.
#[derive(Debug)]
pub struct QueryState {
    pub cycle: u64,
    claims: Vec<Claim>,
    claim_index: HashMap<(String, ClaimTypeKey), usize>,
    sources: Vec<Source>,
    source_index: HashMap<String, usize>,
    results: BTreeMap<u64, Vec<AgentResult>>,
    pub task_graph: Option<TaskGraph>,
    pub react_log: Vec<ReActStep>,
    pub metadata: HashMap<String, Value>,
    pub audit_policy: AuditPolicy,
    pub final_answer: Option<String>,
    lock: Arc<RwLock<()>>,
}

/// `ClaimType` isn't `Hash`, so claim dedup indexes on its discriminant.
type ClaimTypeKey = u8;

fn claim_type_key(t: ClaimType) -> ClaimTypeKey {
    match t {
        ClaimType::Thesis => 0,
        ClaimType::Antithesis => 1,
        ClaimType::Synthesis => 2,
        ClaimType::Evidence => 3,
        ClaimType::Fact => 4,
    }
}

impl QueryState {
    #[must_use]
    pub fn new(audit_policy: AuditPolicy) -> Self {
        Self {
            cycle: 0,
            claims: Vec::new(),
            claim_index: HashMap::new(),
            sources: Vec::new(),
            source_index: HashMap::new(),
            results: BTreeMap::new(),
            task_graph: None,
            react_log: Vec::new(),
            metadata: HashMap::new(),
            audit_policy,
            final_answer: None,
            lock: Arc::new(RwLock::new(())),
        }
    }

    #[must_use]
    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    #[must_use]
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    #[must_use]
    pub fn results_for_cycle(&self, cycle: u64) -> &[AgentResult] {
        self.results.get(&cycle).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn results(&self) -> &BTreeMap<u64, Vec<AgentResult>> {
        &self.results
    }

    /// Advance to the next cycle. Invariant: `cycle` only increases by
    /// exactly 1 between cycles (§3).
    pub fn advance_cycle(&mut self) {
        self.cycle += 1;
    }

    /// Insert a claim, de-duplicated by normalized text + type. Returns
    /// `true` if the claim was newly inserted. Superseded claims are never
    /// removed — only linked via `Claim::supersedes` — so this never
    /// deletes an existing entry.
    pub fn add_claim(&mut self, claim: Claim) -> bool {
        let key = (super::query::canonicalize(&claim.text), claim_type_key(claim.claim_type));
        if self.claim_index.contains_key(&key) {
            return false;
        }
        self.claim_index.insert(key, self.claims.len());
        self.claims.push(claim);
        true
    }

    /// Union a source into the ordered set, de-duplicated by canonical
    /// URL. If already present, the existing entry's `storage_sources`
    /// gains the new entry's stage tags.
    pub fn add_source(&mut self, mut source: Source) {
        if let Some(&idx) = self.source_index.get(source.canonical_url()) {
            let existing = &mut self.sources[idx];
            for stage in std::mem::take(&mut source.storage_sources) {
                existing.storage_sources.insert(stage);
            }
        } else {
            self.source_index
                .insert(source.canonical_url().to_string(), self.sources.len());
            self.sources.push(source);
        }
    }

    /// `QueryState.update(result)` (§4.6): appends claims (deduplicated),
    /// unions sources, appends to `results[cycle]`, recomputes derived
    /// metadata. Deterministic: the same ordered sequence of
    /// `AgentResult`s plus their accompanying claims/sources always
    /// produces a byte-identical externally observable state (modulo
    /// timestamps).
    pub fn update(&mut self, result: AgentResult, claims: Vec<Claim>, sources: Vec<Source>) {
        let cycle = result.cycle;
        for claim in claims {
            self.add_claim(claim);
        }
        for source in sources {
            self.add_source(source);
        }
        self.results.entry(cycle).or_default().push(result);
        self.recompute_metadata();
    }

    fn recompute_metadata(&mut self) {
        self.metadata
            .insert("claim_count".to_string(), Value::from(self.claims.len()));
        self.metadata
            .insert("source_count".to_string(), Value::from(self.sources.len()));
        self.metadata
            .insert("cycle".to_string(), Value::from(self.cycle));
    }

    /// Whether synthesis has converged or all task-graph exit criteria are
    /// met, short-circuiting the remaining cycles of the debate loop
    /// (§4.1 step 5e). A minimal, deterministic heuristic: converged once
    /// a `synthesis`-typed claim exists for the current cycle.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.claims
            .iter()
            .any(|c| c.claim_type == ClaimType::Synthesis && c.cycle_created == self.cycle)
    }
}

impl Clone for QueryState {
    /// Acquire this instance's lock, deep-copy every field, release, then
    /// build a brand new lock for the clone. The clone never shares a
    /// lock with its source (§9).
    fn clone(&self) -> Self {
        let _guard = self.lock.read();
        Self {
            cycle: self.cycle,
            claims: self.claims.clone(),
            claim_index: self.claim_index.clone(),
            sources: self.sources.clone(),
            source_index: self.source_index.clone(),
            results: self.results.clone(),
            task_graph: self.task_graph.clone(),
            react_log: self.react_log.clone(),
            metadata: self.metadata.clone(),
            audit_policy: self.audit_policy.clone(),
            final_answer: self.final_answer.clone(),
            lock: Arc::new(RwLock::new(())),
        }
    }
}
