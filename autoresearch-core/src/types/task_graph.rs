//! ABOUTME: `TaskGraph` and `TaskNode` — the planner's acyclic typed task graph

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One node in the planner-produced task graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskNode {
    pub id: String,
    pub question: String,
    pub objectives: Vec<String>,
    pub exit_criteria: Vec<String>,
    /// Tool name -> affinity score in `[0, 1]`.
    pub tool_affinity: HashMap<String, f64>,
    pub dependencies: Vec<String>,
    pub depth: u32,
}

impl TaskNode {
    #[must_use]
    pub fn max_affinity(&self) -> f64 {
        self.tool_affinity
            .values()
            .copied()
            .fold(f64::MIN, f64::max)
            .max(0.0)
    }
}

/// Why a `TaskGraph` failed normalization, and what was done about it
/// (§4.4 "deterministic repair pass").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairWarning {
    pub reason: String,
    pub removed_edge: Option<(String, String)>,
    pub clamped_node: Option<String>,
}

/// An acyclic set of `TaskNode`s, ordered by insertion, scheduled by the
/// task coordinator under depth/affinity ordering (§4.4).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskGraph {
    nodes: Vec<TaskNode>,
}

impl TaskGraph {
    #[must_use]
    pub fn new(nodes: Vec<TaskNode>) -> Self {
        Self { nodes }
    }

    #[must_use]
    pub fn nodes(&self) -> &[TaskNode] {
        &self.nodes
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&TaskNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Validate acyclicity and exit-criteria non-emptiness, and recompute
    /// `depth` for every node. Returns `Ok` with any repairs applied and a
    /// warning list, or `Err` if repair is impossible (e.g. a dangling
    /// dependency that cannot be dropped safely).
    ///
    /// Repair policy (§4.4): cycles are broken by dropping the latest edge
    /// that closes the cycle (the dependency edge whose source node has
    /// the highest id lexicographically among those in the cycle);
    /// affinities are clamped into `[0, 1]`.
    #[must_use]
    pub fn normalize(mut self) -> (Self, Vec<RepairWarning>) {
        let mut warnings = Vec::new();

        for node in &mut self.nodes {
            if node.exit_criteria.is_empty() {
                node.exit_criteria.push("completion".to_string());
                warnings.push(RepairWarning {
                    reason: format!("node {} had no exit criteria; defaulted", node.id),
                    removed_edge: None,
                    clamped_node: Some(node.id.clone()),
                });
            }
            for (_, score) in node.tool_affinity.iter_mut() {
                let clamped = score.clamp(0.0, 1.0);
                if (clamped - *score).abs() > f64::EPSILON {
                    warnings.push(RepairWarning {
                        reason: format!("node {} had out-of-range affinity; clamped", node.id),
                        removed_edge: None,
                        clamped_node: Some(node.id.clone()),
                    });
                }
                *score = clamped;
            }
        }

        self.break_cycles(&mut warnings);
        self.compute_depths();
        (self, warnings)
    }

    fn break_cycles(&mut self, warnings: &mut Vec<RepairWarning>) {
        loop {
            match self.find_cycle() {
                None => break,
                Some(cycle) => {
                    // Drop the dependency edge whose source id sorts last
                    // lexicographically among the cycle's edges — the
                    // "latest edge closing a cycle".
                    let culprit = cycle
                        .iter()
                        .max_by(|a, b| a.0.cmp(&b.0))
                        .cloned()
                        .expect("cycle is non-empty");
                    if let Some(node) = self.nodes.iter_mut().find(|n| n.id == culprit.0) {
                        node.dependencies.retain(|d| d != &culprit.1);
                    }
                    warnings.push(RepairWarning {
                        reason: "cycle detected in task graph; edge removed".to_string(),
                        removed_edge: Some(culprit),
                        clamped_node: None,
                    });
                }
            }
        }
    }

    /// Returns the edges (`from_id`, `dep_id`) participating in a cycle, if
    /// any exists.
    fn find_cycle(&self) -> Option<Vec<(String, String)>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }
        let mut marks: HashMap<&str, Mark> = self
            .nodes
            .iter()
            .map(|n| (n.id.as_str(), Mark::Unvisited))
            .collect();
        let by_id: HashMap<&str, &TaskNode> =
            self.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

        fn visit<'a>(
            id: &'a str,
            by_id: &HashMap<&'a str, &'a TaskNode>,
            marks: &mut HashMap<&'a str, Mark>,
            path: &mut Vec<&'a str>,
        ) -> Option<Vec<(String, String)>> {
            match marks.get(id).copied().unwrap_or(Mark::Done) {
                Mark::Done => return None,
                Mark::InProgress => {
                    let start = path.iter().position(|p| *p == id).unwrap_or(0);
                    let mut edges = Vec::new();
                    for w in path[start..].windows(2) {
                        edges.push((w[0].to_string(), w[1].to_string()));
                    }
                    edges.push((path[path.len() - 1].to_string(), id.to_string()));
                    return Some(edges);
                }
                Mark::Unvisited => {}
            }
            marks.insert(id, Mark::InProgress);
            path.push(id);
            if let Some(node) = by_id.get(id) {
                for dep in &node.dependencies {
                    if let Some(found) = visit(dep.as_str(), by_id, marks, path) {
                        return Some(found);
                    }
                }
            }
            path.pop();
            marks.insert(id, Mark::Done);
            None
        }

        for node in &self.nodes {
            if marks.get(node.id.as_str()).copied() == Some(Mark::Unvisited) {
                let mut path = Vec::new();
                if let Some(cycle) = visit(node.id.as_str(), &by_id, &mut marks, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn compute_depths(&mut self) {
        let mut resolved: HashMap<String, u32> = HashMap::new();
        let ids: Vec<String> = self.nodes.iter().map(|n| n.id.clone()).collect();
        let mut in_progress: HashSet<String> = HashSet::new();

        fn resolve(
            id: &str,
            nodes: &[TaskNode],
            resolved: &mut HashMap<String, u32>,
            in_progress: &mut HashSet<String>,
        ) -> u32 {
            if let Some(d) = resolved.get(id) {
                return *d;
            }
            if !in_progress.insert(id.to_string()) {
                // Residual cycle after repair (shouldn't happen); break by depth 0.
                return 0;
            }
            let node = nodes.iter().find(|n| n.id == id);
            let depth = match node {
                Some(n) if n.dependencies.is_empty() => 0,
                Some(n) => 1 + n
                    .dependencies
                    .iter()
                    .map(|d| resolve(d, nodes, resolved, in_progress))
                    .max()
                    .unwrap_or(0),
                None => 0,
            };
            resolved.insert(id.to_string(), depth);
            depth
        }

        for id in &ids {
            let depth = resolve(id, &self.nodes, &mut resolved, &mut in_progress);
            resolved.insert(id.clone(), depth);
        }
        for node in &mut self.nodes {
            node.depth = *resolved.get(&node.id).unwrap_or(&0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, deps: &[&str]) -> TaskNode {
        TaskNode {
            id: id.to_string(),
            question: format!("question for {id}"),
            objectives: vec![],
            exit_criteria: vec!["done".to_string()],
            tool_affinity: HashMap::new(),
            dependencies: deps.iter().map(|s| s.to_string()).collect(),
            depth: 0,
        }
    }

    #[test]
    fn depth_is_one_plus_max_dep_depth() {
        let graph = TaskGraph::new(vec![node("a", &[]), node("b", &["a"]), node("c", &["a", "b"])]);
        let (graph, warnings) = graph.normalize();
        assert!(warnings.is_empty());
        assert_eq!(graph.get("a").unwrap().depth, 0);
        assert_eq!(graph.get("b").unwrap().depth, 1);
        assert_eq!(graph.get("c").unwrap().depth, 2);
    }

    #[test]
    fn cycle_is_broken_deterministically() {
        let graph = TaskGraph::new(vec![node("a", &["b"]), node("b", &["a"])]);
        let (graph, warnings) = graph.normalize();
        assert!(!warnings.is_empty());
        assert!(graph.find_cycle().is_none());
    }

    #[test]
    fn missing_exit_criteria_is_repaired() {
        let mut n = node("a", &[]);
        n.exit_criteria.clear();
        let (graph, warnings) = TaskGraph::new(vec![n]).normalize();
        assert_eq!(graph.get("a").unwrap().exit_criteria, vec!["completion".to_string()]);
        assert_eq!(warnings.len(), 1);
    }
}
