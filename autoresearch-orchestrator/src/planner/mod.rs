//! ABOUTME: Task coordinator (§4.4) — parses a planner agent's draft into a `TaskGraph`
//! ABOUTME: and schedules ready tasks by depth, tool affinity, and id

use autoresearch_core::types::{RepairWarning, TaskGraph, TaskNode};
use std::collections::{HashMap, HashSet};

/// Parse a planner agent's free-text draft into a flat, linearly
/// dependent `TaskGraph`: one node per non-blank line, each depending on
/// the previous. The spec leaves the planner's draft format open-ended;
/// this is a deterministic, conservative reading of it that still lets
/// `TaskGraph::normalize` repair degenerate input (no exit criteria, etc).
#[must_use]
pub fn build_task_graph_from_plan(text: &str) -> (TaskGraph, Vec<RepairWarning>) {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let nodes: Vec<TaskNode> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| TaskNode {
            id: format!("t{i}"),
            question: (*line).to_string(),
            objectives: Vec::new(),
            exit_criteria: Vec::new(),
            tool_affinity: HashMap::new(),
            dependencies: if i == 0 { Vec::new() } else { vec![format!("t{}", i - 1)] },
            depth: 0,
        })
        .collect();
    TaskGraph::new(nodes).normalize()
}

/// Tasks whose dependencies are all in `completed`, not yet completed
/// themselves, ordered ascending by depth, then descending by max tool
/// affinity, then ascending by id (§4.4 "ready_tasks()").
#[must_use]
pub fn ready_tasks<'a>(graph: &'a TaskGraph, completed: &HashSet<String>) -> Vec<&'a TaskNode> {
    let mut ready: Vec<&TaskNode> = graph
        .nodes()
        .iter()
        .filter(|n| !completed.contains(&n.id) && n.dependencies.iter().all(|d| completed.contains(d)))
        .collect();
    ready.sort_by(|a, b| {
        a.depth
            .cmp(&b.depth)
            .then_with(|| b.max_affinity().partial_cmp(&a.max_affinity()).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| a.id.cmp(&b.id))
    });
    ready
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_linear_graph_with_one_node_per_nonblank_line() {
        let (graph, _) = build_task_graph_from_plan("find the capital\n\ncheck the population\nsummarize");
        assert_eq!(graph.nodes().len(), 3);
        assert_eq!(graph.get("t1").unwrap().dependencies, vec!["t0".to_string()]);
        assert_eq!(graph.get("t2").unwrap().depth, 2);
    }

    #[test]
    fn empty_plan_repairs_to_an_empty_graph() {
        let (graph, warnings) = build_task_graph_from_plan("   \n\n  ");
        assert!(graph.nodes().is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn ready_tasks_only_returns_tasks_whose_dependencies_are_complete() {
        let (graph, _) = build_task_graph_from_plan("a\nb\nc");
        let completed = HashSet::new();
        let ready = ready_tasks(&graph, &completed);
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].id, "t0");

        let mut completed = HashSet::new();
        completed.insert("t0".to_string());
        let ready = ready_tasks(&graph, &completed);
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].id, "t1");
    }

    #[test]
    fn ready_tasks_breaks_ties_by_descending_affinity_then_ascending_id() {
        let mut a = TaskNode {
            id: "b".to_string(),
            question: "q".to_string(),
            objectives: Vec::new(),
            exit_criteria: vec!["done".to_string()],
            tool_affinity: HashMap::new(),
            dependencies: Vec::new(),
            depth: 0,
        };
        a.tool_affinity.insert("search".to_string(), 0.2);
        let mut b = a.clone();
        b.id = "a".to_string();
        b.tool_affinity.insert("search".to_string(), 0.9);
        let graph = TaskGraph::new(vec![a, b]);
        let ready = ready_tasks(&graph, &HashSet::new());
        assert_eq!(ready[0].id, "a");
        assert_eq!(ready[1].id, "b");
    }
}
