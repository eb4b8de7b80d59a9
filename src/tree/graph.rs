//! Evaluation-order constraints between projects.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};

/// `dependent` must not be configured before `dependency` completes configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvaluationConstraint {
    pub dependent: String,
    pub dependency: String,
}

impl EvaluationConstraint {
    pub fn new(dependent: impl Into<String>, dependency: impl Into<String>) -> Self {
        Self {
            dependent: dependent.into(),
            dependency: dependency.into(),
        }
    }
}

/// Acyclic set of "evaluate after" edges.
#[derive(Debug, Clone, Default)]
pub struct EvaluationGraph {
    /// Edges in insertion order
    constraints: Vec<EvaluationConstraint>,
    /// dependent -> dependencies
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl EvaluationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constraints(&self) -> &[EvaluationConstraint] {
        &self.constraints
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn contains(&self, dependent: &str, dependency: &str) -> bool {
        self.edges
            .get(dependent)
            .is_some_and(|deps| deps.contains(dependency))
    }

    /// Direct dependencies of a project
    pub fn dependencies_of(&self, dependent: &str) -> impl Iterator<Item = &str> {
        self.edges
            .get(dependent)
            .into_iter()
            .flat_map(|deps| deps.iter().map(String::as_str))
    }

    /// If adding `dependent -> dependency` would close a cycle, return the
    /// cycle as a list of project names starting and ending with `dependent`.
    pub fn would_cycle(&self, dependent: &str, dependency: &str) -> Option<Vec<String>> {
        if dependent == dependency {
            return Some(vec![dependent.to_string(), dependency.to_string()]);
        }

        // Search for `dependent` among everything `dependency` already waits on.
        let mut parent: HashMap<&str, &str> = HashMap::new();
        let mut visited: BTreeSet<&str> = BTreeSet::new();
        let mut stack = vec![dependency];
        visited.insert(dependency);

        while let Some(node) = stack.pop() {
            if node == dependent {
                let mut path = vec![node.to_string()];
                let mut current = node;
                while let Some(&prev) = parent.get(current) {
                    path.push(prev.to_string());
                    current = prev;
                }
                path.push(dependent.to_string());
                path.reverse();
                return Some(path);
            }

            for next in self.dependencies_of(node) {
                if visited.insert(next) {
                    parent.insert(next, node);
                    stack.push(next);
                }
            }
        }

        None
    }

    /// Insert an edge after checking it keeps the graph acyclic.
    ///
    /// Returns `Ok(false)` when the edge was already present.
    pub fn insert(&mut self, dependent: &str, dependency: &str) -> Result<bool> {
        if self.contains(dependent, dependency) {
            return Ok(false);
        }

        if let Some(path) = self.would_cycle(dependent, dependency) {
            return Err(LayoutError::Cycle { path });
        }

        self.edges
            .entry(dependent.to_string())
            .or_default()
            .insert(dependency.to_string());
        self.constraints
            .push(EvaluationConstraint::new(dependent, dependency));
        Ok(true)
    }

    /// Order `nodes` so every dependency precedes its dependents.
    ///
    /// Among nodes that are ready at the same time, the one declared first in
    /// `nodes` wins. Edges naming nodes outside `nodes` are ignored.
    pub fn topological_order(&self, nodes: &[&str]) -> Result<Vec<String>> {
        let index: HashMap<&str, usize> = nodes.iter().enumerate().map(|(i, n)| (*n, i)).collect();

        let mut pending = vec![0usize; nodes.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];

        for constraint in &self.constraints {
            let (Some(&after), Some(&before)) = (
                index.get(constraint.dependent.as_str()),
                index.get(constraint.dependency.as_str()),
            ) else {
                continue;
            };
            pending[after] += 1;
            dependents[before].push(after);
        }

        let mut ready: BTreeSet<usize> = (0..nodes.len()).filter(|&i| pending[i] == 0).collect();
        let mut order = Vec::with_capacity(nodes.len());

        while let Some(next) = ready.pop_first() {
            order.push(nodes[next].to_string());
            for &after in &dependents[next] {
                pending[after] -= 1;
                if pending[after] == 0 {
                    ready.insert(after);
                }
            }
        }

        if order.len() != nodes.len() {
            let stuck: Vec<String> = (0..nodes.len())
                .filter(|&i| pending[i] > 0)
                .map(|i| nodes[i].to_string())
                .collect();
            return Err(LayoutError::Cycle { path: stuck });
        }

        Ok(order)
    }
}
