// src/dag/graph.rs

use std::collections::BTreeMap;

use crate::config::ConfigFile;

#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Tasks listed in `after`.
    deps: Vec<String>,
    /// Tasks that list this one in their `after`.
    dependents: Vec<String>,
}

/// Build-order graph of tasks keyed by name.
///
/// Acyclicity is checked by `config::validate`; this only keeps the
/// adjacency lists the build scheduler walks.
#[derive(Debug, Clone, Default)]
pub struct DagGraph {
    nodes: BTreeMap<String, DagNode>,
}

impl DagGraph {
    /// Build from a validated [`ConfigFile`].
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self::from_edges(
            cfg.tasks()
                .iter()
                .map(|(name, task)| (name.clone(), task.after.clone())),
        )
    }

    /// Build from `(task, after)` pairs. Dependencies naming unknown tasks
    /// are ignored.
    pub fn from_edges(edges: impl IntoIterator<Item = (String, Vec<String>)>) -> Self {
        let mut nodes: BTreeMap<String, DagNode> = edges
            .into_iter()
            .map(|(name, deps)| {
                (
                    name,
                    DagNode {
                        deps,
                        dependents: Vec::new(),
                    },
                )
            })
            .collect();

        let pairs: Vec<(String, String)> = nodes
            .iter()
            .flat_map(|(name, node)| node.deps.iter().map(move |dep| (dep.clone(), name.clone())))
            .collect();

        for (dep, dependent) in pairs {
            match nodes.get_mut(&dep) {
                Some(node) => node.dependents.push(dependent),
                None => {
                    if let Some(node) = nodes.get_mut(&dependent) {
                        node.deps.retain(|d| d != &dep);
                    }
                }
            }
        }

        Self { nodes }
    }

    /// Task names, sorted.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
