//! Structural and semantic validation of the canonical graph.
//!
//! Validation never fails with an error value: defects are collected into
//! [`ValidationResult`] as errors or warnings, and `strict` mode promotes
//! warnings to errors. Anything the parser accepted is safe to validate.

use crate::workflow::constants::is_builtin_node;
use crate::workflow::graph::{InputValue, WorkflowGraph};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Default)]
pub struct WorkflowValidator {
    /// Class types the caller already knows how to resolve (manual
    /// overrides); these skip the unknown-type warning.
    known_custom_types: BTreeSet<String>,
}

impl WorkflowValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_known_types(types: impl IntoIterator<Item = String>) -> Self {
        Self {
            known_custom_types: types.into_iter().collect(),
        }
    }

    pub fn validate(&self, graph: &WorkflowGraph, strict: bool) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if graph.is_empty() {
            warnings.push("workflow contains no nodes".to_string());
        }

        let mut unknown_types: BTreeSet<&str> = BTreeSet::new();

        for node in graph.iter() {
            if node.class_type.is_empty() {
                errors.push(format!("node {} has an empty class_type", node.id));
                continue;
            }

            if !is_builtin_node(&node.class_type)
                && !self.known_custom_types.contains(&node.class_type)
            {
                unknown_types.insert(&node.class_type);
            }

            for (field, value) in &node.inputs {
                if let InputValue::Link { node_id, .. } = value {
                    if !graph.contains(node_id) {
                        errors.push(format!(
                            "node {} input '{}' links to missing node {}",
                            node.id, field, node_id
                        ));
                    }
                }
            }
        }

        for class_type in unknown_types {
            warnings.push(format!(
                "unknown node type '{}' (not builtin; may resolve as a custom node)",
                class_type
            ));
        }

        for cycle_node in self.find_cycle_nodes(graph) {
            errors.push(format!(
                "node {} participates in a link cycle; execution order is undefined",
                cycle_node
            ));
        }

        if strict {
            errors.append(&mut warnings);
        }

        let mut metadata = BTreeMap::new();
        metadata.insert(
            "node_count".to_string(),
            serde_json::Value::from(graph.len()),
        );
        metadata.insert(
            "link_count".to_string(),
            serde_json::Value::from(
                graph
                    .iter()
                    .flat_map(|n| n.inputs.values())
                    .filter(|v| v.is_link())
                    .count(),
            ),
        );

        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            metadata,
        }
    }

    /// Finds nodes on a link cycle with an iterative three-color DFS.
    /// Terminates on any graph; returns ids in deterministic order.
    fn find_cycle_nodes(&self, graph: &WorkflowGraph) -> Vec<String> {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let mut colors: HashMap<&str, Color> = graph
            .nodes
            .keys()
            .map(|id| (id.as_str(), Color::White))
            .collect();
        let mut on_cycle: HashSet<&str> = HashSet::new();

        let edges = |id: &str| -> Vec<&str> {
            graph
                .get(id)
                .map(|node| {
                    node.inputs
                        .values()
                        .filter_map(|v| match v {
                            InputValue::Link { node_id, .. } if graph.contains(node_id) => {
                                Some(node_id.as_str())
                            }
                            _ => None,
                        })
                        .collect()
                })
                .unwrap_or_default()
        };

        for start in graph.nodes.keys() {
            if colors[start.as_str()] != Color::White {
                continue;
            }
            // Stack frames: (node, next edge index).
            let mut stack: Vec<(&str, usize)> = vec![(start.as_str(), 0)];
            colors.insert(start.as_str(), Color::Gray);

            while let Some((node, edge_index)) = stack.pop() {
                let targets = edges(node);
                if edge_index < targets.len() {
                    stack.push((node, edge_index + 1));
                    let target = targets[edge_index];
                    match colors[target] {
                        Color::White => {
                            colors.insert(target, Color::Gray);
                            stack.push((target, 0));
                        }
                        Color::Gray => {
                            // Back edge; every gray frame is on the path.
                            on_cycle.insert(target);
                            on_cycle.insert(node);
                        }
                        Color::Black => {}
                    }
                } else {
                    colors.insert(node, Color::Black);
                }
            }
        }

        let mut result: Vec<String> = on_cycle.into_iter().map(String::from).collect();
        result.sort();
        result
    }
}
