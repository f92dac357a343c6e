//! Node census over the canonical graph: counts and custom-type listing.
//! Pure and cheap; callers recompute rather than cache.

use crate::workflow::constants::is_builtin_node;
use crate::workflow::graph::WorkflowGraph;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WorkflowAnalysis {
    pub total_nodes: usize,
    pub builtin_nodes: usize,
    pub custom_nodes: usize,
    pub custom_node_types: BTreeSet<String>,
}

#[derive(Debug, Default)]
pub struct NodeAnalyzer;

impl NodeAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Counts and classifies every node in one pass. Classification is an
    /// exact match against the builtin node set.
    pub fn analyze(&self, graph: &WorkflowGraph) -> WorkflowAnalysis {
        let mut builtin_nodes = 0;
        let mut custom_node_types = BTreeSet::new();

        for node in graph.iter() {
            if is_builtin_node(&node.class_type) {
                builtin_nodes += 1;
            } else {
                custom_node_types.insert(node.class_type.clone());
            }
        }

        WorkflowAnalysis {
            total_nodes: graph.len(),
            builtin_nodes,
            custom_nodes: graph.len() - builtin_nodes,
            custom_node_types,
        }
    }
}
