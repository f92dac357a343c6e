//! Installation order for resolved extensions.
//!
//! Depth-first visit with a visited-set guard: every dependency named in
//! `depends_on` and present in the input installs before its dependent.
//! Names absent from the input are ignored (they may be satisfied by the
//! base image). Cycles cannot loop, since the guard terminates them, but the
//! resulting order for cyclic entries is DFS arrival order, best-effort
//! rather than a true topological sort.

use crate::resolver::metadata::NodeMetadata;
use std::collections::{HashMap, HashSet};

pub fn resolve_dependency_order(nodes: Vec<NodeMetadata>) -> Vec<NodeMetadata> {
    let index: HashMap<String, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (node.name.clone(), i))
        .collect();

    let mut visited: HashSet<String> = HashSet::new();
    let mut order: Vec<usize> = Vec::with_capacity(nodes.len());

    fn visit(
        name: &str,
        nodes: &[NodeMetadata],
        index: &HashMap<String, usize>,
        visited: &mut HashSet<String>,
        order: &mut Vec<usize>,
    ) {
        if !visited.insert(name.to_string()) {
            return;
        }
        let Some(&i) = index.get(name) else {
            return;
        };
        for dep in &nodes[i].depends_on {
            if index.contains_key(dep) {
                visit(dep, nodes, index, visited, order);
            }
        }
        order.push(i);
    }

    for node in &nodes {
        visit(&node.name, &nodes, &index, &mut visited, &mut order);
    }

    let mut slots: Vec<Option<NodeMetadata>> = nodes.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, depends_on: &[&str]) -> NodeMetadata {
        let mut meta = NodeMetadata::new(name, format!("https://github.com/x/{name}"));
        meta.depends_on = depends_on.iter().map(|s| s.to_string()).collect();
        meta
    }

    fn position(order: &[NodeMetadata], name: &str) -> usize {
        order.iter().position(|n| n.name == name).unwrap()
    }

    #[test]
    fn test_dependencies_install_first() {
        let ordered = resolve_dependency_order(vec![
            node("c", &["b"]),
            node("a", &[]),
            node("b", &["a"]),
        ]);

        assert_eq!(ordered.len(), 3);
        assert!(position(&ordered, "a") < position(&ordered, "b"));
        assert!(position(&ordered, "b") < position(&ordered, "c"));
    }

    #[test]
    fn test_missing_dependency_ignored() {
        let ordered = resolve_dependency_order(vec![node("a", &["base-image-extension"])]);
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].name, "a");
    }

    #[test]
    fn test_cycle_terminates_with_best_effort_order() {
        let ordered = resolve_dependency_order(vec![node("a", &["b"]), node("b", &["a"])]);
        // No ordering guarantee inside the cycle, but all entries appear
        // exactly once.
        assert_eq!(ordered.len(), 2);
        let names: HashSet<&str> = ordered.iter().map(|n| n.name.as_str()).collect();
        assert!(names.contains("a") && names.contains("b"));
    }

    #[test]
    fn test_independent_nodes_keep_input_order() {
        let ordered = resolve_dependency_order(vec![node("x", &[]), node("y", &[]), node("z", &[])]);
        let names: Vec<&str> = ordered.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_shared_dependency_visited_once() {
        let ordered = resolve_dependency_order(vec![
            node("app1", &["lib"]),
            node("app2", &["lib"]),
            node("lib", &[]),
        ]);
        assert_eq!(ordered.len(), 3);
        assert!(position(&ordered, "lib") < position(&ordered, "app1"));
        assert!(position(&ordered, "lib") < position(&ordered, "app2"));
    }

    #[test]
    fn test_empty_input() {
        assert!(resolve_dependency_order(Vec::new()).is_empty());
    }
}
