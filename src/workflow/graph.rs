//! Canonical, format-agnostic workflow graph model.
//!
//! Both supported serializations (API and UI) normalize into
//! [`WorkflowGraph`]: an ordered map from node id to [`Node`], with every
//! node input represented as a tagged [`InputValue`], either a literal
//! JSON value or a [`InputValue::Link`] to another node's output slot.
//! Downstream components only ever see the tagged form.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single node input: either a literal value or a wired connection to
/// another node's output slot.
///
/// Classification of raw API-format values is structural: a two-element
/// array `[string, integer]` whose string matches an existing node id is
/// a link. A coincidental two-element literal array of that shape is
/// indistinguishable from a link; this ambiguity is inherent to the
/// serialization and is preserved, not resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    /// Wired connection: (source node id, output slot index).
    Link { node_id: String, slot: u32 },
    /// Any other JSON value (string, number, bool, null, array, object).
    Literal(Value),
}

impl InputValue {
    /// Classifies a raw JSON value as a link or a literal.
    ///
    /// `node_exists` reports whether a candidate source id is present in
    /// the graph being built; values whose first element does not name a
    /// known node stay literal.
    pub fn classify(raw: &Value, node_exists: impl Fn(&str) -> bool) -> InputValue {
        if let Some(pair) = raw.as_array() {
            if pair.len() == 2 {
                let source = match &pair[0] {
                    Value::String(s) => Some(s.clone()),
                    // UI exports write numeric node ids.
                    Value::Number(n) if n.is_u64() => Some(n.to_string()),
                    _ => None,
                };
                if let (Some(node_id), Some(slot)) = (source, pair[1].as_u64()) {
                    if slot <= u64::from(u32::MAX) && node_exists(&node_id) {
                        return InputValue::Link {
                            node_id,
                            slot: slot as u32,
                        };
                    }
                }
            }
        }
        InputValue::Literal(raw.clone())
    }

    /// Returns the literal value, if this input is not a link.
    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            InputValue::Literal(v) => Some(v),
            InputValue::Link { .. } => None,
        }
    }

    /// Returns the literal string value, if this input is a string literal.
    pub fn as_str(&self) -> Option<&str> {
        self.as_literal().and_then(Value::as_str)
    }

    pub fn is_link(&self) -> bool {
        matches!(self, InputValue::Link { .. })
    }
}

/// One vertex of the workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub class_type: String,
    /// Named inputs; BTreeMap for deterministic iteration order.
    pub inputs: BTreeMap<String, InputValue>,
    /// Optional `_meta` block carried through from the source document
    /// (titles, repository/commit hints on custom nodes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<BTreeMap<String, Value>>,
}

impl Node {
    pub fn new(id: impl Into<String>, class_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            class_type: class_type.into(),
            inputs: BTreeMap::new(),
            meta: None,
        }
    }

    /// Fetches a `_meta` entry as a string, if present.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.meta
            .as_ref()
            .and_then(|m| m.get(key))
            .and_then(Value::as_str)
    }
}

/// The canonical workflow graph: ordered node-id → node mapping.
///
/// The graph does not enforce referential integrity; links to missing
/// nodes survive parsing and are reported by the validator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    pub nodes: BTreeMap<String, Node>,
}

impl WorkflowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates nodes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }
}
