//! Workflow parser: normalizes either supported serialization into the
//! canonical [`WorkflowGraph`].
//!
//! Two formats exist in the wild:
//!
//! - *API format*: a flat mapping of node id -> `{class_type, inputs}`,
//!   where inputs already mix literals and two-element link arrays.
//! - *UI format*: `{nodes: [...], links: [...]}` with links as separate
//!   edge records that must be joined back onto each node's input slots.
//!
//! Parsing is tolerant by design: dangling link targets, unknown node
//! types and out-of-range slot indices all survive the parse and are the
//! validator's business. [`MalformedWorkflowError`] fires only when the
//! document matches neither shape.

use crate::workflow::graph::{InputValue, Node, WorkflowGraph};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum MalformedWorkflowError {
    #[error("document is not a JSON object")]
    NotAnObject,
    #[error("document matches neither the API nor the UI workflow format")]
    UnknownFormat,
    #[error("UI node at index {index} is invalid: {reason}")]
    InvalidUiNode { index: usize, reason: String },
    #[error("UI format 'nodes' field is not an array")]
    NodesNotAnArray,
}

/// Which serialization a document was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowFormat {
    Api,
    Ui,
}

impl std::fmt::Display for WorkflowFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowFormat::Api => write!(f, "api"),
            WorkflowFormat::Ui => write!(f, "ui"),
        }
    }
}

/// Parse result: the canonical graph plus the detected source format.
#[derive(Debug, Clone)]
pub struct ParsedWorkflow {
    pub format: WorkflowFormat,
    pub graph: WorkflowGraph,
}

#[derive(Debug, Default)]
pub struct WorkflowParser;

impl WorkflowParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses a raw workflow document into the canonical graph.
    ///
    /// The input is never mutated; the returned graph owns its data.
    pub fn parse(&self, raw: &Value) -> Result<ParsedWorkflow, MalformedWorkflowError> {
        let obj = raw.as_object().ok_or(MalformedWorkflowError::NotAnObject)?;

        if obj.contains_key("nodes") {
            let graph = self.parse_ui(raw)?;
            debug!(nodes = graph.len(), "parsed UI-format workflow");
            return Ok(ParsedWorkflow {
                format: WorkflowFormat::Ui,
                graph,
            });
        }

        let graph = self.parse_api(raw)?;
        debug!(nodes = graph.len(), "parsed API-format workflow");
        Ok(ParsedWorkflow {
            format: WorkflowFormat::Api,
            graph,
        })
    }

    /// API format: flat id -> `{class_type, inputs, _meta?}` mapping.
    fn parse_api(&self, raw: &Value) -> Result<WorkflowGraph, MalformedWorkflowError> {
        let obj = raw.as_object().ok_or(MalformedWorkflowError::NotAnObject)?;

        // First pass: collect node ids so link classification can check
        // whether a candidate source id actually names a node.
        let mut node_ids: BTreeSet<String> = BTreeSet::new();
        for (id, value) in obj {
            if Self::is_api_node(id, value) {
                node_ids.insert(id.clone());
            }
        }

        if node_ids.is_empty() && !obj.is_empty() {
            return Err(MalformedWorkflowError::UnknownFormat);
        }

        let mut graph = WorkflowGraph::new();
        for (id, value) in obj {
            if !node_ids.contains(id) {
                continue;
            }
            let node_obj = value.as_object().expect("checked by is_api_node");
            let class_type = node_obj
                .get("class_type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            let mut node = Node::new(id.clone(), class_type);

            if let Some(inputs) = node_obj.get("inputs").and_then(Value::as_object) {
                for (field, raw_value) in inputs {
                    let tagged = InputValue::classify(raw_value, |src| node_ids.contains(src));
                    node.inputs.insert(field.clone(), tagged);
                }
            }

            if let Some(meta) = node_obj.get("_meta").and_then(Value::as_object) {
                node.meta = Some(
                    meta.iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect::<BTreeMap<_, _>>(),
                );
            }

            graph.insert(node);
        }

        Ok(graph)
    }

    fn is_api_node(id: &str, value: &Value) -> bool {
        // Auxiliary top-level entries ("extra_data", "_meta", ...) are
        // not nodes; a node is an object carrying class_type.
        !id.starts_with('_')
            && value
                .as_object()
                .map(|o| o.contains_key("class_type"))
                .unwrap_or(false)
    }

    /// UI format: `{nodes: [...], links: [...]}` with positional slot
    /// records joined back into named inputs.
    fn parse_ui(&self, raw: &Value) -> Result<WorkflowGraph, MalformedWorkflowError> {
        let obj = raw.as_object().ok_or(MalformedWorkflowError::NotAnObject)?;
        let nodes = obj
            .get("nodes")
            .and_then(Value::as_array)
            .ok_or(MalformedWorkflowError::NodesNotAnArray)?;

        let mut graph = WorkflowGraph::new();
        // Slot names per node, ordered by slot index, for link joining.
        let mut slot_names: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (index, node_value) in nodes.iter().enumerate() {
            let node_obj =
                node_value
                    .as_object()
                    .ok_or_else(|| MalformedWorkflowError::InvalidUiNode {
                        index,
                        reason: "not an object".to_string(),
                    })?;

            let id = match node_obj.get("id") {
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::String(s)) => s.clone(),
                _ => {
                    return Err(MalformedWorkflowError::InvalidUiNode {
                        index,
                        reason: "missing id".to_string(),
                    })
                }
            };

            let class_type = node_obj
                .get("type")
                .and_then(Value::as_str)
                .ok_or_else(|| MalformedWorkflowError::InvalidUiNode {
                    index,
                    reason: "missing type".to_string(),
                })?
                .to_string();

            let mut node = Node::new(id.clone(), class_type);

            let input_slots: Vec<&serde_json::Map<String, Value>> = node_obj
                .get("inputs")
                .and_then(Value::as_array)
                .map(|slots| slots.iter().filter_map(Value::as_object).collect())
                .unwrap_or_default();

            slot_names.insert(
                id.clone(),
                input_slots
                    .iter()
                    .map(|slot| {
                        slot.get("name")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string()
                    })
                    .collect(),
            );

            // Seed literal inputs from widget state: slots that declare a
            // widget consume widgets_values positionally.
            if let Some(widget_values) = node_obj.get("widgets_values").and_then(Value::as_array) {
                let mut widget_iter = widget_values.iter();
                for slot in &input_slots {
                    let widget_name = slot
                        .get("widget")
                        .and_then(Value::as_object)
                        .and_then(|w| w.get("name"))
                        .and_then(Value::as_str);
                    if let Some(name) = widget_name {
                        if let Some(value) = widget_iter.next() {
                            node.inputs
                                .insert(name.to_string(), InputValue::Literal(value.clone()));
                        }
                    }
                }
            }

            if let Some(title) = node_obj.get("title").and_then(Value::as_str) {
                let mut meta = BTreeMap::new();
                meta.insert("title".to_string(), Value::String(title.to_string()));
                node.meta = Some(meta);
            }

            graph.insert(node);
        }

        // Join link records: [link_id, src_node, src_slot, dst_node,
        // dst_slot, type]. Bad records are skipped, never fatal.
        if let Some(links) = obj.get("links").and_then(Value::as_array) {
            for link in links {
                if let Some((src_node, src_slot, dst_node, dst_slot)) = Self::decode_link(link) {
                    let slot_name = slot_names
                        .get(&dst_node)
                        .and_then(|names| names.get(dst_slot as usize))
                        .cloned();
                    let Some(slot_name) = slot_name else {
                        warn!(
                            dst = %dst_node,
                            slot = dst_slot,
                            "link references a slot index the node does not declare, skipping"
                        );
                        continue;
                    };
                    if let Some(node) = graph.nodes.get_mut(&dst_node) {
                        node.inputs.insert(
                            slot_name,
                            InputValue::Link {
                                node_id: src_node,
                                slot: src_slot,
                            },
                        );
                    }
                }
            }
        }

        Ok(graph)
    }

    fn decode_link(link: &Value) -> Option<(String, u32, String, u32)> {
        let parts = link.as_array()?;
        if parts.len() < 5 {
            return None;
        }
        let node_id = |v: &Value| -> Option<String> {
            match v {
                Value::Number(n) => Some(n.to_string()),
                Value::String(s) => Some(s.clone()),
                _ => None,
            }
        };
        let src_node = node_id(&parts[1])?;
        let src_slot = parts[2].as_u64()? as u32;
        let dst_node = node_id(&parts[3])?;
        let dst_slot = parts[4].as_u64()? as u32;
        Some((src_node, src_slot, dst_node, dst_slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn api_doc() -> Value {
        json!({
            "3": {
                "class_type": "CheckpointLoaderSimple",
                "inputs": {"ckpt_name": "sd_xl_base.safetensors"}
            },
            "5": {
                "class_type": "MagicUpscaler",
                "inputs": {"image": ["3", 0], "scale": 2},
                "_meta": {"title": "upscale"}
            }
        })
    }

    #[test]
    fn test_api_format_detection_and_links() {
        let parsed = WorkflowParser::new().parse(&api_doc()).unwrap();
        assert_eq!(parsed.format, WorkflowFormat::Api);
        assert_eq!(parsed.graph.len(), 2);

        let upscaler = parsed.graph.get("5").unwrap();
        assert_eq!(
            upscaler.inputs["image"],
            InputValue::Link {
                node_id: "3".to_string(),
                slot: 0
            }
        );
        assert_eq!(upscaler.inputs["scale"], InputValue::Literal(json!(2)));
        assert_eq!(upscaler.meta_str("title"), Some("upscale"));
    }

    #[test]
    fn test_api_format_dangling_link_is_literal_not_error() {
        let doc = json!({
            "1": {"class_type": "SaveImage", "inputs": {"images": ["99", 0]}}
        });
        let parsed = WorkflowParser::new().parse(&doc).unwrap();
        // "99" names no node, so the pair stays a literal; the validator
        // has nothing to report either, since no link exists.
        let node = parsed.graph.get("1").unwrap();
        assert!(!node.inputs["images"].is_link());
    }

    #[test]
    fn test_api_format_skips_auxiliary_entries() {
        let doc = json!({
            "3": {"class_type": "KSampler", "inputs": {}},
            "_meta": {"version": 1},
            "extra_data": {"foo": "bar"}
        });
        let parsed = WorkflowParser::new().parse(&doc).unwrap();
        assert_eq!(parsed.graph.len(), 1);
    }

    #[test]
    fn test_malformed_document_rejected() {
        let err = WorkflowParser::new().parse(&json!({"foo": "bar"})).unwrap_err();
        assert!(matches!(err, MalformedWorkflowError::UnknownFormat));

        let err = WorkflowParser::new().parse(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, MalformedWorkflowError::NotAnObject));
    }

    #[test]
    fn test_empty_object_parses_as_empty_graph() {
        let parsed = WorkflowParser::new().parse(&json!({})).unwrap();
        assert!(parsed.graph.is_empty());
    }

    fn ui_doc() -> Value {
        json!({
            "nodes": [
                {
                    "id": 3,
                    "type": "CheckpointLoaderSimple",
                    "inputs": [
                        {"name": "ckpt_name", "type": "STRING",
                         "widget": {"name": "ckpt_name"}, "link": null}
                    ],
                    "widgets_values": ["sd_xl_base.safetensors"]
                },
                {
                    "id": 5,
                    "type": "MagicUpscaler",
                    "inputs": [
                        {"name": "image", "type": "IMAGE", "link": 1},
                        {"name": "scale", "type": "INT",
                         "widget": {"name": "scale"}, "link": null}
                    ],
                    "widgets_values": [2]
                }
            ],
            "links": [
                [1, 3, 0, 5, 0, "IMAGE"]
            ]
        })
    }

    #[test]
    fn test_ui_format_joins_links_onto_slots() {
        let parsed = WorkflowParser::new().parse(&ui_doc()).unwrap();
        assert_eq!(parsed.format, WorkflowFormat::Ui);

        let upscaler = parsed.graph.get("5").unwrap();
        assert_eq!(
            upscaler.inputs["image"],
            InputValue::Link {
                node_id: "3".to_string(),
                slot: 0
            }
        );
        assert_eq!(upscaler.inputs["scale"], InputValue::Literal(json!(2)));

        let loader = parsed.graph.get("3").unwrap();
        assert_eq!(
            loader.inputs["ckpt_name"],
            InputValue::Literal(json!("sd_xl_base.safetensors"))
        );
    }

    #[test]
    fn test_ui_and_api_encodings_normalize_identically() {
        let from_api = WorkflowParser::new().parse(&api_doc()).unwrap().graph;
        let from_ui = WorkflowParser::new().parse(&ui_doc()).unwrap().graph;

        for (id, api_node) in &from_api.nodes {
            let ui_node = from_ui.get(id).expect("node present in both encodings");
            assert_eq!(api_node.class_type, ui_node.class_type);
            for (field, value) in &api_node.inputs {
                assert_eq!(ui_node.inputs.get(field), Some(value), "field {field}");
            }
        }
    }

    #[test]
    fn test_ui_format_out_of_range_slot_is_skipped() {
        let doc = json!({
            "nodes": [
                {"id": 1, "type": "SaveImage", "inputs": [], "widgets_values": []},
                {"id": 2, "type": "PreviewImage", "inputs": [], "widgets_values": []}
            ],
            "links": [[1, 1, 0, 2, 4, "IMAGE"]]
        });
        let parsed = WorkflowParser::new().parse(&doc).unwrap();
        assert!(parsed.graph.get("2").unwrap().inputs.is_empty());
    }

    #[test]
    fn test_ui_node_missing_type_is_malformed() {
        let doc = json!({"nodes": [{"id": 1}]});
        let err = WorkflowParser::new().parse(&doc).unwrap_err();
        assert!(matches!(
            err,
            MalformedWorkflowError::InvalidUiNode { index: 0, .. }
        ));
    }

    #[test]
    fn test_parse_does_not_mutate_input() {
        let doc = api_doc();
        let before = doc.clone();
        let _ = WorkflowParser::new().parse(&doc).unwrap();
        assert_eq!(doc, before);
    }
}
