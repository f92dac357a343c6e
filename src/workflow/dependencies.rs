//! Dependency extraction: walks the canonical graph and collects model
//! filenames, custom-node occurrences and inferred python packages.
//!
//! Extraction performs no I/O and is fully re-derivable from the graph,
//! so repeated calls over the same graph yield identical sets. The python
//! package list is heuristic and advisory only; authoritative package
//! requirements come from the node resolver once custom nodes resolve to
//! real repositories.

use crate::workflow::constants::{is_builtin_node, model_category};
use crate::workflow::graph::WorkflowGraph;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Keyword hints mapping substrings of custom node type names to pip
/// packages. Best-effort by design; may under- or over-approximate.
const PACKAGE_HINTS: &[(&str, &str)] = &[
    ("Insight", "insightface"),
    ("FaceAnalysis", "insightface"),
    ("Ultralytics", "ultralytics"),
    ("Yolo", "ultralytics"),
    ("Rembg", "rembg"),
    ("OpenCV", "opencv-python"),
    ("Onnx", "onnxruntime"),
    ("Mediapipe", "mediapipe"),
    ("Segment", "segment-anything"),
];

/// One custom-node instance as it appears in the workflow, including any
/// repository/commit hints embedded in its `_meta` block.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CustomNodeOccurrence {
    pub node_id: String,
    pub class_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DependencySet {
    /// Model category -> filenames.
    pub models: BTreeMap<String, BTreeSet<String>>,
    /// Every custom-node instance, id order.
    pub custom_nodes: Vec<CustomNodeOccurrence>,
    /// Heuristically inferred pip packages.
    pub python_packages: BTreeSet<String>,
}

impl DependencySet {
    /// Distinct custom node type names across all occurrences.
    pub fn custom_node_types(&self) -> BTreeSet<String> {
        self.custom_nodes
            .iter()
            .map(|o| o.class_type.clone())
            .collect()
    }

    pub fn model_count(&self) -> usize {
        self.models.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty() && self.custom_nodes.is_empty() && self.python_packages.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct DependencyExtractor;

impl DependencyExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract_all(&self, graph: &WorkflowGraph) -> DependencySet {
        DependencySet {
            models: self.extract_models(graph),
            custom_nodes: self.extract_custom_nodes(graph),
            python_packages: self.infer_python_packages(graph),
        }
    }

    /// Collects literal model filenames from fields named in the fixed
    /// (class_type, field) -> category table. Link-valued fields are
    /// dynamic and skipped.
    pub fn extract_models(&self, graph: &WorkflowGraph) -> BTreeMap<String, BTreeSet<String>> {
        let mut models: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for node in graph.iter() {
            for (field, value) in &node.inputs {
                let Some(category) = model_category(&node.class_type, field) else {
                    continue;
                };
                if let Some(filename) = value.as_str() {
                    if !filename.is_empty() {
                        models
                            .entry(category.to_string())
                            .or_default()
                            .insert(filename.to_string());
                    }
                }
            }
        }

        models
    }

    /// Records every node whose class_type is not builtin, preserving
    /// per-instance `_meta` repository/commit hints.
    pub fn extract_custom_nodes(&self, graph: &WorkflowGraph) -> Vec<CustomNodeOccurrence> {
        graph
            .iter()
            .filter(|node| !node.class_type.is_empty() && !is_builtin_node(&node.class_type))
            .map(|node| CustomNodeOccurrence {
                node_id: node.id.clone(),
                class_type: node.class_type.clone(),
                repository: node.meta_str("repository").map(String::from),
                commit: node.meta_str("commit").map(String::from),
            })
            .collect()
    }

    /// Best-effort pip package inference from custom node type names.
    pub fn infer_python_packages(&self, graph: &WorkflowGraph) -> BTreeSet<String> {
        let mut packages = BTreeSet::new();
        for node in graph.iter() {
            if is_builtin_node(&node.class_type) {
                continue;
            }
            for (keyword, package) in PACKAGE_HINTS {
                if node.class_type.contains(keyword) {
                    packages.insert((*package).to_string());
                }
            }
        }
        packages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::parser::WorkflowParser;
    use serde_json::json;

    fn graph(doc: serde_json::Value) -> WorkflowGraph {
        WorkflowParser::new().parse(&doc).unwrap().graph
    }

    #[test]
    fn test_model_extraction_by_table() {
        let g = graph(json!({
            "3": {"class_type": "CheckpointLoaderSimple",
                  "inputs": {"ckpt_name": "sd_xl_base.safetensors"}},
            "4": {"class_type": "LoraLoader",
                  "inputs": {"lora_name": "detail.safetensors",
                             "model": ["3", 0]}}
        }));
        let deps = DependencyExtractor::new().extract_all(&g);

        assert_eq!(deps.models["checkpoints"].len(), 1);
        assert!(deps.models["checkpoints"].contains("sd_xl_base.safetensors"));
        assert!(deps.models["loras"].contains("detail.safetensors"));
        assert_eq!(deps.model_count(), 2);
    }

    #[test]
    fn test_linked_model_field_skipped() {
        // ckpt_name wired from another node is dynamic, not a filename.
        let g = graph(json!({
            "1": {"class_type": "CheckpointLoaderSimple", "inputs": {}},
            "2": {"class_type": "CheckpointLoaderSimple",
                  "inputs": {"ckpt_name": ["1", 0]}}
        }));
        let deps = DependencyExtractor::new().extract_all(&g);
        assert!(deps.models.is_empty());
    }

    #[test]
    fn test_custom_node_occurrences_with_meta_hints() {
        let g = graph(json!({
            "5": {"class_type": "MagicUpscaler",
                  "inputs": {},
                  "_meta": {"repository": "https://github.com/x/magic",
                            "commit": "abc123"}},
            "6": {"class_type": "MagicUpscaler", "inputs": {}}
        }));
        let deps = DependencyExtractor::new().extract_all(&g);

        assert_eq!(deps.custom_nodes.len(), 2);
        assert_eq!(
            deps.custom_nodes[0].repository.as_deref(),
            Some("https://github.com/x/magic")
        );
        assert_eq!(deps.custom_nodes[0].commit.as_deref(), Some("abc123"));
        assert_eq!(deps.custom_nodes[1].repository, None);
        assert_eq!(deps.custom_node_types().len(), 1);
    }

    #[test]
    fn test_package_inference_is_keyword_based() {
        let g = graph(json!({
            "1": {"class_type": "UltralyticsDetector", "inputs": {}},
            "2": {"class_type": "FaceAnalysisNode", "inputs": {}},
            "3": {"class_type": "KSampler", "inputs": {}}
        }));
        let deps = DependencyExtractor::new().extract_all(&g);
        assert!(deps.python_packages.contains("ultralytics"));
        assert!(deps.python_packages.contains("insightface"));
        assert_eq!(deps.python_packages.len(), 2);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let g = graph(json!({
            "3": {"class_type": "CheckpointLoaderSimple",
                  "inputs": {"ckpt_name": "sd_xl_base.safetensors"}},
            "5": {"class_type": "MagicUpscaler", "inputs": {"image": ["3", 0]}}
        }));
        let extractor = DependencyExtractor::new();
        assert_eq!(extractor.extract_all(&g), extractor.extract_all(&g));
    }

    #[test]
    fn test_typical_upscale_scenario() {
        let g = graph(json!({
            "3": {"class_type": "CheckpointLoaderSimple",
                  "inputs": {"ckpt_name": "sd_xl_base.safetensors"}},
            "5": {"class_type": "MagicUpscaler", "inputs": {"image": ["3", 0]}}
        }));
        let deps = DependencyExtractor::new().extract_all(&g);

        assert!(deps.models["checkpoints"].contains("sd_xl_base.safetensors"));
        assert_eq!(deps.custom_nodes.len(), 1);
        assert_eq!(deps.custom_nodes[0].class_type, "MagicUpscaler");
    }
}
