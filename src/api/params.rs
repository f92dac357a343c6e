//! Parameter schema extraction for serving a workflow over HTTP.
//!
//! Scans literal inputs on parameterizable fields and turns them into a
//! typed parameter list with bounds and enum constraints, suitable for
//! generating an endpoint description or request validation.

use crate::workflow::constants::{is_parameterizable, CORE_SAMPLERS, CORE_SCHEDULERS};
use crate::workflow::graph::{InputValue, WorkflowGraph};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    String,
    Integer,
    Number,
    Boolean,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiParameter {
    /// Request field name, `<node_id>_<field>`.
    pub name: String,
    pub kind: ParameterKind,
    pub node_id: String,
    pub field: String,
    pub required: bool,
    pub default: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointConfig {
    pub path: String,
    pub method: String,
    pub description: String,
    pub parameters: Vec<ApiParameter>,
}

/// Seed values may be -1 for "randomize", otherwise a u32.
const SEED_MIN: f64 = -1.0;
const SEED_MAX: f64 = u32::MAX as f64;

pub fn extract_parameters(graph: &WorkflowGraph) -> Vec<ApiParameter> {
    let mut parameters = Vec::new();
    for node in graph.nodes.values() {
        for (field, value) in &node.inputs {
            let InputValue::Literal(literal) = value else {
                continue;
            };
            if !is_parameterizable(&node.class_type, field) {
                continue;
            }
            parameters.push(build_parameter(&node.id, &node.class_type, field, literal));
        }
    }
    parameters
}

pub fn endpoint_config(graph: &WorkflowGraph, path: &str) -> EndpointConfig {
    EndpointConfig {
        path: path.to_string(),
        method: "POST".to_string(),
        description: "Execute the workflow with the supplied parameters".to_string(),
        parameters: extract_parameters(graph),
    }
}

fn build_parameter(node_id: &str, class_type: &str, field: &str, default: &Value) -> ApiParameter {
    let mut param = ApiParameter {
        name: format!("{node_id}_{field}"),
        kind: kind_of(default),
        node_id: node_id.to_string(),
        field: field.to_string(),
        required: false,
        default: default.clone(),
        description: None,
        minimum: None,
        maximum: None,
        allowed_values: None,
    };

    match field {
        "seed" | "noise_seed" => {
            param.kind = ParameterKind::Integer;
            param.minimum = Some(SEED_MIN);
            param.maximum = Some(SEED_MAX);
            param.description = Some("Sampling seed, -1 for random".to_string());
        }
        "steps" => {
            param.kind = ParameterKind::Integer;
            param.minimum = Some(1.0);
            param.maximum = Some(100.0);
        }
        "cfg" => {
            param.kind = ParameterKind::Number;
            param.minimum = Some(1.0);
            param.maximum = Some(30.0);
        }
        "denoise" => {
            param.kind = ParameterKind::Number;
            param.minimum = Some(0.0);
            param.maximum = Some(1.0);
        }
        "width" | "height" => {
            param.kind = ParameterKind::Integer;
            param.minimum = Some(64.0);
            param.maximum = Some(2048.0);
            param.description = Some("Pixels, rounded to a multiple of 8".to_string());
        }
        "batch_size" => {
            param.kind = ParameterKind::Integer;
            param.minimum = Some(1.0);
            param.maximum = Some(4.0);
        }
        "sampler_name" => {
            param.allowed_values = Some(CORE_SAMPLERS.iter().map(|s| s.to_string()).collect());
        }
        "scheduler" => {
            param.allowed_values = Some(CORE_SCHEDULERS.iter().map(|s| s.to_string()).collect());
        }
        "text" | "text_g" | "text_l" => {
            param.description = Some(format!("Prompt text for {class_type}"));
        }
        _ => {}
    }
    param
}

fn kind_of(value: &Value) -> ParameterKind {
    match value {
        Value::Bool(_) => ParameterKind::Boolean,
        Value::Number(n) if n.is_i64() || n.is_u64() => ParameterKind::Integer,
        Value::Number(_) => ParameterKind::Number,
        _ => ParameterKind::String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::parser::WorkflowParser;
    use serde_json::json;

    fn sampler_graph() -> WorkflowGraph {
        let raw = json!({
            "3": {
                "class_type": "KSampler",
                "inputs": {
                    "seed": 42,
                    "steps": 20,
                    "cfg": 7.5,
                    "sampler_name": "euler",
                    "scheduler": "karras",
                    "denoise": 1.0,
                    "model": ["4", 0]
                }
            },
            "4": {"class_type": "CheckpointLoaderSimple", "inputs": {"ckpt_name": "sd15.safetensors"}},
            "6": {"class_type": "CLIPTextEncode", "inputs": {"text": "a cat", "clip": ["4", 1]}}
        });
        WorkflowParser::default().parse(&raw).unwrap().graph
    }

    #[test]
    fn test_extracts_literal_parameterizable_fields_only() {
        let params = extract_parameters(&sampler_graph());
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        assert!(names.contains(&"3_seed"));
        assert!(names.contains(&"6_text"));
        // Linked input is not a parameter.
        assert!(!names.iter().any(|n| n.ends_with("_model")));
        // ckpt_name is a model reference, not parameterizable.
        assert!(!names.iter().any(|n| n.ends_with("_ckpt_name")));
    }

    #[test]
    fn test_bounds_and_enums() {
        let params = extract_parameters(&sampler_graph());
        let seed = params.iter().find(|p| p.field == "seed").unwrap();
        assert_eq!(seed.kind, ParameterKind::Integer);
        assert_eq!(seed.minimum, Some(-1.0));
        assert_eq!(seed.maximum, Some(u32::MAX as f64));

        let cfg = params.iter().find(|p| p.field == "cfg").unwrap();
        assert_eq!(cfg.kind, ParameterKind::Number);
        assert_eq!(cfg.maximum, Some(30.0));

        let sampler = params.iter().find(|p| p.field == "sampler_name").unwrap();
        let allowed = sampler.allowed_values.as_ref().unwrap();
        assert!(allowed.iter().any(|s| s == "euler"));
    }

    #[test]
    fn test_defaults_come_from_workflow() {
        let params = extract_parameters(&sampler_graph());
        let steps = params.iter().find(|p| p.field == "steps").unwrap();
        assert_eq!(steps.default, json!(20));
    }

    #[test]
    fn test_endpoint_config() {
        let config = endpoint_config(&sampler_graph(), "/generate");
        assert_eq!(config.path, "/generate");
        assert_eq!(config.method, "POST");
        assert!(!config.parameters.is_empty());
    }
}
