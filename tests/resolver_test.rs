//! Resolver integration tests
//!
//! Drives the full resolution path over parsed fixtures with a
//! table-backed oracle, covering overrides, caching, injected-extension
//! inference, and installation ordering.

use comfypack::resolver::metadata::NodeMetadata;
use comfypack::resolver::node_resolver::NodeResolver;
use comfypack::resolver::oracle::{ResolvedNode, StaticOracle};
use comfypack::resolver::order::resolve_dependency_order;
use comfypack::workflow::graph::WorkflowGraph;
use comfypack::workflow::parser::WorkflowParser;
use std::collections::BTreeMap;
use std::sync::Arc;

const API_FIXTURE: &str = include_str!("fixtures/txt2img_api.json");
const INJECTED_FIXTURE: &str = include_str!("fixtures/injected_scheduler_api.json");

fn parse(doc: &str) -> WorkflowGraph {
    let raw: serde_json::Value = serde_json::from_str(doc).unwrap();
    WorkflowParser::new().parse(&raw).unwrap().graph
}

fn impact_pack() -> ResolvedNode {
    ResolvedNode {
        url: "https://github.com/ltdrdata/ComfyUI-Impact-Pack".to_string(),
        name: "ComfyUI-Impact-Pack".to_string(),
        hash: None,
        pip: vec!["ultralytics".to_string()],
    }
}

#[tokio::test]
async fn test_resolve_fixture_workflow() {
    let oracle = Arc::new(
        StaticOracle::default().with_entry("UltralyticsDetectorProvider", impact_pack()),
    );
    let resolver = NodeResolver::new(oracle);

    let resolution = resolver
        .resolve_workflow(&parse(API_FIXTURE), &BTreeMap::new())
        .await;

    assert!(resolution.unresolved.is_empty());
    assert_eq!(resolution.resolved.len(), 1);
    let meta = &resolution.resolved["https://github.com/ltdrdata/ComfyUI-Impact-Pack"];
    assert_eq!(meta.name, "ComfyUI-Impact-Pack");
    assert!(meta.python_dependencies.contains(&"ultralytics".to_string()));
    assert!(!meta.inferred);
}

#[tokio::test]
async fn test_unknown_node_lands_in_unresolved() {
    let resolver = NodeResolver::new(Arc::new(StaticOracle::default()));

    let resolution = resolver
        .resolve_workflow(&parse(API_FIXTURE), &BTreeMap::new())
        .await;

    assert!(resolution.resolved.is_empty());
    assert_eq!(
        resolution.unresolved,
        vec!["UltralyticsDetectorProvider".to_string()]
    );
}

#[tokio::test]
async fn test_manual_pin_wins_over_oracle() {
    let oracle = Arc::new(
        StaticOracle::default().with_entry("UltralyticsDetectorProvider", impact_pack()),
    );
    let resolver = NodeResolver::new(oracle.clone());

    let mut overrides = BTreeMap::new();
    overrides.insert(
        "UltralyticsDetectorProvider".to_string(),
        "https://github.com/fork/impact-pack".to_string(),
    );

    let resolution = resolver
        .resolve_workflow(&parse(API_FIXTURE), &overrides)
        .await;

    assert!(resolution
        .resolved
        .contains_key("https://github.com/fork/impact-pack"));
    // Every custom node was pinned, so the oracle was never consulted.
    assert_eq!(oracle.call_count(), 0);
}

#[tokio::test]
async fn test_cache_avoids_repeat_oracle_calls() {
    let oracle = Arc::new(
        StaticOracle::default().with_entry("UltralyticsDetectorProvider", impact_pack()),
    );
    let resolver = NodeResolver::new(oracle.clone());
    let graph = parse(API_FIXTURE);

    resolver.resolve_workflow(&graph, &BTreeMap::new()).await;
    resolver.resolve_workflow(&graph, &BTreeMap::new()).await;

    assert_eq!(oracle.call_count(), 1);
}

#[tokio::test]
async fn test_injected_scheduler_implies_extension() {
    let resolver = NodeResolver::new(Arc::new(StaticOracle::default()));

    let resolution = resolver
        .resolve_workflow(&parse(INJECTED_FIXTURE), &BTreeMap::new())
        .await;

    // The workflow has no custom node types, yet the beta57 scheduler
    // token implies the extension that provides it.
    let meta = resolution
        .resolved
        .get("https://github.com/ClownsharkBatwing/RES4LYF")
        .expect("injected extension inferred");
    assert_eq!(meta.name, "RES4LYF");
    assert!(meta.inferred);
    assert!(resolution.unresolved.is_empty());
}

#[tokio::test]
async fn test_core_scheduler_triggers_no_inference() {
    let resolver = NodeResolver::new(Arc::new(StaticOracle::default()));

    let resolution = resolver
        .resolve_workflow(&parse(API_FIXTURE), &BTreeMap::new())
        .await;

    // The txt2img fixture uses the core "normal" scheduler.
    assert!(!resolution
        .resolved
        .keys()
        .any(|url| url.contains("RES4LYF")));
}

#[test]
fn test_install_order_honors_dependencies() {
    let base = NodeMetadata::new("base_pack", "https://github.com/x/base");
    let mut dependent = NodeMetadata::new("addon_pack", "https://github.com/x/addon");
    dependent.depends_on = vec!["base_pack".to_string()];

    let ordered = resolve_dependency_order(vec![dependent, base]);
    let names: Vec<&str> = ordered.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["base_pack", "addon_pack"]);
}

#[test]
fn test_install_order_cycle_terminates() {
    let mut a = NodeMetadata::new("a", "https://github.com/x/a");
    a.depends_on = vec!["b".to_string()];
    let mut b = NodeMetadata::new("b", "https://github.com/x/b");
    b.depends_on = vec!["a".to_string()];

    let ordered = resolve_dependency_order(vec![a, b]);
    assert_eq!(ordered.len(), 2);
}
