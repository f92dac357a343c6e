//! Custom node resolution: class names to pinned source repositories.
//!
//! Resolution order per class name: caller-supplied manual override, then
//! the in-process cache, then one batched oracle call for whatever is
//! left. Individual misses land in the unresolved list; a failed oracle
//! call degrades that whole batch to unresolved. Nothing here raises
//! after construction.

use crate::resolver::cache::ResolutionCache;
use crate::resolver::metadata::NodeMetadata;
use crate::resolver::oracle::{ResolutionOracle, ResolvedNode};
use crate::workflow::constants::{injected_extension_for_scheduler, is_core_scheduler};
use crate::workflow::graph::WorkflowGraph;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Node types whose scheduler option list is commonly patched by
/// third-party extensions.
const SAMPLER_NODE_TYPES: &[&str] = &["KSampler", "KSamplerAdvanced"];

/// Outcome of one resolution run, keyed by repository URL.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct WorkflowResolution {
    pub resolved: BTreeMap<String, NodeMetadata>,
    pub unresolved: Vec<String>,
}

impl WorkflowResolution {
    /// Resolved entries in map order, for the order resolver.
    pub fn into_metadata(self) -> Vec<NodeMetadata> {
        self.resolved.into_values().collect()
    }
}

pub struct NodeResolver {
    oracle: Arc<dyn ResolutionOracle>,
    cache: ResolutionCache,
    cache_enabled: bool,
}

impl NodeResolver {
    pub fn new(oracle: Arc<dyn ResolutionOracle>) -> Self {
        Self {
            oracle,
            cache: ResolutionCache::new(),
            cache_enabled: true,
        }
    }

    /// Disables the in-process cache when `enabled` is false; every run
    /// then consults the oracle for non-overridden names.
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Resolves a set of custom node class names.
    ///
    /// `manual_overrides` maps class_type -> repository URL and always
    /// wins without consulting cache or oracle.
    pub async fn resolve_custom_nodes(
        &self,
        class_types: &BTreeSet<String>,
        manual_overrides: &BTreeMap<String, String>,
    ) -> WorkflowResolution {
        let mut resolved: BTreeMap<String, NodeMetadata> = BTreeMap::new();
        let mut remaining: Vec<String> = Vec::new();

        for class_type in class_types {
            if let Some(url) = manual_overrides.get(class_type) {
                debug!(class_type = %class_type, url = %url, "manual override");
                let meta = NodeMetadata::new(class_type.clone(), url.clone());
                Self::merge_resolved(&mut resolved, meta);
            } else {
                remaining.push(class_type.clone());
            }
        }

        let misses = if self.cache_enabled {
            let (hits, misses) = self.cache.partition(&remaining);
            for (class_type, node) in hits {
                debug!(class_type = %class_type, "resolution cache hit");
                Self::merge_resolved(&mut resolved, NodeMetadata::from_resolved(&node));
            }
            misses
        } else {
            remaining
        };

        let mut unresolved = Vec::new();
        if !misses.is_empty() {
            match self.oracle.resolve_batch(&misses).await {
                Ok(batch) => {
                    if self.cache_enabled {
                        self.cache.insert_all(
                            batch
                                .resolved
                                .iter()
                                .map(|(k, v)| (k.clone(), v.clone()))
                                .collect::<Vec<(String, ResolvedNode)>>(),
                        );
                    }
                    for node in batch.resolved.values() {
                        Self::merge_resolved(&mut resolved, NodeMetadata::from_resolved(node));
                    }
                    unresolved = batch.unresolved;
                }
                Err(e) => {
                    // Oracle failure is non-fatal: the whole batch is
                    // reported unresolved.
                    warn!(oracle = self.oracle.name(), error = %e,
                          "batch resolution failed; marking batch unresolved");
                    unresolved = misses;
                }
            }
        }

        info!(
            resolved = resolved.len(),
            unresolved = unresolved.len(),
            "custom node resolution finished"
        );
        WorkflowResolution {
            resolved,
            unresolved,
        }
    }

    /// Resolves every custom node in a graph and augments the result with
    /// injected-extension inference.
    pub async fn resolve_workflow(
        &self,
        graph: &WorkflowGraph,
        manual_overrides: &BTreeMap<String, String>,
    ) -> WorkflowResolution {
        let class_types: BTreeSet<String> = graph
            .iter()
            .filter(|n| {
                !n.class_type.is_empty()
                    && !crate::workflow::constants::is_builtin_node(&n.class_type)
            })
            .map(|n| n.class_type.clone())
            .collect();

        let mut resolution = self
            .resolve_custom_nodes(&class_types, manual_overrides)
            .await;

        for (url, meta) in self.infer_injected_extensions(graph) {
            // Inference is advisory: never replace an explicit resolution
            // for the same repository.
            resolution.resolved.entry(url).or_insert(meta);
        }

        resolution
    }

    /// Detects extensions that inject behavior into builtin nodes.
    ///
    /// A builtin sampler carrying a literal scheduler token outside the
    /// first-party set implies the extension that patches that token into
    /// the option list. The node itself stays builtin, but the image
    /// still needs the repository installed.
    pub fn infer_injected_extensions(
        &self,
        graph: &WorkflowGraph,
    ) -> BTreeMap<String, NodeMetadata> {
        let mut inferred = BTreeMap::new();

        for node in graph.iter() {
            if !SAMPLER_NODE_TYPES.contains(&node.class_type.as_str()) {
                continue;
            }
            let Some(token) = node.inputs.get("scheduler").and_then(|v| v.as_str()) else {
                continue;
            };
            if token.is_empty() || is_core_scheduler(token) {
                continue;
            }
            if let Some((url, name)) = injected_extension_for_scheduler(token) {
                debug!(
                    node = %node.id,
                    scheduler = %token,
                    repository = url,
                    "scheduler token implies injected extension"
                );
                inferred.insert(
                    url.to_string(),
                    NodeMetadata::new(name, url).inferred(true),
                );
            } else {
                warn!(
                    node = %node.id,
                    scheduler = %token,
                    "non-core scheduler token with no known extension mapping"
                );
            }
        }

        inferred
    }

    /// Entries currently held by the resolution cache.
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    fn merge_resolved(resolved: &mut BTreeMap<String, NodeMetadata>, meta: NodeMetadata) {
        match resolved.get_mut(&meta.repository) {
            // Two class names from the same repository: keep one entry,
            // union the pip requirements.
            Some(existing) => {
                for dep in meta.python_dependencies {
                    if !existing.python_dependencies.contains(&dep) {
                        existing.python_dependencies.push(dep);
                    }
                }
            }
            None => {
                resolved.insert(meta.repository.clone(), meta);
            }
        }
    }
}
