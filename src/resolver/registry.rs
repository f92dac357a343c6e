//! HTTP oracle backed by a ComfyUI-Manager-style node registry.
//!
//! The registry publishes one JSON document mapping repository URLs to
//! the node class names each extension provides, plus auxiliary metadata
//! (`title_aux`, optional `pip` requirements). The oracle fetches the map
//! once, inverts it to class name -> repository, and answers batches from
//! the inverted index.
//!
//! Construction probes the registry; total unreachability is fatal at
//! that point ([`ResolverError::Unavailable`]) since no resolution of any
//! kind can proceed without it. A fetch failure later, during an actual
//! batch call, is not fatal: the resolver degrades that batch to
//! all-unresolved.

use crate::resolver::oracle::{BatchResolution, OracleError, ResolutionOracle, ResolvedNode};
use crate::resolver::ResolverError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Default node map published by ComfyUI-Manager.
pub const DEFAULT_REGISTRY_URL: &str =
    "https://raw.githubusercontent.com/ltdrdata/ComfyUI-Manager/main/extension-node-map.json";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct RegistryOracle {
    endpoint: String,
    http_client: Client,
    timeout: Duration,
    /// Inverted index, fetched lazily on the first batch call.
    index: Mutex<Option<HashMap<String, ResolvedNode>>>,
}

impl RegistryOracle {
    /// Connects to the registry, probing reachability first.
    pub async fn connect(endpoint: String, timeout: Duration) -> Result<Self, ResolverError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResolverError::Unavailable(format!("http client: {e}")))?;

        debug!(endpoint = %endpoint, "probing node registry");
        let probe = http_client.head(&endpoint).send().await;
        match probe {
            Ok(response) if response.status().is_success() => {
                info!(endpoint = %endpoint, "node registry reachable");
            }
            Ok(response) => {
                return Err(ResolverError::Unavailable(format!(
                    "registry returned status {}",
                    response.status()
                )));
            }
            Err(e) => {
                return Err(ResolverError::Unavailable(format!(
                    "cannot reach registry at {endpoint}: {e}"
                )));
            }
        }

        Ok(Self {
            endpoint,
            http_client,
            timeout,
            index: Mutex::new(None),
        })
    }

    pub async fn connect_default() -> Result<Self, ResolverError> {
        Self::connect(
            DEFAULT_REGISTRY_URL.to_string(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
        .await
    }

    async fn fetch_index(&self) -> Result<HashMap<String, ResolvedNode>, OracleError> {
        let response = self
            .http_client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout(self.timeout.as_secs())
                } else {
                    OracleError::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(OracleError::Network(format!(
                "registry returned status {}",
                response.status()
            )));
        }

        let document: Value = response
            .json()
            .await
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;

        Ok(Self::invert_node_map(&document))
    }

    /// Inverts `{repo_url: [[class names...], {title_aux, pip?}], ...}`
    /// into class name -> resolved record. Malformed entries are skipped.
    fn invert_node_map(document: &Value) -> HashMap<String, ResolvedNode> {
        let mut index = HashMap::new();
        let Some(map) = document.as_object() else {
            return index;
        };

        for (url, entry) in map {
            let Some(parts) = entry.as_array() else {
                continue;
            };
            let Some(class_names) = parts.first().and_then(Value::as_array) else {
                continue;
            };
            let meta = parts.get(1).and_then(Value::as_object);

            let name = meta
                .and_then(|m| m.get("title_aux"))
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or_else(|| repo_basename(url));
            let pip: Vec<String> = meta
                .and_then(|m| m.get("pip"))
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default();

            for class_name in class_names.iter().filter_map(Value::as_str) {
                match index.entry(class_name.to_string()) {
                    // First registration wins on conflicting class names,
                    // but the conflict is surfaced in the log.
                    Entry::Occupied(existing) => {
                        warn!(
                            class_type = %class_name,
                            kept = %existing.get().url,
                            ignored = %url,
                            "class name registered by multiple repositories"
                        );
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(ResolvedNode {
                            url: url.clone(),
                            name: name.clone(),
                            hash: None,
                            pip: pip.clone(),
                        });
                    }
                }
            }
        }

        index
    }
}

/// Last path segment of a repository URL, `.git` stripped.
fn repo_basename(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url)
        .trim_end_matches(".git")
        .to_string()
}

#[async_trait]
impl ResolutionOracle for RegistryOracle {
    async fn resolve_batch(&self, names: &[String]) -> Result<BatchResolution, OracleError> {
        let mut index_guard = self.index.lock().await;
        if index_guard.is_none() {
            debug!(endpoint = %self.endpoint, "fetching registry node map");
            let index = self.fetch_index().await?;
            info!(classes = index.len(), "registry node map loaded");
            *index_guard = Some(index);
        }
        let index = index_guard.as_ref().expect("just populated");

        let mut result = BatchResolution::default();
        for name in names {
            match index.get(name) {
                Some(node) => {
                    result.resolved.insert(name.clone(), node.clone());
                }
                None => {
                    warn!(class_type = %name, "registry has no entry for node class");
                    result.unresolved.push(name.clone());
                }
            }
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "comfyui-manager-registry"
    }
}
