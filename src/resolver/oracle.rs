//! Resolution oracle abstraction.
//!
//! The oracle maps custom node class names to source repositories. It is
//! an injected capability so the resolver never hardcodes a transport:
//! production uses the HTTP [`RegistryOracle`](crate::resolver::registry::RegistryOracle),
//! tests use the in-process [`StaticOracle`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// Errors from a single oracle call. The resolver treats every variant as
/// "this batch resolved nothing". Oracle call failures never abort a
/// resolution run.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {0} seconds")]
    Timeout(u64),
    #[error("invalid response from registry: {0}")]
    InvalidResponse(String),
}

/// One resolved custom node: repository plus install metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedNode {
    pub url: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default)]
    pub pip: Vec<String>,
}

/// Result of a batched resolution call. Partial success is first-class:
/// `resolved` and `unresolved` partition the requested names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResolution {
    pub resolved: BTreeMap<String, ResolvedNode>,
    pub unresolved: Vec<String>,
}

/// Capability to resolve custom node class names to repositories.
#[async_trait]
pub trait ResolutionOracle: Send + Sync {
    /// Resolves a batch of class names in one round trip. Names the
    /// oracle does not know go into `unresolved`; only transport-level
    /// failures return `Err`.
    async fn resolve_batch(&self, names: &[String]) -> Result<BatchResolution, OracleError>;

    /// Human-readable oracle identifier for logs.
    fn name(&self) -> &str;
}

/// Table-backed oracle for tests and offline use. Counts calls so tests
/// can assert cache behavior.
#[derive(Debug, Default)]
pub struct StaticOracle {
    table: HashMap<String, ResolvedNode>,
    calls: AtomicUsize,
}

impl StaticOracle {
    pub fn new(table: HashMap<String, ResolvedNode>) -> Self {
        Self {
            table,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_entry(mut self, class_type: &str, node: ResolvedNode) -> Self {
        self.table.insert(class_type.to_string(), node);
        self
    }

    /// Number of resolve_batch invocations so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResolutionOracle for StaticOracle {
    async fn resolve_batch(&self, names: &[String]) -> Result<BatchResolution, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut result = BatchResolution::default();
        for name in names {
            match self.table.get(name) {
                Some(node) => {
                    result.resolved.insert(name.clone(), node.clone());
                }
                None => result.unresolved.push(name.clone()),
            }
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "static"
    }
}
