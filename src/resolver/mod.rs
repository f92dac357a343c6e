//! Custom node resolution: oracle abstraction, cache, resolver and
//! installation ordering.

pub mod cache;
pub mod metadata;
pub mod node_resolver;
pub mod oracle;
pub mod order;
pub mod registry;

pub use cache::ResolutionCache;
pub use metadata::NodeMetadata;
pub use node_resolver::{NodeResolver, WorkflowResolution};
pub use oracle::{BatchResolution, OracleError, ResolutionOracle, ResolvedNode, StaticOracle};
pub use order::resolve_dependency_order;
pub use registry::{RegistryOracle, DEFAULT_REGISTRY_URL};

use thiserror::Error;

/// Fatal resolver failures. Only raised at construction time, when the
/// external resolution mechanism cannot be reached at all; per-name
/// misses and failed batches are reported, never raised.
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("resolution registry unavailable: {0}")]
    Unavailable(String),
}
