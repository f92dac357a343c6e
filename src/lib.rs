//! comfypack - workflow-to-container dependency resolution for ComfyUI
//!
//! This library parses ComfyUI workflow JSON (both the API export and the
//! UI editor format), extracts the models, custom node extensions, and
//! python packages a workflow depends on, resolves custom node class
//! names to source repositories via the community registry, and generates
//! a Dockerfile that reproduces the workflow's environment.
//!
//! # Core Concepts
//!
//! - **Canonical Graph**: Both workflow serializations normalize into one
//!   [`WorkflowGraph`] so everything downstream is format-agnostic
//! - **Resolution Oracle**: Pluggable lookup from class names to
//!   repositories; production uses the ComfyUI-Manager registry, tests
//!   use an in-process table
//! - **Injected Extensions**: Builtin nodes can carry option tokens that
//!   only exist once a third-party extension is installed; these are
//!   inferred and flagged as advisory dependencies
//!
//! # Example Usage
//!
//! ```ignore
//! use comfypack::{NodeResolver, WorkflowParser, DependencyExtractor, DockerfileBuilder};
//! use comfypack::resolver::registry::RegistryOracle;
//! use comfypack::resolver::order::resolve_dependency_order;
//! use std::sync::Arc;
//!
//! async fn build(raw: &serde_json::Value) -> Result<String, Box<dyn std::error::Error>> {
//!     let parsed = WorkflowParser::default().parse(raw)?;
//!     let dependencies = DependencyExtractor::default().extract_all(&parsed.graph);
//!
//!     let oracle = Arc::new(RegistryOracle::connect_default().await?);
//!     let resolver = NodeResolver::new(oracle);
//!     let resolution = resolver.resolve_workflow(&parsed.graph, &Default::default()).await;
//!
//!     let ordered = resolve_dependency_order(resolution.into_metadata());
//!     let dockerfile = DockerfileBuilder::new()
//!         .build_for_workflow(&dependencies, &ordered, "python:3.11-slim", false);
//!     Ok(dockerfile)
//! }
//! ```
//!
//! # Project Structure
//!
//! - [`workflow`]: Parsing, validation, analysis, dependency extraction
//! - [`resolver`]: Custom node resolution, caching, installation ordering
//! - [`container`]: Dockerfile generation and install planning
//! - [`api`]: Parameter schema derivation and request sanitization

// Public modules
pub mod api;
pub mod cli;
pub mod config;
pub mod container;
pub mod resolver;
pub mod util;
pub mod workflow;

// Re-export key types for convenient access
pub use config::{ComfypackConfig, ConfigError};
pub use container::dockerfile::DockerfileBuilder;
pub use container::installer::{InstallPlanError, InstallPlanner};
pub use resolver::metadata::NodeMetadata;
pub use resolver::node_resolver::{NodeResolver, WorkflowResolution};
pub use resolver::oracle::{BatchResolution, OracleError, ResolutionOracle, ResolvedNode};
pub use resolver::ResolverError;
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};
pub use workflow::analyzer::{NodeAnalyzer, WorkflowAnalysis};
pub use workflow::dependencies::{DependencyExtractor, DependencySet};
pub use workflow::graph::{InputValue, Node, WorkflowGraph};
pub use workflow::parser::{MalformedWorkflowError, ParsedWorkflow, WorkflowFormat, WorkflowParser};
pub use workflow::validator::{ValidationResult, WorkflowValidator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
