//! Workflow parsing, validation and static analysis.

pub mod analyzer;
pub mod constants;
pub mod dependencies;
pub mod graph;
pub mod parser;
pub mod validator;

pub use analyzer::{NodeAnalyzer, WorkflowAnalysis};
pub use dependencies::{CustomNodeOccurrence, DependencyExtractor, DependencySet};
pub use graph::{InputValue, Node, WorkflowGraph};
pub use parser::{MalformedWorkflowError, ParsedWorkflow, WorkflowFormat, WorkflowParser};
pub use validator::{ValidationResult, WorkflowValidator};
