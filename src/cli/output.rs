//! Output formatting for multiple formats
//!
//! Formatters for JSON, YAML, human-readable text, and raw Dockerfile
//! output. Each formatter applies consistent styling and structure.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::ComfypackConfig;
use crate::resolver::node_resolver::WorkflowResolution;
use crate::workflow::analyzer::WorkflowAnalysis;
use crate::workflow::dependencies::DependencySet;
use crate::workflow::validator::ValidationResult;

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format (human-friendly, version-control friendly)
    Yaml,
    /// Human-readable formatted text
    Human,
    /// Raw Dockerfile text (build command only)
    Dockerfile,
}

/// Full result of a `build` run.
#[derive(Debug, Serialize)]
pub struct BuildReport {
    pub analysis: WorkflowAnalysis,
    pub dependencies: DependencySet,
    pub resolution: WorkflowResolution,
    pub dockerfile: String,
}

/// Full result of an `analyze` run.
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub analysis: WorkflowAnalysis,
    pub dependencies: DependencySet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<crate::api::params::ApiParameter>>,
}

/// Output formatter for pipeline results
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_build(&self, report: &BuildReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(report).context("Failed to serialize build report to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(report).context("Failed to serialize build report to YAML")
            }
            OutputFormat::Dockerfile => Ok(report.dockerfile.clone()),
            OutputFormat::Human => Ok(self.format_build_human(report)),
        }
    }

    pub fn format_analysis(&self, report: &AnalysisReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report)
                .context("Failed to serialize analysis report to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(report).context("Failed to serialize analysis report to YAML")
            }
            OutputFormat::Dockerfile | OutputFormat::Human => {
                Ok(self.format_analysis_human(report))
            }
        }
    }

    pub fn format_validation(&self, result: &ValidationResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(result)
                .context("Failed to serialize validation result to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(result)
                .context("Failed to serialize validation result to YAML"),
            OutputFormat::Dockerfile | OutputFormat::Human => {
                Ok(self.format_validation_human(result))
            }
        }
    }

    pub fn format_config(&self, config: &ComfypackConfig) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&config.to_display_map())
                .context("Failed to serialize config to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(&config.to_display_map())
                .context("Failed to serialize config to YAML"),
            OutputFormat::Dockerfile | OutputFormat::Human => Ok(config.to_string()),
        }
    }

    // Human-readable formatting

    fn format_build_human(&self, report: &BuildReport) -> String {
        let mut output = String::new();

        if report.resolution.unresolved.is_empty() {
            output.push_str("\u{2713} Workflow Build Report\n");
        } else {
            output.push_str("\u{26A0} Workflow Build Report (Unresolved Nodes)\n");
        }
        output.push_str(&"\u{2501}".repeat(42));
        output.push_str("\n\n");

        output.push_str(&self.format_analysis_human(&AnalysisReport {
            analysis: report.analysis.clone(),
            dependencies: report.dependencies.clone(),
            parameters: None,
        }));

        output.push_str("Resolution:\n");
        if report.resolution.resolved.is_empty() {
            output.push_str("\u{2514}\u{2500} (no custom nodes resolved)\n");
        } else {
            let count = report.resolution.resolved.len();
            for (i, meta) in report.resolution.resolved.values().enumerate() {
                let connector = if i == count - 1 { "\u{2514}" } else { "\u{251C}" };
                let marker = if meta.inferred { " (inferred)" } else { "" };
                output.push_str(&format!(
                    "{}\u{2500} {} \u{2192} {}{}\n",
                    connector, meta.name, meta.repository, marker
                ));
            }
        }
        if !report.resolution.unresolved.is_empty() {
            output.push_str(&format!(
                "\nUnresolved: {}\n",
                report.resolution.unresolved.join(", ")
            ));
        }
        output.push_str(&format!(
            "\nDockerfile: {} lines\n",
            report.dockerfile.lines().count()
        ));
        output
    }

    fn format_analysis_human(&self, report: &AnalysisReport) -> String {
        let mut output = String::new();

        output.push_str("Nodes:\n");
        output.push_str(&format!("\u{251C}\u{2500} Total:    {}\n", report.analysis.total_nodes));
        output.push_str(&format!(
            "\u{251C}\u{2500} Builtin:  {}\n",
            report.analysis.builtin_nodes
        ));
        output.push_str(&format!(
            "\u{2514}\u{2500} Custom:   {}\n\n",
            report.analysis.custom_nodes
        ));

        if !report.dependencies.models.is_empty() {
            output.push_str("Models:\n");
            let total = report.dependencies.models.len();
            for (i, (category, files)) in report.dependencies.models.iter().enumerate() {
                let connector = if i == total - 1 { "\u{2514}" } else { "\u{251C}" };
                let names: Vec<&str> = files.iter().map(String::as_str).collect();
                output.push_str(&format!(
                    "{}\u{2500} {}: {}\n",
                    connector,
                    category,
                    names.join(", ")
                ));
            }
            output.push('\n');
        }

        if !report.analysis.custom_node_types.is_empty() {
            output.push_str("Custom node types:\n");
            let total = report.analysis.custom_node_types.len();
            for (i, class_type) in report.analysis.custom_node_types.iter().enumerate() {
                let connector = if i == total - 1 { "\u{2514}" } else { "\u{251C}" };
                output.push_str(&format!("{}\u{2500} {}\n", connector, class_type));
            }
            output.push('\n');
        }

        if !report.dependencies.python_packages.is_empty() {
            let packages: Vec<&str> = report
                .dependencies
                .python_packages
                .iter()
                .map(String::as_str)
                .collect();
            output.push_str(&format!("Python packages: {}\n\n", packages.join(", ")));
        }

        if let Some(parameters) = &report.parameters {
            output.push_str(&format!("API parameters: {}\n", parameters.len()));
            for param in parameters {
                output.push_str(&format!(
                    "  {} ({:?}, default {})\n",
                    param.name, param.kind, param.default
                ));
            }
            output.push('\n');
        }

        output
    }

    fn format_validation_human(&self, result: &ValidationResult) -> String {
        let mut output = String::new();

        if result.is_valid {
            output.push_str("\u{2713} Workflow is valid\n");
        } else {
            output.push_str("\u{2717} Workflow is invalid\n");
        }

        if !result.errors.is_empty() {
            output.push_str("\nErrors:\n");
            for error in &result.errors {
                output.push_str(&format!("  \u{2717} {}\n", error));
            }
        }
        if !result.warnings.is_empty() {
            output.push_str("\nWarnings:\n");
            for warning in &result.warnings {
                output.push_str(&format!("  \u{26A0} {}\n", warning));
            }
        }
        if let Some(node_count) = result.metadata.get("node_count") {
            output.push_str(&format!("\nNodes: {}\n", node_count));
        }

        output
    }
}
