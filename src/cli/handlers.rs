//! Command handlers for the CLI
//!
//! Each handler runs one subcommand end to end and returns a process
//! exit code. Errors are reported to stderr; structured output goes to
//! stdout or the requested file.

use crate::api::params::extract_parameters;
use crate::cli::commands::{parse_pin, AnalyzeArgs, BuildArgs, ConfigArgs, ValidateArgs};
use crate::cli::output::{AnalysisReport, BuildReport, OutputFormatter};
use crate::config::ComfypackConfig;
use crate::container::dockerfile::DockerfileBuilder;
use crate::container::installer::InstallPlanner;
use crate::resolver::node_resolver::NodeResolver;
use crate::resolver::oracle::{ResolutionOracle, StaticOracle};
use crate::resolver::order::resolve_dependency_order;
use crate::resolver::registry::RegistryOracle;
use crate::workflow::analyzer::NodeAnalyzer;
use crate::workflow::dependencies::DependencyExtractor;
use crate::workflow::graph::WorkflowGraph;
use crate::workflow::parser::WorkflowParser;
use crate::workflow::validator::WorkflowValidator;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Handles the `build` subcommand
pub async fn handle_build(args: &BuildArgs, quiet: bool) -> i32 {
    match run_build(args, quiet).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

/// Handles the `validate` subcommand
pub async fn handle_validate(args: &ValidateArgs) -> i32 {
    match run_validate(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

/// Handles the `analyze` subcommand
pub async fn handle_analyze(args: &AnalyzeArgs) -> i32 {
    match run_analyze(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

/// Handles the `config` subcommand
pub async fn handle_config(args: &ConfigArgs) -> i32 {
    match run_config(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

async fn run_build(args: &BuildArgs, quiet: bool) -> Result<i32> {
    let mut config = ComfypackConfig::default();
    if let Some(url) = &args.registry_url {
        config.registry_url = url.clone();
    }
    if let Some(timeout) = args.timeout {
        config.request_timeout_secs = timeout;
    }
    if let Some(image) = &args.base_image {
        config.base_image = image.clone();
    }
    config.validate().context("Invalid configuration")?;

    let overrides = parse_pins(&args.pins)?;
    let graph = load_graph(&args.workflow_path)?;

    let validation = WorkflowValidator::with_known_types(overrides.keys().cloned())
        .validate(&graph, false);
    if !validation.is_valid {
        for error in &validation.errors {
            eprintln!("Error: {}", error);
        }
        return Ok(1);
    }
    for warning in &validation.warnings {
        warn!("{}", warning);
    }

    let analysis = NodeAnalyzer::default().analyze(&graph);
    let dependencies = DependencyExtractor::default().extract_all(&graph);

    let spinner = create_spinner(quiet, "Resolving custom nodes...");
    let oracle = select_oracle(args.offline, &config).await;
    let resolver = NodeResolver::new(oracle).with_cache_enabled(config.cache_enabled);
    let resolution = resolver.resolve_workflow(&graph, &overrides).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    info!(
        resolved = resolution.resolved.len(),
        unresolved = resolution.unresolved.len(),
        "resolution complete"
    );

    let ordered = resolve_dependency_order(resolution.clone().into_metadata());

    if let Some(target_version) = &config.comfyui_version {
        if let Err(e) = InstallPlanner::new().check_compatibility(&ordered, target_version) {
            warn!("compatibility check failed: {}", e);
        }
    }

    let dockerfile = DockerfileBuilder::new().build_for_workflow(
        &dependencies,
        &ordered,
        &config.base_image,
        args.cuda,
    );

    let report = BuildReport {
        analysis,
        dependencies,
        resolution,
        dockerfile,
    };

    let formatter = OutputFormatter::new(args.format.into());
    let output = formatter.format_build(&report)?;
    write_output(&output, args.output.as_deref())?;

    Ok(0)
}

fn run_validate(args: &ValidateArgs) -> Result<i32> {
    let graph = load_graph(&args.workflow_path)?;

    let result = WorkflowValidator::new().validate(&graph, args.strict);

    let formatter = OutputFormatter::new(args.format.into());
    println!("{}", formatter.format_validation(&result)?);

    Ok(if result.is_valid { 0 } else { 1 })
}

fn run_analyze(args: &AnalyzeArgs) -> Result<i32> {
    let graph = load_graph(&args.workflow_path)?;

    let analysis = NodeAnalyzer::default().analyze(&graph);
    let dependencies = DependencyExtractor::default().extract_all(&graph);
    let parameters = args.params.then(|| extract_parameters(&graph));

    let report = AnalysisReport {
        analysis,
        dependencies,
        parameters,
    };

    let formatter = OutputFormatter::new(args.format.into());
    let output = formatter.format_analysis(&report)?;
    write_output(&output, args.output.as_deref())?;

    Ok(0)
}

fn run_config(args: &ConfigArgs) -> Result<i32> {
    let config = ComfypackConfig::default();
    config.validate().context("Invalid configuration")?;

    let formatter = OutputFormatter::new(args.format.into());
    println!("{}", formatter.format_config(&config)?);

    Ok(0)
}

/// Reads and parses a workflow file into the canonical graph.
fn load_graph(path: &Path) -> Result<WorkflowGraph> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read workflow file: {}", path.display()))?;
    let raw: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Workflow file is not valid JSON: {}", path.display()))?;
    let parsed = WorkflowParser::default()
        .parse(&raw)
        .with_context(|| format!("Malformed workflow: {}", path.display()))?;
    info!(
        format = ?parsed.format,
        nodes = parsed.graph.len(),
        "workflow parsed"
    );
    Ok(parsed.graph)
}

/// Picks the resolution oracle. Offline mode and registry failure both
/// degrade to an empty static oracle, leaving every node unresolved.
async fn select_oracle(offline: bool, config: &ComfypackConfig) -> Arc<dyn ResolutionOracle> {
    if offline {
        info!("offline mode, skipping registry resolution");
        return Arc::new(StaticOracle::default());
    }
    let timeout = Duration::from_secs(config.request_timeout_secs);
    match RegistryOracle::connect(config.registry_url.clone(), timeout).await {
        Ok(oracle) => Arc::new(oracle),
        Err(e) => {
            warn!("registry unavailable, continuing offline: {}", e);
            Arc::new(StaticOracle::default())
        }
    }
}

fn parse_pins(pins: &[String]) -> Result<BTreeMap<String, String>> {
    let mut overrides = BTreeMap::new();
    for pin in pins {
        let (class, url) = parse_pin(pin).map_err(anyhow::Error::msg)?;
        overrides.insert(class, url);
    }
    Ok(overrides)
}

fn write_output(output: &str, target: Option<&Path>) -> Result<()> {
    match target {
        Some(path) => {
            std::fs::write(path, output)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            info!(path = %path.display(), "output written");
        }
        None => println!("{}", output),
    }
    Ok(())
}

fn create_spinner(quiet: bool, message: &str) -> Option<ProgressBar> {
    if quiet {
        return None;
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    Some(spinner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_workflow(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_graph_api_format() {
        let file = write_workflow(
            r#"{"1": {"class_type": "KSampler", "inputs": {"steps": 20}}}"#,
        );
        let graph = load_graph(file.path()).unwrap();
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_load_graph_rejects_invalid_json() {
        let file = write_workflow("not json");
        assert!(load_graph(file.path()).is_err());
    }

    #[test]
    fn test_load_graph_missing_file() {
        assert!(load_graph(Path::new("/nonexistent/workflow.json")).is_err());
    }

    #[test]
    fn test_parse_pins() {
        let pins = vec!["A=https://github.com/x/a".to_string()];
        let overrides = parse_pins(&pins).unwrap();
        assert_eq!(overrides["A"], "https://github.com/x/a");

        assert!(parse_pins(&["broken".to_string()]).is_err());
    }

    #[test]
    fn test_run_config_reports_effective_settings() {
        let args = ConfigArgs {
            format: crate::cli::commands::OutputFormatArg::Human,
        };
        assert_eq!(run_config(&args).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_offline_oracle_selection() {
        let config = ComfypackConfig::default();
        let oracle = select_oracle(true, &config).await;
        assert_eq!(oracle.name(), "static");
    }
}
