use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Workflow-to-container dependency resolution for ComfyUI
#[derive(Parser, Debug)]
#[command(
    name = "comfypack",
    about = "Resolve ComfyUI workflow dependencies and generate container definitions",
    version,
    author,
    long_about = "comfypack parses ComfyUI workflow JSON (API or UI export format), extracts \
                  model and custom node dependencies, resolves custom node class names to \
                  source repositories via the community registry, and generates a Dockerfile \
                  that reproduces the workflow's environment."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(
        short = 'v',
        long,
        global = true,
        help = "Increase verbosity (can be used multiple times)"
    )]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Resolve a workflow and generate a container definition",
        long_about = "Parses the workflow, resolves custom node dependencies against the \
                      registry, and emits a Dockerfile (or a structured build report).\n\n\
                      Examples:\n  \
                      comfypack build workflow.json\n  \
                      comfypack build workflow.json --cuda -o Dockerfile\n  \
                      comfypack build workflow.json --format json\n  \
                      comfypack build workflow.json --offline"
    )]
    Build(BuildArgs),

    #[command(
        about = "Validate a workflow file",
        long_about = "Checks workflow structure: link integrity, node types, cycles.\n\n\
                      Examples:\n  \
                      comfypack validate workflow.json\n  \
                      comfypack validate workflow.json --strict"
    )]
    Validate(ValidateArgs),

    #[command(
        about = "Analyze a workflow's dependencies without resolving",
        long_about = "Classifies nodes, extracts model and custom node dependencies, and \
                      derives the API parameter schema. Purely offline.\n\n\
                      Examples:\n  \
                      comfypack analyze workflow.json\n  \
                      comfypack analyze workflow.json --format yaml --params"
    )]
    Analyze(AnalyzeArgs),

    #[command(
        about = "Show the effective configuration",
        long_about = "Prints the configuration after applying COMFYPACK_* environment \
                      variables over the built-in defaults.\n\n\
                      Examples:\n  \
                      comfypack config\n  \
                      comfypack config --format json"
    )]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    #[arg(value_name = "WORKFLOW", help = "Path to the workflow JSON file")]
    pub workflow_path: PathBuf,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "dockerfile",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(long, value_name = "IMAGE", help = "Base container image")]
    pub base_image: Option<String>,

    #[arg(long, help = "Use a CUDA base image with GPU PyTorch")]
    pub cuda: bool,

    #[arg(long, value_name = "URL", help = "Node registry endpoint")]
    pub registry_url: Option<String>,

    #[arg(
        long,
        value_name = "SECONDS",
        help = "Registry request timeout in seconds"
    )]
    pub timeout: Option<u64>,

    #[arg(long, help = "Skip registry resolution; all custom nodes stay unresolved")]
    pub offline: bool,

    #[arg(
        long = "pin",
        value_name = "CLASS=URL",
        help = "Manual resolution override, repeatable"
    )]
    pub pins: Vec<String>,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to file instead of stdout"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(value_name = "WORKFLOW", help = "Path to the workflow JSON file")]
    pub workflow_path: PathBuf,

    #[arg(long, help = "Treat warnings as errors")]
    pub strict: bool,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(value_name = "WORKFLOW", help = "Path to the workflow JSON file")]
    pub workflow_path: PathBuf,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(long, help = "Include the derived API parameter schema")]
    pub params: bool,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to file instead of stdout"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
    Dockerfile,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
            OutputFormatArg::Dockerfile => super::output::OutputFormat::Dockerfile,
        }
    }
}

/// Parses a `CLASS=URL` pin argument.
pub fn parse_pin(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((class, url)) if !class.is_empty() && !url.is_empty() => {
            Ok((class.to_string(), url.to_string()))
        }
        _ => Err(format!("Invalid pin '{raw}', expected CLASS=URL")),
    }
}
