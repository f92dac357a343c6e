//! Shell-level install planning for resolved custom node extensions.
//!
//! Produces the commands a container build (or a bare host) would run to
//! materialize an extension list, plus the aggregated requirements file
//! and compatibility checks against a target ComfyUI version.

use crate::resolver::metadata::NodeMetadata;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstallPlanError {
    #[error("invalid repository URL: {0}")]
    InvalidRepository(String),
    #[error("node {name} requires ComfyUI >= {required}, target is {target}")]
    VersionTooOld {
        name: String,
        required: String,
        target: String,
    },
    #[error("node {name} requires ComfyUI <= {required}, target is {target}")]
    VersionTooNew {
        name: String,
        required: String,
        target: String,
    },
}

fn https_repo_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^https://github\.com/[\w.-]+/[\w.-]+(\.git)?/?$").unwrap()
    })
}

fn ssh_repo_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^git@github\.com:[\w.-]+/[\w.-]+(\.git)?$").unwrap())
}

/// Accepts GitHub https and ssh clone URLs, rejects everything else.
pub fn validate_repository_url(url: &str) -> Result<(), InstallPlanError> {
    if https_repo_pattern().is_match(url) || ssh_repo_pattern().is_match(url) {
        Ok(())
    } else {
        Err(InstallPlanError::InvalidRepository(url.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct InstallPlanner {
    /// Target directory inside the image or host.
    pub custom_nodes_dir: String,
}

impl InstallPlanner {
    pub fn new() -> Self {
        Self {
            custom_nodes_dir: "/app/ComfyUI/custom_nodes".to_string(),
        }
    }

    pub fn with_dir(dir: impl Into<String>) -> Self {
        Self {
            custom_nodes_dir: dir.into(),
        }
    }

    /// Shell commands to install a single extension. Validates the
    /// repository URL first so a bad resolution never reaches a shell.
    pub fn install_commands(&self, node: &NodeMetadata) -> Result<Vec<String>, InstallPlanError> {
        validate_repository_url(&node.repository)?;

        let target = format!("{}/{}", self.custom_nodes_dir, node.name);
        let mut commands = vec![format!("git clone {} {}", node.repository, target)];

        if let Some(hash) = &node.commit_hash {
            commands.push(format!("git -C {target} checkout {hash}"));
        }
        if !node.python_dependencies.is_empty() {
            commands.push(format!(
                "pip install --no-cache-dir {}",
                node.python_dependencies.join(" ")
            ));
        }
        // A node shipping its own requirements file installs it too.
        commands.push(format!(
            "if [ -f {target}/requirements.txt ]; then pip install --no-cache-dir -r {target}/requirements.txt; fi"
        ));
        Ok(commands)
    }

    /// Flattened command list for an already ordered node sequence.
    pub fn batch_install_commands(
        &self,
        nodes: &[NodeMetadata],
    ) -> Result<Vec<String>, InstallPlanError> {
        let mut commands = Vec::new();
        for node in nodes {
            commands.extend(self.install_commands(node)?);
        }
        Ok(commands)
    }

    /// Deduplicated requirements.txt content across all nodes, sorted.
    pub fn aggregate_requirements(&self, nodes: &[NodeMetadata]) -> String {
        let mut packages: Vec<&str> = nodes
            .iter()
            .flat_map(|n| n.python_dependencies.iter())
            .map(String::as_str)
            .collect();
        packages.sort_unstable();
        packages.dedup();
        let mut out = packages.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    /// Checks each node's declared ComfyUI version range against the
    /// target version. Nodes without constraints always pass.
    pub fn check_compatibility(
        &self,
        nodes: &[NodeMetadata],
        target_version: &str,
    ) -> Result<(), InstallPlanError> {
        let target = parse_version(target_version);
        for node in nodes {
            if let Some(min) = &node.min_comfyui_version {
                if target < parse_version(min) {
                    return Err(InstallPlanError::VersionTooOld {
                        name: node.name.clone(),
                        required: min.clone(),
                        target: target_version.to_string(),
                    });
                }
            }
            if let Some(max) = &node.max_comfyui_version {
                if target > parse_version(max) {
                    return Err(InstallPlanError::VersionTooNew {
                        name: node.name.clone(),
                        required: max.clone(),
                        target: target_version.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Lenient dotted-numeric parse. Non-numeric segments compare as zero.
fn parse_version(version: &str) -> Vec<u64> {
    version
        .trim_start_matches('v')
        .split('.')
        .map(|part| part.parse::<u64>().unwrap_or(0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, repo: &str) -> NodeMetadata {
        NodeMetadata::new(name, repo)
    }

    #[test]
    fn test_url_validation() {
        assert!(validate_repository_url("https://github.com/ltdrdata/ComfyUI-Manager").is_ok());
        assert!(validate_repository_url("https://github.com/x/y.git").is_ok());
        assert!(validate_repository_url("git@github.com:x/y.git").is_ok());
        assert!(validate_repository_url("https://evil.example.com/x/y").is_err());
        assert!(validate_repository_url("https://github.com/x/y; rm -rf /").is_err());
        assert!(validate_repository_url("").is_err());
    }

    #[test]
    fn test_install_commands_with_pin_and_packages() {
        let mut meta = node("magic", "https://github.com/x/magic");
        meta.commit_hash = Some("deadbeef".to_string());
        meta.python_dependencies = vec!["numpy".to_string(), "scipy".to_string()];

        let commands = InstallPlanner::new().install_commands(&meta).unwrap();
        assert_eq!(
            commands[0],
            "git clone https://github.com/x/magic /app/ComfyUI/custom_nodes/magic"
        );
        assert!(commands[1].contains("checkout deadbeef"));
        assert!(commands[2].contains("numpy scipy"));
        assert!(commands[3].contains("requirements.txt"));
    }

    #[test]
    fn test_install_rejects_bad_repository() {
        let meta = node("bad", "ftp://example.com/repo");
        assert!(InstallPlanner::new().install_commands(&meta).is_err());
    }

    #[test]
    fn test_aggregate_requirements_deduplicates() {
        let mut a = node("a", "https://github.com/x/a");
        a.python_dependencies = vec!["numpy".to_string(), "pillow".to_string()];
        let mut b = node("b", "https://github.com/x/b");
        b.python_dependencies = vec!["numpy".to_string()];

        let requirements = InstallPlanner::new().aggregate_requirements(&[a, b]);
        assert_eq!(requirements, "numpy\npillow\n");
    }

    #[test]
    fn test_compatibility_range() {
        let planner = InstallPlanner::new();
        let mut meta = node("versioned", "https://github.com/x/v");
        meta.min_comfyui_version = Some("0.2.0".to_string());
        meta.max_comfyui_version = Some("0.4.0".to_string());

        assert!(planner.check_compatibility(&[meta.clone()], "0.3.1").is_ok());
        assert!(matches!(
            planner.check_compatibility(&[meta.clone()], "0.1.9"),
            Err(InstallPlanError::VersionTooOld { .. })
        ));
        assert!(matches!(
            planner.check_compatibility(&[meta], "0.5.0"),
            Err(InstallPlanError::VersionTooNew { .. })
        ));
    }

    #[test]
    fn test_unconstrained_node_always_compatible() {
        let planner = InstallPlanner::new();
        assert!(planner
            .check_compatibility(&[node("free", "https://github.com/x/f")], "0.0.1")
            .is_ok());
    }
}
