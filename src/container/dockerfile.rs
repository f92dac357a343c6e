//! Dockerfile text generation for resolved workflows.
//!
//! Pure rendering: the ordered extension list and the extracted
//! dependency set become Dockerfile instructions. Nothing here shells out
//! or talks to a container runtime; build execution belongs to whatever
//! consumes the generated file.

use crate::resolver::metadata::NodeMetadata;
use crate::workflow::dependencies::DependencySet;
use std::collections::BTreeMap;

pub const DEFAULT_BASE_IMAGE: &str = "python:3.11-slim";
pub const COMFYUI_REPO: &str = "https://github.com/comfyanonymous/ComfyUI.git";
pub const COMFYUI_PORT: u16 = 8188;

#[derive(Debug, Default)]
pub struct DockerfileBuilder;

impl DockerfileBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Renders the complete Dockerfile for a workflow: base image, system
    /// packages, ComfyUI, inferred python packages, then each resolved
    /// extension in installation order.
    pub fn build_for_workflow(
        &self,
        dependencies: &DependencySet,
        ordered_nodes: &[NodeMetadata],
        base_image: &str,
        use_cuda: bool,
    ) -> String {
        let mut lines: Vec<String> = Vec::new();

        if use_cuda {
            lines.push(self.cuda_base("12.1", "8", "22.04"));
        } else {
            lines.push(format!("FROM {base_image}"));
            lines.push(String::new());
        }

        lines.push("# Install system dependencies".to_string());
        lines.extend(self.system_packages(&["curl", "git", "wget"]));
        lines.push(String::new());

        lines.push("# Install ComfyUI".to_string());
        lines.push(format!("RUN git clone {COMFYUI_REPO} /app/ComfyUI"));
        lines.push("WORKDIR /app/ComfyUI".to_string());
        lines.push(String::new());

        lines.push("# Install PyTorch".to_string());
        if use_cuda {
            lines.push(
                "RUN pip install --no-cache-dir torch torchvision torchaudio".to_string(),
            );
        } else {
            lines.push(
                "RUN pip install --no-cache-dir torch torchvision torchaudio \
                 --index-url https://download.pytorch.org/whl/cpu"
                    .to_string(),
            );
        }
        lines.push(String::new());

        lines.push("# Install ComfyUI requirements".to_string());
        lines.push("RUN pip install --no-cache-dir -r requirements.txt".to_string());
        lines.push(String::new());

        if !dependencies.python_packages.is_empty() {
            lines.push("# Install inferred Python packages".to_string());
            lines.extend(self.python_packages(
                &dependencies
                    .python_packages
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>(),
            ));
            lines.push(String::new());
        }

        if !ordered_nodes.is_empty() {
            lines.push(self.custom_nodes_section(ordered_nodes));
        }

        lines.push(format!("EXPOSE {COMFYUI_PORT}"));
        lines.push(String::new());
        lines.push(format!(
            "CMD [\"python\", \"main.py\", \"--listen\", \"0.0.0.0\", \"--port\", \"{COMFYUI_PORT}\"]"
        ));

        lines.join("\n")
    }

    /// `RUN pip install` line for a sorted package list.
    pub fn python_packages(&self, packages: &[String]) -> Vec<String> {
        if packages.is_empty() {
            return Vec::new();
        }
        let mut sorted = packages.to_vec();
        sorted.sort();
        vec![format!(
            "RUN pip install --no-cache-dir {}",
            sorted.join(" ")
        )]
    }

    /// apt-get block for system packages, cache cleaned in the same layer.
    pub fn system_packages(&self, packages: &[&str]) -> Vec<String> {
        if packages.is_empty() {
            return Vec::new();
        }
        let mut sorted: Vec<&str> = packages.to_vec();
        sorted.sort_unstable();
        vec![
            "RUN apt-get update && \\".to_string(),
            format!(
                "    apt-get install -y --no-install-recommends {} && \\",
                sorted.join(" ")
            ),
            "    apt-get clean && \\".to_string(),
            "    rm -rf /var/lib/apt/lists/*".to_string(),
        ]
    }

    fn cuda_base(&self, cuda: &str, cudnn: &str, ubuntu: &str) -> String {
        [
            format!("FROM nvidia/cuda:{cuda}.0-cudnn{cudnn}-runtime-ubuntu{ubuntu}"),
            String::new(),
            "# Install Python".to_string(),
            "RUN apt-get update && \\".to_string(),
            "    apt-get install -y python3 python3-pip && \\".to_string(),
            "    apt-get clean && \\".to_string(),
            "    rm -rf /var/lib/apt/lists/*".to_string(),
            String::new(),
        ]
        .join("\n")
    }

    /// Per-extension clone/checkout/pip block, in the given order.
    pub fn custom_nodes_section(&self, nodes: &[NodeMetadata]) -> String {
        let mut lines = vec![
            "# Install custom nodes".to_string(),
            "WORKDIR /app/ComfyUI/custom_nodes".to_string(),
            String::new(),
        ];

        for node in nodes {
            lines.push(format!("# Install {}", node.name));
            if node.inferred {
                lines.push("# (inferred dependency)".to_string());
            }
            match &node.commit_hash {
                Some(hash) => lines.push(format!(
                    "RUN git clone {} {} && \\\n    cd {} && \\\n    git checkout {}",
                    node.repository, node.name, node.name, hash
                )),
                None => lines.push(format!("RUN git clone {} {}", node.repository, node.name)),
            }
            if !node.system_dependencies.is_empty() {
                lines.extend(self.system_packages(
                    &node
                        .system_dependencies
                        .iter()
                        .map(String::as_str)
                        .collect::<Vec<_>>(),
                ));
            }
            if !node.python_dependencies.is_empty() {
                lines.extend(self.python_packages(&node.python_dependencies));
            }
            lines.push(String::new());
        }

        lines.push("WORKDIR /app/ComfyUI".to_string());
        lines.push(String::new());
        lines.join("\n")
    }

    /// Merges consecutive apt-get / pip install RUN layers into one.
    pub fn optimize_layers(&self, commands: &[String]) -> Vec<String> {
        let mut optimized: Vec<String> = Vec::new();
        let mut pip_group: Vec<String> = Vec::new();

        let flush = |group: &mut Vec<String>, out: &mut Vec<String>| {
            if group.is_empty() {
                return;
            }
            let mut packages: Vec<String> = Vec::new();
            for cmd in group.iter() {
                if let Some(rest) = cmd.split("pip install").nth(1) {
                    packages.extend(
                        rest.split_whitespace()
                            .filter(|w| !w.starts_with("--"))
                            .map(String::from),
                    );
                }
            }
            out.push(format!(
                "RUN pip install --no-cache-dir {}",
                packages.join(" ")
            ));
            group.clear();
        };

        for cmd in commands {
            if cmd.starts_with("RUN pip install") {
                pip_group.push(cmd.clone());
            } else {
                flush(&mut pip_group, &mut optimized);
                optimized.push(cmd.clone());
            }
        }
        flush(&mut pip_group, &mut optimized);
        optimized
    }

    pub fn healthcheck(&self, command: &str, interval: &str, timeout: &str, retries: u32) -> String {
        format!(
            "HEALTHCHECK --interval={interval} --timeout={timeout} --retries={retries} \\\n    CMD {command}"
        )
    }

    pub fn env_vars(&self, vars: &BTreeMap<String, String>) -> Vec<String> {
        vars.iter().map(|(k, v)| format!("ENV {k}={v}")).collect()
    }

    pub fn entrypoint(&self, entrypoint: &[&str], command: &[&str]) -> String {
        let quote = |parts: &[&str]| {
            parts
                .iter()
                .map(|p| format!("\"{p}\""))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let mut result = Vec::new();
        if !entrypoint.is_empty() {
            result.push(format!("ENTRYPOINT [{}]", quote(entrypoint)));
        }
        if !command.is_empty() {
            result.push(format!("CMD [{}]", quote(command)));
        }
        result.join("\n")
    }
}
