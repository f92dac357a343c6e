//! Resolved custom-node metadata, the value object handed to the
//! dependency order resolver and the container-definition generator.

use crate::resolver::oracle::ResolvedNode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// Directory-safe extension name.
    pub name: String,
    /// Source repository URL.
    pub repository: String,
    /// Pinned commit, when the resolution carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_hash: Option<String>,
    #[serde(default)]
    pub python_dependencies: Vec<String>,
    #[serde(default)]
    pub system_dependencies: Vec<String>,
    #[serde(default)]
    pub models_required: Vec<String>,
    /// Names of other extensions that must install before this one.
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_comfyui_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_comfyui_version: Option<String>,
    /// True when this dependency was inferred (e.g. from an injected
    /// scheduler token) rather than resolved explicitly.
    #[serde(default)]
    pub inferred: bool,
}

impl NodeMetadata {
    pub fn new(name: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            name: sanitize_name(&name.into()),
            repository: repository.into(),
            commit_hash: None,
            python_dependencies: Vec::new(),
            system_dependencies: Vec::new(),
            models_required: Vec::new(),
            depends_on: Vec::new(),
            min_comfyui_version: None,
            max_comfyui_version: None,
            inferred: false,
        }
    }

    /// Builds metadata from an oracle resolution. Falls back to the
    /// repository basename when the record carries no name.
    pub fn from_resolved(node: &ResolvedNode) -> Self {
        let name = if node.name.is_empty() {
            node.url
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or(&node.url)
                .trim_end_matches(".git")
                .to_string()
        } else {
            node.name.clone()
        };

        Self {
            name: sanitize_name(&name),
            repository: node.url.clone(),
            commit_hash: node.hash.clone(),
            python_dependencies: node.pip.clone(),
            system_dependencies: Vec::new(),
            models_required: Vec::new(),
            depends_on: Vec::new(),
            min_comfyui_version: None,
            max_comfyui_version: None,
            inferred: false,
        }
    }

    pub fn inferred(mut self, yes: bool) -> Self {
        self.inferred = yes;
        self
    }

    pub fn with_commit(mut self, hash: impl Into<String>) -> Self {
        self.commit_hash = Some(hash.into());
        self
    }
}

/// Makes an extension name safe for use as a directory name.
fn sanitize_name(name: &str) -> String {
    name.replace([' ', '|'], "_").replace(['(', ')'], "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Magic Nodes (v2)"), "Magic_Nodes_v2");
        assert_eq!(sanitize_name("a|b"), "a_b");
        assert_eq!(sanitize_name("plain"), "plain");
    }

    #[test]
    fn test_from_resolved_falls_back_to_basename() {
        let node = ResolvedNode {
            url: "https://github.com/x/magic.git".to_string(),
            name: String::new(),
            hash: Some("abc".to_string()),
            pip: vec!["numpy".to_string()],
        };
        let meta = NodeMetadata::from_resolved(&node);
        assert_eq!(meta.name, "magic");
        assert_eq!(meta.commit_hash.as_deref(), Some("abc"));
        assert_eq!(meta.python_dependencies, vec!["numpy".to_string()]);
        assert!(!meta.inferred);
    }
}
