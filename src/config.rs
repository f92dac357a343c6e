//! Configuration management for comfypack
//!
//! Loads settings from environment variables with sensible defaults.
//! Configuration covers the registry endpoint, caching, request timeouts,
//! container base image selection, and logging.
//!
//! # Environment Variables
//!
//! - `COMFYPACK_REGISTRY_URL`: Node registry endpoint - default: ComfyUI-Manager extension map
//! - `COMFYPACK_CACHE_ENABLED`: Enable resolution caching (true|false) - default: "true"
//! - `COMFYPACK_REQUEST_TIMEOUT`: Registry timeout in seconds - default: "30"
//! - `COMFYPACK_BASE_IMAGE`: Base container image - default: "python:3.11-slim"
//! - `COMFYPACK_COMFYUI_VERSION`: Target ComfyUI version for compatibility checks - default: none
//! - `COMFYPACK_LOG_LEVEL`: Logging level - default: "info"

use crate::container::dockerfile::DEFAULT_BASE_IMAGE;
use crate::resolver::registry::DEFAULT_REGISTRY_URL;
use std::env;
use std::fmt;
use thiserror::Error;

const DEFAULT_CACHE_ENABLED: bool = true;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// Failed to parse configuration value
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

/// Main configuration structure for comfypack
///
/// Constructed via `Default::default()`, which reads COMFYPACK_*
/// environment variables and falls back to defaults for any missing
/// values.
#[derive(Debug, Clone)]
pub struct ComfypackConfig {
    /// Node registry endpoint for class name resolution
    pub registry_url: String,

    /// Enable in-process resolution caching
    pub cache_enabled: bool,

    /// Registry request timeout in seconds
    pub request_timeout_secs: u64,

    /// Base container image for generated Dockerfiles
    pub base_image: String,

    /// Target ComfyUI version for extension compatibility checks
    pub comfyui_version: Option<String>,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ComfypackConfig {
    fn default() -> Self {
        let registry_url = env::var("COMFYPACK_REGISTRY_URL")
            .unwrap_or_else(|_| DEFAULT_REGISTRY_URL.to_string());

        let cache_enabled = env::var("COMFYPACK_CACHE_ENABLED")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(DEFAULT_CACHE_ENABLED);

        let request_timeout_secs = env::var("COMFYPACK_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let base_image =
            env::var("COMFYPACK_BASE_IMAGE").unwrap_or_else(|_| DEFAULT_BASE_IMAGE.to_string());

        let comfyui_version = env::var("COMFYPACK_COMFYUI_VERSION").ok();

        let log_level = env::var("COMFYPACK_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            registry_url,
            cache_enabled,
            request_timeout_secs,
            base_image,
            comfyui_version,
            log_level,
        }
    }
}

impl ComfypackConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any value is out of range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 10 minutes".to_string(),
            ));
        }

        if !self.registry_url.starts_with("http://") && !self.registry_url.starts_with("https://")
        {
            return Err(ConfigError::ValidationFailed(format!(
                "Registry URL must be http(s): {}",
                self.registry_url
            )));
        }

        if self.base_image.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Base image cannot be empty".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    /// Converts configuration to a display map for output formatting
    pub fn to_display_map(&self) -> std::collections::HashMap<String, String> {
        let mut map = std::collections::HashMap::new();

        map.insert("registry_url".to_string(), self.registry_url.clone());
        map.insert("cache_enabled".to_string(), self.cache_enabled.to_string());
        map.insert(
            "request_timeout_secs".to_string(),
            self.request_timeout_secs.to_string(),
        );
        map.insert("base_image".to_string(), self.base_image.clone());
        if let Some(ref version) = self.comfyui_version {
            map.insert("comfyui_version".to_string(), version.clone());
        }
        map.insert("log_level".to_string(), self.log_level.clone());

        map
    }
}

impl fmt::Display for ComfypackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Comfypack Configuration:")?;
        writeln!(f, "  Registry URL: {}", self.registry_url)?;
        writeln!(f, "  Cache Enabled: {}", self.cache_enabled)?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Base Image: {}", self.base_image)?;
        if let Some(ref version) = self.comfyui_version {
            writeln!(f, "  ComfyUI Version: {}", version)?;
        }
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    /// Helper to temporarily set environment variables for testing
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    fn base_config() -> ComfypackConfig {
        ComfypackConfig {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            cache_enabled: true,
            request_timeout_secs: 30,
            base_image: DEFAULT_BASE_IMAGE.to_string(),
            comfyui_version: None,
            log_level: "info".to_string(),
        }
    }

    #[test]
    fn test_environment_variable_parsing() {
        let _guards = vec![
            EnvGuard::set("COMFYPACK_REGISTRY_URL", "https://example.com/map.json"),
            EnvGuard::set("COMFYPACK_CACHE_ENABLED", "false"),
            EnvGuard::set("COMFYPACK_REQUEST_TIMEOUT", "60"),
            EnvGuard::set("COMFYPACK_BASE_IMAGE", "python:3.12"),
            EnvGuard::set("COMFYPACK_LOG_LEVEL", "DEBUG"),
        ];

        let config = ComfypackConfig::default();

        assert_eq!(config.registry_url, "https://example.com/map.json");
        assert!(!config.cache_enabled);
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.base_image, "python:3.12");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_validation_valid() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_timeout() {
        let mut config = base_config();
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        config.request_timeout_secs = 601;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_registry_url() {
        let mut config = base_config();
        config.registry_url = "ftp://example.com/map.json".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_log_level() {
        let mut config = base_config();
        config.log_level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_display_map() {
        let mut config = base_config();
        config.comfyui_version = Some("0.3.0".to_string());
        let map = config.to_display_map();
        assert_eq!(map.get("base_image").unwrap(), DEFAULT_BASE_IMAGE);
        assert_eq!(map.get("comfyui_version").unwrap(), "0.3.0");
    }

    #[test]
    fn test_config_display() {
        let display = format!("{}", base_config());
        assert!(display.contains("Comfypack Configuration:"));
        assert!(display.contains("Registry URL:"));
    }
}
