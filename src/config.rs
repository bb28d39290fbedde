//! Deployment configuration loading from `.embedrc.toml`.
//!
//! The shell script this tool replaces took everything from ambient state:
//! the current directory, hardcoded names and ports, implicit environment.
//! Here that state is an explicit [`DeployConfig`] threaded through every
//! orchestration step. Configuration is optional - sensible defaults match
//! the original fixed values, and a `.embedrc.toml` in the working directory
//! overrides them.
//!
//! # Example Configuration
//!
//! ```toml
//! [service]
//! image = "nomic-embed-api"
//! container = "nomic-embed-api"
//! host_port = 5000
//! container_port = 5000
//! restart = "unless-stopped"
//!
//! [service.env]
//! FLASK_ENV = "production"
//! PYTHONUNBUFFERED = "1"
//!
//! [runtime]
//! binary = "docker"
//!
//! [paths]
//! models_dir = "models"
//!
//! [readiness]
//! timeout_secs = 120
//! initial_delay_ms = 500
//! max_delay_ms = 5000
//!
//! [output]
//! format = "table"
//! color = true
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::constants;

/// Root configuration structure loaded from `.embedrc.toml`.
///
/// All sections are optional and fall back to the original script's fixed
/// values if not specified.
#[derive(Debug, Deserialize, Default)]
pub struct DeployConfig {
    /// Image, container name, ports and environment for the service.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Container runtime selection.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Filesystem layout (models directory).
    #[serde(default)]
    pub paths: PathsConfig,

    /// Readiness polling parameters.
    #[serde(default)]
    pub readiness: ReadinessConfig,

    /// Output formatting preferences.
    #[serde(default)]
    pub output: OutputSettings,
}

/// Service identity and launch parameters.
#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    /// Image tag used for build and run.
    #[serde(default = "default_image")]
    pub image: String,

    /// Reserved container name. The teardown step guarantees at most one
    /// instance with this name exists.
    #[serde(default = "default_container")]
    pub container: String,

    /// Host port the service is published on.
    #[serde(default = "default_host_port")]
    pub host_port: u16,

    /// Port the service listens on inside the container.
    #[serde(default = "default_container_port")]
    pub container_port: u16,

    /// Restart policy passed to the runtime.
    #[serde(default = "default_restart")]
    pub restart: String,

    /// Environment variables set on the launched instance.
    ///
    /// Defaults to the production-mode flag and the output-buffering
    /// disable flag the service expects.
    #[serde(default = "default_env")]
    pub env: BTreeMap<String, String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            image: default_image(),
            container: default_container(),
            host_port: default_host_port(),
            container_port: default_container_port(),
            restart: default_restart(),
            env: default_env(),
        }
    }
}

/// Container runtime selection.
#[derive(Debug, Deserialize)]
pub struct RuntimeConfig {
    /// Runtime binary name (`docker`, `podman`, or an absolute path).
    #[serde(default = "default_runtime_binary")]
    pub binary: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            binary: default_runtime_binary(),
        }
    }
}

/// Filesystem layout for the deployment.
#[derive(Debug, Deserialize)]
pub struct PathsConfig {
    /// Directory (relative to the working directory) bind-mounted into the
    /// container so model weights persist across redeploys.
    #[serde(default = "default_models_dir")]
    pub models_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
        }
    }
}

/// Readiness polling parameters.
///
/// The poll starts at `initial_delay_ms`, doubles after each failed attempt
/// up to `max_delay_ms`, and gives up after `timeout_secs` overall.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadinessConfig {
    /// Hard deadline for the service to answer its health endpoint.
    #[serde(default = "default_readiness_timeout")]
    pub timeout_secs: u64,

    /// Delay before the first retry.
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Backoff cap.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_readiness_timeout(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

/// Output formatting preferences.
///
/// Command-line flags (e.g., `--format json`) override these settings.
#[derive(Debug, Deserialize, Default)]
pub struct OutputSettings {
    /// Default output format for CLI commands (`table` or `json`).
    #[serde(default)]
    pub format: Option<String>,

    /// Whether to use colored output. Defaults to TTY auto-detection.
    #[serde(default)]
    pub color: Option<bool>,
}

fn default_image() -> String {
    constants::DEFAULT_IMAGE.to_string()
}

fn default_container() -> String {
    constants::DEFAULT_CONTAINER.to_string()
}

fn default_host_port() -> u16 {
    constants::DEFAULT_HOST_PORT
}

fn default_container_port() -> u16 {
    constants::DEFAULT_CONTAINER_PORT
}

fn default_restart() -> String {
    constants::DEFAULT_RESTART_POLICY.to_string()
}

fn default_env() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("FLASK_ENV".to_string(), "production".to_string()),
        ("PYTHONUNBUFFERED".to_string(), "1".to_string()),
    ])
}

fn default_runtime_binary() -> String {
    constants::DEFAULT_RUNTIME.to_string()
}

fn default_models_dir() -> String {
    constants::DEFAULT_MODELS_DIR.to_string()
}

fn default_readiness_timeout() -> u64 {
    constants::DEFAULT_READINESS_TIMEOUT_SECS
}

fn default_initial_delay() -> u64 {
    constants::DEFAULT_READINESS_INITIAL_DELAY_MS
}

fn default_max_delay() -> u64 {
    constants::DEFAULT_READINESS_MAX_DELAY_MS
}

impl DeployConfig {
    /// Load configuration from `.embedrc.toml` in the given directory.
    ///
    /// If the config file doesn't exist or can't be parsed, returns defaults.
    /// Parse errors are logged as warnings but don't cause failures.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(".embedrc.toml");
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse .embedrc.toml: {}", e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read .embedrc.toml: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Absolute path of the models directory under the working directory.
    pub fn models_path(&self, workdir: &Path) -> PathBuf {
        workdir.join(&self.paths.models_dir)
    }

    /// Base URL the deployed service is reachable at from the host.
    pub fn base_url(&self) -> String {
        format!("http://localhost:{}", self.service.host_port)
    }

    /// Host-port to container-port publish mapping.
    pub fn port_mapping(&self) -> String {
        format!("{}:{}", self.service.host_port, self.service.container_port)
    }

    /// Get the default output format, if configured.
    pub fn default_format(&self) -> Option<&str> {
        self.output.format.as_deref()
    }

    /// Check if colored output should be used.
    ///
    /// Returns the configured value, or `None` to use auto-detection.
    pub fn use_color(&self) -> Option<bool> {
        self.output.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DeployConfig::default();
        assert_eq!(config.service.image, "nomic-embed-api");
        assert_eq!(config.service.container, "nomic-embed-api");
        assert_eq!(config.service.host_port, 5000);
        assert_eq!(config.service.container_port, 5000);
        assert_eq!(config.service.restart, "unless-stopped");
        assert_eq!(config.runtime.binary, "docker");
        assert_eq!(config.paths.models_dir, "models");
        assert_eq!(config.readiness.timeout_secs, 120);
        assert!(config.output.format.is_none());
    }

    #[test]
    fn test_default_env_vars() {
        let config = DeployConfig::default();
        assert_eq!(
            config.service.env.get("FLASK_ENV").map(String::as_str),
            Some("production")
        );
        assert_eq!(
            config.service.env.get("PYTHONUNBUFFERED").map(String::as_str),
            Some("1")
        );
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[service]
image = "my-embed"
container = "my-embed-1"
host_port = 8080
container_port = 5000
restart = "always"

[service.env]
FLASK_ENV = "development"

[runtime]
binary = "podman"

[paths]
models_dir = "cache/models"

[readiness]
timeout_secs = 30
initial_delay_ms = 100
max_delay_ms = 1000

[output]
format = "json"
color = false
"#;
        let config: DeployConfig = toml::from_str(toml_content).unwrap();

        assert_eq!(config.service.image, "my-embed");
        assert_eq!(config.service.container, "my-embed-1");
        assert_eq!(config.service.host_port, 8080);
        assert_eq!(config.service.restart, "always");
        assert_eq!(config.port_mapping(), "8080:5000");
        assert_eq!(config.base_url(), "http://localhost:8080");

        // An explicit env table replaces the defaults entirely
        assert_eq!(
            config.service.env.get("FLASK_ENV").map(String::as_str),
            Some("development")
        );
        assert!(!config.service.env.contains_key("PYTHONUNBUFFERED"));

        assert_eq!(config.runtime.binary, "podman");
        assert_eq!(config.paths.models_dir, "cache/models");
        assert_eq!(config.readiness.timeout_secs, 30);
        assert_eq!(config.readiness.initial_delay_ms, 100);
        assert_eq!(config.default_format(), Some("json"));
        assert_eq!(config.use_color(), Some(false));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let toml_content = r#"
[service]
host_port = 9000
"#;
        let config: DeployConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.service.host_port, 9000);
        assert_eq!(config.service.image, "nomic-embed-api");
        assert_eq!(config.runtime.binary, "docker");
    }

    #[test]
    fn test_models_path_joins_workdir() {
        let config = DeployConfig::default();
        let path = config.models_path(Path::new("/srv/embed"));
        assert_eq!(path, PathBuf::from("/srv/embed/models"));
    }
}
