//! Status command - Show instance state and recommended next steps
//!
//! Checks the container runtime for the reserved instance name, probes the
//! health endpoint when something is running, and suggests what to do next.

use std::path::Path;
use std::time::Instant;

use colored::Colorize;
use serde::Serialize;

use crate::config::DeployConfig;
use crate::output::{Output, OutputFormat, TableDisplay};
use crate::probe::{HealthReport, ServiceProbe};
use crate::runtime::{ContainerRuntime, InstanceInfo};

/// Status information for the deployed service.
#[derive(Debug, Serialize)]
pub struct StatusInfo {
    /// Whether the config file (.embedrc.toml) exists
    pub config_exists: bool,
    /// Reserved container name
    pub container: String,
    /// Running instances matching the reserved name
    pub instances: Vec<InstanceInfo>,
    /// Live health response, if the service answered
    pub health: Option<HealthReport>,
    /// Base URL the service is probed at
    pub base_url: String,
    /// Recommended next action
    pub next_action: Option<String>,
    /// Time taken to gather status (in milliseconds)
    pub duration_ms: u64,
}

impl TableDisplay for StatusInfo {
    fn to_table(&self) -> String {
        let mut lines = Vec::new();

        if self.instances.is_empty() {
            lines.push(format!("{}", "Service Status: Not running".yellow().bold()));
            lines.push(format!("  {}: {}", "Container".cyan(), self.container));
        } else {
            lines.push(format!("{}", "Service Status: Running".green().bold()));
            for instance in &self.instances {
                lines.push(format!("  {}: {}", "Container".cyan(), instance.name));
                lines.push(format!("  {}: {}", "State".cyan(), instance.status));
                if !instance.ports.is_empty() {
                    lines.push(format!("  {}: {}", "Ports".cyan(), instance.ports));
                }
            }

            match &self.health {
                Some(health) => {
                    lines.push(format!("  {}: {}", "Health".cyan(), health.status.green()));
                    if let Some(model) = &health.model {
                        lines.push(format!("  {}: {}", "Model".cyan(), model));
                    }
                }
                None => {
                    lines.push(format!(
                        "  {}: {}",
                        "Health".cyan(),
                        "not answering".yellow()
                    ));
                }
            }
            lines.push(format!("  {}: {}", "URL".cyan(), self.base_url));
        }

        lines.push(format!(
            "  {}: {}",
            "Config".cyan(),
            if self.config_exists { "Yes" } else { "No" }
        ));

        if let Some(action) = &self.next_action {
            lines.push(String::new());
            lines.push(format!("{}: {}", "Next action".yellow(), action));
        }

        lines.push(format!(
            "\n{}",
            format!("({} ms)", self.duration_ms).dimmed()
        ));

        lines.join("\n")
    }
}

/// Run the status command.
pub async fn run(path: &str, format: OutputFormat) -> anyhow::Result<()> {
    let start = Instant::now();

    let workdir = Path::new(path)
        .canonicalize()
        .unwrap_or_else(|_| Path::new(path).to_path_buf());
    let config = DeployConfig::load(&workdir);
    let runtime = ContainerRuntime::new(&config.runtime.binary);

    let config_exists = workdir.join(".embedrc.toml").exists();
    let instances = runtime
        .running_instances(&config.service.container)
        .unwrap_or_default();

    let mut health = None;
    let mut next_action = None;

    if instances.is_empty() {
        next_action = Some("embedctl deploy".to_string());
    } else {
        let probe = ServiceProbe::new(config.base_url());
        match probe.health().await {
            Ok(report) => health = Some(report),
            Err(e) => {
                tracing::debug!("health probe failed: {}", e);
                next_action = Some("embedctl logs".to_string());
            }
        }
    }

    let status = StatusInfo {
        config_exists,
        container: config.service.container.clone(),
        instances,
        health,
        base_url: config.base_url(),
        next_action,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    Output::new(status, format).render()
}
