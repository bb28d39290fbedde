//! Doctor command - Health check for a deployment directory
//!
//! Performs the preflight checks standalone:
//! - Required service files
//! - Models directory
//! - Container runtime availability
//! - Instance state and live health endpoint

use std::path::Path;

use colored::Colorize;
use serde::Serialize;

use crate::config::DeployConfig;
use crate::constants::REQUIRED_FILES;
use crate::output::{Output, OutputFormat, TableDisplay};
use crate::probe::ServiceProbe;
use crate::runtime::ContainerRuntime;

/// Status of a health check item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckStatus {
    fn colored_icon(&self) -> String {
        match self {
            CheckStatus::Ok => "[OK]".green().to_string(),
            CheckStatus::Warning => "[!!]".yellow().to_string(),
            CheckStatus::Error => "[!!]".red().to_string(),
        }
    }
}

/// A single health check item
#[derive(Debug, Clone, Serialize)]
pub struct CheckItem {
    pub status: CheckStatus,
    pub label: String,
    pub value: String,
}

impl CheckItem {
    fn ok(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Ok,
            label: label.into(),
            value: value.into(),
        }
    }

    fn warning(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Warning,
            label: label.into(),
            value: value.into(),
        }
    }

    fn error(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Error,
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Result of the doctor run
#[derive(Debug, Serialize)]
pub struct DoctorResult {
    pub checks: Vec<CheckItem>,
    pub recommendations: Vec<String>,
}

impl DoctorResult {
    /// Whether any check failed outright.
    pub fn has_errors(&self) -> bool {
        self.checks
            .iter()
            .any(|check| check.status == CheckStatus::Error)
    }
}

impl TableDisplay for DoctorResult {
    fn to_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("{}\n", "Deployment Health Check".cyan().bold()));
        output.push_str(&format!("{}\n", "\u{2500}".repeat(40).dimmed()));

        for check in &self.checks {
            output.push_str(&format!(
                "{} {}: {}\n",
                check.status.colored_icon(),
                check.label,
                check.value
            ));
        }

        if !self.recommendations.is_empty() {
            output.push_str(&format!("\n{}\n", "Recommendations:".yellow().bold()));
            for rec in &self.recommendations {
                output.push_str(&format!("  - {}\n", rec));
            }
        }

        output
    }
}

/// Check each required file in the working directory.
fn check_files(workdir: &Path, checks: &mut Vec<CheckItem>, recommendations: &mut Vec<String>) {
    for name in REQUIRED_FILES {
        let present = workdir.join(name).exists();
        if !present {
            checks.push(CheckItem::error(*name, "not found"));
            continue;
        }
        // The compose file is required by the layout but the launch path
        // uses a direct run invocation.
        if *name == "docker-compose.yml" {
            checks.push(CheckItem::warning(
                *name,
                "present (unused by the direct-run launch path)",
            ));
        } else {
            checks.push(CheckItem::ok(*name, "present"));
        }
    }

    if checks
        .iter()
        .any(|check| check.status == CheckStatus::Error)
    {
        recommendations
            .push("Add the missing files to the working directory before deploying".to_string());
    }
}

/// Run the doctor command.
pub async fn run(path: &str, format: OutputFormat) -> anyhow::Result<()> {
    let workdir = Path::new(path)
        .canonicalize()
        .unwrap_or_else(|_| Path::new(path).to_path_buf());
    let config = DeployConfig::load(&workdir);
    let runtime = ContainerRuntime::new(&config.runtime.binary);

    let mut checks = Vec::new();
    let mut recommendations = Vec::new();

    // Check 1: required files
    check_files(&workdir, &mut checks, &mut recommendations);

    // Check 2: models directory
    let models_path = config.models_path(&workdir);
    if models_path.is_dir() {
        checks.push(CheckItem::ok(
            "Models directory",
            models_path.display().to_string(),
        ));
    } else {
        checks.push(CheckItem::warning(
            "Models directory",
            "missing (created on deploy)",
        ));
    }

    // Check 3: container runtime
    match runtime.version() {
        Some(version) => {
            checks.push(CheckItem::ok("Container runtime", version));
        }
        None => {
            checks.push(CheckItem::error(
                "Container runtime",
                format!("'{}' not available", config.runtime.binary),
            ));
            recommendations.push(format!(
                "Install {} or set [runtime].binary in .embedrc.toml",
                config.runtime.binary
            ));
        }
    }

    // Check 4 + 5: instance state and live health
    let container = &config.service.container;
    if runtime.is_running(container) {
        checks.push(CheckItem::ok("Instance", format!("'{}' running", container)));

        let probe = ServiceProbe::new(config.base_url());
        match probe.health().await {
            Ok(health) => {
                let value = match health.model {
                    Some(model) => format!("{} ({})", health.status, model),
                    None => health.status,
                };
                checks.push(CheckItem::ok("Health endpoint", value));
            }
            Err(e) => {
                checks.push(CheckItem::warning(
                    "Health endpoint",
                    format!("not answering: {}", e),
                ));
                recommendations.push("Inspect the service logs: embedctl logs".to_string());
            }
        }
    } else {
        checks.push(CheckItem::warning(
            "Instance",
            format!("'{}' not running", container),
        ));
        recommendations.push("Deploy the service: embedctl deploy".to_string());
    }

    let result = DoctorResult {
        checks,
        recommendations,
    };

    if result.has_errors() {
        tracing::warn!("doctor found problems that will block a deploy");
    }

    Output::new(result, format).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_check_item_creation() {
        let ok = CheckItem::ok("Test", "value");
        assert_eq!(ok.status, CheckStatus::Ok);

        let warn = CheckItem::warning("Test", "value");
        assert_eq!(warn.status, CheckStatus::Warning);

        let err = CheckItem::error("Test", "value");
        assert_eq!(err.status, CheckStatus::Error);
    }

    #[test]
    fn test_check_files_all_present_flags_compose_as_unused() {
        let temp = TempDir::new().unwrap();
        for name in REQUIRED_FILES {
            fs::write(temp.path().join(name), "").unwrap();
        }

        let mut checks = Vec::new();
        let mut recommendations = Vec::new();
        check_files(temp.path(), &mut checks, &mut recommendations);

        assert_eq!(checks.len(), REQUIRED_FILES.len());
        assert!(recommendations.is_empty());

        let compose = checks
            .iter()
            .find(|check| check.label == "docker-compose.yml")
            .unwrap();
        assert_eq!(compose.status, CheckStatus::Warning);
        assert!(compose.value.contains("unused"));
    }

    #[test]
    fn test_check_files_missing_produces_errors() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("app.py"), "").unwrap();

        let mut checks = Vec::new();
        let mut recommendations = Vec::new();
        check_files(temp.path(), &mut checks, &mut recommendations);

        let errors: Vec<_> = checks
            .iter()
            .filter(|check| check.status == CheckStatus::Error)
            .collect();
        assert_eq!(errors.len(), 3);
        assert!(!recommendations.is_empty());
    }

    #[test]
    fn test_doctor_result_has_errors() {
        let result = DoctorResult {
            checks: vec![CheckItem::ok("a", "b"), CheckItem::error("c", "d")],
            recommendations: vec![],
        };
        assert!(result.has_errors());

        let clean = DoctorResult {
            checks: vec![CheckItem::ok("a", "b"), CheckItem::warning("c", "d")],
            recommendations: vec![],
        };
        assert!(!clean.has_errors());
    }
}
