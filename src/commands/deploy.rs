//! Deploy command - run the full deployment sequence in one step
//!
//! This command:
//! 1. Ensures the models directory exists
//! 2. Verifies the required service files are present
//! 3. Tears down any previous instance (best-effort)
//! 4. Builds the image and launches a fresh detached instance
//! 5. Polls the health endpoint until the service is ready
//! 6. Runs smoke tests and prints endpoints plus operational hints

use std::fs;
use std::net::UdpSocket;
use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::config::DeployConfig;
use crate::constants::{
    DEFAULT_LOG_TAIL_LINES, REQUIRED_FILES, SMOKE_SAMPLE_TEXT, SPINNER_TICK_MS,
};
use crate::error::DeployError;
use crate::output::{Output, OutputFormat, TableDisplay};
use crate::probe::{EmbedReport, HealthReport, ServiceProbe};
use crate::runtime::ContainerRuntime;

/// Smoke-test outcome carried in the deploy result. Failures here are
/// warnings only and never change the exit code.
#[derive(Debug, Default, Serialize)]
pub struct SmokeOutcome {
    pub skipped: bool,
    pub health: Option<HealthReport>,
    pub embed: Option<EmbedReport>,
    pub warnings: Vec<String>,
}

/// Endpoint URLs printed in the summary.
#[derive(Debug, Serialize)]
pub struct Endpoints {
    pub health: String,
    pub embed: String,
    pub embed_batch: String,
}

/// Result of a deploy run.
#[derive(Debug, Serialize)]
pub struct DeployResult {
    pub success: bool,
    pub workdir: String,
    pub image: String,
    pub container: String,
    pub container_id: String,
    pub previous_instance_removed: bool,
    pub ready_attempts: u32,
    pub ready_ms: u64,
    pub model: Option<String>,
    pub running: bool,
    pub log_tail: String,
    pub smoke: SmokeOutcome,
    pub host_ip: String,
    pub endpoints: Endpoints,
    pub deployed_at: String,
    pub duration_ms: u64,
}

impl TableDisplay for DeployResult {
    fn to_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{} embedding service deployed\n",
            "SUCCESS:".green().bold()
        ));

        output.push_str(&format!("\n{}\n", "Summary".cyan().bold()));
        output.push_str(&format!("  Workdir:   {}\n", self.workdir));
        output.push_str(&format!("  Image:     {}\n", self.image));
        output.push_str(&format!(
            "  Container: {} ({})\n",
            self.container,
            short_id(&self.container_id)
        ));
        if self.previous_instance_removed {
            output.push_str("  Replaced a previous instance\n");
        }
        output.push_str(&format!(
            "  Duration:  {}ms\n",
            self.duration_ms.to_string().yellow()
        ));

        output.push_str(&format!("\n{}\n", "Service".cyan().bold()));
        output.push_str(&format!(
            "  Ready after {} attempt{} ({:.1}s)\n",
            self.ready_attempts,
            if self.ready_attempts == 1 { "" } else { "s" },
            self.ready_ms as f64 / 1000.0
        ));
        if let Some(model) = &self.model {
            output.push_str(&format!("  Model: {}\n", model.green()));
        }

        if !self.log_tail.is_empty() {
            output.push_str(&format!("\n{}\n", "Recent Logs".cyan().bold()));
            for line in self.log_tail.lines() {
                output.push_str(&format!("  {}\n", line.dimmed()));
            }
        }

        if !self.smoke.skipped {
            output.push_str(&format!("\n{}\n", "Smoke Tests".cyan().bold()));
            if let Some(health) = &self.smoke.health {
                output.push_str(&format!("  /health  {}\n", health.status.green()));
            }
            if let Some(embed) = &self.smoke.embed {
                output.push_str(&format!(
                    "  /embed   {} dimensions in {:.3}s\n",
                    embed.dimensions.to_string().green(),
                    embed.processing_time
                ));
            }
            for warning in &self.smoke.warnings {
                output.push_str(&format!("  {} {}\n", "WARNING:".yellow().bold(), warning));
            }
        }

        output.push_str(&format!("\n{}\n", "Endpoints".cyan().bold()));
        output.push_str(&format!("  Health: GET  {}\n", self.endpoints.health));
        output.push_str(&format!("  Embed:  POST {}\n", self.endpoints.embed));
        output.push_str(&format!("  Batch:  POST {}\n", self.endpoints.embed_batch));

        output.push_str(&format!("\n{}\n", "Next Steps".cyan().bold()));
        output.push_str("  embedctl status          # Check service status\n");
        output.push_str("  embedctl logs --follow   # Stream service logs\n");
        output.push_str("  embedctl smoke           # Re-run smoke tests\n");
        output.push_str("  embedctl down            # Stop and remove the service\n");

        output
    }
}

/// Verify every required file exists; report all absences at once.
fn preflight(workdir: &Path) -> crate::error::Result<()> {
    let missing: Vec<String> = REQUIRED_FILES
        .iter()
        .filter(|name| !workdir.join(name).exists())
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(DeployError::MissingFiles { files: missing })
    }
}

/// Best-effort discovery of the host's outbound IP for the printed
/// endpoint URLs. Falls back to loopback when there is no route.
fn discover_host_ip() -> String {
    UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect("8.8.8.8:80")?;
            socket.local_addr()
        })
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|_| "127.0.0.1".to_string())
}

fn short_id(id: &str) -> &str {
    if id.len() > 12 {
        &id[..12]
    } else {
        id
    }
}

/// Run the deploy command.
pub async fn run(
    path: &str,
    skip_smoke: bool,
    timeout_secs: Option<u64>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let start = Instant::now();

    let workdir = Path::new(path).canonicalize().context("Invalid path")?;
    let mut config = DeployConfig::load(&workdir);
    if let Some(timeout) = timeout_secs {
        config.readiness.timeout_secs = timeout;
    }

    let runtime = ContainerRuntime::new(&config.runtime.binary);
    let container = config.service.container.clone();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(SPINNER_TICK_MS));

    // Step 1: directory setup (idempotent)
    spinner.set_message("Preparing models directory...");
    fs::create_dir_all(config.models_path(&workdir))
        .context("Failed to create models directory")?;

    // Step 2: preflight - fatal, nothing downstream runs on failure
    spinner.set_message("Checking required files...");
    if let Err(e) = preflight(&workdir) {
        spinner.finish_and_clear();
        return Err(e.into());
    }

    if !runtime.available() {
        spinner.finish_and_clear();
        return Err(DeployError::RuntimeUnavailable {
            binary: config.runtime.binary.clone(),
        }
        .into());
    }

    // Step 3: teardown - best-effort, absence of a prior instance is fine
    spinner.set_message(format!("Removing previous instance '{}'...", container));
    let previous_instance_removed = runtime.teardown(&container);
    if previous_instance_removed {
        tracing::info!("Removed previous instance '{}'", container);
    }

    // Step 4: build - fatal on non-zero exit
    spinner.set_message(format!("Building image '{}'...", config.service.image));
    let build_result = spinner.suspend(|| runtime.build(&config.service.image, &workdir));
    if let Err(e) = build_result {
        spinner.finish_and_clear();
        return Err(e.into());
    }

    // Step 5: launch - fatal on non-zero exit
    spinner.set_message(format!("Launching container '{}'...", container));
    let container_id = match runtime.launch(&config, &workdir) {
        Ok(id) => id,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e.into());
        }
    };
    tracing::info!("Launched container {}", short_id(&container_id));

    // Step 6: readiness - bounded poll with backoff, fatal on timeout
    let probe = ServiceProbe::new(config.base_url());
    spinner.set_message(format!("Waiting for {}...", probe.health_url()));
    let ready = match probe.wait_ready(&config.readiness).await {
        Ok(report) => report,
        Err(e) => {
            spinner.finish_and_clear();
            // Show what the service was doing before giving up
            if let Ok(tail) = runtime.logs_tail(&container, DEFAULT_LOG_TAIL_LINES) {
                if !tail.is_empty() {
                    eprintln!("{}", "Last log lines:".yellow().bold());
                    eprintln!("{}", tail.dimmed());
                }
            }
            return Err(e).context("Service did not become ready");
        }
    };

    // Step 7: status/log inspection - informational only
    spinner.set_message("Inspecting instance...");
    let running = runtime.is_running(&container);
    let log_tail = runtime.logs_tail(&container, DEFAULT_LOG_TAIL_LINES).unwrap_or_default();

    // Step 8: smoke tests - warnings only, never fatal
    let mut smoke = SmokeOutcome {
        skipped: skip_smoke,
        ..Default::default()
    };
    if !skip_smoke {
        spinner.set_message("Running smoke tests...");
        match probe.health().await {
            Ok(health) => smoke.health = Some(health),
            Err(e) => smoke.warnings.push(format!("health check failed: {}", e)),
        }
        match probe.embed(SMOKE_SAMPLE_TEXT).await {
            Ok(report) => smoke.embed = Some(report),
            Err(e) => smoke.warnings.push(format!("embed check failed: {}", e)),
        }
        for warning in &smoke.warnings {
            tracing::warn!("{}", warning);
        }
    }

    spinner.finish_and_clear();

    // Step 9: summary
    let host_ip = discover_host_ip();
    let port = config.service.host_port;
    let result = DeployResult {
        success: true,
        workdir: workdir.display().to_string(),
        image: config.service.image.clone(),
        container,
        container_id,
        previous_instance_removed,
        ready_attempts: ready.attempts,
        ready_ms: ready.waited_ms,
        model: ready.health.model.clone(),
        running,
        log_tail,
        smoke,
        endpoints: Endpoints {
            health: format!("http://{}:{}/health", host_ip, port),
            embed: format!("http://{}:{}/embed", host_ip, port),
            embed_batch: format!("http://{}:{}/embed/batch", host_ip, port),
        },
        host_ip,
        deployed_at: chrono::Local::now().to_rfc3339(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    Output::new(result, format).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_preflight_reports_every_missing_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("app.py"), "").unwrap();
        fs::write(temp.path().join("Dockerfile"), "").unwrap();

        let err = preflight(temp.path()).unwrap_err();
        match err {
            DeployError::MissingFiles { files } => {
                assert_eq!(files, vec!["requirements.txt", "docker-compose.yml"]);
            }
            other => panic!("expected MissingFiles, got {:?}", other),
        }
    }

    #[test]
    fn test_preflight_passes_with_all_files() {
        let temp = TempDir::new().unwrap();
        for name in REQUIRED_FILES {
            fs::write(temp.path().join(name), "").unwrap();
        }
        assert!(preflight(temp.path()).is_ok());
    }

    #[test]
    fn test_discover_host_ip_is_parseable() {
        let ip = discover_host_ip();
        assert!(ip.parse::<std::net::IpAddr>().is_ok(), "got: {}", ip);
    }

    #[test]
    fn test_short_id_truncates() {
        assert_eq!(short_id("abcdef0123456789"), "abcdef012345");
        assert_eq!(short_id("abc"), "abc");
    }
}
