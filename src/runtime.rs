//! Container runtime CLI adapter.
//!
//! Wraps the runtime binary (`docker` by default, `podman` works the same
//! way) for the handful of operations the orchestration sequence needs:
//! build, detached run, stop, remove, ps-filter and log tailing. Fatal
//! operations return typed errors; teardown helpers are best-effort and
//! only report whether the runtime accepted the command.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::config::DeployConfig;
use crate::constants::CONTAINER_MODELS_PATH;
use crate::error::{DeployError, Result};

/// Handle to the container runtime CLI.
#[derive(Debug, Clone)]
pub struct ContainerRuntime {
    binary: String,
}

/// One row of `ps` output for the reserved name.
#[derive(Debug, Clone, serde::Serialize)]
pub struct InstanceInfo {
    pub name: String,
    pub status: String,
    pub ports: String,
}

impl ContainerRuntime {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Check that the runtime binary can be executed at all.
    pub fn available(&self) -> bool {
        self.version().is_some()
    }

    /// Runtime version string, if the binary answers `--version`.
    pub fn version(&self) -> Option<String> {
        let output = Command::new(&self.binary).arg("--version").output().ok()?;
        if output.status.success() {
            Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            None
        }
    }

    /// Build the image from the given build context.
    ///
    /// Build output is passed through to the terminal so layer progress
    /// stays visible. A non-zero exit is fatal.
    pub fn build(&self, image: &str, context: &Path) -> Result<()> {
        let status = Command::new(&self.binary)
            .args(["build", "-t", image])
            .arg(context)
            .status()?;

        if status.success() {
            Ok(())
        } else {
            Err(DeployError::BuildFailed {
                image: image.to_string(),
            })
        }
    }

    /// Launch a detached instance per the configured name, restart policy,
    /// port mapping, models bind-mount and environment.
    ///
    /// Returns the container id printed by the runtime.
    pub fn launch(&self, config: &DeployConfig, workdir: &Path) -> Result<String> {
        let models_path = config.models_path(workdir);
        let volume = format!("{}:{}", models_path.display(), CONTAINER_MODELS_PATH);

        let mut cmd = Command::new(&self.binary);
        cmd.args(["run", "-d"])
            .args(["--name", &config.service.container])
            .args(["--restart", &config.service.restart])
            .args(["-p", &config.port_mapping()])
            .args(["-v", &volume]);
        for (key, value) in &config.service.env {
            cmd.args(["-e", &format!("{}={}", key, value)]);
        }
        cmd.arg(&config.service.image);

        let output = cmd.output()?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(DeployError::LaunchFailed {
                container: config.service.container.clone(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    /// Stop the named instance. Best-effort: a missing instance is not an
    /// error, so the result only says whether the runtime accepted the stop.
    pub fn stop(&self, name: &str) -> bool {
        match Command::new(&self.binary)
            .args(["stop", name])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) => status.success(),
            Err(e) => {
                debug!("stop {} failed to spawn: {}", name, e);
                false
            }
        }
    }

    /// Remove the named instance. Best-effort, same contract as [`stop`].
    ///
    /// [`stop`]: ContainerRuntime::stop
    pub fn remove(&self, name: &str) -> bool {
        match Command::new(&self.binary)
            .args(["rm", name])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) => status.success(),
            Err(e) => {
                debug!("rm {} failed to spawn: {}", name, e);
                false
            }
        }
    }

    /// Stop and remove any prior instance with the reserved name.
    ///
    /// Returns whether an instance was actually torn down.
    pub fn teardown(&self, name: &str) -> bool {
        let stopped = self.stop(name);
        let removed = self.remove(name);
        stopped || removed
    }

    /// List running instances whose name matches exactly.
    pub fn running_instances(&self, name: &str) -> Result<Vec<InstanceInfo>> {
        let filter = format!("name=^{}$", name);
        let output = Command::new(&self.binary)
            .args([
                "ps",
                "--filter",
                &filter,
                "--format",
                "{{.Names}}\t{{.Status}}\t{{.Ports}}",
            ])
            .output()?;

        if !output.status.success() {
            debug!(
                "ps failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Ok(Vec::new());
        }

        Ok(parse_instances(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Whether an instance with the reserved name is currently running.
    pub fn is_running(&self, name: &str) -> bool {
        self.running_instances(name)
            .map(|instances| !instances.is_empty())
            .unwrap_or(false)
    }

    /// Fetch the last `lines` lines of the instance's log output.
    ///
    /// The runtime writes container logs to both streams, so both are
    /// captured and concatenated.
    pub fn logs_tail(&self, name: &str, lines: u32) -> Result<String> {
        let output = Command::new(&self.binary)
            .args(["logs", "--tail", &lines.to_string(), name])
            .output()?;

        let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !combined.is_empty() && !combined.ends_with('\n') {
                combined.push('\n');
            }
            combined.push_str(&stderr);
        }
        Ok(combined.trim_end().to_string())
    }

    /// Stream the instance's logs to the terminal until interrupted.
    pub fn logs_follow(&self, name: &str) -> Result<()> {
        Command::new(&self.binary)
            .args(["logs", "-f", name])
            .status()?;
        Ok(())
    }
}

/// Parse the tab-separated `ps --format` output into instance rows.
fn parse_instances(stdout: &str) -> Vec<InstanceInfo> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut parts = line.splitn(3, '\t');
            InstanceInfo {
                name: parts.next().unwrap_or_default().to_string(),
                status: parts.next().unwrap_or_default().to_string(),
                ports: parts.next().unwrap_or_default().to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_instances_single_row() {
        let out = "nomic-embed-api\tUp 2 minutes\t0.0.0.0:5000->5000/tcp\n";
        let instances = parse_instances(out);
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].name, "nomic-embed-api");
        assert_eq!(instances[0].status, "Up 2 minutes");
        assert_eq!(instances[0].ports, "0.0.0.0:5000->5000/tcp");
    }

    #[test]
    fn test_parse_instances_empty_output() {
        assert!(parse_instances("").is_empty());
        assert!(parse_instances("\n\n").is_empty());
    }

    #[test]
    fn test_parse_instances_missing_columns() {
        let instances = parse_instances("lonely-name\n");
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].name, "lonely-name");
        assert_eq!(instances[0].status, "");
        assert_eq!(instances[0].ports, "");
    }

    #[test]
    fn test_available_with_missing_binary() {
        let runtime = ContainerRuntime::new("definitely-not-a-real-runtime-binary");
        assert!(!runtime.available());
    }

    #[test]
    fn test_stop_with_missing_binary_is_swallowed() {
        let runtime = ContainerRuntime::new("definitely-not-a-real-runtime-binary");
        assert!(!runtime.stop("anything"));
        assert!(!runtime.remove("anything"));
        assert!(!runtime.teardown("anything"));
    }
}
